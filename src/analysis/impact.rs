// src/analysis/impact.rs

//! Cost impact of lead-time variations on a single demand stream.
//!
//! Compares the baseline lead time against each variation and converts the
//! extra safety stock into inventory value and annual holding cost.

use crate::analysis::statistics::analyze_results;
use crate::error::{Result, SimError};
use crate::model::demand::DemandGenerator;
use crate::simulation::config::SimulationConfig;
use crate::simulation::engine::MonteCarloEngine;
use crate::simulation::policy::LeadTimeAdditive;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Extra holding cost (as a share of the baseline) above which lead-time
/// changes count as significant.
pub const SIGNIFICANCE_SHARE: f64 = 0.25;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactParams {
    pub mean_demand: f64,
    pub demand_std_dev: f64,
    /// Average network lead time in days.
    pub base_lead_time: f64,
    pub coverage_days: f64,
    /// Constant unloading time added to every lead time.
    pub unload_time: f64,
    pub unit_cost: f64,
    /// Annual holding cost as a fraction of inventory value (0.20 = 20%).
    pub holding_cost_rate: f64,
    /// Extra days of lead time to evaluate.
    pub variations: Vec<f64>,
    pub simulation_days: usize,
    pub iterations: usize,
    pub seed: u64,
}

impl Default for ImpactParams {
    fn default() -> Self {
        Self {
            mean_demand: 100.0,
            demand_std_dev: 20.0,
            base_lead_time: 3.0,
            coverage_days: 7.0,
            unload_time: 1.0,
            unit_cost: 50.0,
            holding_cost_rate: 0.20,
            variations: vec![1.0, 2.0, 3.0, 4.0, 9.0, 10.0],
            simulation_days: 90,
            iterations: 1000,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariationBand {
    /// Up to 2 days.
    Small,
    /// Up to 4 days.
    Medium,
    Large,
}

impl VariationBand {
    pub fn classify(variation_days: f64) -> Self {
        if variation_days <= 2.0 {
            VariationBand::Small
        } else if variation_days <= 4.0 {
            VariationBand::Medium
        } else {
            VariationBand::Large
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactAssessment {
    LowImpact,
    SignificantImpact,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactRow {
    pub variation_days: f64,
    /// Base lead time plus variation plus unload time.
    pub total_lead_time: f64,
    pub band: VariationBand,
    pub safety_stock: f64,
    pub percent_change: f64,
    pub additional_units: f64,
    pub inventory_value: f64,
    pub annual_holding_cost: f64,
    pub additional_annual_cost: f64,
}

/// Averages over all variations that fall into one band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandSummary {
    pub band: VariationBand,
    pub average_additional_cost: f64,
    pub average_increase_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactReport {
    pub baseline_lead_time: f64,
    pub baseline_safety_stock: f64,
    pub baseline_inventory_value: f64,
    pub baseline_holding_cost: f64,
    pub rows: Vec<ImpactRow>,
    pub bands: Vec<BandSummary>,
    /// Largest holding-cost increase over the baseline, in percent.
    pub max_cost_increase_percent: f64,
    /// Additional annual cost at which the impact becomes significant.
    pub significance_threshold: f64,
    pub assessment: ImpactAssessment,
}

/// Runs baseline and variations in one simulation (shared demand draws)
/// with the [`LeadTimeAdditive`] model.
pub fn analyze_lead_time_impact(params: &ImpactParams) -> Result<ImpactReport> {
    validate(params)?;

    let generator = DemandGenerator::new(params.mean_demand, params.demand_std_dev)?;
    let config = SimulationConfig::default()
        .with_iterations(params.iterations)
        .with_seed(params.seed);
    let engine = MonteCarloEngine::single_node("demand", generator, config)?.with_model(LeadTimeAdditive);

    let baseline_lead_time = params.base_lead_time + params.unload_time;
    let mut lead_times = vec![baseline_lead_time];
    lead_times.extend(params.variations.iter().map(|v| baseline_lead_time + v));

    let results = engine.simulate_safety_stock(params.coverage_days, params.simulation_days, &lead_times)?;
    let summaries = analyze_results(&results)?;

    let baseline_safety_stock = summaries[0].mean;
    let baseline_inventory_value = baseline_safety_stock * params.unit_cost;
    let baseline_holding_cost = baseline_inventory_value * params.holding_cost_rate;

    let rows: Vec<ImpactRow> = params
        .variations
        .iter()
        .zip(&summaries[1..])
        .map(|(&variation_days, summary)| {
            let safety_stock = summary.mean;
            let additional_units = safety_stock - baseline_safety_stock;
            let inventory_value = safety_stock * params.unit_cost;
            let annual_holding_cost = inventory_value * params.holding_cost_rate;
            ImpactRow {
                variation_days,
                total_lead_time: summary.lead_time,
                band: VariationBand::classify(variation_days),
                safety_stock,
                percent_change: percent_of(additional_units, baseline_safety_stock),
                additional_units,
                inventory_value,
                annual_holding_cost,
                additional_annual_cost: annual_holding_cost - baseline_holding_cost,
            }
        })
        .collect();

    let bands = [VariationBand::Small, VariationBand::Medium, VariationBand::Large]
        .into_iter()
        .filter_map(|band| {
            let members: Vec<&ImpactRow> = rows.iter().filter(|r| r.band == band).collect();
            if members.is_empty() {
                return None;
            }
            let n = members.len() as f64;
            let average_additional_cost = members.iter().map(|r| r.additional_annual_cost).sum::<f64>() / n;
            Some(BandSummary {
                band,
                average_additional_cost,
                average_increase_percent: percent_of(average_additional_cost, baseline_holding_cost),
            })
        })
        .collect();

    let max_cost_increase_percent = rows
        .iter()
        .map(|r| percent_of(r.additional_annual_cost, baseline_holding_cost))
        .fold(f64::NEG_INFINITY, f64::max);
    let assessment = if max_cost_increase_percent < SIGNIFICANCE_SHARE * 100.0 {
        ImpactAssessment::LowImpact
    } else {
        ImpactAssessment::SignificantImpact
    };

    info!(
        baseline_safety_stock,
        max_cost_increase_percent,
        ?assessment,
        "Lead time impact analysis complete"
    );

    Ok(ImpactReport {
        baseline_lead_time,
        baseline_safety_stock,
        baseline_inventory_value,
        baseline_holding_cost,
        rows,
        bands,
        max_cost_increase_percent,
        significance_threshold: baseline_holding_cost * SIGNIFICANCE_SHARE,
        assessment,
    })
}

fn validate(params: &ImpactParams) -> Result<()> {
    if params.variations.is_empty() {
        return Err(SimError::invalid("at least one lead-time variation is required"));
    }
    if let Some(v) = params.variations.iter().find(|v| !(v.is_finite() && **v > 0.0)) {
        return Err(SimError::invalid(format!("variations must be positive, got {v}")));
    }
    for (name, value) in [
        ("base lead time", params.base_lead_time),
        ("unload time", params.unload_time),
        ("unit cost", params.unit_cost),
        ("holding cost rate", params.holding_cost_rate),
    ] {
        if !(value.is_finite() && value >= 0.0) {
            return Err(SimError::invalid(format!("{name} must be non-negative, got {value}")));
        }
    }
    if params.mean_demand <= 0.0 {
        return Err(SimError::invalid("mean demand must be positive for a cost comparison"));
    }
    Ok(())
}

fn percent_of(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    part / whole * 100.0
}

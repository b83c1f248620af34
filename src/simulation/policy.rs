// src/simulation/policy.rs

use crate::analysis::optimization::{lead_time_buffer, z_score};
use crate::error::Result;
use std::fmt::Debug;

/// Everything a safety-stock formula may look at for one node, one trial
/// and one lead-time scenario.
#[derive(Debug, Clone, Copy)]
pub struct CoverageContext<'a> {
    /// Days of average demand the stock should cover.
    pub coverage_days: f64,
    /// The caller's lead-time scenario.
    pub scenario_lead_time: f64,
    /// Scenario plus the node's (possibly disrupted) network lead time.
    /// Equal to the scenario when no network is attached.
    pub effective_lead_time: f64,
    /// `effective_lead_time / baseline_lead_time` with a network, 1.0 without.
    pub lead_time_ratio: f64,
    /// The trial's simulated daily demand.
    pub demand: &'a [f64],
    /// Mean of `demand`.
    pub mean_daily_demand: f64,
}

/// Sizes the safety stock for one trial.
///
/// We require `Send` + `Sync` so trials can run on parallel workers.
pub trait SafetyStockModel: Debug + Send + Sync {
    fn safety_stock(&self, ctx: &CoverageContext<'_>) -> f64;

    /// Short label for logs.
    fn name(&self) -> &'static str;
}

// =========================================================================
// 1. Coverage Duration (default)
// =========================================================================

/// Holds `coverage_days` of average demand, stretched by how much longer
/// the node's lead time is than the baseline.
///
/// Formula: SafetyStock = CoverageDays * LeadTimeRatio * MeanDailyDemand
#[derive(Debug, Clone, Copy, Default)]
pub struct CoverageDuration;

impl SafetyStockModel for CoverageDuration {
    fn safety_stock(&self, ctx: &CoverageContext<'_>) -> f64 {
        ctx.coverage_days * ctx.lead_time_ratio * ctx.mean_daily_demand
    }

    fn name(&self) -> &'static str {
        "coverage_duration"
    }
}

// =========================================================================
// 2. Lead Time Additive
// =========================================================================

/// Covers the lead time itself on top of the coverage window.
///
/// Formula: SafetyStock = (CoverageDays + EffectiveLeadTime) * MeanDailyDemand
#[derive(Debug, Clone, Copy, Default)]
pub struct LeadTimeAdditive;

impl SafetyStockModel for LeadTimeAdditive {
    fn safety_stock(&self, ctx: &CoverageContext<'_>) -> f64 {
        (ctx.coverage_days + ctx.effective_lead_time) * ctx.mean_daily_demand
    }

    fn name(&self) -> &'static str {
        "lead_time_additive"
    }
}

// =========================================================================
// 3. Statistical Buffer
// =========================================================================

/// Textbook buffer against demand variability during the lead time,
/// using the trial's observed demand volatility.
///
/// Formula: SafetyStock = Z * StdDev(demand) * sqrt(EffectiveLeadTime)
#[derive(Debug, Clone, Copy)]
pub struct StatisticalBuffer {
    z: f64,
}

impl StatisticalBuffer {
    pub fn new(service_level: f64) -> Result<Self> {
        Ok(Self {
            z: z_score(service_level)?,
        })
    }

    pub fn z(&self) -> f64 {
        self.z
    }
}

impl SafetyStockModel for StatisticalBuffer {
    fn safety_stock(&self, ctx: &CoverageContext<'_>) -> f64 {
        let n = ctx.demand.len();
        if n < 2 {
            return 0.0;
        }
        let variance = ctx
            .demand
            .iter()
            .map(|d| (d - ctx.mean_daily_demand).powi(2))
            .sum::<f64>()
            / (n - 1) as f64;

        lead_time_buffer(self.z, variance.sqrt(), ctx.effective_lead_time)
    }

    fn name(&self) -> &'static str {
        "statistical_buffer"
    }
}

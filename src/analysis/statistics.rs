// src/analysis/statistics.rs

//! Summary statistics over Monte Carlo safety-stock samples.

use crate::analysis::optimization::inverse_normal_cdf;
use crate::error::{Result, SimError};
use crate::simulation::engine::SimulationResults;
use serde::Serialize;

/// Distribution of safety stock for one lead-time scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioSummary {
    pub lead_time: f64,
    pub samples: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1); 0 for a single sample.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub p5: f64,
    pub p95: f64,
}

/// Summary restricted to a single demand node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSummary {
    pub node_id: String,
    pub summary: ScenarioSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceInterval {
    pub lead_time: f64,
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
    pub confidence: f64,
}

impl ConfidenceInterval {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.lower..=self.upper).contains(&value)
    }
}

/// One summary per scenario, in result order.
pub fn analyze_results(results: &SimulationResults) -> Result<Vec<ScenarioSummary>> {
    results
        .scenarios
        .iter()
        .map(|scenario| summarize(scenario.lead_time, &scenario.values()))
        .collect()
}

/// One summary per (node, scenario), grouped by node.
pub fn analyze_by_node(results: &SimulationResults) -> Result<Vec<NodeSummary>> {
    let mut summaries = Vec::new();
    for node_id in results.node_ids() {
        for scenario in &results.scenarios {
            summaries.push(NodeSummary {
                node_id: node_id.clone(),
                summary: summarize(scenario.lead_time, &scenario.values_for(&node_id))?,
            });
        }
    }
    Ok(summaries)
}

/// Normal-approximation confidence interval for the mean safety stock of
/// each scenario: mean -/+ z * s / sqrt(n).
pub fn calculate_confidence_intervals(
    results: &SimulationResults,
    confidence: f64,
) -> Result<Vec<ConfidenceInterval>> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(SimError::invalid(format!(
            "confidence must be in (0, 1), got {confidence}"
        )));
    }
    let z = inverse_normal_cdf((1.0 + confidence) / 2.0);

    results
        .scenarios
        .iter()
        .map(|scenario| {
            let values = scenario.values();
            if values.len() < 2 {
                return Err(SimError::InsufficientSamples {
                    required: 2,
                    actual: values.len(),
                });
            }
            let n = values.len() as f64;
            let mean = mean(&values);
            let margin = z * sample_std_dev(&values, mean) / n.sqrt();
            Ok(ConfidenceInterval {
                lead_time: scenario.lead_time,
                mean,
                lower: mean - margin,
                upper: mean + margin,
                confidence,
            })
        })
        .collect()
}

fn summarize(lead_time: f64, values: &[f64]) -> Result<ScenarioSummary> {
    if values.is_empty() {
        return Err(SimError::InsufficientSamples {
            required: 1,
            actual: 0,
        });
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mean = mean(&sorted);

    Ok(ScenarioSummary {
        lead_time,
        samples: sorted.len(),
        mean,
        std_dev: sample_std_dev(&sorted, mean),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        median: percentile(&sorted, 0.5),
        p5: percentile(&sorted, 0.05),
        p95: percentile(&sorted, 0.95),
    })
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Linear-interpolated percentile of an ascending slice; NaN when empty.
/// `p` is a fraction in [0, 1].
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let rank = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let weight = rank - lo as f64;
    sorted[lo] * (1.0 - weight) + sorted[hi] * weight
}

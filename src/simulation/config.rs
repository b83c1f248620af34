// src/simulation/config.rs

use crate::error::{Result, SimError};
use crate::simulation::disruption::Disruption;
use serde::{Deserialize, Serialize};

/// Configuration for a Monte Carlo run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of independent trials.
    pub iterations: usize,

    /// Random seed for deterministic simulation. `None` draws one from OS
    /// entropy; the seed used is reported in the results.
    pub seed: Option<u64>,

    /// Run trials on the rayon thread pool. Results are identical either way.
    pub parallel: bool,

    /// Lead time (days) at which the coverage window is taken as-is when a
    /// network is attached.
    pub baseline_lead_time: f64,

    /// Lead-time disruptions applied per trial. Requires a network.
    pub disruptions: Vec<Disruption>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            seed: None,
            parallel: false,
            baseline_lead_time: 1.0,
            disruptions: Vec::new(),
        }
    }
}

impl SimulationConfig {
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_baseline_lead_time(mut self, baseline_lead_time: f64) -> Self {
        self.baseline_lead_time = baseline_lead_time;
        self
    }

    pub fn with_disruption(mut self, disruption: Disruption) -> Self {
        self.disruptions.push(disruption);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(SimError::invalid("number of iterations must be positive"));
        }
        if !(self.baseline_lead_time.is_finite() && self.baseline_lead_time > 0.0) {
            return Err(SimError::invalid(format!(
                "baseline lead time must be positive, got {}",
                self.baseline_lead_time
            )));
        }
        for disruption in &self.disruptions {
            disruption.validate()?;
        }
        Ok(())
    }
}

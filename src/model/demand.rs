// src/model/demand.rs

use crate::error::{Result, SimError};
use rand::distributions::Uniform;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Shape of the daily demand draws. Every shape is parameterised by the
/// generator's mean and standard deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandDistribution {
    /// Bell curve around the mean.
    #[default]
    Normal,
    /// Flat distribution on `mean ± sqrt(3) * std_dev` (same mean and variance as the normal).
    Uniform,
    /// Every day demands exactly the mean. Useful for step-response style tests.
    Constant,
}

/// Produces stochastic daily demand for a single node.
///
/// Draws are floored at zero: a negative sample becomes `0.0`, it is never
/// resampled. This slightly raises the effective mean when `std_dev` is
/// large relative to `mean`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemandGenerator {
    mean: f64,
    std_dev: f64,
    distribution: DemandDistribution,
    seed: Option<u64>,
}

impl DemandGenerator {
    /// Creates a normal demand generator.
    ///
    /// # Arguments
    /// * `mean` - Average daily demand (e.g., 100.0).
    /// * `std_dev` - Day-to-day volatility (e.g., 20.0).
    pub fn new(mean: f64, std_dev: f64) -> Result<Self> {
        validate_parameters(mean, std_dev)?;
        Ok(Self {
            mean,
            std_dev,
            distribution: DemandDistribution::Normal,
            seed: None,
        })
    }

    /// Fixes the seed used by [`DemandGenerator::generate_daily_demand`].
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_distribution(mut self, distribution: DemandDistribution) -> Self {
        self.distribution = distribution;
        self
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    pub fn distribution(&self) -> DemandDistribution {
        self.distribution
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Replaces the demand parameters, keeping distribution and seed.
    pub fn set_parameters(&mut self, mean: f64, std_dev: f64) -> Result<()> {
        validate_parameters(mean, std_dev)?;
        self.mean = mean;
        self.std_dev = std_dev;
        Ok(())
    }

    /// Generates `days` of demand from the generator's own stream.
    ///
    /// With a seed every call starts a fresh stream from that seed, so two
    /// calls return the same sequence. Without a seed the stream comes from
    /// OS entropy.
    pub fn generate_daily_demand(&self, days: usize) -> Result<Vec<f64>> {
        let mut rng = match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        self.sample_daily_demand(days, &mut rng)
    }

    /// Generates `days` of demand from a caller-owned random stream.
    pub fn sample_daily_demand<R: Rng + ?Sized>(&self, days: usize, rng: &mut R) -> Result<Vec<f64>> {
        if days == 0 {
            return Err(SimError::invalid("demand horizon must be at least one day"));
        }

        let schedule = match self.distribution {
            DemandDistribution::Normal => {
                let normal = Normal::new(self.mean, self.std_dev)
                    .map_err(|e| SimError::invalid(format!("normal demand: {e}")))?;
                (0..days).map(|_| normal.sample(rng).max(0.0)).collect()
            }
            DemandDistribution::Uniform => {
                let half_width = 3f64.sqrt() * self.std_dev;
                let (low, high) = (self.mean - half_width, self.mean + half_width);
                if !(low.is_finite() && high.is_finite() && (high - low).is_finite()) {
                    return Err(SimError::invalid(format!(
                        "uniform demand range overflows for mean {} and std dev {}",
                        self.mean, self.std_dev
                    )));
                }
                let uniform = Uniform::new_inclusive(low, high);
                (0..days).map(|_| uniform.sample(rng).max(0.0)).collect()
            }
            DemandDistribution::Constant => vec![self.mean; days],
        };

        Ok(schedule)
    }

    /// Generates `days` of demand and sizes a safety stock covering
    /// `coverage_days` of the observed average.
    pub fn calculate_safety_stock(&self, coverage_days: f64, days: usize) -> Result<f64> {
        let history = self.generate_daily_demand(days)?;
        coverage_safety_stock(coverage_days, &history)
    }
}

/// Safety stock sized to cover `coverage_days` of average demand.
///
/// Formula: SafetyStock = CoverageDays * mean(history)
pub fn coverage_safety_stock(coverage_days: f64, history: &[f64]) -> Result<f64> {
    if !(coverage_days.is_finite() && coverage_days > 0.0) {
        return Err(SimError::invalid(format!(
            "coverage days must be positive, got {coverage_days}"
        )));
    }
    Ok(coverage_days * mean_demand(history)?)
}

/// Average of a demand history.
pub fn mean_demand(history: &[f64]) -> Result<f64> {
    if history.is_empty() {
        return Err(SimError::invalid("demand history is empty"));
    }
    Ok(history.iter().sum::<f64>() / history.len() as f64)
}

fn validate_parameters(mean: f64, std_dev: f64) -> Result<()> {
    if !mean.is_finite() || mean < 0.0 {
        return Err(SimError::invalid(format!(
            "mean demand must be finite and non-negative, got {mean}"
        )));
    }
    if !std_dev.is_finite() || std_dev < 0.0 {
        return Err(SimError::invalid(format!(
            "demand std dev must be finite and non-negative, got {std_dev}"
        )));
    }
    Ok(())
}

// src/analysis/optimization.rs

//! Closed-form inventory formulas used alongside the simulation.
//!
//! Provides the standard normal quantile (for confidence intervals and
//! service-level z-scores) and the textbook statistical safety stock.

use crate::error::{Result, SimError};

/// Standard normal quantile, Φ⁻¹(p).
///
/// Rational approximation from Abramowitz & Stegun 26.2.23, accurate to
/// about 4.5e-4. Probabilities at or beyond 0 and 1 saturate at -5 and 5.
pub fn inverse_normal_cdf(p: f64) -> f64 {
    const C: [f64; 3] = [2.515517, 0.802853, 0.010328];
    const D: [f64; 3] = [1.432788, 0.189269, 0.001308];

    if p <= 0.0 {
        return -5.0;
    }
    if p >= 1.0 {
        return 5.0;
    }
    if p == 0.5 {
        return 0.0;
    }

    // The approximation covers the lower tail only.
    let tail = p.min(1.0 - p);
    let t = (-2.0 * tail.ln()).sqrt();
    let z = t - (C[0] + t * (C[1] + t * C[2])) / (1.0 + t * (D[0] + t * (D[1] + t * D[2])));

    if p < 0.5 {
        -z
    } else {
        z
    }
}

/// Z-score for a one-sided service level strictly between 0 and 1.
pub fn z_score(service_level: f64) -> Result<f64> {
    if !(service_level > 0.0 && service_level < 1.0) {
        return Err(SimError::invalid(format!(
            "service level must be in (0, 1), got {service_level}"
        )));
    }
    Ok(inverse_normal_cdf(service_level))
}

/// Buffer against demand variability over a lead time:
/// `z * std_dev_daily * sqrt(lead_time_days)`, floored at zero.
pub fn lead_time_buffer(z: f64, std_dev_daily: f64, lead_time_days: f64) -> f64 {
    (z * std_dev_daily * lead_time_days.max(0.0).sqrt()).max(0.0)
}

/// Classic statistical safety stock for i.i.d. daily demand.
///
/// # Arguments
/// * `service_level` - Target probability of not stocking out during the lead time.
/// * `std_dev_daily` - Standard deviation of daily demand.
/// * `lead_time_days` - Replenishment lead time in days.
pub fn statistical_safety_stock(service_level: f64, std_dev_daily: f64, lead_time_days: f64) -> Result<f64> {
    if !(lead_time_days.is_finite() && lead_time_days >= 0.0) {
        return Err(SimError::invalid(format!(
            "lead time must be non-negative, got {lead_time_days}"
        )));
    }
    Ok(lead_time_buffer(z_score(service_level)?, std_dev_daily, lead_time_days))
}

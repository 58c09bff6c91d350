use rand::{distributions::WeightedIndex, prelude::*};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SamplingError {
    #[error("Input weights list is empty, cannot perform sampling")]
    EmptyWeights,
    #[error("All weights are zero, resulting in zero total weight for sampling")]
    ZeroTotalWeight,
    #[error("Failed to create weighted distribution: {source}")]
    DistributionError {
        #[from]
        source: rand::distributions::WeightedError,
    },
}

/// Probability `rate · dt` of an event in one step, clamped to `[0, 1]`.
#[inline]
pub fn event_probability(rate: f64, delta_time: f64) -> f64 {
    let p = rate * delta_time;
    if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
}

/// One Bernoulli trial with probability `rate · dt`.
#[inline]
pub fn occurs(rate: f64, delta_time: f64, rng: &mut impl Rng) -> bool {
    let p = event_probability(rate, delta_time);
    if p <= 0.0 {
        return false;
    }
    if p >= 1.0 {
        return true;
    }
    rng.gen_range(0.0..1.0) < p
}

/// Uniform sample from `[low, high]`. Returns `low` for an empty or inverted range.
#[inline]
pub fn uniform(low: f64, high: f64, rng: &mut impl Rng) -> f64 {
    if high > low {
        rng.gen_range(low..=high)
    } else {
        low
    }
}

/// Multiplicative drift factor `1 + U(-drift, +drift)`.
#[inline]
pub fn drift_factor(drift: f64, rng: &mut impl Rng) -> f64 {
    1.0 + uniform(-drift.abs(), drift.abs(), rng)
}

/// Draws an index with probability proportional to its weight.
pub fn weighted_choice(weights: &[f64], rng: &mut impl Rng) -> Result<usize, SamplingError> {
    if weights.is_empty() {
        return Err(SamplingError::EmptyWeights);
    }
    let total: f64 = weights.iter().filter(|w| w.is_finite() && **w > 0.0).sum();
    if total <= f64::EPSILON {
        return Err(SamplingError::ZeroTotalWeight);
    }
    let dist = WeightedIndex::new(weights)?;
    Ok(dist.sample(rng))
}

pub fn pick<'a, T>(items: &'a [T], rng: &mut impl Rng) -> Option<&'a T> {
    items.choose(rng)
}

// Population statistics: mean/stdev over a metric's population and z-scores.

use serde::Serialize;

/// Threshold below which standard deviation is treated as zero.
const STDEV_EPSILON: f64 = 1e-9;

/// Minimum number of non-null samples needed for a usable standard deviation.
pub const MIN_POPULATION: usize = 2;

/// Mean and standard deviation for a single metric across a population.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PoolStats {
    pub mean: f64,
    pub stdev: f64,
    /// Number of non-null samples the stats were computed from.
    pub count: usize,
}

impl PoolStats {
    /// Stats for an empty population: every z-score against it is 0.
    pub const EMPTY: PoolStats = PoolStats {
        mean: 0.0,
        stdev: 0.0,
        count: 0,
    };

    /// Compute stats over the non-null, finite values of an optional-valued
    /// population.
    pub fn from_optional<I>(values: I) -> PoolStats
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let present: Vec<f64> = values
            .into_iter()
            .flatten()
            .filter(|v| v.is_finite())
            .collect();
        compute_pool_stats(&present)
    }

    /// True when the population cannot discriminate between entities
    /// (fewer than two samples, or zero variance).
    pub fn is_degenerate(&self) -> bool {
        self.count < MIN_POPULATION || self.stdev < STDEV_EPSILON
    }
}

/// Compute mean and standard deviation for a slice of values.
///
/// Uses the population standard deviation (N denominator), since the pool
/// is the full set of eligible entities rather than a sample. Fewer than
/// two values yields a zero stdev.
pub fn compute_pool_stats(values: &[f64]) -> PoolStats {
    if values.is_empty() {
        return PoolStats::EMPTY;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < MIN_POPULATION {
        return PoolStats {
            mean,
            stdev: 0.0,
            count: values.len(),
        };
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    PoolStats {
        mean,
        stdev: variance.sqrt(),
        count: values.len(),
    }
}

/// Compute a z-score given a value and pool stats.
///
/// Returns 0.0 if the standard deviation is approximately zero, or if the
/// value or the pool is not finite.
pub fn compute_zscore(value: f64, stats: &PoolStats) -> f64 {
    if !value.is_finite() || !stats.mean.is_finite() || !stats.stdev.is_finite() {
        return 0.0;
    }
    if stats.stdev < STDEV_EPSILON {
        return 0.0;
    }
    (value - stats.mean) / stats.stdev
}

/// Null-propagating z-score: a missing or non-finite raw value has no
/// z-score.
pub fn zscore_opt(value: Option<f64>, stats: &PoolStats) -> Option<f64> {
    value
        .filter(|v| v.is_finite())
        .map(|v| compute_zscore(v, stats))
}

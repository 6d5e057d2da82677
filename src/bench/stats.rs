use serde::Serialize;

/// Latency summary over the succeeded samples of one backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencyDistribution {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
}

impl LatencyDistribution {
    /// `None` when there is nothing to summarize; an empty run never reports
    /// zeros.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);

        let sum: f64 = sorted.iter().sum();
        Some(Self {
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            avg: sum / sorted.len() as f64,
            p50: percentile_sorted(&sorted, 50.0),
            p95: percentile_sorted(&sorted, 95.0),
            p99: percentile_sorted(&sorted, 99.0),
        })
    }

    /// Tail spread, p99 minus p50. Smaller means more consistent.
    pub fn spread(&self) -> f64 {
        self.p99 - self.p50
    }
}

/// Percentile of unsorted samples, linear interpolation between nearest ranks.
pub fn compute_percentile(samples: &[f64], percentile: f64) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(percentile_sorted(&sorted, percentile))
}

fn percentile_sorted(sorted: &[f64], percentile: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let rank = (percentile / 100.0) * (n - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = (lower + 1).min(n - 1);
    let fraction = rank - lower as f64;
    sorted[lower] + fraction * (sorted[upper] - sorted[lower])
}

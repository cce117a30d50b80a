//! Distribution statistics over link counts

use serde::Serialize;

/// Summary statistics of a set of link counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DistributionStats {
    pub min: usize,
    pub max: usize,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation
    pub std_dev: f64,
}

impl DistributionStats {
    /// Compute from raw counts; all zeros for an empty slice
    pub fn from_counts(counts: &[usize]) -> Self {
        if counts.is_empty() {
            return Self::default();
        }

        let mut sorted = counts.to_vec();
        sorted.sort_unstable();

        let n = sorted.len();
        let mean = sorted.iter().sum::<usize>() as f64 / n as f64;
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) as f64 / 2.0
        } else {
            sorted[n / 2] as f64
        };
        let variance = sorted
            .iter()
            .map(|&c| {
                let d = c as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n as f64;

        Self {
            min: sorted[0],
            max: sorted[n - 1],
            mean,
            median,
            std_dev: variance.sqrt(),
        }
    }

    /// Coefficient of variation clamped to [0, 1]; 0 when the mean is 0
    pub fn imbalance_ratio(&self) -> f64 {
        if self.mean <= 0.0 {
            return 0.0;
        }
        (self.std_dev / self.mean).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_stats() {
        let stats = DistributionStats::from_counts(&[1, 2, 3, 4]);
        assert_eq!(stats.min, 1);
        assert_eq!(stats.max, 4);
        assert!((stats.mean - 2.5).abs() < 1e-12);
        assert!((stats.median - 2.5).abs() < 1e-12);
        assert!((stats.std_dev - 1.25f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_odd_median() {
        let stats = DistributionStats::from_counts(&[5, 1, 3]);
        assert!((stats.median - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_and_zero_mean() {
        assert_eq!(DistributionStats::from_counts(&[]), DistributionStats::default());
        assert_eq!(DistributionStats::from_counts(&[0, 0]).imbalance_ratio(), 0.0);
    }

    #[test]
    fn test_imbalance_ratio_is_clamped() {
        let even = DistributionStats::from_counts(&[2, 2, 2]);
        assert_eq!(even.imbalance_ratio(), 0.0);

        let skewed = DistributionStats::from_counts(&[0, 0, 0, 0, 0, 0, 0, 0, 0, 30]);
        assert_eq!(skewed.imbalance_ratio(), 1.0);
    }
}

use serde::{Deserialize, Serialize};

/// Spread below which a standard deviation or range counts as zero.
pub(crate) const ZERO_SPREAD: f64 = 1e-9;

/// Summary statistics over a set of composite scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub mean: f64,
    /// Population standard deviation.
    pub stddev: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

impl Distribution {
    /// `None` for an empty slice.
    pub fn from_scores(scores: &[f64]) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }

        let count = scores.len();
        let mean = scores.iter().sum::<f64>() / count as f64;
        let variance = scores
            .iter()
            .map(|score| (score - mean).powi(2))
            .sum::<f64>()
            / count as f64;
        let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            mean,
            stddev: variance.sqrt(),
            min,
            max,
            count,
        })
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    pub fn has_spread(&self) -> bool {
        self.stddev > ZERO_SPREAD
    }
}

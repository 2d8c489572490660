use serde::{Deserialize, Serialize};
use tracing::warn;

/// Ordinal performance band. `L5` is the best outcome, `L1` the worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    L1,
    L2,
    L3,
    L4,
    L5,
}

/// Lower bounds for `L5`, `L4`, `L3`, `L2`; anything below the last bound is `L1`.
const THRESHOLDS: [(f64, Level); 4] = [
    (1.4, Level::L5),
    (1.15, Level::L4),
    (0.9, Level::L3),
    (0.65, Level::L2),
];

impl Level {
    pub const fn ordered() -> [Self; 5] {
        [Self::L1, Self::L2, Self::L3, Self::L4, Self::L5]
    }

    /// Neutral level used whenever an upstream level code cannot be interpreted.
    pub const fn neutral() -> Self {
        Self::L3
    }

    /// Classify a composite score using the fixed threshold table.
    pub fn from_score(score: f64) -> Self {
        THRESHOLDS
            .iter()
            .find(|(bound, _)| score >= *bound)
            .map(|(_, level)| *level)
            .unwrap_or(Self::L1)
    }

    /// Canonical numeric encoding of the level, also the only admissible sub-scores.
    pub const fn canonical_score(self) -> f64 {
        match self {
            Self::L1 => 0.5,
            Self::L2 => 0.8,
            Self::L3 => 1.0,
            Self::L4 => 1.2,
            Self::L5 => 1.5,
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::L1 => "L1",
            Self::L2 => "L2",
            Self::L3 => "L3",
            Self::L4 => "L4",
            Self::L5 => "L5",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "L1" => Some(Self::L1),
            "L2" => Some(Self::L2),
            "L3" => Some(Self::L3),
            "L4" => Some(Self::L4),
            "L5" => Some(Self::L5),
            _ => None,
        }
    }

    /// Parse a level code coming from data that cannot guarantee exhaustiveness.
    ///
    /// Unknown codes fall back to [`Level::neutral`] instead of failing, so legacy rows with
    /// stray values still display and still default their sub-scores to `1.0`.
    pub fn from_code_or_neutral(code: &str) -> Self {
        Self::from_code(code).unwrap_or_else(|| {
            warn!(code, "unrecognized level code, defaulting to L3");
            Self::neutral()
        })
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::L5 => "Excellent",
            Self::L4 => "Good",
            Self::L3 => "Satisfactory",
            Self::L2 => "Needs Improvement",
            Self::L1 => "Unsatisfactory",
        }
    }

    pub const fn color(self) -> &'static str {
        match self {
            Self::L5 => "#10B981",
            Self::L4 => "#3B82F6",
            Self::L3 => "#F59E0B",
            Self::L2 => "#F97316",
            Self::L1 => "#EF4444",
        }
    }

    pub const fn comment(self) -> &'static str {
        match self {
            Self::L5 => "Outstanding performance, a benchmark for the team",
            Self::L4 => "Strong performance, exceeds expectations",
            Self::L3 => "Meets requirements",
            Self::L2 => "Room for improvement, needs more effort",
            Self::L1 => "Below expectations, improvement urgently needed",
        }
    }
}

/// Canonical score for a raw level code, using the neutral default for unknown codes.
pub fn level_code_to_score(code: &str) -> f64 {
    Level::from_code_or_neutral(code).canonical_score()
}

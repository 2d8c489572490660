use super::super::scoring::{round2, MAX_SCORE, MIN_SCORE};
use super::config::NormalizationMethod;
use super::stats::{Distribution, ZERO_SPREAD};

/// Manager spread under which the blended method mixes in the min-max mapping.
const BLEND_STDDEV_CUTOFF: f64 = 0.1;
const BLEND_ZSCORE_WEIGHT: f64 = 0.7;

/// `company.mean + (raw - manager.mean) * company.stddev / manager.stddev`.
///
/// A manager without spread leaves the raw score unchanged.
pub fn z_score(raw: f64, manager: &Distribution, company: &Distribution) -> f64 {
    if !manager.has_spread() {
        return raw;
    }
    company.mean + (raw - manager.mean) * (company.stddev / manager.stddev)
}

/// Position within the manager's range, projected onto the company range.
pub fn min_max(raw: f64, manager: &Distribution, company: &Distribution) -> f64 {
    let range = manager.range();
    if range <= ZERO_SPREAD {
        return raw;
    }
    company.min + (raw - manager.min) / range * company.range()
}

/// Calibrated score rounded to two decimals and held inside the score range.
pub fn normalize(
    raw: f64,
    manager: &Distribution,
    company: &Distribution,
    method: NormalizationMethod,
) -> f64 {
    let value = match method {
        NormalizationMethod::ZScore => z_score(raw, manager, company),
        NormalizationMethod::MinMax => min_max(raw, manager, company),
        NormalizationMethod::Blended => {
            let z = z_score(raw, manager, company);
            if manager.stddev < BLEND_STDDEV_CUTOFF {
                z * BLEND_ZSCORE_WEIGHT + min_max(raw, manager, company) * (1.0 - BLEND_ZSCORE_WEIGHT)
            } else {
                z
            }
        }
    };

    round2(value).clamp(MIN_SCORE, MAX_SCORE)
}

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::domain::Period;

/// A recompute for the period is already running.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("a recompute for {period} is already in progress; retry once it completes")]
pub struct RecomputeConflict {
    pub period: Period,
}

/// Single-writer registry: at most one recompute per period at a time.
///
/// Each running entry carries a rerun flag so that triggers arriving mid-recompute can be
/// folded into one more pass by the running worker instead of racing it.
#[derive(Debug, Default)]
pub struct PeriodLocks {
    running: Mutex<HashMap<Period, bool>>,
}

impl PeriodLocks {
    pub fn try_begin(&self, period: &Period) -> Result<PeriodGuard<'_>, RecomputeConflict> {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if running.contains_key(period) {
            return Err(RecomputeConflict {
                period: period.clone(),
            });
        }
        running.insert(period.clone(), false);

        Ok(PeriodGuard {
            locks: self,
            period: period.clone(),
            released: false,
        })
    }

    /// Ask the running recompute for `period` to make one more pass.
    ///
    /// Returns `false` when nothing is running, in which case the caller should start its own.
    pub fn request_rerun(&self, period: &Period) -> bool {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        match running.get_mut(period) {
            Some(rerun) => {
                *rerun = true;
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self, period: &Period) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(period)
    }

    fn release(&self, period: &Period) {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(period);
    }
}

/// Held for the duration of a recompute. Dropping it releases the period.
#[derive(Debug)]
pub struct PeriodGuard<'a> {
    locks: &'a PeriodLocks,
    period: Period,
    released: bool,
}

impl PeriodGuard<'_> {
    /// Release the period unless a rerun was requested; returns `true` when another pass is due.
    pub fn finish_or_rerun(&mut self) -> bool {
        let mut running = self
            .locks
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match running.get_mut(&self.period) {
            Some(rerun) if *rerun => {
                *rerun = false;
                true
            }
            _ => {
                running.remove(&self.period);
                self.released = true;
                false
            }
        }
    }
}

impl Drop for PeriodGuard<'_> {
    fn drop(&mut self) {
        if !self.released {
            self.locks.release(&self.period);
        }
    }
}

//! Close and reopen eligibility rules.
//!
//! These functions are the single definition of which transitions are legal.
//! The lifecycle service runs them under the tenant lock before writing, and the
//! view projector runs them on a read snapshot to decide which actions to offer.

use periodlock_shared::config::PeriodsConfig;

use super::error::PeriodError;
use super::gate::OperationsStart;
use super::types::{ClosedPeriods, YearMonth};

/// Tunable bounds for period transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodPolicy {
    /// Earliest year accepted.
    pub min_year: i32,
    /// Latest year accepted.
    pub max_year: i32,
    /// December reopen ignores January of the next year, leaving a gap.
    pub allow_year_end_reopen_gap: bool,
}

impl Default for PeriodPolicy {
    fn default() -> Self {
        Self::from(&PeriodsConfig::default())
    }
}

impl From<&PeriodsConfig> for PeriodPolicy {
    fn from(config: &PeriodsConfig) -> Self {
        Self {
            min_year: config.min_year,
            max_year: config.max_year,
            allow_year_end_reopen_gap: config.allow_year_end_reopen_gap,
        }
    }
}

impl PeriodPolicy {
    /// Checks that the month is 1-12 and the year within bounds.
    ///
    /// # Errors
    ///
    /// Returns `PeriodError::InvalidMonthOrYear` otherwise.
    pub fn validate(&self, period: YearMonth) -> Result<(), PeriodError> {
        if period.has_valid_month() && (self.min_year..=self.max_year).contains(&period.year) {
            Ok(())
        } else {
            Err(PeriodError::InvalidMonthOrYear {
                year: period.year,
                month: period.month,
                min_year: self.min_year,
                max_year: self.max_year,
            })
        }
    }
}

/// Decides whether `period` may be closed given the current closures.
///
/// Checks run in a fixed order so the reported kind is deterministic:
/// bounds, already closed, before start, then the predecessor.
pub fn check_close(
    policy: &PeriodPolicy,
    start: &OperationsStart,
    closed: &ClosedPeriods,
    period: YearMonth,
) -> Result<(), PeriodError> {
    policy.validate(period)?;

    if closed.is_closed(period) {
        return Err(PeriodError::PeriodAlreadyClosed(period));
    }

    if start.is_before_start(period) {
        return Err(PeriodError::PeriodBeforeOperationsStart {
            period,
            start: start.month(),
        });
    }

    if start.is_start_month(period) {
        return Ok(());
    }

    // January looks up December of the prior year in the same snapshot.
    let predecessor = period.predecessor();
    if closed.is_closed(predecessor) {
        Ok(())
    } else {
        Err(PeriodError::PredecessorNotClosed {
            period,
            predecessor,
        })
    }
}

/// Decides whether `period` may be reopened given the current closures.
pub fn check_reopen(
    policy: &PeriodPolicy,
    closed: &ClosedPeriods,
    period: YearMonth,
) -> Result<(), PeriodError> {
    policy.validate(period)?;

    if !closed.is_closed(period) {
        return Err(PeriodError::PeriodAlreadyOpen(period));
    }

    if period.month == 12 && policy.allow_year_end_reopen_gap {
        return Ok(());
    }

    let successor = period.successor();
    if closed.is_closed(successor) {
        Err(PeriodError::SuccessorStillClosed { period, successor })
    } else {
        Ok(())
    }
}

//! Period lifecycle error types.

use periodlock_shared::types::TenantId;
use thiserror::Error;

use super::types::YearMonth;

/// Errors returned by period lifecycle operations.
///
/// Every variant is a per-request condition; none is fatal and none is retried
/// automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodError {
    /// Month outside 1-12 or year outside the configured bounds.
    #[error("Invalid period {year}-{month}: month must be 1-12 and year within {min_year}-{max_year}")]
    InvalidMonthOrYear {
        /// Requested year.
        year: i32,
        /// Requested month.
        month: u32,
        /// Lowest accepted year.
        min_year: i32,
        /// Highest accepted year.
        max_year: i32,
    },

    /// Tenant record or its operations start date is missing.
    #[error("Tenant not found or has no operations start date: {0}")]
    TenantNotFound(TenantId),

    /// Close requested for a period that is already closed.
    #[error("Period {0} is already closed")]
    PeriodAlreadyClosed(YearMonth),

    /// Reopen requested for a period that is not closed.
    #[error("Period {0} is not closed")]
    PeriodAlreadyOpen(YearMonth),

    /// Period lies before the tenant's operations start.
    #[error("Period {period} is before the operations start {start}")]
    PeriodBeforeOperationsStart {
        /// Requested period.
        period: YearMonth,
        /// Tenant's first operating month.
        start: YearMonth,
    },

    /// The previous period is still open.
    #[error("Cannot close {period}: previous period {predecessor} must be closed first")]
    PredecessorNotClosed {
        /// Requested period.
        period: YearMonth,
        /// Period that must be closed first.
        predecessor: YearMonth,
    },

    /// The following period is still closed.
    #[error("Cannot reopen {period}: following period {successor} is still closed")]
    SuccessorStillClosed {
        /// Requested period.
        period: YearMonth,
        /// Period that must be reopened first.
        successor: YearMonth,
    },

    /// The ledger backend failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl PeriodError {
    /// Returns the stable error identifier for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidMonthOrYear { .. } => "invalid_month_or_year",
            Self::TenantNotFound(_) => "tenant_not_found",
            Self::PeriodAlreadyClosed(_) => "period_already_closed",
            Self::PeriodAlreadyOpen(_) => "period_already_open",
            Self::PeriodBeforeOperationsStart { .. } => "period_before_operations_start",
            Self::PredecessorNotClosed { .. } => "predecessor_not_closed",
            Self::SuccessorStillClosed { .. } => "successor_still_closed",
            Self::Storage(_) => "storage_error",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidMonthOrYear { .. } => 400,
            Self::TenantNotFound(_) => 404,
            Self::PeriodAlreadyClosed(_)
            | Self::PeriodAlreadyOpen(_)
            | Self::PredecessorNotClosed { .. }
            | Self::SuccessorStillClosed { .. } => 409,
            Self::PeriodBeforeOperationsStart { .. } => 422,
            Self::Storage(_) => 500,
        }
    }
}

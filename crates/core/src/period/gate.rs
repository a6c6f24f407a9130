//! Tenant operations-start boundary.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use periodlock_shared::types::TenantId;

use super::error::PeriodError;
use super::types::YearMonth;

/// Read access to company records owned outside this crate.
#[async_trait]
pub trait CompanyDirectory: Send + Sync {
    /// Returns the date the tenant started operating, or `None` if the tenant
    /// or its start date is unknown.
    async fn operations_start(&self, tenant: TenantId) -> Result<Option<NaiveDate>, PeriodError>;
}

/// A tenant's resolved operations-start month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationsStart {
    start: YearMonth,
}

impl OperationsStart {
    /// Wraps an already normalized start month.
    #[must_use]
    pub const fn new(start: YearMonth) -> Self {
        Self { start }
    }

    /// Normalizes a start date to its month.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self::new(YearMonth::from_date(date))
    }

    /// The first month the tenant may close.
    #[must_use]
    pub const fn month(&self) -> YearMonth {
        self.start
    }

    /// True if `period` lies strictly before the start month.
    #[must_use]
    pub fn is_before_start(&self, period: YearMonth) -> bool {
        period < self.start
    }

    /// True if `period` is exactly the start month.
    #[must_use]
    pub fn is_start_month(&self, period: YearMonth) -> bool {
        period == self.start
    }
}

/// Resolves operations-start boundaries through the company directory.
#[derive(Clone)]
pub struct OperationsStartGate {
    directory: Arc<dyn CompanyDirectory>,
}

impl std::fmt::Debug for OperationsStartGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationsStartGate").finish_non_exhaustive()
    }
}

impl OperationsStartGate {
    /// Creates a gate backed by the given directory.
    #[must_use]
    pub fn new(directory: Arc<dyn CompanyDirectory>) -> Self {
        Self { directory }
    }

    /// Resolves the tenant's start month.
    ///
    /// # Errors
    ///
    /// Returns `PeriodError::TenantNotFound` if the tenant or its start date is missing.
    pub async fn start_of(&self, tenant: TenantId) -> Result<OperationsStart, PeriodError> {
        self.directory
            .operations_start(tenant)
            .await?
            .map(OperationsStart::from_date)
            .ok_or(PeriodError::TenantNotFound(tenant))
    }

    /// True if `(year, month)` lies before the tenant's start month.
    pub async fn is_before_start(
        &self,
        tenant: TenantId,
        year: i32,
        month: u32,
    ) -> Result<bool, PeriodError> {
        Ok(self
            .start_of(tenant)
            .await?
            .is_before_start(YearMonth::new(year, month)))
    }

    /// True if `(year, month)` is exactly the tenant's start month.
    pub async fn is_start_month(
        &self,
        tenant: TenantId,
        year: i32,
        month: u32,
    ) -> Result<bool, PeriodError> {
        Ok(self
            .start_of(tenant)
            .await?
            .is_start_month(YearMonth::new(year, month)))
    }
}

//! Persisted record of closed periods.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use periodlock_shared::types::{PeriodEventId, TenantId, UserId};

use super::error::PeriodError;
use super::types::{ClosedPeriods, ClosureRecord, PeriodAction, PeriodEvent, YearMonth};

/// Check run against the tenant's closures before a write is applied.
pub type TransitionGuard = dyn Fn(&ClosedPeriods) -> Result<(), PeriodError> + Send + Sync;

/// The write a transition performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodChange {
    /// Mark the period closed with this audit.
    Close(ClosureRecord),
    /// Mark the period open again.
    Reopen {
        /// User reopening the period.
        reopened_by: UserId,
        /// When it was reopened.
        reopened_at: DateTime<Utc>,
    },
}

impl PeriodChange {
    /// The audit action this change records.
    #[must_use]
    pub const fn action(&self) -> PeriodAction {
        match self {
            Self::Close(_) => PeriodAction::Closed,
            Self::Reopen { .. } => PeriodAction::Reopened,
        }
    }

    /// Who made the change.
    #[must_use]
    pub const fn actor(&self) -> UserId {
        match self {
            Self::Close(record) => record.closed_by,
            Self::Reopen { reopened_by, .. } => *reopened_by,
        }
    }

    /// When the change happened.
    #[must_use]
    pub const fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            Self::Close(record) => record.closed_at,
            Self::Reopen { reopened_at, .. } => *reopened_at,
        }
    }
}

/// A change targeted at one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodCommand {
    /// Target period.
    pub period: YearMonth,
    /// What to write.
    pub change: PeriodChange,
}

impl PeriodCommand {
    /// Builds the audit event recorded alongside the write.
    #[must_use]
    pub fn event(&self, tenant: TenantId) -> PeriodEvent {
        PeriodEvent {
            id: PeriodEventId::new(),
            tenant_id: tenant,
            period: self.period,
            action: self.change.action(),
            actor: self.change.actor(),
            occurred_at: self.change.occurred_at(),
        }
    }
}

/// Storage of closed periods per tenant.
///
/// Open is the absence of a record. Writes go only through [`PeriodLedger::apply`],
/// which must hold an exclusive per-tenant lock (or equivalent transaction) from
/// reading the closures through running the guard to committing the write, so a
/// concurrent transition for the same tenant is re-checked against the result.
/// A failed or abandoned `apply` leaves no partial write.
#[async_trait]
pub trait PeriodLedger: Send + Sync {
    /// Returns every closed period of the tenant, across all years.
    async fn closed_periods(&self, tenant: TenantId) -> Result<ClosedPeriods, PeriodError>;

    /// Returns true if the period is closed.
    async fn is_closed(&self, tenant: TenantId, period: YearMonth) -> Result<bool, PeriodError> {
        Ok(self.closed_periods(tenant).await?.is_closed(period))
    }

    /// Atomically checks `guard` against the current closures and, if it passes,
    /// applies the command and appends its audit event.
    async fn apply(
        &self,
        tenant: TenantId,
        command: PeriodCommand,
        guard: &TransitionGuard,
    ) -> Result<(), PeriodError>;

    /// Returns the audit events of one period, oldest first.
    async fn history(&self, tenant: TenantId, period: YearMonth)
    -> Result<Vec<PeriodEvent>, PeriodError>;
}

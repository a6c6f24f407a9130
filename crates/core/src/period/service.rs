//! Period lifecycle service: the only way periods change state.

use std::sync::Arc;

use chrono::Utc;
use periodlock_shared::types::{TenantId, UserId};
use tracing::{info, warn};

use super::error::PeriodError;
use super::gate::{CompanyDirectory, OperationsStart, OperationsStartGate};
use super::ledger::{PeriodChange, PeriodCommand, PeriodLedger};
use super::projector::PeriodViewProjector;
use super::rules::{self, PeriodPolicy};
use super::types::{ClosedPeriods, ClosureRecord, PeriodEvent, PeriodView, YearMonth, YearView};

/// Applies close and reopen transitions under the ordering rules.
///
/// Every transition is checked inside [`PeriodLedger::apply`], so the check and
/// the write are atomic per tenant. Operations for different tenants never
/// contend.
#[derive(Clone)]
pub struct PeriodLifecycleService {
    ledger: Arc<dyn PeriodLedger>,
    gate: OperationsStartGate,
    projector: PeriodViewProjector,
    policy: PeriodPolicy,
}

impl std::fmt::Debug for PeriodLifecycleService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeriodLifecycleService")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl PeriodLifecycleService {
    /// Creates a service over a ledger and a company directory.
    #[must_use]
    pub fn new(
        ledger: Arc<dyn PeriodLedger>,
        directory: Arc<dyn CompanyDirectory>,
        policy: PeriodPolicy,
    ) -> Self {
        let gate = OperationsStartGate::new(directory);
        let projector = PeriodViewProjector::new(Arc::clone(&ledger), gate.clone(), policy);
        Self {
            ledger,
            gate,
            projector,
            policy,
        }
    }

    /// The policy in force.
    #[must_use]
    pub const fn policy(&self) -> &PeriodPolicy {
        &self.policy
    }

    /// Closes `(year, month)` for the tenant.
    ///
    /// # Errors
    ///
    /// - `InvalidMonthOrYear` if the period is out of range
    /// - `TenantNotFound` if the tenant has no operations start
    /// - `PeriodAlreadyClosed` if the period is closed
    /// - `PeriodBeforeOperationsStart` if the period precedes the start month
    /// - `PredecessorNotClosed` if the previous period is open
    pub async fn close(
        &self,
        tenant: TenantId,
        actor: UserId,
        year: i32,
        month: u32,
    ) -> Result<PeriodView, PeriodError> {
        let period = YearMonth::new(year, month);
        self.policy.validate(period)?;
        let start = self.gate.start_of(tenant).await?;

        let policy = self.policy;
        let guard =
            move |closed: &ClosedPeriods| rules::check_close(&policy, &start, closed, period);
        let command = PeriodCommand {
            period,
            change: PeriodChange::Close(ClosureRecord {
                closed_by: actor,
                closed_at: Utc::now(),
            }),
        };

        match self.ledger.apply(tenant, command, &guard).await {
            Ok(()) => {
                info!(tenant_id = %tenant, period = %period, actor = %actor, "Period closed");
                self.view_of(tenant, &start, period).await
            }
            Err(e) => {
                warn!(tenant_id = %tenant, period = %period, error = %e, "Period close rejected");
                Err(e)
            }
        }
    }

    /// Reopens `(year, month)` for the tenant.
    ///
    /// # Errors
    ///
    /// - `InvalidMonthOrYear` if the period is out of range
    /// - `TenantNotFound` if the tenant has no operations start
    /// - `PeriodAlreadyOpen` if the period is not closed
    /// - `SuccessorStillClosed` if the following period is closed
    pub async fn reopen(
        &self,
        tenant: TenantId,
        actor: UserId,
        year: i32,
        month: u32,
    ) -> Result<PeriodView, PeriodError> {
        let period = YearMonth::new(year, month);
        self.policy.validate(period)?;
        let start = self.gate.start_of(tenant).await?;

        let policy = self.policy;
        let guard = move |closed: &ClosedPeriods| rules::check_reopen(&policy, closed, period);
        let command = PeriodCommand {
            period,
            change: PeriodChange::Reopen {
                reopened_by: actor,
                reopened_at: Utc::now(),
            },
        };

        match self.ledger.apply(tenant, command, &guard).await {
            Ok(()) => {
                info!(tenant_id = %tenant, period = %period, actor = %actor, "Period reopened");
                self.view_of(tenant, &start, period).await
            }
            Err(e) => {
                warn!(tenant_id = %tenant, period = %period, error = %e, "Period reopen rejected");
                Err(e)
            }
        }
    }

    /// Lists every closed period of the tenant in chronological order.
    pub async fn closed_periods(&self, tenant: TenantId) -> Result<Vec<YearMonth>, PeriodError> {
        self.gate.start_of(tenant).await?;
        let closed = self.ledger.closed_periods(tenant).await?;
        Ok(closed.periods().collect())
    }

    /// Returns true if the period is closed.
    pub async fn is_closed(
        &self,
        tenant: TenantId,
        year: i32,
        month: u32,
    ) -> Result<bool, PeriodError> {
        let period = YearMonth::new(year, month);
        self.policy.validate(period)?;
        self.gate.start_of(tenant).await?;
        self.ledger.is_closed(tenant, period).await
    }

    /// Twelve-month view of `year` with the actions currently allowed.
    pub async fn year_view(&self, tenant: TenantId, year: i32) -> Result<YearView, PeriodError> {
        self.projector.list_year_view(tenant, year).await
    }

    /// Audit history of one period, oldest first.
    pub async fn history(
        &self,
        tenant: TenantId,
        year: i32,
        month: u32,
    ) -> Result<Vec<PeriodEvent>, PeriodError> {
        let period = YearMonth::new(year, month);
        self.policy.validate(period)?;
        self.gate.start_of(tenant).await?;
        self.ledger.history(tenant, period).await
    }

    /// The tenant's operations-start month.
    pub async fn operations_start(&self, tenant: TenantId) -> Result<YearMonth, PeriodError> {
        Ok(self.gate.start_of(tenant).await?.month())
    }

    async fn view_of(
        &self,
        tenant: TenantId,
        start: &OperationsStart,
        period: YearMonth,
    ) -> Result<PeriodView, PeriodError> {
        let closed = self.ledger.closed_periods(tenant).await?;
        Ok(self.projector.project_period(start, &closed, period))
    }
}

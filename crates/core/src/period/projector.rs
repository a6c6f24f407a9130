//! Read-only twelve-month view of a fiscal year.

use std::sync::Arc;

use periodlock_shared::types::TenantId;

use super::error::PeriodError;
use super::gate::{OperationsStart, OperationsStartGate};
use super::ledger::PeriodLedger;
use super::rules::{self, PeriodPolicy};
use super::types::{ClosedPeriods, PeriodView, YearMonth, YearView};

/// Projects period state and allowed actions without touching the ledger.
#[derive(Clone)]
pub struct PeriodViewProjector {
    ledger: Arc<dyn PeriodLedger>,
    gate: OperationsStartGate,
    policy: PeriodPolicy,
}

impl std::fmt::Debug for PeriodViewProjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeriodViewProjector")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl PeriodViewProjector {
    /// Creates a projector reading from `ledger`.
    #[must_use]
    pub fn new(
        ledger: Arc<dyn PeriodLedger>,
        gate: OperationsStartGate,
        policy: PeriodPolicy,
    ) -> Self {
        Self {
            ledger,
            gate,
            policy,
        }
    }

    /// Lists the twelve months of `year` for a tenant, January first.
    pub async fn list_year_view(
        &self,
        tenant: TenantId,
        year: i32,
    ) -> Result<YearView, PeriodError> {
        self.policy.validate(YearMonth::new(year, 1))?;
        let start = self.gate.start_of(tenant).await?;
        let closed = self.ledger.closed_periods(tenant).await?;
        Ok(self.project_year(&start, &closed, year))
    }

    /// Builds the year view from a snapshot.
    #[must_use]
    pub fn project_year(
        &self,
        start: &OperationsStart,
        closed: &ClosedPeriods,
        year: i32,
    ) -> YearView {
        let periods = closed
            .year_slots(year)
            .iter()
            .map(|(period, _)| self.project_period(start, closed, period))
            .collect();

        YearView {
            year,
            operations_start: start.month(),
            periods,
        }
    }

    /// Builds the view of a single period from a snapshot.
    #[must_use]
    pub fn project_period(
        &self,
        start: &OperationsStart,
        closed: &ClosedPeriods,
        period: YearMonth,
    ) -> PeriodView {
        PeriodView {
            year: period.year,
            month: period.month,
            state: closed.state(period),
            can_close: rules::check_close(&self.policy, start, closed, period).is_ok(),
            can_reopen: rules::check_reopen(&self.policy, closed, period).is_ok(),
        }
    }
}

//! PostgreSQL-backed period ledger.
//!
//! Transitions run in one database transaction that first locks the company
//! row with `SELECT ... FOR UPDATE`. Concurrent transitions for the same
//! company queue behind that lock and re-read the closures it protected, so
//! the guard always sees committed state. Other companies are unaffected.

use async_trait::async_trait;
use chrono::Utc;
use periodlock_core::period::{
    ClosedPeriods, ClosureRecord, PeriodChange, PeriodCommand, PeriodError, PeriodEvent,
    PeriodLedger, TransitionGuard, YearMonth,
};
use periodlock_shared::types::{PeriodEventId, TenantId, UserId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

use crate::entities::{
    accounting_periods, companies, period_events,
    sea_orm_active_enums::{PeriodAction, PeriodStatus},
};

/// Period ledger stored in `accounting_periods` and `period_events`.
#[derive(Debug, Clone)]
pub struct PeriodRepository {
    db: DatabaseConnection,
}

impl PeriodRepository {
    /// Creates a new period repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn load_closed<C: ConnectionTrait>(
        conn: &C,
        tenant: TenantId,
    ) -> Result<ClosedPeriods, PeriodError> {
        let rows = accounting_periods::Entity::find()
            .filter(accounting_periods::Column::CompanyId.eq(tenant.into_inner()))
            .filter(accounting_periods::Column::Status.eq(PeriodStatus::Closed))
            .order_by_asc(accounting_periods::Column::Year)
            .order_by_asc(accounting_periods::Column::Month)
            .all(conn)
            .await
            .map_err(storage)?;

        rows.into_iter().map(closure_of).collect()
    }

    async fn find_row<C: ConnectionTrait>(
        conn: &C,
        tenant: TenantId,
        period: YearMonth,
    ) -> Result<Option<accounting_periods::Model>, PeriodError> {
        accounting_periods::Entity::find()
            .filter(accounting_periods::Column::CompanyId.eq(tenant.into_inner()))
            .filter(accounting_periods::Column::Year.eq(period.year))
            .filter(accounting_periods::Column::Month.eq(month_column(period)?))
            .one(conn)
            .await
            .map_err(storage)
    }
}

#[async_trait]
impl PeriodLedger for PeriodRepository {
    async fn closed_periods(&self, tenant: TenantId) -> Result<ClosedPeriods, PeriodError> {
        Self::load_closed(&self.db, tenant).await
    }

    async fn apply(
        &self,
        tenant: TenantId,
        command: PeriodCommand,
        guard: &TransitionGuard,
    ) -> Result<(), PeriodError> {
        let period = command.period;
        let month = month_column(period)?;
        let txn = self.db.begin().await.map_err(storage)?;

        // Dropping `txn` on an early return rolls back and releases the lock.
        let company = companies::Entity::find_by_id(tenant.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(storage)?;
        if company.is_none() {
            return Err(PeriodError::TenantNotFound(tenant));
        }
        debug!(tenant_id = %tenant, period = %period, "Company row locked");

        let closed = Self::load_closed(&txn, tenant).await?;
        guard(&closed)?;

        let now = Utc::now().into();
        let existing = Self::find_row(&txn, tenant, period).await?;

        match (command.change, existing) {
            (PeriodChange::Close(record), Some(row)) => {
                let mut active: accounting_periods::ActiveModel = row.into();
                active.status = Set(PeriodStatus::Closed);
                active.closed_by = Set(Some(record.closed_by.into_inner()));
                active.closed_at = Set(Some(record.closed_at.into()));
                active.updated_at = Set(now);
                active.update(&txn).await.map_err(storage)?;
            }
            (PeriodChange::Close(record), None) => {
                accounting_periods::ActiveModel {
                    id: Set(Uuid::now_v7()),
                    company_id: Set(tenant.into_inner()),
                    year: Set(period.year),
                    month: Set(month),
                    status: Set(PeriodStatus::Closed),
                    closed_by: Set(Some(record.closed_by.into_inner())),
                    closed_at: Set(Some(record.closed_at.into())),
                    reopened_by: Set(None),
                    reopened_at: Set(None),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(&txn)
                .await
                .map_err(storage)?;
            }
            (
                PeriodChange::Reopen {
                    reopened_by,
                    reopened_at,
                },
                Some(row),
            ) => {
                // closed_by/closed_at stay as the last close audit.
                let mut active: accounting_periods::ActiveModel = row.into();
                active.status = Set(PeriodStatus::Open);
                active.reopened_by = Set(Some(reopened_by.into_inner()));
                active.reopened_at = Set(Some(reopened_at.into()));
                active.updated_at = Set(now);
                active.update(&txn).await.map_err(storage)?;
            }
            (PeriodChange::Reopen { .. }, None) => {
                return Err(PeriodError::Storage(format!(
                    "no stored row for {period} of tenant {tenant}"
                )));
            }
        }

        let event = command.event(tenant);
        period_events::ActiveModel {
            id: Set(event.id.into_inner()),
            company_id: Set(tenant.into_inner()),
            year: Set(period.year),
            month: Set(month),
            action: Set(PeriodAction::from(event.action)),
            actor_id: Set(event.actor.into_inner()),
            occurred_at: Set(event.occurred_at.into()),
        }
        .insert(&txn)
        .await
        .map_err(storage)?;

        txn.commit().await.map_err(storage)?;
        debug!(
            tenant_id = %tenant,
            period = %period,
            action = event.action.as_str(),
            "Period transition committed"
        );

        Ok(())
    }

    async fn history(
        &self,
        tenant: TenantId,
        period: YearMonth,
    ) -> Result<Vec<PeriodEvent>, PeriodError> {
        let rows = period_events::Entity::find()
            .filter(period_events::Column::CompanyId.eq(tenant.into_inner()))
            .filter(period_events::Column::Year.eq(period.year))
            .filter(period_events::Column::Month.eq(month_column(period)?))
            .order_by_asc(period_events::Column::OccurredAt)
            .order_by_asc(period_events::Column::Id)
            .all(&self.db)
            .await
            .map_err(storage)?;

        Ok(rows
            .into_iter()
            .map(|row| PeriodEvent {
                id: PeriodEventId::from_uuid(row.id),
                tenant_id: tenant,
                period,
                action: row.action.into(),
                actor: UserId::from_uuid(row.actor_id),
                occurred_at: row.occurred_at.with_timezone(&Utc),
            })
            .collect())
    }
}

fn storage(err: DbErr) -> PeriodError {
    PeriodError::Storage(err.to_string())
}

fn month_column(period: YearMonth) -> Result<i32, PeriodError> {
    i32::try_from(period.month)
        .map_err(|_| PeriodError::Storage(format!("month out of range: {}", period.month)))
}

fn closure_of(row: accounting_periods::Model) -> Result<(YearMonth, ClosureRecord), PeriodError> {
    let month = u32::try_from(row.month)
        .map_err(|_| PeriodError::Storage(format!("stored month out of range: {}", row.month)))?;
    let period = YearMonth::new(row.year, month);

    match (row.closed_by, row.closed_at) {
        (Some(closed_by), Some(closed_at)) => Ok((
            period,
            ClosureRecord {
                closed_by: UserId::from_uuid(closed_by),
                closed_at: closed_at.with_timezone(&Utc),
            },
        )),
        _ => Err(PeriodError::Storage(format!(
            "closed period {period} has no closure audit"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn row(month: i32, closed_by: Option<Uuid>) -> accounting_periods::Model {
        let now: DateTime<Utc> = Utc::now();
        accounting_periods::Model {
            id: Uuid::now_v7(),
            company_id: Uuid::now_v7(),
            year: 2025,
            month,
            status: PeriodStatus::Closed,
            closed_by,
            closed_at: closed_by.map(|_| now.into()),
            reopened_by: None,
            reopened_at: None,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[test]
    fn test_closure_of_reads_audit() {
        let actor = Uuid::now_v7();
        let (period, record) = closure_of(row(3, Some(actor))).unwrap();

        assert_eq!(period, YearMonth::new(2025, 3));
        assert_eq!(record.closed_by, UserId::from_uuid(actor));
    }

    #[test]
    fn test_closure_without_audit_is_storage_error() {
        assert!(matches!(
            closure_of(row(3, None)),
            Err(PeriodError::Storage(_))
        ));
    }

    #[test]
    fn test_negative_month_is_storage_error() {
        assert!(matches!(
            closure_of(row(-1, Some(Uuid::now_v7()))),
            Err(PeriodError::Storage(_))
        ));
    }
}

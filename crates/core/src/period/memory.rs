//! In-memory ledger and company directory for tests and embedded use.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use periodlock_shared::types::TenantId;
use tokio::sync::RwLock;

use super::error::PeriodError;
use super::gate::CompanyDirectory;
use super::ledger::{PeriodChange, PeriodCommand, PeriodLedger, TransitionGuard};
use super::types::{ClosedPeriods, ClosureRecord, PeriodEvent, YearMonth};

#[derive(Debug, Default)]
struct TenantBook {
    closed: ClosedPeriods,
    events: Vec<PeriodEvent>,
}

impl TenantBook {
    fn mark_closed(&mut self, period: YearMonth, record: ClosureRecord) {
        self.closed.mark_closed(period, record);
    }

    fn mark_open(&mut self, period: YearMonth) {
        self.closed.mark_open(period);
    }
}

/// Period ledger held in process memory.
///
/// Each tenant has its own lock; tenants never wait on each other.
#[derive(Debug, Default)]
pub struct InMemoryPeriodLedger {
    tenants: DashMap<TenantId, Arc<RwLock<TenantBook>>>,
}

impl InMemoryPeriodLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn existing(&self, tenant: TenantId) -> Option<Arc<RwLock<TenantBook>>> {
        self.tenants.get(&tenant).map(|entry| Arc::clone(entry.value()))
    }

    fn book(&self, tenant: TenantId) -> Arc<RwLock<TenantBook>> {
        Arc::clone(self.tenants.entry(tenant).or_default().value())
    }
}

#[async_trait]
impl PeriodLedger for InMemoryPeriodLedger {
    async fn closed_periods(&self, tenant: TenantId) -> Result<ClosedPeriods, PeriodError> {
        match self.existing(tenant) {
            Some(book) => Ok(book.read().await.closed.clone()),
            None => Ok(ClosedPeriods::new()),
        }
    }

    async fn apply(
        &self,
        tenant: TenantId,
        command: PeriodCommand,
        guard: &TransitionGuard,
    ) -> Result<(), PeriodError> {
        let entry = self.book(tenant);
        let mut book = entry.write().await;

        guard(&book.closed)?;

        match command.change {
            PeriodChange::Close(record) => book.mark_closed(command.period, record),
            PeriodChange::Reopen { .. } => book.mark_open(command.period),
        }
        book.events.push(command.event(tenant));
        Ok(())
    }

    async fn history(
        &self,
        tenant: TenantId,
        period: YearMonth,
    ) -> Result<Vec<PeriodEvent>, PeriodError> {
        let Some(book) = self.existing(tenant) else {
            return Ok(Vec::new());
        };
        let book = book.read().await;
        Ok(book
            .events
            .iter()
            .filter(|event| event.period == period)
            .cloned()
            .collect())
    }
}

/// Company directory held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryCompanyDirectory {
    starts: DashMap<TenantId, NaiveDate>,
}

impl InMemoryCompanyDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records (or replaces) a tenant's operations start date.
    pub fn register(&self, tenant: TenantId, operations_start: NaiveDate) {
        self.starts.insert(tenant, operations_start);
    }

    /// Forgets a tenant.
    pub fn remove(&self, tenant: TenantId) {
        self.starts.remove(&tenant);
    }
}

#[async_trait]
impl CompanyDirectory for InMemoryCompanyDirectory {
    async fn operations_start(&self, tenant: TenantId) -> Result<Option<NaiveDate>, PeriodError> {
        Ok(self.starts.get(&tenant).map(|entry| *entry.value()))
    }
}

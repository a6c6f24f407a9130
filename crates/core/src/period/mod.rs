//! Accounting period lifecycle.
//!
//! This module implements monthly period closing:
//! - Period identity and state (`YearMonth`, `ClosedPeriods`)
//! - Operations-start boundary per tenant
//! - Close and reopen ordering rules
//! - Ledger seam with an atomic check-then-write
//! - Lifecycle service and read-only year view

pub mod error;
pub mod gate;
pub mod ledger;
pub mod memory;
pub mod projector;
pub mod rules;
pub mod service;
pub mod types;

#[cfg(test)]
mod rules_props;

pub use error::PeriodError;
pub use gate::{CompanyDirectory, OperationsStart, OperationsStartGate};
pub use ledger::{PeriodChange, PeriodCommand, PeriodLedger, TransitionGuard};
pub use memory::{InMemoryCompanyDirectory, InMemoryPeriodLedger};
pub use projector::PeriodViewProjector;
pub use rules::{PeriodPolicy, check_close, check_reopen};
pub use service::PeriodLifecycleService;
pub use types::{
    ClosedPeriods, ClosureRecord, FiscalYearSlots, MONTHS_PER_YEAR, PeriodAction, PeriodEvent,
    PeriodState, PeriodStatus, PeriodView, YearMonth, YearView,
};

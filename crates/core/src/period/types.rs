//! Accounting period domain types.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use periodlock_shared::types::{PeriodEventId, TenantId, UserId};
use serde::{Deserialize, Serialize};

/// Number of monthly periods in a fiscal year.
pub const MONTHS_PER_YEAR: usize = 12;

/// A calendar month identifying an accounting period.
///
/// Ordering is chronological: `year` is compared before `month`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    /// Calendar year.
    pub year: i32,
    /// Month number, 1-12 for a valid period.
    pub month: u32,
}

impl YearMonth {
    /// Creates a year-month without validating the month.
    #[must_use]
    pub const fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// Normalizes a calendar date to the month containing it.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }

    /// Returns true if the month is within 1-12.
    #[must_use]
    pub const fn has_valid_month(self) -> bool {
        self.month >= 1 && self.month <= 12
    }

    /// The immediately preceding period; January wraps to December of the prior year.
    #[must_use]
    pub const fn predecessor(self) -> Self {
        if self.month <= 1 {
            Self::new(self.year - 1, 12)
        } else {
            Self::new(self.year, self.month - 1)
        }
    }

    /// The immediately following period; December wraps to January of the next year.
    #[must_use]
    pub const fn successor(self) -> Self {
        if self.month >= 12 {
            Self::new(self.year + 1, 1)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Audit data recorded when a period is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureRecord {
    /// User who closed the period.
    pub closed_by: UserId,
    /// When the period was closed.
    pub closed_at: DateTime<Utc>,
}

/// Flat status of a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodStatus {
    /// Period accepts postings.
    Open,
    /// Period is locked against postings.
    Closed,
}

impl PeriodStatus {
    /// Returns the lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

/// State of one period slot, carrying the closure audit when closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PeriodState {
    /// No closure on record.
    #[default]
    Open,
    /// Closed, with who and when.
    Closed(ClosureRecord),
}

impl PeriodState {
    /// Returns the flat status.
    #[must_use]
    pub const fn status(&self) -> PeriodStatus {
        match self {
            Self::Open => PeriodStatus::Open,
            Self::Closed(_) => PeriodStatus::Closed,
        }
    }

    /// Returns true if the slot is closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed(_))
    }

    /// Returns the closure audit, if closed.
    #[must_use]
    pub const fn closure(&self) -> Option<&ClosureRecord> {
        match self {
            Self::Open => None,
            Self::Closed(record) => Some(record),
        }
    }
}

/// Snapshot of every closed period of one tenant.
///
/// Open periods are absent. Lookups work across fiscal-year boundaries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClosedPeriods {
    closed: BTreeMap<YearMonth, ClosureRecord>,
}

impl ClosedPeriods {
    /// Creates an empty snapshot (every period open).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the period is closed.
    #[must_use]
    pub fn is_closed(&self, period: YearMonth) -> bool {
        self.closed.contains_key(&period)
    }

    /// Returns the closure audit for a period.
    #[must_use]
    pub fn closure(&self, period: YearMonth) -> Option<&ClosureRecord> {
        self.closed.get(&period)
    }

    /// Returns the state of a period.
    #[must_use]
    pub fn state(&self, period: YearMonth) -> PeriodState {
        self.closure(period)
            .map_or(PeriodState::Open, |record| PeriodState::Closed(*record))
    }

    /// Closed periods in chronological order.
    pub fn periods(&self) -> impl Iterator<Item = YearMonth> + '_ {
        self.closed.keys().copied()
    }

    /// Number of closed periods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.closed.len()
    }

    /// Returns true if nothing is closed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.closed.is_empty()
    }

    /// Returns true if the closed periods form an unbroken run beginning at `start`.
    #[must_use]
    pub fn is_contiguous_from(&self, start: YearMonth) -> bool {
        let mut expected = start;
        for period in self.periods() {
            if period != expected {
                return false;
            }
            expected = period.successor();
        }
        true
    }

    /// Materializes the twelve slots of one fiscal year.
    #[must_use]
    pub fn year_slots(&self, year: i32) -> FiscalYearSlots {
        let mut slots = [PeriodState::Open; MONTHS_PER_YEAR];
        let range = YearMonth::new(year, 1)..=YearMonth::new(year, 12);
        for (period, record) in self.closed.range(range) {
            if let Some(slot) = month_index(period.month).and_then(|i| slots.get_mut(i)) {
                *slot = PeriodState::Closed(*record);
            }
        }
        FiscalYearSlots { year, slots }
    }

    pub(crate) fn mark_closed(&mut self, period: YearMonth, record: ClosureRecord) {
        self.closed.insert(period, record);
    }

    pub(crate) fn mark_open(&mut self, period: YearMonth) {
        self.closed.remove(&period);
    }
}

impl FromIterator<(YearMonth, ClosureRecord)> for ClosedPeriods {
    fn from_iter<I: IntoIterator<Item = (YearMonth, ClosureRecord)>>(iter: I) -> Self {
        Self {
            closed: iter.into_iter().collect(),
        }
    }
}

fn month_index(month: u32) -> Option<usize> {
    usize::try_from(month).ok()?.checked_sub(1)
}

/// The twelve monthly slots of a fiscal year, addressable by month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiscalYearSlots {
    year: i32,
    slots: [PeriodState; MONTHS_PER_YEAR],
}

impl FiscalYearSlots {
    /// The fiscal year these slots belong to.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Returns the slot for a month (1-12).
    #[must_use]
    pub fn get(&self, month: u32) -> Option<&PeriodState> {
        month_index(month).and_then(|i| self.slots.get(i))
    }

    /// Iterates slots in month order.
    pub fn iter(&self) -> impl Iterator<Item = (YearMonth, &PeriodState)> + '_ {
        (1u32..)
            .zip(self.slots.iter())
            .map(|(month, state)| (YearMonth::new(self.year, month), state))
    }
}

/// A period as presented to callers, with the actions the rules currently allow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodView {
    /// Calendar year.
    pub year: i32,
    /// Month number (1-12).
    pub month: u32,
    /// Status plus closure audit when closed.
    #[serde(flatten)]
    pub state: PeriodState,
    /// Whether a close request would currently be accepted.
    pub can_close: bool,
    /// Whether a reopen request would currently be accepted.
    pub can_reopen: bool,
}

impl PeriodView {
    /// The period this view describes.
    #[must_use]
    pub const fn period(&self) -> YearMonth {
        YearMonth::new(self.year, self.month)
    }
}

/// Twelve-month projection of one fiscal year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearView {
    /// Fiscal year.
    pub year: i32,
    /// The tenant's operations-start month.
    pub operations_start: YearMonth,
    /// One entry per month, January first.
    pub periods: Vec<PeriodView>,
}

/// Kind of transition recorded in the audit history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodAction {
    /// Period went from open to closed.
    Closed,
    /// Period went from closed to open.
    Reopened,
}

impl PeriodAction {
    /// Returns the lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Reopened => "reopened",
        }
    }
}

/// One applied transition, kept for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodEvent {
    /// Event identifier.
    pub id: PeriodEventId,
    /// Tenant the period belongs to.
    pub tenant_id: TenantId,
    /// The period that changed.
    pub period: YearMonth,
    /// What happened.
    pub action: PeriodAction,
    /// Who did it.
    pub actor: UserId,
    /// When it happened.
    pub occurred_at: DateTime<Utc>,
}

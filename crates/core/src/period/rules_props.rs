//! Property-based tests for period close and reopen rules.
//!
//! - Close eligibility matches a direct statement of the ordering rule
//! - Any sequence of accepted transitions keeps closures contiguous
//! - Rejected transitions never change the closure set

use chrono::Utc;
use periodlock_shared::types::UserId;
use proptest::prelude::*;

use super::error::PeriodError;
use super::gate::OperationsStart;
use super::rules::{PeriodPolicy, check_close, check_reopen};
use super::types::{ClosedPeriods, ClosureRecord, YearMonth};

/// Moves `months` away from `from`, forwards or backwards.
fn shift(from: YearMonth, months: i32) -> YearMonth {
    let index = from.year * 12 + i32::try_from(from.month).unwrap() - 1 + months;
    YearMonth::new(index.div_euclid(12), u32::try_from(index.rem_euclid(12)).unwrap() + 1)
}

fn record() -> ClosureRecord {
    ClosureRecord {
        closed_by: UserId::new(),
        closed_at: Utc::now(),
    }
}

fn year_end_gap_policy() -> PeriodPolicy {
    PeriodPolicy {
        allow_year_end_reopen_gap: true,
        ..PeriodPolicy::default()
    }
}

/// Strategy to generate an operations-start month well inside the year bounds.
fn start_strategy() -> impl Strategy<Value = YearMonth> {
    (2021i32..=2045, 1u32..=12).prop_map(|(year, month)| YearMonth::new(year, month))
}

/// Strategy to generate a transition: `true` closes, `false` reopens, at a month offset.
fn op_strategy() -> impl Strategy<Value = (bool, i32)> {
    (any::<bool>(), -3i32..30)
}

/// Applies a transition the way the service does: check, then write.
fn step(
    policy: &PeriodPolicy,
    start: &OperationsStart,
    closed: &mut ClosedPeriods,
    close: bool,
    period: YearMonth,
) -> Result<(), PeriodError> {
    if close {
        check_close(policy, start, closed, period)?;
        closed.mark_closed(period, record());
    } else {
        check_reopen(policy, closed, period)?;
        closed.mark_open(period);
    }
    Ok(())
}

proptest! {
    /// Closing succeeds exactly when the period is open, not before start, and
    /// either is the start month or follows a closed period.
    #[test]
    fn prop_close_matches_ordering_rule(
        start in start_strategy(),
        closed_offsets in proptest::collection::btree_set(0i32..24, 0..24),
        target_offset in -6i32..30,
    ) {
        let policy = PeriodPolicy::default();
        let gate = OperationsStart::new(start);
        let closed: ClosedPeriods = closed_offsets
            .iter()
            .map(|&offset| (shift(start, offset), record()))
            .collect();
        let target = shift(start, target_offset);

        let expected = !closed.is_closed(target)
            && target >= start
            && (target == start || closed.is_closed(target.predecessor()));

        let result = check_close(&policy, &gate, &closed, target);
        prop_assert_eq!(result.is_ok(), expected, "target {} got {:?}", target, result);
    }

    /// Every reachable state is an unbroken run of closures starting at the
    /// operations-start month, across year boundaries too.
    #[test]
    fn prop_transitions_keep_closures_contiguous(
        start in start_strategy(),
        ops in proptest::collection::vec(op_strategy(), 0..200),
    ) {
        let policy = PeriodPolicy::default();
        let gate = OperationsStart::new(start);
        let mut closed = ClosedPeriods::new();

        for (close, offset) in ops {
            let _ = step(&policy, &gate, &mut closed, close, shift(start, offset));
            prop_assert!(closed.is_contiguous_from(start), "broken run: {:?}", closed);
        }
    }

    /// When the year-end gap is allowed, a gap can only sit at a December.
    #[test]
    fn prop_year_end_gap_policy_gaps_only_at_december(
        start in start_strategy(),
        ops in proptest::collection::vec(op_strategy(), 0..200),
    ) {
        let policy = year_end_gap_policy();
        let gate = OperationsStart::new(start);
        let mut closed = ClosedPeriods::new();

        for (close, offset) in ops {
            let _ = step(&policy, &gate, &mut closed, close, shift(start, offset));
        }

        for period in closed.periods() {
            prop_assert!(period >= start);
            let predecessor = period.predecessor();
            prop_assert!(
                period == start || closed.is_closed(predecessor) || predecessor.month == 12,
                "{} closed without {}",
                period,
                predecessor
            );
        }
    }

    /// A rejected transition leaves the closure set untouched.
    #[test]
    fn prop_rejection_changes_nothing(
        start in start_strategy(),
        ops in proptest::collection::vec(op_strategy(), 0..100),
    ) {
        let policy = PeriodPolicy::default();
        let gate = OperationsStart::new(start);
        let mut closed = ClosedPeriods::new();

        for (close, offset) in ops {
            let before = closed.clone();
            if step(&policy, &gate, &mut closed, close, shift(start, offset)).is_err() {
                prop_assert_eq!(&closed, &before);
            }
        }
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_shift_wraps_years() {
        assert_eq!(shift(YearMonth::new(2024, 11), 2), YearMonth::new(2025, 1));
        assert_eq!(shift(YearMonth::new(2025, 1), -1), YearMonth::new(2024, 12));
        assert_eq!(shift(YearMonth::new(2025, 6), 0), YearMonth::new(2025, 6));
        assert_eq!(shift(YearMonth::new(2025, 6), 24), YearMonth::new(2027, 6));
    }
}

//! Corrects a schedule extraction's date against the date taken from the
//! disambiguation answer. When the two disagree the disambiguation date
//! wins; times of day are kept as extracted.

use chrono::{Days, NaiveDate};
use tracing::debug;

use crate::error::ReconcileError;
use crate::schedule::ScheduleRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// Start date already matched the reference date.
    Unchanged,
    /// Start and end were moved; `from` is the start date the oracle gave.
    Corrected { from: NaiveDate },
}

/// Moves `record` onto `reference` if its start date differs.
///
/// The new start keeps its time of day. The new end keeps its time of day
/// and lands `duration` days after `reference`, or further if the extracted
/// end was already more days after the extracted start (an overnight event
/// with `duration` 0 stays overnight). Both fields are computed before either
/// is written, so on error the record is untouched.
pub fn reconcile(
    record: &mut ScheduleRecord,
    reference: NaiveDate,
) -> Result<Reconciliation, ReconcileError> {
    let original = record.start.date();
    if original == reference {
        debug!(%reference, "schedule date agrees with reference");
        return Ok(Reconciliation::Unchanged);
    }

    let span = (record.end.date() - original)
        .num_days()
        .max(i64::from(record.duration))
        .unsigned_abs();
    let end_date = reference
        .checked_add_days(Days::new(span))
        .ok_or(ReconcileError::DateOutOfRange {
            date: reference,
            days: span,
        })?;
    let start = reference.and_time(record.start.time());
    let end = end_date.and_time(record.end.time());

    debug!(from = %original, to = %reference, "schedule date corrected");
    record.start = start;
    record.end = end;
    Ok(Reconciliation::Corrected { from: original })
}

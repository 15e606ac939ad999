use chrono_tz::Tz;
use tracing::{debug, info, instrument};

use crate::error::PipelineError;
use crate::extract::{ExtractedDateTime, extract_datetime};
use crate::gateway::OracleGateway;
use crate::oracle::Oracle;
use crate::output::TaggedOutput;
use crate::reconcile::reconcile;
use crate::time::{DEFAULT_TIMEZONE, ReferenceMoment};
use crate::todo::TodoRecord;

/// Branch chosen from the disambiguation answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Todo,
    /// Carries the date/time found in the answer forward to reconciliation.
    Schedule(ExtractedDateTime),
}

/// Picks a branch from the oracle's restatement of the message's date.
///
/// An answer that echoes `now` verbatim (ignoring surrounding whitespace),
/// or contains no parseable timestamp, means the message names no date.
pub fn route(answer: &str, now: ReferenceMoment) -> Route {
    let answer = answer.trim();
    if answer == now.to_string() {
        return Route::Todo;
    }
    match extract_datetime(answer) {
        Some(reference) => Route::Schedule(reference),
        None => Route::Todo,
    }
}

/// Turns one free-form message into a [`TaggedOutput`].
///
/// Holds nothing mutable, so one pipeline can serve concurrent requests.
#[derive(Debug, Clone)]
pub struct Pipeline<O> {
    gateway: OracleGateway<O>,
    timezone: Tz,
}

impl<O: Oracle> Pipeline<O> {
    pub fn new(oracle: O) -> Self {
        Self::with_timezone(oracle, DEFAULT_TIMEZONE)
    }

    pub fn with_timezone(oracle: O, timezone: Tz) -> Self {
        Self {
            gateway: OracleGateway::new(oracle),
            timezone,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn gateway(&self) -> &OracleGateway<O> {
        &self.gateway
    }

    /// Classifies `text` against the current time in the pipeline's zone.
    pub async fn process(&self, text: &str) -> Result<TaggedOutput, PipelineError> {
        self.process_at(text, ReferenceMoment::now(self.timezone)).await
    }

    /// Classifies `text` with every relative date resolved against `now`.
    #[instrument(skip(self, now), fields(now = %now))]
    pub async fn process_at(
        &self,
        text: &str,
        now: ReferenceMoment,
    ) -> Result<TaggedOutput, PipelineError> {
        let answer = self.gateway.disambiguate(text, now).await?;

        match route(&answer, now) {
            Route::Todo => {
                let classification = self.gateway.classify(text).await?;
                info!(category = %classification.category, confidence = classification.confidence, "todo");
                Ok(TodoRecord::classified(text, classification).into())
            }
            Route::Schedule(reference) => {
                let mut record = self.gateway.extract_schedule(text, now).await?;
                let outcome = reconcile(&mut record, reference.date())?;
                debug!(?outcome, "reconciled");
                info!(start = %record.dtstart(), title = %record.title, "schedule");
                Ok(record.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> ReferenceMoment {
        let local = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        ReferenceMoment::from_local(DEFAULT_TIMEZONE, local).unwrap()
    }

    #[test]
    fn test_route_sentinel_echo_is_todo() {
        assert_eq!(route("2024-05-01 09:30:00+09:00", now()), Route::Todo);
        assert_eq!(route("2024-05-01 09:30:00+09:00\n", now()), Route::Todo);
    }

    #[test]
    fn test_route_unparseable_answer_is_todo() {
        assert_eq!(route("日時を特定できません", now()), Route::Todo);
        assert_eq!(route("2024-06-31 00:00:00+09:00", now()), Route::Todo);
    }

    #[test]
    fn test_route_distinct_date_is_schedule() {
        match route("2024-06-09 00:00:00+09:00", now()) {
            Route::Schedule(reference) => {
                assert_eq!(reference.date(), NaiveDate::from_ymd_opt(2024, 6, 9).unwrap());
            }
            Route::Todo => panic!("expected schedule route"),
        }
    }

    #[test]
    fn test_route_same_day_different_time_is_schedule() {
        // Only an exact echo is the sentinel; "today at 18:00" is a date.
        assert!(matches!(
            route("2024-05-01 18:00:00+09:00", now()),
            Route::Schedule(_)
        ));
    }
}

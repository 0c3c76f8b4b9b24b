//! Daily quest completion and streak bookkeeping.

use sqlx::types::time::{Date, OffsetDateTime};
use thiserror::Error;
use tracing::{info, warn};

use crate::store::{LearningStore, NewCompletion, StoreError, StreakRecord, UserId};

/// Source of "now". Calendar days are UTC.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;

    fn today(&self) -> Date {
        self.now().date()
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

#[derive(Debug, Error)]
pub enum RecordError {
    /// The completion row was not written; nothing else happened.
    #[error("{0}")]
    Insert(String),

    /// The completion was stored but the streak could not be updated.
    #[error("streak update failed: {0}")]
    Streak(StoreError),
}

/// Streak after a completion on `today`, given the stored record (if any).
///
/// Yesterday extends the run, today leaves it alone, and anything else
/// (a longer gap or a date in the future) starts over at 1.
pub fn next_streak(previous: Option<&StreakRecord>, user_id: &UserId, today: Date) -> StreakRecord {
    let current_streak = match previous {
        None => 1,
        Some(record) if Some(record.last_completed_at) == today.previous_day() => {
            record.current_streak.saturating_add(1)
        }
        Some(record) if record.last_completed_at == today => record.current_streak,
        Some(_) => 1,
    };

    StreakRecord {
        user_id: user_id.clone(),
        current_streak,
        last_completed_at: today,
    }
}

/// Store a completion of `quest_id` and advance the user's streak.
///
/// The completion is not rolled back when the streak write fails.
pub async fn record_completion(
    store: &dyn LearningStore,
    clock: &dyn Clock,
    user_id: &UserId,
    quest_id: i64,
) -> Result<StreakRecord, RecordError> {
    let now = clock.now();
    let today = now.date();

    store
        .insert_completion(&NewCompletion {
            user_id: user_id.clone(),
            quest_id,
            completed_at: now,
            completed_date: today,
        })
        .await
        .map_err(|e| RecordError::Insert(e.to_string()))?;

    let streak = store.advance_streak(user_id, today).await.map_err(|e| {
        warn!(user_id = %user_id, quest_id, error = %e, "completion stored but streak update failed");
        RecordError::Streak(e)
    })?;

    info!(
        user_id = %user_id,
        quest_id,
        streak = streak.current_streak,
        "quest completed"
    );

    Ok(streak)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn record(streak: i32, last: Date) -> StreakRecord {
        StreakRecord {
            user_id: UserId::new("kid"),
            current_streak: streak,
            last_completed_at: last,
        }
    }

    #[test]
    fn first_completion_starts_at_one() {
        let next = next_streak(None, &UserId::new("kid"), date!(2025 - 03 - 10));
        assert_eq!(next.current_streak, 1);
        assert_eq!(next.last_completed_at, date!(2025 - 03 - 10));
    }

    #[test]
    fn yesterday_extends_the_run() {
        let prev = record(4, date!(2025 - 03 - 09));
        let next = next_streak(Some(&prev), &prev.user_id, date!(2025 - 03 - 10));
        assert_eq!(next.current_streak, 5);
        assert_eq!(next.last_completed_at, date!(2025 - 03 - 10));
    }

    #[test]
    fn same_day_is_idempotent() {
        let prev = record(4, date!(2025 - 03 - 10));
        let next = next_streak(Some(&prev), &prev.user_id, date!(2025 - 03 - 10));
        assert_eq!(next, prev);
    }

    #[test]
    fn gap_resets() {
        let prev = record(9, date!(2025 - 03 - 07));
        let next = next_streak(Some(&prev), &prev.user_id, date!(2025 - 03 - 10));
        assert_eq!(next.current_streak, 1);
    }

    #[test]
    fn future_date_resets() {
        let prev = record(3, date!(2025 - 03 - 12));
        let next = next_streak(Some(&prev), &prev.user_id, date!(2025 - 03 - 10));
        assert_eq!(next.current_streak, 1);
        assert_eq!(next.last_completed_at, date!(2025 - 03 - 10));
    }

    #[test]
    fn crosses_month_and_year_boundaries() {
        let prev = record(2, date!(2024 - 12 - 31));
        let next = next_streak(Some(&prev), &prev.user_id, date!(2025 - 01 - 01));
        assert_eq!(next.current_streak, 3);

        let prev = record(2, date!(2024 - 02 - 29));
        let next = next_streak(Some(&prev), &prev.user_id, date!(2024 - 03 - 01));
        assert_eq!(next.current_streak, 3);
    }

    #[test]
    fn consecutive_days_count_up() {
        let user = UserId::new("kid");
        let mut day = date!(2025 - 05 - 01);
        let mut current = None;
        for n in 1..=40 {
            let next = next_streak(current.as_ref(), &user, day);
            assert_eq!(next.current_streak, n);
            current = Some(next);
            day = day.next_day().expect("in range");
        }
    }
}

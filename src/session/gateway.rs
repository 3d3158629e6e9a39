//! Storage seam used by the session engine and by history recording

use anyhow::Result;
use chrono::NaiveDate;

use super::SessionRecord;
use crate::history::SessionSummary;
use crate::workouts::FeedbackRating;

/// Durable store for session resume, history and feedback.
///
/// Callers treat every write as best-effort: the engine logs a failed write
/// and carries on with its in-memory state.
pub trait PersistenceGateway {
    /// Saved session for this workout, if any. A record that cannot be decoded is
    /// discarded and reported as absent; `Err` means the store itself failed.
    fn load_session(&self, workout_id: &str) -> Result<Option<SessionRecord>>;

    fn save_session(&self, record: &SessionRecord) -> Result<()>;

    fn clear_session(&self, workout_id: &str) -> Result<()>;

    /// Add a finished session to the log for `date`
    fn append_history(&self, date: NaiveDate, summary: &SessionSummary) -> Result<()>;

    /// Latest rating wins per exercise name
    fn record_feedback(&self, exercise: &str, rating: FeedbackRating) -> Result<()>;
}

impl<T: PersistenceGateway + ?Sized> PersistenceGateway for &T {
    fn load_session(&self, workout_id: &str) -> Result<Option<SessionRecord>> {
        (**self).load_session(workout_id)
    }

    fn save_session(&self, record: &SessionRecord) -> Result<()> {
        (**self).save_session(record)
    }

    fn clear_session(&self, workout_id: &str) -> Result<()> {
        (**self).clear_session(workout_id)
    }

    fn append_history(&self, date: NaiveDate, summary: &SessionSummary) -> Result<()> {
        (**self).append_history(date, summary)
    }

    fn record_feedback(&self, exercise: &str, rating: FeedbackRating) -> Result<()> {
        (**self).record_feedback(exercise, rating)
    }
}

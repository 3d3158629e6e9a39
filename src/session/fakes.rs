//! Test doubles for the session collaborators

use std::sync::{Arc, Mutex};

use anyhow::{Result, bail};
use chrono::NaiveDate;

use super::{PersistenceGateway, SessionRecord};
use crate::cue::{AudioCue, Cue};
use crate::history::SessionSummary;
use crate::workouts::FeedbackRating;

/// Remembers every cue played; clones share the log
#[derive(Clone, Default)]
pub struct RecordingCue {
    played: Arc<Mutex<Vec<Cue>>>,
}

impl RecordingCue {
    pub fn played(&self) -> Vec<Cue> {
        self.played.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.played.lock().unwrap().clear();
    }
}

impl AudioCue for RecordingCue {
    fn play(&self, cue: Cue) {
        self.played.lock().unwrap().push(cue);
    }
}

/// Store whose every call fails
pub struct FailingStore;

impl PersistenceGateway for FailingStore {
    fn load_session(&self, _workout_id: &str) -> Result<Option<SessionRecord>> {
        bail!("store offline")
    }

    fn save_session(&self, _record: &SessionRecord) -> Result<()> {
        bail!("store offline")
    }

    fn clear_session(&self, _workout_id: &str) -> Result<()> {
        bail!("store offline")
    }

    fn append_history(&self, _date: NaiveDate, _summary: &SessionSummary) -> Result<()> {
        bail!("store offline")
    }

    fn record_feedback(&self, _exercise: &str, _rating: FeedbackRating) -> Result<()> {
        bail!("store offline")
    }
}

/// Delegates to the wrapped store, except that reads fail as if the database were locked
pub struct LockedStore<P>(pub P);

impl<P: PersistenceGateway> PersistenceGateway for LockedStore<P> {
    fn load_session(&self, _workout_id: &str) -> Result<Option<SessionRecord>> {
        bail!("database is locked")
    }

    fn save_session(&self, record: &SessionRecord) -> Result<()> {
        self.0.save_session(record)
    }

    fn clear_session(&self, workout_id: &str) -> Result<()> {
        self.0.clear_session(workout_id)
    }

    fn append_history(&self, date: NaiveDate, summary: &SessionSummary) -> Result<()> {
        self.0.append_history(date, summary)
    }

    fn record_feedback(&self, exercise: &str, rating: FeedbackRating) -> Result<()> {
        self.0.record_feedback(exercise, rating)
    }
}

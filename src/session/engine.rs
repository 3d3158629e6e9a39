//! Workout session engine - drives exercises, sets and rests

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use super::clock::CountdownKey;
use super::{
    PersistenceGateway, Phase, RestDurations, SessionError, SessionRecord, SessionResult,
    SessionState,
};
use crate::cue::{AudioCue, Cue};
use crate::workouts::{Exercise, FeedbackRating, Workout};

/// State machine for one run-through of a workout.
///
/// All controls and ticks go through `&mut self`, so transitions never
/// interleave. Every mutation is written to the store; the finishing
/// operation deletes the record instead and returns the [`SessionResult`].
/// After that the engine ignores all controls.
pub struct SessionEngine<P, A> {
    workout: Workout,
    store: P,
    cue: A,
    rest: RestDurations,
    state: SessionState,
    /// Set on resume so the restored countdown is not overwritten by the initial setup
    suppress_next_setup: bool,
    finished: bool,
}

impl<P: PersistenceGateway, A: AudioCue> SessionEngine<P, A> {
    /// Start or resume a session with the standard rest durations
    pub fn start(workout: Workout, store: P, cue: A) -> Result<Self, SessionError> {
        Self::with_rest(workout, store, cue, RestDurations::default())
    }

    pub fn with_rest(
        workout: Workout,
        store: P,
        cue: A,
        rest: RestDurations,
    ) -> Result<Self, SessionError> {
        if workout.exercises.is_empty() {
            return Err(SessionError::EmptyWorkout(workout.id));
        }

        // a store that cannot be read keeps its record; we only avoid overwriting it on start
        let mut load_failed = false;
        let saved = match store.load_session(&workout.id) {
            Ok(Some(record)) if record.fits(&workout) => Some(record),
            Ok(Some(record)) => {
                debug!(
                    "Saved session for '{}' does not fit workout '{}', starting fresh",
                    record.workout_id, workout.id
                );
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to load session for '{}', starting fresh: {:#}", workout.id, e);
                load_failed = true;
                None
            }
        };

        let mut engine = Self {
            workout,
            store,
            cue,
            rest,
            state: SessionState::fresh(),
            suppress_next_setup: false,
            finished: false,
        };

        if let Some(record) = saved {
            engine.restore(record);
        }
        engine.setup_exercise();
        if !load_failed {
            engine.persist();
        }

        info!(
            "Session '{}' at exercise {}/{}, set {}, {:?}",
            engine.workout.id,
            engine.state.current_exercise_index + 1,
            engine.workout.exercises.len(),
            engine.state.current_set,
            engine.state.phase
        );
        Ok(engine)
    }

    /// Drop any saved progress for `workout` and start from the first exercise
    pub fn restart(workout: Workout, store: P, cue: A, rest: RestDurations) -> Result<Self, SessionError> {
        if let Err(e) = store.clear_session(&workout.id) {
            warn!("Failed to clear session for '{}': {:#}", workout.id, e);
        }
        Self::with_rest(workout, store, cue, rest)
    }

    fn restore(&mut self, record: SessionRecord) {
        let exercise = &self.workout.exercises[record.current_exercise_index];
        let countdown = record.phase == Phase::Resting || exercise.is_timed();

        self.state.current_exercise_index = record.current_exercise_index;
        self.state.current_set = record.current_set;
        self.state.phase = record.phase;
        self.state.time_left = record.time_left;
        self.state.completed = record.completed_exercises.into_iter().collect();
        self.state.is_playing = countdown && record.time_left > 0;
        self.suppress_next_setup = true;

        debug!("Resumed session '{}'", self.workout.id);
    }

    // ---- observers ----

    pub fn workout(&self) -> &Workout {
        &self.workout
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn current_exercise(&self) -> &Exercise {
        &self.workout.exercises[self.state.current_exercise_index]
    }

    pub fn next_exercise(&self) -> Option<&Exercise> {
        self.workout.exercises.get(self.state.current_exercise_index + 1)
    }

    pub fn exercise_index(&self) -> usize {
        self.state.current_exercise_index
    }

    pub fn current_set(&self) -> u32 {
        self.state.current_set
    }

    pub fn total_sets(&self) -> u32 {
        self.current_exercise().total_sets()
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn time_left(&self) -> u32 {
        self.state.time_left
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    pub fn feedback(&self) -> &BTreeMap<String, FeedbackRating> {
        &self.state.feedback
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// More sets of the current exercise remain
    pub fn is_set_rest(&self) -> bool {
        self.state.current_set < self.total_sets()
    }

    /// Length of the rest that the current rest phase started with
    pub fn rest_duration(&self) -> u32 {
        if self.is_set_rest() {
            self.rest.between_sets
        } else {
            self.rest.between_exercises
        }
    }

    /// Whether the current phase has a countdown at all
    pub fn has_countdown(&self) -> bool {
        match self.state.phase {
            Phase::Resting => true,
            Phase::Exercising => self.current_exercise().is_timed(),
        }
    }

    /// Identifies the countdown that is ticking right now, None when nothing ticks
    pub fn countdown_key(&self) -> Option<CountdownKey> {
        (!self.finished && self.state.is_playing && self.has_countdown()).then_some((
            self.state.current_exercise_index,
            self.state.current_set,
            self.state.phase,
        ))
    }

    /// Feedback is taken during the rest after the final set of an exercise
    pub fn accepts_feedback(&self) -> bool {
        !self.finished && self.state.phase == Phase::Resting && !self.is_set_rest()
    }

    /// Snapshot in persisted form
    pub fn record(&self) -> SessionRecord {
        SessionRecord {
            workout_id: self.workout.id.clone(),
            current_exercise_index: self.state.current_exercise_index,
            current_set: self.state.current_set,
            phase: self.state.phase,
            time_left: self.state.time_left,
            completed_exercises: self.state.completed.iter().copied().collect(),
        }
    }

    // ---- controls ----

    /// One second of wall-clock time
    pub fn tick(&mut self) -> Option<SessionResult> {
        self.elapse(1)
    }

    /// Several seconds at once: clamps at zero and transitions once
    pub fn elapse(&mut self, secs: u32) -> Option<SessionResult> {
        if self.finished || !self.state.is_playing || secs == 0 || !self.has_countdown() {
            return None;
        }

        self.state.time_left = self.state.time_left.saturating_sub(secs);
        if self.state.time_left > 0 {
            self.persist();
            return None;
        }

        match self.state.phase {
            Phase::Exercising => self.finish_set(true),
            Phase::Resting => self.advance_past_rest(),
        }
    }

    /// Returns the new playing flag
    pub fn toggle_play_pause(&mut self) -> bool {
        if self.finished {
            return false;
        }
        self.state.is_playing = !self.state.is_playing;
        self.persist();
        self.state.is_playing
    }

    /// "Done" - the set counts as completed. During rest, skips the rest.
    pub fn complete_current_set(&mut self) -> Option<SessionResult> {
        if self.finished {
            return None;
        }
        match self.state.phase {
            Phase::Exercising => self.finish_set(true),
            Phase::Resting => self.advance_past_rest(),
        }
    }

    /// Move on without counting the set. During rest, skips the rest.
    pub fn skip_current(&mut self) -> Option<SessionResult> {
        if self.finished {
            return None;
        }
        match self.state.phase {
            Phase::Exercising => self.finish_set(false),
            Phase::Resting => self.advance_past_rest(),
        }
    }

    /// Back to the previous exercise; returns false at the first one
    pub fn go_to_previous(&mut self) -> bool {
        if self.finished || self.state.current_exercise_index == 0 {
            return false;
        }
        self.state.current_exercise_index -= 1;
        self.state.current_set = 1;
        self.state.phase = Phase::Exercising;
        self.setup_exercise();
        self.persist();
        true
    }

    /// Rate the exercise just finished. Ignored outside the post-exercise rest.
    pub fn submit_feedback(&mut self, rating: FeedbackRating) -> bool {
        if !self.accepts_feedback() {
            debug!("Feedback {:?} ignored outside exercise rest", rating);
            return false;
        }

        let name = self.current_exercise().name.clone();
        if let Err(e) = self.store.record_feedback(&name, rating) {
            warn!("Failed to store feedback for '{}': {:#}", name, e);
        }
        self.state.feedback.insert(name, rating);
        true
    }

    pub fn force_finish(&mut self) -> Option<SessionResult> {
        if self.finished {
            return None;
        }
        self.finish()
    }

    // ---- transitions ----

    fn finish_set(&mut self, succeeded: bool) -> Option<SessionResult> {
        self.state.is_playing = false;
        self.cue.play(Cue::Complete);

        if succeeded {
            self.state.completed.insert(self.state.current_exercise_index);
        }

        if self.is_set_rest() {
            self.enter_rest(self.rest.between_sets);
        } else if self.state.current_exercise_index + 1 >= self.workout.exercises.len() {
            return self.finish();
        } else {
            self.enter_rest(self.rest.between_exercises);
        }

        self.persist();
        None
    }

    fn enter_rest(&mut self, secs: u32) {
        self.state.phase = Phase::Resting;
        self.state.time_left = secs;
        self.state.is_playing = true;
        self.cue.play(Cue::Rest);
    }

    fn advance_past_rest(&mut self) -> Option<SessionResult> {
        self.state.is_playing = false;

        if self.is_set_rest() {
            self.state.current_set += 1;
        } else if self.state.current_exercise_index + 1 < self.workout.exercises.len() {
            self.state.current_exercise_index += 1;
            self.state.current_set = 1;
        } else {
            // only reachable from a resumed rest after the final set
            return self.finish();
        }

        self.state.phase = Phase::Exercising;
        self.setup_exercise();
        self.persist();
        None
    }

    fn setup_exercise(&mut self) {
        if std::mem::take(&mut self.suppress_next_setup) {
            return;
        }
        if self.state.phase != Phase::Exercising {
            return;
        }

        self.cue.play(Cue::Start);
        let exercise = self.current_exercise();
        let (duration, timed) = (exercise.duration_secs(), exercise.is_timed());
        self.state.time_left = duration;
        self.state.is_playing = timed;
    }

    fn finish(&mut self) -> Option<SessionResult> {
        self.state.is_playing = false;
        self.finished = true;

        if let Err(e) = self.store.clear_session(&self.workout.id) {
            warn!("Failed to clear session for '{}': {:#}", self.workout.id, e);
        }

        let total = self.workout.exercises.len();
        let completed_exercises: Vec<Exercise> = self
            .state
            .completed
            .iter()
            .map(|i| self.workout.exercises[*i].clone())
            .collect();
        let completed = completed_exercises.len();

        info!(
            "Session '{}' finished: {}/{} completed",
            self.workout.id, completed, total
        );

        Some(SessionResult {
            completed,
            skipped: total - completed,
            total,
            completed_exercises,
        })
    }

    fn persist(&self) {
        if self.finished {
            return;
        }
        if let Err(e) = self.store.save_session(&self.record()) {
            warn!("Failed to save session for '{}': {:#}", self.workout.id, e);
        }
    }
}

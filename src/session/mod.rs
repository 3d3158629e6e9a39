//! Session module - guided workout player state machine
//!
//! Exercise -> rest -> next set or exercise, with pause/resume and
//! recovery of an interrupted session from the store.

pub mod clock;
pub mod engine;
pub mod gateway;
pub mod runner;

#[cfg(test)]
pub(crate) mod fakes;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::workouts::{Exercise, FeedbackRating, Workout};

pub use clock::TickClock;
pub use engine::SessionEngine;
pub use gateway::PersistenceGateway;
pub use runner::{Control, Outcome};

/// Rest between sets of the same exercise
pub const SET_REST_SECONDS: u32 = 30;
/// Rest after the last set of an exercise
pub const EXERCISE_REST_SECONDS: u32 = 60;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Phase {
    #[serde(rename = "exercise")]
    Exercising,
    #[serde(rename = "rest")]
    Resting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestDurations {
    pub between_sets: u32,
    pub between_exercises: u32,
}

impl Default for RestDurations {
    fn default() -> Self {
        Self {
            between_sets: SET_REST_SECONDS,
            between_exercises: EXERCISE_REST_SECONDS,
        }
    }
}

/// Live state of one run-through of a workout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub current_exercise_index: usize,
    pub current_set: u32,
    pub phase: Phase,
    pub time_left: u32,
    pub is_playing: bool,
    /// Exercises finished on purpose, not skipped
    pub completed: BTreeSet<usize>,
    pub feedback: BTreeMap<String, FeedbackRating>,
}

impl SessionState {
    pub(crate) fn fresh() -> Self {
        Self {
            current_exercise_index: 0,
            current_set: 1,
            phase: Phase::Exercising,
            time_left: 0,
            is_playing: false,
            completed: BTreeSet::new(),
            feedback: BTreeMap::new(),
        }
    }
}

/// Persisted shape of an in-progress session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub workout_id: String,
    pub current_exercise_index: usize,
    pub current_set: u32,
    pub phase: Phase,
    pub time_left: u32,
    pub completed_exercises: Vec<usize>,
}

impl SessionRecord {
    /// Whether this record can be resumed on `workout` as is
    pub fn fits(&self, workout: &Workout) -> bool {
        let Some(exercise) = workout.exercises.get(self.current_exercise_index) else {
            return false;
        };
        self.workout_id == workout.id
            && (1..=exercise.total_sets()).contains(&self.current_set)
            && self
                .completed_exercises
                .iter()
                .all(|i| *i < workout.exercises.len())
    }
}

/// Summary emitted once when a session ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResult {
    pub completed: usize,
    pub skipped: usize,
    pub total: usize,
    pub completed_exercises: Vec<Exercise>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("workout '{0}' has no exercises")]
    EmptyWorkout(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workout() -> Workout {
        Workout {
            id: "w".into(),
            title: "w".into(),
            description: String::new(),
            exercises: vec![
                Exercise::reps("мостик", "", "12", 2),
                Exercise::timed("планка", "", 30, 1),
            ],
        }
    }

    fn record(index: usize, set: u32) -> SessionRecord {
        SessionRecord {
            workout_id: "w".into(),
            current_exercise_index: index,
            current_set: set,
            phase: Phase::Resting,
            time_left: 12,
            completed_exercises: vec![0],
        }
    }

    #[test]
    fn test_record_json_shape() {
        let json = serde_json::to_string(&record(0, 1)).unwrap();
        assert_eq!(
            json,
            r#"{"workoutId":"w","currentExerciseIndex":0,"currentSet":1,"phase":"rest","timeLeft":12,"completedExercises":[0]}"#
        );
    }

    #[test]
    fn test_record_rejects_negative_time() {
        let json = r#"{"workoutId":"w","currentExerciseIndex":0,"currentSet":1,"phase":"rest","timeLeft":-3,"completedExercises":[]}"#;
        assert!(serde_json::from_str::<SessionRecord>(json).is_err());
    }

    #[test]
    fn test_record_fits() {
        let w = workout();
        assert!(record(0, 2).fits(&w));
        assert!(record(1, 1).fits(&w));
        assert!(!record(2, 1).fits(&w)); // index out of range
        assert!(!record(1, 2).fits(&w)); // set out of range
        assert!(!record(0, 0).fits(&w));

        let mut other = record(0, 1);
        other.workout_id = "other".into();
        assert!(!other.fits(&w));

        let mut bad_completed = record(0, 1);
        bad_completed.completed_exercises = vec![5];
        assert!(!bad_completed.fits(&w));
    }
}

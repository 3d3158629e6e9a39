//! History module - finished sessions, streaks and feedback statistics

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use tracing::info;

use crate::session::{PersistenceGateway, SessionResult};
use crate::workouts::{self, FeedbackRating, TODAY_WORKOUT_ID, Workout};

/// Which plan a finished session moves forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramCredit {
    /// A training day for this recovery stage
    Stage(u32),
    /// A training day for whichever recovery stage is current when the session is logged
    CurrentStage,
    /// Next day of the 30-day course
    SpecialDay,
    None,
}

impl ProgramCredit {
    pub fn for_workout(workout: &Workout) -> Self {
        if let Some(stage_id) = workout.stage_id() {
            ProgramCredit::Stage(stage_id)
        } else if workout.id == TODAY_WORKOUT_ID {
            ProgramCredit::CurrentStage
        } else if workouts::is_special_program(&workout.id) {
            ProgramCredit::SpecialDay
        } else {
            ProgramCredit::None
        }
    }
}

/// What gets written to the log when a session finishes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub workout_id: String,
    pub completed: u32,
    pub total: u32,
    /// Names of the exercises actually done
    pub completed_exercises: Vec<String>,
    pub credit: ProgramCredit,
}

impl SessionSummary {
    pub fn new(workout: &Workout, result: &SessionResult) -> Self {
        Self {
            workout_id: workout.id.clone(),
            completed: result.completed as u32,
            total: result.total as u32,
            completed_exercises: result
                .completed_exercises
                .iter()
                .map(|e| e.name.clone())
                .collect(),
            credit: ProgramCredit::for_workout(workout),
        }
    }
}

/// One session inside a day's log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLog {
    pub workout_id: String,
    pub completed: u32,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkoutLog {
    pub date: NaiveDate,
    pub sessions: Vec<SessionLog>,
}

/// Log a finished session. Sessions with nothing completed are not recorded.
pub fn record_finished<P: PersistenceGateway>(
    store: &P,
    workout: &Workout,
    result: &SessionResult,
    date: NaiveDate,
) -> Result<bool> {
    if result.completed == 0 {
        return Ok(false);
    }
    let summary = SessionSummary::new(workout, result);
    store.append_history(date, &summary)?;
    info!(
        "Logged '{}' on {}: {}/{}",
        summary.workout_id, date, summary.completed, summary.total
    );
    Ok(true)
}

/// Training analytics over the day log
pub struct History {
    days: BTreeSet<NaiveDate>,
    logs: Vec<WorkoutLog>,
}

impl History {
    pub fn new(logs: Vec<WorkoutLog>) -> Self {
        let days = logs.iter().map(|l| l.date).collect();
        Self { days, logs }
    }

    pub fn trained_on(&self, date: NaiveDate) -> bool {
        self.days.contains(&date)
    }

    pub fn total_sessions(&self) -> usize {
        self.logs.iter().map(|l| l.sessions.len()).sum()
    }

    pub fn total_days(&self) -> usize {
        self.days.len()
    }

    /// Consecutive training days ending today or yesterday
    pub fn streak(&self, today: NaiveDate) -> u32 {
        let mut day = if self.trained_on(today) {
            today
        } else if self.trained_on(today - Duration::days(1)) {
            today - Duration::days(1)
        } else {
            return 0;
        };

        let mut streak = 0;
        while self.trained_on(day) {
            streak += 1;
            day -= Duration::days(1);
        }
        streak
    }

    /// Activity strip for the last `days` days, oldest first
    pub fn activity(&self, today: NaiveDate, days: u32) -> Vec<(NaiveDate, bool)> {
        (0..days as i64)
            .rev()
            .map(|back| {
                let date = today - Duration::days(back);
                (date, self.trained_on(date))
            })
            .collect()
    }

    /// Share of exercises done over all logged sessions, in percent
    pub fn completion_rate(&self) -> f32 {
        let (done, total) = self
            .logs
            .iter()
            .flat_map(|l| &l.sessions)
            .fold((0u32, 0u32), |(d, t), s| (d + s.completed, t + s.total));
        if total == 0 {
            return 0.0;
        }
        done as f32 / total as f32 * 100.0
    }
}

/// The `n` most done exercises, most first, ties by name
pub fn top_exercises(counts: &BTreeMap<String, u32>, n: usize) -> Vec<(&str, u32)> {
    let mut top: Vec<(&str, u32)> = counts.iter().map(|(name, c)| (name.as_str(), *c)).collect();
    top.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    top.truncate(n);
    top
}

/// Counts of ratings across exercises
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedbackStats {
    pub good: usize,
    pub hard: usize,
}

impl FeedbackStats {
    pub fn from_feedback(feedback: &BTreeMap<String, FeedbackRating>) -> Self {
        feedback.values().fold(Self::default(), |mut stats, rating| {
            match rating {
                FeedbackRating::Good => stats.good += 1,
                FeedbackRating::Hard => stats.hard += 1,
            }
            stats
        })
    }

    pub fn total(&self) -> usize {
        self.good + self.hard
    }

    /// Exercises rated too hard, sorted by name
    pub fn hard_exercises(feedback: &BTreeMap<String, FeedbackRating>) -> Vec<&str> {
        feedback
            .iter()
            .filter(|(_, r)| **r == FeedbackRating::Hard)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::workouts::Exercise;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn log(date: NaiveDate, completed: u32, total: u32) -> WorkoutLog {
        WorkoutLog {
            date,
            sessions: vec![SessionLog { workout_id: "today".into(), completed, total }],
        }
    }

    fn workout(id: &str) -> Workout {
        Workout {
            id: id.into(),
            title: id.into(),
            description: String::new(),
            exercises: vec![
                Exercise::reps("мостик", "", "12", 1),
                Exercise::timed("планка", "", 30, 1),
            ],
        }
    }

    fn result(workout: &Workout, done: &[usize]) -> SessionResult {
        SessionResult {
            completed: done.len(),
            skipped: workout.exercises.len() - done.len(),
            total: workout.exercises.len(),
            completed_exercises: done.iter().map(|i| workout.exercises[*i].clone()).collect(),
        }
    }

    #[test]
    fn test_streak_empty() {
        let history = History::new(vec![]);
        assert_eq!(history.streak(day(10)), 0);
    }

    #[test]
    fn test_streak_ending_today() {
        let history = History::new(vec![log(day(10), 1, 2), log(day(9), 2, 2), log(day(8), 1, 1), log(day(5), 1, 1)]);
        assert_eq!(history.streak(day(10)), 3);
    }

    #[test]
    fn test_streak_ending_yesterday() {
        let history = History::new(vec![log(day(9), 1, 2), log(day(8), 2, 2)]);
        assert_eq!(history.streak(day(10)), 2);
    }

    #[test]
    fn test_streak_broken() {
        let history = History::new(vec![log(day(8), 1, 2), log(day(7), 2, 2)]);
        assert_eq!(history.streak(day(10)), 0);
    }

    #[test]
    fn test_activity_strip() {
        let history = History::new(vec![log(day(10), 1, 2), log(day(8), 1, 2)]);
        let strip = history.activity(day(10), 3);
        assert_eq!(strip, vec![(day(8), true), (day(9), false), (day(10), true)]);
    }

    #[test]
    fn test_completion_rate() {
        let history = History::new(vec![log(day(10), 1, 2), log(day(9), 3, 4)]);
        assert_eq!(history.total_sessions(), 2);
        assert!((history.completion_rate() - 66.66).abs() < 0.1);
        assert_eq!(History::new(vec![]).completion_rate(), 0.0);
    }

    #[test]
    fn test_summary_from_result() {
        let w = workout("stage-3");
        let summary = SessionSummary::new(&w, &result(&w, &[1]));
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.completed_exercises, vec!["планка".to_string()]);
        assert_eq!(summary.credit, ProgramCredit::Stage(3));
    }

    #[test]
    fn test_program_credit_by_workout() {
        assert_eq!(ProgramCredit::for_workout(&workout("today")), ProgramCredit::CurrentStage);
        assert_eq!(ProgramCredit::for_workout(&workout("sp-day-4")), ProgramCredit::SpecialDay);
        assert_eq!(ProgramCredit::for_workout(&workout("symptom-sitting")), ProgramCredit::None);
        assert_eq!(ProgramCredit::for_workout(&workout("stage-x")), ProgramCredit::None);
    }

    #[test]
    fn test_today_workout_advances_current_stage() {
        let db = Database::open_in_memory().unwrap();
        let w = workout("today");

        assert!(record_finished(&db, &w, &result(&w, &[0]), day(1)).unwrap());
        assert_eq!(db.get_program_progress().unwrap().get(&1), Some(&1));

        // stage 1 done: the next daily session counts toward stage 2
        for d in 2..=14 {
            record_finished(&db, &w, &result(&w, &[0]), day(d)).unwrap();
        }
        record_finished(&db, &w, &result(&w, &[1]), day(15)).unwrap();
        let progress = db.get_program_progress().unwrap();
        assert_eq!(progress.get(&1), Some(&14));
        assert_eq!(progress.get(&2), Some(&1));
        assert_eq!(workouts::current_stage(&progress).id, 2);
    }

    #[test]
    fn test_course_day_advances_and_caps() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.get_special_program_day().unwrap(), 1);

        let w = workout("sp-day-1");
        assert!(!record_finished(&db, &w, &result(&w, &[]), day(1)).unwrap());
        assert_eq!(db.get_special_program_day().unwrap(), 1);

        for d in 1..=31 {
            record_finished(&db, &w, &result(&w, &[0]), day(d)).unwrap();
        }
        assert_eq!(db.get_special_program_day().unwrap(), workouts::SPECIAL_PROGRAM_DAYS);
        assert!(db.get_program_progress().unwrap().is_empty());
    }

    #[test]
    fn test_symptom_workout_logged_without_plan_progress() {
        let db = Database::open_in_memory().unwrap();
        let w = workout("symptom-sitting");
        record_finished(&db, &w, &result(&w, &[0, 1]), day(3)).unwrap();

        assert_eq!(db.get_workout_history().unwrap().len(), 1);
        assert!(db.get_program_progress().unwrap().is_empty());
        assert_eq!(db.get_special_program_day().unwrap(), 1);
    }

    #[test]
    fn test_top_exercises() {
        let mut counts = BTreeMap::new();
        counts.insert("мостик".to_string(), 3);
        counts.insert("кошка".to_string(), 5);
        counts.insert("планка".to_string(), 3);
        counts.insert("супермен".to_string(), 1);

        assert_eq!(top_exercises(&counts, 3), vec![("кошка", 5), ("мостик", 3), ("планка", 3)]);
        assert!(top_exercises(&BTreeMap::new(), 3).is_empty());
    }

    #[test]
    fn test_record_finished_skips_empty_sessions() {
        let db = Database::open_in_memory().unwrap();
        let w = workout("today");

        assert!(!record_finished(&db, &w, &result(&w, &[]), day(1)).unwrap());
        assert!(db.get_workout_history().unwrap().is_empty());

        assert!(record_finished(&db, &w, &result(&w, &[0, 1]), day(1)).unwrap());
        let logs = db.get_workout_history().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].sessions[0].completed, 2);
        assert_eq!(db.get_execution_counts().unwrap().get("мостик"), Some(&1));
    }

    #[test]
    fn test_feedback_stats() {
        let mut feedback = BTreeMap::new();
        feedback.insert("мостик".to_string(), FeedbackRating::Good);
        feedback.insert("планка".to_string(), FeedbackRating::Hard);
        feedback.insert("кошка".to_string(), FeedbackRating::Good);

        let stats = FeedbackStats::from_feedback(&feedback);
        assert_eq!(stats, FeedbackStats { good: 2, hard: 1 });
        assert_eq!(stats.total(), 3);
        assert_eq!(FeedbackStats::hard_exercises(&feedback), vec!["планка"]);
    }
}

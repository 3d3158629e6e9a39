//! Runtime configuration from CLI flags, environment and `.env`

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::session::{EXERCISE_REST_SECONDS, RestDurations, SET_REST_SECONDS};
use crate::workouts::{self, Workout};

#[derive(Args, Debug, Clone)]
pub struct Config {
    /// SQLite database file
    #[arg(long, env = "REHAB_DB", default_value = "rehabtrack.db", global = true)]
    pub db: String,

    /// Rest between sets, seconds
    #[arg(long, env = "REHAB_SET_REST", default_value_t = SET_REST_SECONDS, global = true)]
    pub set_rest: u32,

    /// Rest after an exercise, seconds
    #[arg(long, env = "REHAB_EXERCISE_REST", default_value_t = EXERCISE_REST_SECONDS, global = true)]
    pub exercise_rest: u32,

    /// JSON file with extra workouts (same id replaces a built-in one)
    #[arg(long, env = "REHAB_WORKOUTS", global = true)]
    pub workouts: Option<PathBuf>,

    /// No terminal bell
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

impl Config {
    pub fn rest(&self) -> RestDurations {
        RestDurations {
            between_sets: self.set_rest,
            between_exercises: self.exercise_rest,
        }
    }

    /// Built-in workouts, the course workout for `special_day`, plus the ones from `--workouts`
    pub fn catalog(&self, special_day: u32) -> Result<Vec<Workout>> {
        let extra = match &self.workouts {
            Some(path) => Workout::load_file(path)?,
            None => Vec::new(),
        };
        Ok(workouts::catalog(extra, special_day))
    }

    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: Config,
    }

    #[test]
    fn test_defaults() {
        let cli = TestCli::parse_from(["rehabtrack"]);
        assert_eq!(cli.config.rest(), RestDurations::default());
        assert!(cli.config.workouts.is_none());
        assert_eq!(cli.config.log_level(), tracing::Level::WARN);
    }

    #[test]
    fn test_rest_override() {
        let cli = TestCli::parse_from(["rehabtrack", "--set-rest", "15", "--exercise-rest", "45", "-vv"]);
        assert_eq!(cli.config.rest(), RestDurations { between_sets: 15, between_exercises: 45 });
        assert_eq!(cli.config.log_level(), tracing::Level::TRACE);
    }

    #[test]
    fn test_catalog_without_file() {
        let cli = TestCli::parse_from(["rehabtrack"]);
        let catalog = cli.config.catalog(3).unwrap();
        assert!(workouts::find_workout(&catalog, workouts::TODAY_WORKOUT_ID).is_some());
        assert!(workouts::find_workout(&catalog, "sp-day-3").is_some());
    }
}

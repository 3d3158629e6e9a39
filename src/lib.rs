//! rehabtrack - guided back-rehab workouts
//!
//! Exercise, rest, next set: a resumable session player with history and tips.

pub mod config;
pub mod cue;
pub mod db;
pub mod history;
pub mod session;
pub mod tips;
pub mod tui;
pub mod workouts;

pub use db::Database;

//! Async session driver: one-second interval plus a control channel on a single task

use std::io::BufRead;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::debug;

use super::{PersistenceGateway, SessionEngine, SessionResult};
use crate::cue::AudioCue;
use crate::workouts::FeedbackRating;

const TICK: Duration = Duration::from_secs(1);

/// Caller-side controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    TogglePlayPause,
    Complete,
    Skip,
    Previous,
    Feedback(FeedbackRating),
    Finish,
}

impl Control {
    /// Single-letter commands used by the plain-text player
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "p" | " " => Some(Control::TogglePlayPause),
            "d" | "" => Some(Control::Complete),
            "s" | "n" => Some(Control::Skip),
            "b" => Some(Control::Previous),
            "g" => Some(Control::Feedback(FeedbackRating::Good)),
            "h" => Some(Control::Feedback(FeedbackRating::Hard)),
            "f" => Some(Control::Finish),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Finished(SessionResult),
    /// Control channel closed before the end; saved progress stays for resume
    Abandoned,
}

/// Turn input lines into controls until EOF, a `q` line, or the receiver hangs up.
///
/// Blocks on reads, so run it on a plain thread: a finished session must not
/// wait for the next line.
pub fn feed_controls<R, F>(input: R, controls: mpsc::Sender<Control>, mut unknown: F)
where
    R: BufRead,
    F: FnMut(&str),
{
    for line in input.lines() {
        let Ok(line) = line else { break };
        if line.trim() == "q" {
            break;
        }
        match Control::parse(&line) {
            Some(control) => {
                if controls.blocking_send(control).is_err() {
                    break;
                }
            }
            None => unknown(line.trim()),
        }
    }
}

fn apply<P: PersistenceGateway, A: AudioCue>(
    engine: &mut SessionEngine<P, A>,
    control: Control,
) -> Option<SessionResult> {
    match control {
        Control::TogglePlayPause => {
            engine.toggle_play_pause();
            None
        }
        Control::Complete => engine.complete_current_set(),
        Control::Skip => engine.skip_current(),
        Control::Previous => {
            engine.go_to_previous();
            None
        }
        Control::Feedback(rating) => {
            engine.submit_feedback(rating);
            None
        }
        Control::Finish => engine.force_finish(),
    }
}

fn ticker() -> Interval {
    let mut ticker = interval_at(Instant::now() + TICK, TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Run the session until it finishes or `controls` closes.
///
/// Ticks and controls are handled on this one task, so transitions never
/// interleave. `observe` sees the engine after every change.
pub async fn drive<P, A, F>(
    engine: &mut SessionEngine<P, A>,
    mut controls: mpsc::Receiver<Control>,
    mut observe: F,
) -> Outcome
where
    P: PersistenceGateway,
    A: AudioCue,
    F: FnMut(&SessionEngine<P, A>),
{
    if engine.is_finished() {
        return Outcome::Abandoned;
    }

    let mut ticker = ticker();
    let mut countdown = engine.countdown_key();
    observe(engine);

    loop {
        let finished = tokio::select! {
            _ = ticker.tick(), if countdown.is_some() => engine.tick(),
            control = controls.recv() => match control {
                Some(control) => {
                    debug!("Control {:?}", control);
                    apply(engine, control)
                }
                None => {
                    debug!("Controls closed, leaving session '{}'", engine.workout().id);
                    return Outcome::Abandoned;
                }
            },
        };

        if let Some(result) = finished {
            observe(engine);
            return Outcome::Finished(result);
        }

        // a different countdown starts on a full second
        let next = engine.countdown_key();
        if next != countdown {
            ticker.reset();
            countdown = next;
        }
        observe(engine);
    }
}

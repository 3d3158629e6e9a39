//! Whole-second tick source for polling loops (the terminal UI)

use std::time::{Duration, Instant};

use super::Phase;

/// Countdown identity: exercise index, set, phase
pub type CountdownKey = (usize, u32, Phase);

/// Converts wall-clock time into whole seconds for one countdown at a time.
///
/// A change of countdown key (or a pause) drops the partial second collected
/// so far, so a fresh countdown always gets a full first second.
#[derive(Debug, Default)]
pub struct TickClock {
    running: Option<(CountdownKey, Instant)>,
    carry: Duration,
}

impl TickClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds elapsed since the last poll for `key`; 0 when `key` is None or just changed
    pub fn poll(&mut self, now: Instant, key: Option<CountdownKey>) -> u32 {
        let Some(key) = key else {
            self.reset();
            return 0;
        };

        match self.running {
            Some((running_key, last)) if running_key == key => {
                self.carry += now.saturating_duration_since(last);
                self.running = Some((key, now));
                let secs = self.carry.as_secs();
                self.carry -= Duration::from_secs(secs);
                u32::try_from(secs).unwrap_or(u32::MAX)
            }
            _ => {
                self.running = Some((key, now));
                self.carry = Duration::ZERO;
                0
            }
        }
    }

    pub fn reset(&mut self) {
        self.running = None;
        self.carry = Duration::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: CountdownKey = (0, 1, Phase::Exercising);

    #[test]
    fn test_first_poll_starts_countdown() {
        let mut clock = TickClock::new();
        assert_eq!(clock.poll(Instant::now(), Some(KEY)), 0);
    }

    #[test]
    fn test_accumulates_partial_seconds() {
        let mut clock = TickClock::new();
        let t0 = Instant::now();
        clock.poll(t0, Some(KEY));

        assert_eq!(clock.poll(t0 + Duration::from_millis(600), Some(KEY)), 0);
        assert_eq!(clock.poll(t0 + Duration::from_millis(1200), Some(KEY)), 1);
        assert_eq!(clock.poll(t0 + Duration::from_millis(1900), Some(KEY)), 0);
        assert_eq!(clock.poll(t0 + Duration::from_millis(2000), Some(KEY)), 1);
    }

    #[test]
    fn test_reports_several_seconds_at_once() {
        let mut clock = TickClock::new();
        let t0 = Instant::now();
        clock.poll(t0, Some(KEY));
        assert_eq!(clock.poll(t0 + Duration::from_millis(4500), Some(KEY)), 4);
    }

    #[test]
    fn test_pause_drops_partial_second() {
        let mut clock = TickClock::new();
        let t0 = Instant::now();
        clock.poll(t0, Some(KEY));
        clock.poll(t0 + Duration::from_millis(900), Some(KEY));

        assert_eq!(clock.poll(t0 + Duration::from_millis(950), None), 0);
        assert_eq!(clock.poll(t0 + Duration::from_millis(5000), Some(KEY)), 0);
        assert_eq!(clock.poll(t0 + Duration::from_millis(5500), Some(KEY)), 0);
        assert_eq!(clock.poll(t0 + Duration::from_millis(6000), Some(KEY)), 1);
    }

    #[test]
    fn test_new_countdown_cancels_previous() {
        let mut clock = TickClock::new();
        let t0 = Instant::now();
        clock.poll(t0, Some(KEY));
        clock.poll(t0 + Duration::from_millis(900), Some(KEY));

        let rest = (0, 1, Phase::Resting);
        assert_eq!(clock.poll(t0 + Duration::from_millis(1100), Some(rest)), 0);
        assert_eq!(clock.poll(t0 + Duration::from_millis(2000), Some(rest)), 0);
        assert_eq!(clock.poll(t0 + Duration::from_millis(2100), Some(rest)), 1);
    }
}

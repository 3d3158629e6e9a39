//! Audio cues at phase transitions

use std::io::Write;

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Start,     // начало упражнения
    Complete,  // подход выполнен
    Rest,      // отдых
}

/// Fire-and-forget notifier. Implementations must not panic or block.
pub trait AudioCue {
    fn play(&self, cue: Cue);
}

impl<T: AudioCue + ?Sized> AudioCue for &T {
    fn play(&self, cue: Cue) {
        (**self).play(cue)
    }
}

/// Rings the terminal bell: one ring to start, two for rest, three on completion
pub struct TerminalBell;

impl TerminalBell {
    fn rings(cue: Cue) -> usize {
        match cue {
            Cue::Start => 1,
            Cue::Rest => 2,
            Cue::Complete => 3,
        }
    }
}

impl AudioCue for TerminalBell {
    fn play(&self, cue: Cue) {
        let bells = "\x07".repeat(Self::rings(cue));
        let mut err = std::io::stderr();
        if let Err(e) = err.write_all(bells.as_bytes()).and_then(|_| err.flush()) {
            debug!("cue {:?} not played: {}", cue, e);
        }
    }
}

/// For `--quiet` runs
pub struct SilentCue;

impl AudioCue for SilentCue {
    fn play(&self, cue: Cue) {
        debug!("cue {:?} (silent)", cue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rings_distinct_per_cue() {
        assert_eq!(TerminalBell::rings(Cue::Start), 1);
        assert_eq!(TerminalBell::rings(Cue::Rest), 2);
        assert_eq!(TerminalBell::rings(Cue::Complete), 3);
    }
}

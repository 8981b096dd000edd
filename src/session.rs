use crate::difficulty::Difficulty;
use crate::grid::HoleId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    Idle,
    Running,
    Paused,
    Ended,
}

/// Mutable state of one session, owned by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub score: u32,
    pub time_remaining_secs: u32,
    pub phase: Phase,
    /// Only ever `Some` while `phase == Running`.
    pub active_hole: Option<HoleId>,
    pub difficulty: Difficulty,
}

impl SessionState {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            score: 0,
            time_remaining_secs: difficulty.profile().duration_secs,
            phase: Phase::Idle,
            active_hole: None,
            difficulty,
        }
    }

    /// A session is in progress until it ends or is abandoned.
    pub fn in_progress(&self) -> bool {
        matches!(self.phase, Phase::Running | Phase::Paused)
    }
}

/// Payload of the end-of-session notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub final_score: u32,
    pub difficulty_name: String,
    pub is_new_best: bool,
}

/// Things the presentation layer may want to react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    MoleShown { hole: HoleId },
    MoleRetracted { hole: HoleId },
    MoleHit { hole: HoleId, score: u32 },
    Missed { hole: HoleId },
    ClockTick { time_remaining_secs: u32 },
    Ended(SessionSummary),
}

/// What happened to a hole activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    Hit { score: u32 },
    Miss,
    /// Not running, or the hole is outside the grid.
    Ignored,
}

/// Read-only view of everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub phase: Phase,
    pub difficulty: Difficulty,
    pub score: u32,
    pub best_score: u32,
    pub time_remaining_secs: u32,
    pub active_hole: Option<HoleId>,
    pub hole_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_is_idle_with_full_clock() {
        let state = SessionState::new(Difficulty::Medium);
        assert_eq!(state.phase, Phase::Idle);
        assert_eq!(state.score, 0);
        assert_eq!(state.time_remaining_secs, 35);
        assert_eq!(state.active_hole, None);
        assert!(!state.in_progress());
    }

    #[test]
    fn paused_counts_as_in_progress() {
        let mut state = SessionState::new(Difficulty::Easy);
        state.phase = Phase::Paused;
        assert!(state.in_progress());
        state.phase = Phase::Ended;
        assert!(!state.in_progress());
    }
}

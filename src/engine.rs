use std::collections::VecDeque;

use tracing::{debug, info};

use crate::difficulty::{resolve, Difficulty, DifficultyProfile};
use crate::grid::{HoleGrid, HoleId, HoleSelector, RandomHoleSelector};
use crate::records::RecordKeeper;
use crate::scheduler::{Clock, Scheduler, TimerKind};
use crate::session::{HitOutcome, Phase, SessionEvent, SessionState, SessionSummary, Snapshot};
use crate::store::KeyValueStore;

/// Delay before the extra first mole of a fresh session. The regular
/// cadence still counts from the start.
pub const FIRST_SPAWN_DELAY_MS: u64 = 500;
/// Delay before the first mole after resuming.
pub const RESUME_SPAWN_DELAY_MS: u64 = 200;
/// After a hit the next mole comes at this share of the spawn interval.
pub const HIT_RESPAWN_PERCENT: u64 = 30;

/// Reusable, UI-agnostic whac-a-mole session.
///
/// Input methods (`start`, `pause`, `on_hole_activated`, ...) and timer
/// callbacks (`on_spawn_tick`, `on_mole_expired`, `on_countdown_tick`) are
/// all plain synchronous calls. `pump` dispatches whichever timers are due
/// on the scheduler's clock. Rejected transitions are no-ops that return
/// `false`.
pub struct SessionEngine<C: Clock, S: KeyValueStore> {
    state: SessionState,
    profile: DifficultyProfile,
    best_score: u32,
    grid: HoleGrid,
    scheduler: Scheduler<C>,
    records: RecordKeeper<S>,
    selector: Box<dyn HoleSelector>,
    events: VecDeque<SessionEvent>,
}

impl<C: Clock, S: KeyValueStore> SessionEngine<C, S> {
    pub fn new(difficulty: Difficulty, scheduler: Scheduler<C>, records: RecordKeeper<S>) -> Self {
        let best_score = records.load(difficulty);
        Self {
            state: SessionState::new(difficulty),
            profile: resolve(difficulty),
            best_score,
            grid: HoleGrid::default(),
            scheduler,
            records,
            selector: Box::new(RandomHoleSelector::new()),
            events: VecDeque::new(),
        }
    }

    pub fn with_grid(mut self, grid: HoleGrid) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_selector(mut self, selector: Box<dyn HoleSelector>) -> Self {
        self.selector = selector;
        self
    }

    // ---- queries ----

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn score(&self) -> u32 {
        self.state.score
    }

    /// Best score to display: the stored record, raised live by the running
    /// score once it passes it.
    pub fn best_score(&self) -> u32 {
        self.best_score
    }

    pub fn time_remaining_secs(&self) -> u32 {
        self.state.time_remaining_secs
    }

    pub fn active_hole(&self) -> Option<HoleId> {
        self.state.active_hole
    }

    pub fn difficulty(&self) -> Difficulty {
        self.state.difficulty
    }

    pub fn profile(&self) -> &DifficultyProfile {
        &self.profile
    }

    pub fn grid(&self) -> HoleGrid {
        self.grid
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn scheduler(&self) -> &Scheduler<C> {
        &self.scheduler
    }

    pub fn records(&self) -> &RecordKeeper<S> {
        &self.records
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.state.phase,
            difficulty: self.state.difficulty,
            score: self.state.score,
            best_score: self.best_score,
            time_remaining_secs: self.state.time_remaining_secs,
            active_hole: self.state.active_hole,
            hole_count: self.grid.len(),
        }
    }

    /// Take all events emitted since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.events.drain(..).collect()
    }

    // ---- input ----

    pub fn select_difficulty(&mut self, difficulty: Difficulty) -> bool {
        if self.state.phase != Phase::Idle {
            debug!(phase = %self.state.phase, "difficulty change rejected");
            return false;
        }
        self.state.difficulty = difficulty;
        self.profile = resolve(difficulty);
        self.state.time_remaining_secs = self.profile.duration_secs;
        self.best_score = self.records.load(difficulty);
        true
    }

    /// Start a fresh session from Idle or Ended, or resume from Paused.
    pub fn start(&mut self) -> bool {
        match self.state.phase {
            Phase::Idle | Phase::Ended => {
                self.begin();
                true
            }
            Phase::Paused => {
                self.resume();
                true
            }
            Phase::Running => {
                debug!("start rejected: already running");
                false
            }
        }
    }

    pub fn pause(&mut self) -> bool {
        if self.state.phase != Phase::Running {
            debug!(phase = %self.state.phase, "pause rejected");
            return false;
        }
        self.retract_mole();
        self.scheduler.pause();
        self.state.phase = Phase::Paused;
        info!(score = self.state.score, time_remaining = self.state.time_remaining_secs, "paused");
        true
    }

    /// Abandon whatever is going on and return to Idle.
    ///
    /// An abandoned session is still settled against the record, but no
    /// `Ended` event is emitted.
    pub fn new_game(&mut self) {
        if self.state.in_progress() {
            let is_new_best = self.settle();
            info!(score = self.state.score, is_new_best, "session abandoned");
        }
        self.scheduler.stop();
        self.retract_mole();
        self.state.score = 0;
        self.state.time_remaining_secs = self.profile.duration_secs;
        self.state.phase = Phase::Idle;
    }

    pub fn on_hole_activated(&mut self, hole: HoleId) -> HitOutcome {
        if self.state.phase != Phase::Running || !self.grid.contains(hole) {
            return HitOutcome::Ignored;
        }
        if self.state.active_hole != Some(hole) {
            self.events.push_back(SessionEvent::Missed { hole });
            return HitOutcome::Miss;
        }

        self.state.score = self.state.score.saturating_add(1);
        self.state.active_hole = None;
        self.best_score = self.best_score.max(self.state.score);
        self.scheduler.cancel_mole_expiry();
        let delay_ms = self.profile.spawn_interval_ms * HIT_RESPAWN_PERCENT / 100;
        self.scheduler.schedule_spawn(delay_ms);

        let score = self.state.score;
        self.events.push_back(SessionEvent::MoleHit { hole, score });
        HitOutcome::Hit { score }
    }

    /// Clear the stored record for the current difficulty. Not allowed while
    /// a session is in progress.
    pub fn reset_best_score(&mut self) -> bool {
        if self.state.in_progress() {
            debug!("high score reset rejected: session in progress");
            return false;
        }
        self.records.clear(self.state.difficulty);
        self.best_score = 0;
        true
    }

    // ---- timer callbacks ----

    /// Dispatch every timer that is due. Returns how many fired.
    pub fn pump(&mut self) -> usize {
        let mut fired = 0;
        while let Some(kind) = self.scheduler.pop_due() {
            fired += 1;
            match kind {
                TimerKind::Spawn => self.on_spawn_tick(),
                TimerKind::MoleExpiry => self.on_mole_expired(),
                TimerKind::Countdown => self.on_countdown_tick(),
            }
        }
        fired
    }

    pub fn on_spawn_tick(&mut self) {
        if self.state.phase != Phase::Running {
            return;
        }
        self.retract_mole();

        let hole = self.selector.select(self.grid.len());
        debug_assert!(self.grid.contains(hole), "selector returned {hole}");
        let hole = hole.min(self.grid.len() - 1);

        self.state.active_hole = Some(hole);
        self.scheduler.arm_mole_expiry(self.profile.mole_visible_ms);
        debug!(hole, "mole shown");
        self.events.push_back(SessionEvent::MoleShown { hole });
    }

    pub fn on_mole_expired(&mut self) {
        if self.state.phase == Phase::Running {
            self.retract_mole();
        }
    }

    pub fn on_countdown_tick(&mut self) {
        if self.state.phase != Phase::Running {
            return;
        }
        self.state.time_remaining_secs = self.state.time_remaining_secs.saturating_sub(1);
        self.events.push_back(SessionEvent::ClockTick {
            time_remaining_secs: self.state.time_remaining_secs,
        });
        if self.state.time_remaining_secs == 0 {
            self.finish();
        }
    }

    // ---- internals ----

    fn begin(&mut self) {
        self.scheduler.stop();
        self.best_score = self.records.load(self.state.difficulty);
        self.state.score = 0;
        self.state.time_remaining_secs = self.profile.duration_secs;
        self.state.active_hole = None;
        self.state.phase = Phase::Running;
        self.scheduler.start(&self.profile);
        self.scheduler.arm_spawn_once(FIRST_SPAWN_DELAY_MS);
        info!(difficulty = %self.state.difficulty, "session started");
    }

    fn resume(&mut self) {
        self.state.phase = Phase::Running;
        self.scheduler.resume(&self.profile);
        self.scheduler.arm_spawn_once(RESUME_SPAWN_DELAY_MS);
        info!(time_remaining = self.state.time_remaining_secs, "resumed");
    }

    fn finish(&mut self) {
        self.scheduler.stop();
        self.retract_mole();
        let is_new_best = self.settle();
        self.state.phase = Phase::Ended;

        let summary = SessionSummary {
            final_score: self.state.score,
            difficulty_name: self.state.difficulty.to_string(),
            is_new_best,
        };
        info!(score = summary.final_score, is_new_best, "session ended");
        self.events.push_back(SessionEvent::Ended(summary));
    }

    /// Compare the session score against the stored record.
    fn settle(&mut self) -> bool {
        let is_new_best = self
            .records
            .try_save(self.state.difficulty, self.state.score);
        if is_new_best {
            self.best_score = self.state.score;
        }
        is_new_best
    }

    fn retract_mole(&mut self) {
        if let Some(hole) = self.state.active_hole.take() {
            self.scheduler.cancel_mole_expiry();
            self.events.push_back(SessionEvent::MoleRetracted { hole });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualClock;
    use crate::store::MemoryStore;
    use assert_matches::assert_matches;

    struct Always(HoleId);

    impl HoleSelector for Always {
        fn select(&mut self, _hole_count: usize) -> HoleId {
            self.0
        }
    }

    fn engine(difficulty: Difficulty) -> (ManualClock, SessionEngine<ManualClock, MemoryStore>) {
        let clock = ManualClock::new();
        let engine = SessionEngine::new(
            difficulty,
            Scheduler::new(clock.clone()),
            RecordKeeper::new(MemoryStore::new()),
        )
        .with_selector(Box::new(Always(4)));
        (clock, engine)
    }

    #[test]
    fn starts_idle() {
        let (_, engine) = engine(Difficulty::Easy);
        assert_eq!(engine.phase(), Phase::Idle);
        assert_eq!(engine.time_remaining_secs(), 45);
        assert!(!engine.scheduler().any_armed());
    }

    #[test]
    fn start_resets_and_runs() {
        let (_, mut engine) = engine(Difficulty::Hard);
        assert!(engine.start());
        assert_eq!(engine.phase(), Phase::Running);
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.time_remaining_secs(), 25);
        assert_eq!(engine.active_hole(), None);
        assert_eq!(
            engine.scheduler().due_in(TimerKind::Spawn),
            Some(FIRST_SPAWN_DELAY_MS)
        );
    }

    #[test]
    fn start_while_running_is_rejected() {
        let (clock, mut engine) = engine(Difficulty::Easy);
        engine.start();
        clock.advance(3000);
        engine.pump();
        let before = engine.snapshot();
        assert!(!engine.start());
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn first_mole_appears_after_initial_delay() {
        let (clock, mut engine) = engine(Difficulty::Easy);
        engine.start();
        clock.advance(FIRST_SPAWN_DELAY_MS - 1);
        engine.pump();
        assert_eq!(engine.active_hole(), None);
        clock.advance(1);
        engine.pump();
        assert_eq!(engine.active_hole(), Some(4));
        assert_matches!(
            engine.drain_events().as_slice(),
            [SessionEvent::MoleShown { hole: 4 }]
        );
    }

    #[test]
    fn hit_scores_and_speeds_up_next_spawn() {
        let (clock, mut engine) = engine(Difficulty::Easy);
        engine.start();
        clock.advance(FIRST_SPAWN_DELAY_MS);
        engine.pump();

        assert_eq!(engine.on_hole_activated(4), HitOutcome::Hit { score: 1 });
        assert_eq!(engine.active_hole(), None);
        assert!(!engine.scheduler().is_armed(TimerKind::MoleExpiry));
        assert_eq!(engine.scheduler().due_in(TimerKind::Spawn), Some(360));

        // a second click on the now-empty hole does nothing
        assert_eq!(engine.on_hole_activated(4), HitOutcome::Miss);
        assert_eq!(engine.score(), 1);
    }

    #[test]
    fn miss_changes_nothing() {
        let (clock, mut engine) = engine(Difficulty::Medium);
        engine.start();
        clock.advance(FIRST_SPAWN_DELAY_MS);
        engine.pump();
        engine.drain_events();

        assert_eq!(engine.on_hole_activated(0), HitOutcome::Miss);
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.active_hole(), Some(4));
        assert_eq!(engine.drain_events(), vec![SessionEvent::Missed { hole: 0 }]);
    }

    #[test]
    fn out_of_range_hole_is_ignored() {
        let (_, mut engine) = engine(Difficulty::Easy);
        engine.start();
        assert_eq!(engine.on_hole_activated(9), HitOutcome::Ignored);
    }

    #[test]
    fn mole_retracts_after_visible_window() {
        let (clock, mut engine) = engine(Difficulty::Medium);
        engine.start();
        clock.advance(FIRST_SPAWN_DELAY_MS);
        engine.pump();
        assert_eq!(engine.active_hole(), Some(4));
        assert_eq!(
            engine.scheduler().due_in(TimerKind::MoleExpiry),
            Some(engine.profile().mole_visible_ms)
        );

        // medium respawns every 800ms, before the 1500ms window runs out,
        // so stop the cadence to watch the expiry alone
        engine.scheduler.stop();
        engine.scheduler.arm_mole_expiry(1500);
        clock.advance(1500);
        engine.pump();
        assert_eq!(engine.active_hole(), None);
        assert_eq!(engine.score(), 0);
    }

    #[test]
    fn pause_hides_mole_and_freezes_clock() {
        let (clock, mut engine) = engine(Difficulty::Easy);
        engine.start();
        clock.advance(2000);
        engine.pump();
        assert!(engine.active_hole().is_some());
        let score = engine.score();
        let time = engine.time_remaining_secs();

        assert!(engine.pause());
        assert_eq!(engine.phase(), Phase::Paused);
        assert_eq!(engine.active_hole(), None);

        clock.advance(60_000);
        assert_eq!(engine.pump(), 0);
        assert_eq!(engine.on_hole_activated(4), HitOutcome::Ignored);
        assert_eq!(engine.score(), score);
        assert_eq!(engine.time_remaining_secs(), time);

        assert!(engine.start());
        assert_eq!(engine.phase(), Phase::Running);
        assert_eq!(
            engine.scheduler().due_in(TimerKind::Spawn),
            Some(RESUME_SPAWN_DELAY_MS)
        );
        assert_eq!(engine.score(), score);
        assert_eq!(engine.time_remaining_secs(), time);
    }

    #[test]
    fn pause_outside_running_is_rejected() {
        let (_, mut engine) = engine(Difficulty::Easy);
        assert!(!engine.pause());
        assert_eq!(engine.phase(), Phase::Idle);
    }

    #[test]
    fn difficulty_locked_during_session() {
        let (_, mut engine) = engine(Difficulty::Easy);
        assert!(engine.select_difficulty(Difficulty::Hard));
        assert_eq!(engine.time_remaining_secs(), 25);
        engine.start();
        assert!(!engine.select_difficulty(Difficulty::Easy));
        engine.pause();
        assert!(!engine.select_difficulty(Difficulty::Easy));
        assert_eq!(engine.difficulty(), Difficulty::Hard);
    }

    #[test]
    fn countdown_to_zero_ends_once() {
        let (clock, mut engine) = engine(Difficulty::Hard);
        engine.start();
        clock.advance(30_000);
        engine.pump();

        assert_eq!(engine.phase(), Phase::Ended);
        assert_eq!(engine.time_remaining_secs(), 0);
        assert_eq!(engine.active_hole(), None);
        assert!(!engine.scheduler().any_armed());

        let ended: Vec<_> = engine
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, SessionEvent::Ended(_)))
            .collect();
        assert_eq!(ended.len(), 1);

        // extra ticks after the end do nothing
        engine.on_countdown_tick();
        assert_eq!(engine.time_remaining_secs(), 0);
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn new_game_settles_silently() {
        let (clock, mut engine) = engine(Difficulty::Easy);
        engine.start();
        clock.advance(FIRST_SPAWN_DELAY_MS);
        engine.pump();
        engine.on_hole_activated(4);
        engine.drain_events();

        engine.new_game();
        assert_eq!(engine.phase(), Phase::Idle);
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.time_remaining_secs(), 45);
        assert!(!engine.scheduler().any_armed());
        assert_eq!(engine.records().load(Difficulty::Easy), 1);
        assert_eq!(engine.best_score(), 1);
        assert!(!engine
            .drain_events()
            .iter()
            .any(|e| matches!(e, SessionEvent::Ended(_))));
    }

    #[test]
    fn reset_best_score_only_when_not_playing() {
        let (_, mut engine) = engine(Difficulty::Easy);
        engine.records.try_save(Difficulty::Easy, 9);
        engine.select_difficulty(Difficulty::Easy);
        assert_eq!(engine.best_score(), 9);

        engine.start();
        assert!(!engine.reset_best_score());
        engine.new_game();
        assert!(engine.reset_best_score());
        assert_eq!(engine.best_score(), 0);
        assert_eq!(engine.records().load(Difficulty::Easy), 0);
    }
}

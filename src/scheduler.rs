use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use crate::difficulty::DifficultyProfile;

const COUNTDOWN_PERIOD_MS: u64 = 1000;

/// Source of monotonic milliseconds for the scheduler.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Wall clock measured from construction
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Simulated clock for driving sessions deterministically.
///
/// Clones share the same time, so a test can keep one handle and give
/// another to the scheduler.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get().saturating_add(ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Spawn,
    MoleExpiry,
    Countdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Armed {
    due_ms: u64,
    period_ms: Option<u64>,
}

/// Storage slots. Two of them report as `TimerKind::Spawn`: the repeating
/// cadence and the one-shot spawn armed on start/resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Countdown,
    MoleExpiry,
    Cadence,
    SpawnOnce,
}

impl Slot {
    const ALL: [Slot; 4] = [Slot::Countdown, Slot::MoleExpiry, Slot::Cadence, Slot::SpawnOnce];

    fn kind(self) -> TimerKind {
        match self {
            Slot::Countdown => TimerKind::Countdown,
            Slot::MoleExpiry => TimerKind::MoleExpiry,
            Slot::Cadence | Slot::SpawnOnce => TimerKind::Spawn,
        }
    }
}

/// Owns the session timers as deadline slots.
///
/// Nothing fires on its own: the owner polls `pop_due` and dispatches each
/// returned timer. Cancelling a timer clears its slot, so a cancelled timer
/// can never be observed afterwards.
#[derive(Debug)]
pub struct Scheduler<C: Clock> {
    clock: C,
    cadence: Option<Armed>,
    spawn_once: Option<Armed>,
    mole_expiry: Option<Armed>,
    countdown: Option<Armed>,
}

impl<C: Clock> Scheduler<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            cadence: None,
            spawn_once: None,
            mole_expiry: None,
            countdown: None,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Arm the spawn cadence and the countdown. The expiry timer is armed per
    /// spawn via `arm_mole_expiry`.
    pub fn start(&mut self, profile: &DifficultyProfile) {
        self.stop();
        let now = self.now_ms();
        self.cadence = Some(Armed {
            due_ms: now.saturating_add(profile.spawn_interval_ms),
            period_ms: Some(profile.spawn_interval_ms),
        });
        self.countdown = Some(Armed {
            due_ms: now.saturating_add(COUNTDOWN_PERIOD_MS),
            period_ms: Some(COUNTDOWN_PERIOD_MS),
        });
    }

    pub fn pause(&mut self) {
        self.stop();
    }

    /// Intervals restart from scratch; progress within an interval is lost.
    pub fn resume(&mut self, profile: &DifficultyProfile) {
        self.start(profile);
    }

    pub fn stop(&mut self) {
        self.cadence = None;
        self.spawn_once = None;
        self.mole_expiry = None;
        self.countdown = None;
    }

    /// One extra spawn at `now + delay_ms`. The cadence keeps its own
    /// deadlines.
    pub fn arm_spawn_once(&mut self, delay_ms: u64) {
        self.spawn_once = Some(Armed {
            due_ms: self.now_ms().saturating_add(delay_ms),
            period_ms: None,
        });
    }

    /// Pull the next cadence tick in to `now + delay_ms`. The cadence continues
    /// from that tick, so the regular interval does not fire right after.
    pub fn schedule_spawn(&mut self, delay_ms: u64) {
        let due_ms = self.now_ms().saturating_add(delay_ms);
        match self.cadence.as_mut() {
            Some(armed) => armed.due_ms = due_ms,
            None => {
                self.cadence = Some(Armed {
                    due_ms,
                    period_ms: None,
                })
            }
        }
    }

    pub fn arm_mole_expiry(&mut self, delay_ms: u64) {
        self.mole_expiry = Some(Armed {
            due_ms: self.now_ms().saturating_add(delay_ms),
            period_ms: None,
        });
    }

    pub fn cancel_mole_expiry(&mut self) {
        self.mole_expiry = None;
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.armed(kind).next().is_some()
    }

    pub fn any_armed(&self) -> bool {
        Slot::ALL.iter().any(|&slot| self.slot(slot).is_some())
    }

    /// Milliseconds until the earliest timer of `kind` fires, if armed.
    pub fn due_in(&self, kind: TimerKind) -> Option<u64> {
        let now = self.now_ms();
        self.armed(kind)
            .map(|armed| armed.due_ms.saturating_sub(now))
            .min()
    }

    /// Take the earliest timer whose deadline has passed.
    ///
    /// Repeating timers are rearmed one period after their previous
    /// deadline, so a caller that fell behind catches up tick by tick.
    pub fn pop_due(&mut self) -> Option<TimerKind> {
        let now = self.now_ms();
        let slot = Slot::ALL
            .into_iter()
            .filter_map(|slot| self.slot(slot).map(|armed| (slot, armed.due_ms)))
            .filter(|&(_, due_ms)| due_ms <= now)
            .min_by_key(|&(_, due_ms)| due_ms)
            .map(|(slot, _)| slot)?;

        let armed = self.slot_mut(slot);
        match (*armed).and_then(|a| a.period_ms) {
            Some(period_ms) => {
                if let Some(a) = armed.as_mut() {
                    a.due_ms = a.due_ms.saturating_add(period_ms.max(1));
                }
            }
            None => *armed = None,
        }
        Some(slot.kind())
    }

    fn armed(&self, kind: TimerKind) -> impl Iterator<Item = &Armed> + '_ {
        Slot::ALL
            .into_iter()
            .filter(move |slot| slot.kind() == kind)
            .filter_map(move |slot| self.slot(slot))
    }

    fn slot(&self, slot: Slot) -> Option<&Armed> {
        match slot {
            Slot::Countdown => self.countdown.as_ref(),
            Slot::MoleExpiry => self.mole_expiry.as_ref(),
            Slot::Cadence => self.cadence.as_ref(),
            Slot::SpawnOnce => self.spawn_once.as_ref(),
        }
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut Option<Armed> {
        match slot {
            Slot::Countdown => &mut self.countdown,
            Slot::MoleExpiry => &mut self.mole_expiry,
            Slot::Cadence => &mut self.cadence,
            Slot::SpawnOnce => &mut self.spawn_once,
        }
    }
}

//! Timer engine implementation.
//!
//! Transitions are a pure reducer over [`TimerSession`]: given a session, a
//! command and the current time, [`reduce`] returns the next session, the
//! event describing the change, and what the caller must do with its ticker.
//! The engine has no internal thread; [`TimerDriver`](super::TimerDriver) owns
//! the one-second ticker.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Paused -> Running
//!   ^        |
//!   +--------+  (reset from anywhere, or the phase runs out)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(Durations::default());
//! engine.start();
//! // Once per second while running:
//! engine.tick(); // Some(Event::PhaseCompleted { .. }) at the phase boundary
//! ```

use chrono::{DateTime, Utc};

use super::session::{Durations, TimerSession, TimerState};
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Start,
    Pause,
    Reset,
    Tick,
    SetDurations(Durations),
}

/// What the owner of the ticker must do after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerDirective {
    /// Leave the current ticker (or its absence) alone.
    Keep,
    /// Cancel any outstanding ticker, then schedule a new one.
    Schedule,
    /// Cancel any outstanding ticker.
    Cancel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub session: TimerSession,
    pub event: Option<Event>,
    pub ticker: TickerDirective,
}

impl Transition {
    fn unchanged(session: &TimerSession) -> Self {
        Self {
            session: session.clone(),
            event: None,
            ticker: TickerDirective::Keep,
        }
    }
}

/// Apply one command to a session.
///
/// Invalid commands for the current state are no-ops: the session comes back
/// unchanged, with no event and [`TickerDirective::Keep`].
pub fn reduce(session: &TimerSession, command: TimerCommand, now: DateTime<Utc>) -> Transition {
    match command {
        TimerCommand::Start => start(session, now),
        TimerCommand::Pause => pause(session, now),
        TimerCommand::Reset => reset(session, now),
        TimerCommand::Tick => tick(session, now),
        TimerCommand::SetDurations(durations) => set_durations(session, durations, now),
    }
}

fn start(session: &TimerSession, now: DateTime<Utc>) -> Transition {
    let resumed = match session.state {
        TimerState::Running => return Transition::unchanged(session),
        TimerState::Idle => false,
        TimerState::Paused => true,
    };
    let mut next = session.clone();
    next.state = TimerState::Running;
    if !resumed {
        next.session_start = Some(now);
        next.session_end = None;
    }
    Transition {
        event: Some(Event::TimerStarted {
            phase: next.phase,
            remaining_secs: next.time,
            resumed,
            at: now,
        }),
        session: next,
        ticker: TickerDirective::Schedule,
    }
}

fn pause(session: &TimerSession, now: DateTime<Utc>) -> Transition {
    if session.state != TimerState::Running {
        return Transition::unchanged(session);
    }
    let mut next = session.clone();
    next.state = TimerState::Paused;
    next.session_end = Some(now);
    Transition {
        event: Some(Event::TimerPaused {
            remaining_secs: next.time,
            interval: next.focus_interval(),
            at: now,
        }),
        session: next,
        ticker: TickerDirective::Cancel,
    }
}

fn reset(session: &TimerSession, now: DateTime<Utc>) -> Transition {
    let mut next = session.clone();
    next.state = TimerState::Idle;
    next.initial_time = next.durations.for_phase(next.phase);
    next.time = next.initial_time;
    next.session_start = None;
    next.session_end = None;
    Transition {
        event: Some(Event::TimerReset {
            phase: next.phase,
            remaining_secs: next.time,
            at: now,
        }),
        session: next,
        ticker: TickerDirective::Cancel,
    }
}

fn tick(session: &TimerSession, now: DateTime<Utc>) -> Transition {
    if session.state != TimerState::Running {
        return Transition::unchanged(session);
    }
    let mut next = session.clone();
    next.time = next.time.saturating_sub(1);
    if next.time > 0 {
        return Transition {
            event: Some(Event::Ticked {
                phase: next.phase,
                remaining_secs: next.time,
                at: now,
            }),
            session: next,
            ticker: TickerDirective::Keep,
        };
    }

    // Phase boundary: report the finished stretch, then move to the next
    // phase and stop there.
    next.session_end = Some(now);
    let interval = next.focus_interval();
    let completed = next.phase;
    let (phase, cycle_count) = next.next_phase();
    next.phase = phase;
    next.cycle_count = cycle_count;
    next.initial_time = next.durations.for_phase(phase);
    next.time = next.initial_time;
    next.state = TimerState::Idle;
    next.session_start = None;
    next.session_end = None;

    Transition {
        event: Some(Event::PhaseCompleted {
            completed,
            next: phase,
            next_secs: next.time,
            cycle_count,
            interval,
            at: now,
        }),
        session: next,
        ticker: TickerDirective::Cancel,
    }
}

fn set_durations(session: &TimerSession, durations: Durations, now: DateTime<Utc>) -> Transition {
    let mut next = session.clone();
    next.durations = durations;
    if next.state == TimerState::Idle {
        next.initial_time = durations.for_phase(next.phase);
        next.time = next.time.min(next.initial_time);
    }
    Transition {
        event: Some(Event::DurationsChanged {
            durations,
            remaining_secs: next.time,
            at: now,
        }),
        session: next,
        ticker: TickerDirective::Keep,
    }
}

/// Core timer engine.
///
/// Holds the current session and applies commands through [`reduce`].
/// The caller is responsible for honouring [`TimerEngine::last_directive`].
#[derive(Debug, Clone)]
pub struct TimerEngine {
    session: TimerSession,
    last_directive: TickerDirective,
}

impl TimerEngine {
    /// Create an idle engine positioned on a work phase.
    pub fn new(durations: Durations) -> Self {
        Self::from_session(TimerSession::new(durations))
    }

    pub fn from_session(session: TimerSession) -> Self {
        Self {
            session,
            last_directive: TickerDirective::Keep,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn session(&self) -> &TimerSession {
        &self.session
    }

    pub fn state(&self) -> TimerState {
        self.session.state
    }

    pub fn remaining_secs(&self) -> u64 {
        self.session.time
    }

    pub fn durations(&self) -> Durations {
        self.session.durations
    }

    /// Ticker instruction produced by the most recent command.
    pub fn last_directive(&self) -> TickerDirective {
        self.last_directive
    }

    pub fn clock(&self) -> String {
        self.session.clock()
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.session.state,
            phase: self.session.phase,
            remaining_secs: self.session.time,
            total_secs: self.session.initial_time,
            cycle_count: self.session.cycle_count,
            clock: self.clock(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        self.apply(TimerCommand::Start, Utc::now())
    }

    pub fn pause(&mut self) -> Option<Event> {
        self.apply(TimerCommand::Pause, Utc::now())
    }

    pub fn reset(&mut self) -> Option<Event> {
        self.apply(TimerCommand::Reset, Utc::now())
    }

    /// Call once per second while running. Returns
    /// `Some(Event::PhaseCompleted)` when the phase runs out.
    pub fn tick(&mut self) -> Option<Event> {
        self.apply(TimerCommand::Tick, Utc::now())
    }

    pub fn set_durations(&mut self, durations: Durations) -> Option<Event> {
        self.apply(TimerCommand::SetDurations(durations), Utc::now())
    }

    pub fn apply(&mut self, command: TimerCommand, now: DateTime<Utc>) -> Option<Event> {
        let Transition {
            session,
            event,
            ticker,
        } = reduce(&self.session, command, now);
        self.session = session;
        self.last_directive = ticker;
        event
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(Durations::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::Phase;
    use chrono::Duration;

    fn short() -> Durations {
        Durations::new(3, 2, 4)
    }

    fn run_out(engine: &mut TimerEngine, now: DateTime<Utc>) -> Option<Event> {
        let mut last = None;
        while engine.state() == TimerState::Running {
            last = engine.apply(TimerCommand::Tick, now);
        }
        last
    }

    #[test]
    fn start_pause_resume() {
        let mut engine = TimerEngine::default();
        assert_eq!(engine.state(), TimerState::Idle);

        assert!(engine.start().is_some());
        assert_eq!(engine.state(), TimerState::Running);
        assert_eq!(engine.last_directive(), TickerDirective::Schedule);

        assert!(engine.pause().is_some());
        assert_eq!(engine.state(), TimerState::Paused);
        assert_eq!(engine.last_directive(), TickerDirective::Cancel);

        match engine.start() {
            Some(Event::TimerStarted { resumed, .. }) => assert!(resumed),
            other => panic!("Expected TimerStarted, got {other:?}"),
        }
        assert_eq!(engine.state(), TimerState::Running);
    }

    #[test]
    fn start_while_running_is_noop() {
        let mut engine = TimerEngine::default();
        engine.start();
        let before = engine.session().clone();
        assert!(engine.start().is_none());
        assert_eq!(engine.last_directive(), TickerDirective::Keep);
        assert_eq!(engine.session(), &before);
    }

    #[test]
    fn pause_and_tick_outside_running_are_noops() {
        let mut engine = TimerEngine::default();
        assert!(engine.pause().is_none());
        assert!(engine.tick().is_none());
        assert_eq!(engine.remaining_secs(), 1500);

        engine.start();
        engine.pause();
        assert!(engine.tick().is_none());
        assert!(engine.pause().is_none());
    }

    #[test]
    fn fresh_start_stamps_session_start_resume_keeps_it() {
        let t0 = Utc::now();
        let mut engine = TimerEngine::default();
        engine.apply(TimerCommand::Start, t0);
        assert_eq!(engine.session().session_start, Some(t0));

        engine.apply(TimerCommand::Pause, t0 + Duration::seconds(10));
        engine.apply(TimerCommand::Start, t0 + Duration::seconds(20));
        assert_eq!(engine.session().session_start, Some(t0));
    }

    #[test]
    fn pause_reports_focus_interval() {
        let t0 = Utc::now();
        let t1 = t0 + Duration::seconds(42);
        let mut engine = TimerEngine::default();
        engine.apply(TimerCommand::Start, t0);
        let event = engine.apply(TimerCommand::Pause, t1).unwrap();
        let interval = event.focus_interval().copied().unwrap();
        assert_eq!(interval.started_at, t0);
        assert_eq!(interval.ended_at, t1);
        assert_eq!(interval.phase, Phase::Work);
    }

    #[test]
    fn tick_counts_down_by_one() {
        let mut engine = TimerEngine::new(short());
        engine.start();
        assert_eq!(engine.remaining_secs(), 3);
        engine.tick();
        assert_eq!(engine.remaining_secs(), 2);
        engine.tick();
        assert_eq!(engine.remaining_secs(), 1);
        assert_eq!(engine.state(), TimerState::Running);
    }

    #[test]
    fn work_completion_moves_to_idle_short_break() {
        let now = Utc::now();
        let mut engine = TimerEngine::new(short());
        engine.apply(TimerCommand::Start, now);
        let event = run_out(&mut engine, now).unwrap();

        let session = engine.session();
        assert_eq!(session.state, TimerState::Idle);
        assert_eq!(session.phase, Phase::ShortBreak);
        assert!(session.is_break());
        assert_eq!(session.time, 2);
        assert_eq!(session.initial_time, 2);
        assert_eq!(session.cycle_count, 1);
        assert_eq!(engine.last_directive(), TickerDirective::Cancel);
        match event {
            Event::PhaseCompleted {
                completed,
                next,
                interval,
                ..
            } => {
                assert_eq!(completed, Phase::Work);
                assert_eq!(next, Phase::ShortBreak);
                assert_eq!(interval.map(|i| i.started_at), Some(now));
            }
            other => panic!("Expected PhaseCompleted, got {other:?}"),
        }
    }

    #[test]
    fn break_completion_returns_to_work_without_counting() {
        let now = Utc::now();
        let mut engine = TimerEngine::new(short());
        engine.apply(TimerCommand::Start, now);
        run_out(&mut engine, now);
        engine.apply(TimerCommand::Start, now);
        run_out(&mut engine, now);

        let session = engine.session();
        assert_eq!(session.phase, Phase::Work);
        assert_eq!(session.cycle_count, 1);
        assert_eq!(session.time, 3);
    }

    #[test]
    fn sixth_work_completion_wraps_cycle_and_takes_long_break() {
        let now = Utc::now();
        let mut engine = TimerEngine::new(short());
        for completed in 1..=6u32 {
            engine.apply(TimerCommand::Start, now);
            run_out(&mut engine, now);
            let session = engine.session().clone();
            let expected_count = if completed == 6 { 0 } else { completed };
            assert_eq!(session.cycle_count, expected_count);
            if completed == 6 {
                assert_eq!(session.phase, Phase::LongBreak);
                assert_eq!(session.time, 4);
            }
            // skip the break
            engine.apply(TimerCommand::Start, now);
            run_out(&mut engine, now);
        }
    }

    #[test]
    fn reset_from_any_state_restores_initial_time() {
        let mut engine = TimerEngine::new(short());
        engine.reset();
        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!(engine.remaining_secs(), 3);

        engine.start();
        engine.tick();
        engine.reset();
        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!(engine.remaining_secs(), 3);

        engine.start();
        engine.tick();
        engine.pause();
        engine.reset();
        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!(engine.remaining_secs(), 3);
        assert!(engine.session().session_start.is_none());
    }

    #[test]
    fn reset_keeps_cycle_count() {
        let now = Utc::now();
        let mut engine = TimerEngine::new(short());
        engine.apply(TimerCommand::Start, now);
        run_out(&mut engine, now);
        engine.reset();
        assert_eq!(engine.session().cycle_count, 1);
        assert_eq!(engine.session().phase, Phase::ShortBreak);
        assert_eq!(engine.remaining_secs(), 2);
    }

    #[test]
    fn set_durations_clamps_idle_time_down() {
        let mut engine = TimerEngine::default();
        engine.set_durations(Durations::new(600, 60, 120));
        assert_eq!(engine.remaining_secs(), 600);
        assert_eq!(engine.session().initial_time, 600);
    }

    #[test]
    fn set_durations_does_not_raise_idle_time() {
        let mut engine = TimerEngine::new(Durations::new(600, 60, 120));
        engine.set_durations(Durations::new(1200, 60, 120));
        assert_eq!(engine.remaining_secs(), 600);
        assert_eq!(engine.durations().work_secs, 1200);
    }

    #[test]
    fn set_durations_leaves_running_session_alone() {
        let mut engine = TimerEngine::default();
        engine.start();
        engine.tick();
        engine.set_durations(Durations::new(60, 30, 90));
        assert_eq!(engine.remaining_secs(), 1499);
        assert_eq!(engine.session().initial_time, 1500);
        assert_eq!(engine.state(), TimerState::Running);
        assert_eq!(engine.last_directive(), TickerDirective::Keep);

        engine.reset();
        assert_eq!(engine.remaining_secs(), 60);
        assert_eq!(engine.session().initial_time, 60);
    }

    #[test]
    fn reset_after_paused_set_durations_uses_new_duration() {
        let mut engine = TimerEngine::default();
        engine.start();
        engine.tick();
        engine.pause();
        engine.set_durations(Durations::new(600, 60, 120));
        assert_eq!(engine.remaining_secs(), 1499);

        engine.reset();
        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!(engine.session().initial_time, 600);
        assert_eq!(engine.remaining_secs(), 600);
    }

    #[test]
    fn set_durations_on_idle_break_clamps_to_break_duration() {
        let mut engine = TimerEngine::new(Durations::new(3, 20, 40));
        let now = Utc::now();
        engine.start();
        run_out(&mut engine, now);
        assert_eq!(engine.session().phase, Phase::ShortBreak);
        assert_eq!(engine.remaining_secs(), 20);

        // Work shrinking below the remaining break time leaves the break alone.
        engine.set_durations(Durations::new(5, 20, 40));
        assert_eq!(engine.remaining_secs(), 20);
        assert_eq!(engine.session().initial_time, 20);

        engine.set_durations(Durations::new(5, 8, 40));
        assert_eq!(engine.remaining_secs(), 8);
        assert_eq!(engine.session().initial_time, 8);
    }

    #[test]
    fn snapshot_returns_valid_event() {
        let engine = TimerEngine::default();
        match engine.snapshot() {
            Event::StateSnapshot {
                state,
                remaining_secs,
                clock,
                ..
            } => {
                assert_eq!(state, TimerState::Idle);
                assert_eq!(remaining_secs, 25 * 60);
                assert_eq!(clock, "25:00");
            }
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }
    }

    #[test]
    fn reduce_does_not_touch_input_session() {
        let session = TimerSession::default();
        let before = session.clone();
        let transition = reduce(&session, TimerCommand::Start, Utc::now());
        assert_eq!(session, before);
        assert_eq!(transition.session.state, TimerState::Running);
    }
}

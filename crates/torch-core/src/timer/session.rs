use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Completed work phases wrap back to zero once the count would pass this.
pub const MAX_CYCLE: u32 = 5;

/// Work phases completed before breaks switch from short to long.
pub const LONG_BREAK_AFTER: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    #[default]
    Idle,
    Running,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Work,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub fn is_break(self) -> bool {
        !matches!(self, Phase::Work)
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Work => "Focus",
            Phase::ShortBreak => "Short Break",
            Phase::LongBreak => "Long Break",
        }
    }
}

/// Configured phase lengths, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Durations {
    pub work_secs: u64,
    pub short_break_secs: u64,
    pub long_break_secs: u64,
}

impl Durations {
    pub fn new(work_secs: u64, short_break_secs: u64, long_break_secs: u64) -> Self {
        Self {
            work_secs,
            short_break_secs,
            long_break_secs,
        }
    }

    pub fn for_phase(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Work => self.work_secs,
            Phase::ShortBreak => self.short_break_secs,
            Phase::LongBreak => self.long_break_secs,
        }
    }
}

impl Default for Durations {
    fn default() -> Self {
        Self::new(25 * 60, 5 * 60, 15 * 60)
    }
}

/// The half-open span `[started_at, ended_at)` of one running stretch,
/// handed to whoever records focus history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusInterval {
    pub phase: Phase,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl FocusInterval {
    pub fn duration_secs(&self) -> u64 {
        (self.ended_at - self.started_at).num_seconds().max(0) as u64
    }
}

/// Countdown state for the current phase.
///
/// Owned by whoever drives the timer; transitions go through
/// [`reduce`](super::reduce) and never mutate a session in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSession {
    /// Seconds left in the current phase.
    pub time: u64,
    /// Length of the current phase when it began.
    pub initial_time: u64,
    pub state: TimerState,
    pub phase: Phase,
    /// Work phases completed since the count last wrapped.
    pub cycle_count: u32,
    pub durations: Durations,
    pub session_start: Option<DateTime<Utc>>,
    pub session_end: Option<DateTime<Utc>>,
}

impl TimerSession {
    /// A fresh, idle work phase.
    pub fn new(durations: Durations) -> Self {
        Self {
            time: durations.work_secs,
            initial_time: durations.work_secs,
            state: TimerState::Idle,
            phase: Phase::Work,
            cycle_count: 0,
            durations,
            session_start: None,
            session_end: None,
        }
    }

    pub fn is_break(&self) -> bool {
        self.phase.is_break()
    }

    /// Phase that follows the current one, and the cycle count it starts with.
    pub fn next_phase(&self) -> (Phase, u32) {
        match self.phase {
            Phase::Work => {
                let next = if self.cycle_count < LONG_BREAK_AFTER {
                    Phase::ShortBreak
                } else {
                    Phase::LongBreak
                };
                let count = if self.cycle_count + 1 > MAX_CYCLE {
                    0
                } else {
                    self.cycle_count + 1
                };
                (next, count)
            }
            Phase::ShortBreak | Phase::LongBreak => (Phase::Work, self.cycle_count),
        }
    }

    /// The `[session_start, session_end)` span, once both ends are known.
    pub fn focus_interval(&self) -> Option<FocusInterval> {
        match (self.session_start, self.session_end) {
            (Some(started_at), Some(ended_at)) => Some(FocusInterval {
                phase: self.phase,
                started_at,
                ended_at,
            }),
            _ => None,
        }
    }

    /// Remaining time as `mm:ss`.
    pub fn clock(&self) -> String {
        format_clock(self.time)
    }
}

impl Default for TimerSession {
    fn default() -> Self {
        Self::new(Durations::default())
    }
}

/// Render seconds as `mm:ss`. Minutes are not wrapped into hours.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Durations, FocusInterval, Phase, TimerState};

/// Every timer state change produces an Event.
/// The driver publishes them; the CLI renders the clock and records history from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        remaining_secs: u64,
        /// True when continuing from `paused` rather than starting fresh.
        resumed: bool,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u64,
        interval: Option<FocusInterval>,
        at: DateTime<Utc>,
    },
    TimerReset {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    Ticked {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// A phase ran out. The timer is idle on `next` until started again.
    PhaseCompleted {
        completed: Phase,
        next: Phase,
        next_secs: u64,
        cycle_count: u32,
        interval: Option<FocusInterval>,
        at: DateTime<Utc>,
    },
    DurationsChanged {
        durations: Durations,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        phase: Phase,
        remaining_secs: u64,
        total_secs: u64,
        cycle_count: u32,
        clock: String,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// The focus interval this event reports, if any.
    pub fn focus_interval(&self) -> Option<&FocusInterval> {
        match self {
            Event::TimerPaused { interval, .. } | Event::PhaseCompleted { interval, .. } => {
                interval.as_ref()
            }
            _ => None,
        }
    }
}

mod driver;
mod engine;
mod session;

pub use driver::TimerDriver;
pub use engine::{reduce, TickerDirective, TimerCommand, TimerEngine, Transition};
pub use session::{
    format_clock, Durations, FocusInterval, Phase, TimerSession, TimerState, LONG_BREAK_AFTER,
    MAX_CYCLE,
};

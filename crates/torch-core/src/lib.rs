//! # Torch Core Library
//!
//! Business logic for Torch, a Dreams → Goals → Tasks tracker with a
//! Pomodoro-style focus timer. Front ends (the `torch` CLI, or any GUI) are
//! thin layers over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a pure reducer over [`TimerSession`] plus an async
//!   [`TimerDriver`] that owns the single one-second ticker
//! - **Progress Aggregator**: stateless rollups and parent grouping over an
//!   [`ItemSet`] snapshot
//! - **Storage**: TOML configuration and SQLite focus history
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`TimerDriver`]: Ticker ownership and event publishing
//! - [`ItemSet`]: A loaded item snapshot and its derived rows
//! - [`Config`]: Application configuration management
//! - [`HistoryDb`]: Focus interval persistence

pub mod error;
pub mod events;
pub mod items;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use items::{
    compute_progress, filter_and_project, find_item_by_id, group_by_parent, group_rows,
    roll_up_dream, roll_up_goal, Dream, Goal, Item, ItemRef, ItemRow, ItemSet, ItemType, Task,
};
pub use storage::{Config, HistoryDb};
pub use timer::{Durations, FocusInterval, Phase, TimerDriver, TimerEngine, TimerSession, TimerState};

pub mod config;
pub mod items;
pub mod stats;
pub mod timer;

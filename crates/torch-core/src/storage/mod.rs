mod config;
pub mod history;

pub use config::{Config, DisplayConfig, HistoryConfig, TimerConfig};
pub use history::{HistoryDb, IntervalRecord, Stats};

use std::path::PathBuf;

use crate::error::{Result, StorageError};

/// Returns `~/.config/torch[-dev]/` based on TORCH_ENV.
///
/// Set TORCH_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("TORCH_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("torch-dev")
    } else {
        base_dir.join("torch")
    };

    std::fs::create_dir_all(&dir).map_err(|source| StorageError::DataDir {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}

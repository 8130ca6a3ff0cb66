//! Store path utilities - uses ~/.local/share/riskcast/ (platform data dir)

use crate::models::ModelName;
use std::path::{Path, PathBuf};

/// Per-user data directory for stored results.
/// `RISKCAST_DATA_DIR` overrides the platform default.
pub fn get_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("RISKCAST_DATA_DIR") {
        return PathBuf::from(dir);
    }

    dirs::data_dir()
        .unwrap_or_else(|| {
            // Fallback to ~/.local/share
            dirs::home_dir()
                .map(|h| h.join(".local").join("share"))
                .unwrap_or_else(|| PathBuf::from("."))
        })
        .join("riskcast")
}

/// Record file for one model.
pub fn record_path(dir: &Path, model: ModelName) -> PathBuf {
    dir.join(format!("{}_risk.json", model.as_str()))
}

/// Combined summary file.
pub fn summary_path(dir: &Path) -> PathBuf {
    dir.join("health_summary.json")
}

use std::path::{Path, PathBuf};
use std::time::Duration;

pub const LOCATIONS_FILE: &str = "Locations.txt";
pub const SOCKET_FILE: &str = "MemoryWatcher";
pub const SETTINGS_FILE: &str = "config.yaml";

/// Roughly one frame of a 60 Hz guest.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(16);

pub fn memwatch_root(home: &Path) -> PathBuf {
    home.join(".memwatch")
}

pub fn locations_path(home: &Path) -> PathBuf {
    memwatch_root(home).join(LOCATIONS_FILE)
}

pub fn socket_path(home: &Path) -> PathBuf {
    memwatch_root(home).join(SOCKET_FILE)
}

pub fn settings_path(home: &Path) -> PathBuf {
    memwatch_root(home).join(SETTINGS_FILE)
}

//! Optional YAML settings at `~/.memwatch/config.yaml`.
//!
//! ```yaml
//! binding: reqrep          # datagram | reqrep
//! interval_ms: 16
//! locations: /path/to/Locations.txt
//! socket: /path/to/MemoryWatcher
//! memory:
//!   base: "80000000"       # integer or hex string
//!   endian: big
//! ```
//!
//! Every field is optional. A missing file means all defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use memwatch_core::{Endian, DEFAULT_GUEST_BASE};
use memwatch_transport::TransportKind;
use serde::{Deserialize, Deserializer};

use crate::error::{io_err, DaemonError};
use crate::paths::{locations_path, settings_path, socket_path, DEFAULT_TICK_INTERVAL};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub binding: TransportKind,
    pub interval_ms: u64,
    pub locations: Option<PathBuf>,
    pub socket: Option<PathBuf>,
    pub memory: MemorySettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MemorySettings {
    #[serde(deserialize_with = "deserialize_address")]
    pub base: u32,
    pub endian: Endian,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            binding: TransportKind::default(),
            interval_ms: DEFAULT_TICK_INTERVAL.as_millis() as u64,
            locations: None,
            socket: None,
            memory: MemorySettings::default(),
        }
    }
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            base: DEFAULT_GUEST_BASE,
            endian: Endian::default(),
        }
    }
}

impl Settings {
    /// Load `<home>/.memwatch/config.yaml`, or defaults if it does not exist.
    pub fn load_at(home: &Path) -> Result<Self, DaemonError> {
        let path = settings_path(home);
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&contents).map_err(|source| DaemonError::Settings { path, source })
    }

    pub fn locations_path(&self, home: &Path) -> PathBuf {
        self.locations
            .clone()
            .unwrap_or_else(|| locations_path(home))
    }

    pub fn socket_path(&self, home: &Path) -> PathBuf {
        self.socket.clone().unwrap_or_else(|| socket_path(home))
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Parse a guest address written as hex, with or without `0x`.
pub fn parse_address(text: &str) -> Result<u32, String> {
    let digits = text
        .trim()
        .trim_start_matches("0x")
        .trim_start_matches("0X");
    u32::from_str_radix(digits, 16).map_err(|err| format!("invalid address '{text}': {err}"))
}

fn deserialize_address<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Address {
        Number(u32),
        Text(String),
    }

    match Address::deserialize(deserializer)? {
        Address::Number(value) => Ok(value),
        Address::Text(text) => parse_address(&text).map_err(serde::de::Error::custom),
    }
}

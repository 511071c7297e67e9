//! Adapter configuration
//!
//! Stored as JSON. Every field has a default, so a partial or empty document
//! is valid:
//!
//! ```json
//! {
//!   "transmitter": { "timeout_ms": 500 },
//!   "receiver": { "timeout_ms": 100 },
//!   "dispatcher": { "poll_interval_ms": 150, "event_buffer": 64 }
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use fs20_detect::AdapterKind;
use serde::{Deserialize, Serialize};

use crate::error::Fs20Error;

/// Per-adapter settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Read timeout in milliseconds
    pub timeout_ms: u64,
}

impl AdapterConfig {
    /// Defaults for the given adapter
    pub fn for_kind(kind: AdapterKind) -> Self {
        Self {
            timeout_ms: kind.default_timeout().as_millis() as u64,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_transmitter() -> AdapterConfig {
    AdapterConfig::for_kind(AdapterKind::Transmitter)
}

fn default_receiver() -> AdapterConfig {
    AdapterConfig::for_kind(AdapterKind::Receiver)
}

/// Event dispatcher settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Pause between receiver polls
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Capacity of the event broadcast channel
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_poll_interval_ms() -> u64 {
    150
}

fn default_event_buffer() -> usize {
    64
}

impl DispatcherConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            event_buffer: default_event_buffer(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fs20Config {
    #[serde(default = "default_transmitter")]
    pub transmitter: AdapterConfig,
    #[serde(default = "default_receiver")]
    pub receiver: AdapterConfig,
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
}

impl Default for Fs20Config {
    fn default() -> Self {
        Self {
            transmitter: default_transmitter(),
            receiver: default_receiver(),
            dispatcher: DispatcherConfig::default(),
        }
    }
}

impl Fs20Config {
    pub fn from_json_str(json: &str) -> Result<Self, Fs20Error> {
        serde_json::from_str(json)
            .map_err(|e| Fs20Error::Config(format!("Failed to parse configuration: {}", e)))
    }

    pub fn to_json_string(&self) -> Result<String, Fs20Error> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Fs20Error::Config(format!("Failed to serialize configuration: {}", e)))
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, Fs20Error> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            Fs20Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    /// Save configuration as a JSON file
    pub fn save(&self, path: &Path) -> Result<(), Fs20Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Fs20Error::Config(format!("Failed to create config directory: {}", e))
            })?;
        }
        let json = self.to_json_string()?;
        std::fs::write(path, json)
            .map_err(|e| Fs20Error::Config(format!("Failed to write {}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Fs20Config::default();
        assert_eq!(config.transmitter.timeout_ms, 500);
        assert_eq!(config.receiver.timeout_ms, 100);
        assert_eq!(config.dispatcher.poll_interval_ms, 150);
        assert_eq!(config.dispatcher.event_buffer, 64);
    }

    #[test]
    fn test_partial_document() {
        let config = Fs20Config::from_json_str(r#"{"dispatcher": {"poll_interval_ms": 20}}"#).unwrap();
        assert_eq!(config.dispatcher.poll_interval(), Duration::from_millis(20));
        assert_eq!(config.dispatcher.event_buffer, 64);
        assert_eq!(config.transmitter.timeout(), Duration::from_millis(500));

        assert_eq!(Fs20Config::from_json_str("{}").unwrap(), Fs20Config::default());
    }

    #[test]
    fn test_json_roundtrip() {
        let mut config = Fs20Config::default();
        config.receiver.timeout_ms = 250;
        let json = config.to_json_string().unwrap();
        assert_eq!(Fs20Config::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            Fs20Config::from_json_str("{not json"),
            Err(Fs20Error::Config(_))
        ));
        assert!(matches!(
            Fs20Config::from_json_str(r#"{"receiver": {"timeout_ms": "fast"}}"#),
            Err(Fs20Error::Config(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("fs20-io-config-test-missing.json");
        assert!(matches!(Fs20Config::load(&path), Err(Fs20Error::Config(_))));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir()
            .join(format!("fs20-io-config-{}", std::process::id()))
            .join("config.json");
        let config = Fs20Config::default();
        config.save(&path).unwrap();
        assert_eq!(Fs20Config::load(&path).unwrap(), config);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}

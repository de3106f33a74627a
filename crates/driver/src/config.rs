//! The `config` module contains the [DriverConfig].

use anyhow::Result;
use fault_dispute_solvers::fault::DEFAULT_METADATA_VERSION;
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

/// The [DriverConfig] struct contains the configuration for the game creator and the
/// [Driver](crate::Driver) implementations. Durations are (de)serialized as milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DriverConfig {
    /// How often bounded waits poll their condition.
    #[serde(with = "millis")]
    pub poll_interval: Duration,
    /// How long to wait for enough output proposals before a game can be created.
    #[serde(with = "millis")]
    pub proposal_timeout: Duration,
    /// How long to wait for the anchor block checkpoint.
    #[serde(with = "millis")]
    pub checkpoint_timeout: Duration,
    /// How long to wait for a created game to reach a claim count or status.
    #[serde(with = "millis")]
    pub status_timeout: Duration,
    /// The max depth of alphabet games.
    pub alphabet_depth: u64,
    /// The max depth of cannon games.
    pub cannon_depth: u64,
    /// The version word written into game metadata.
    pub metadata_version: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            proposal_timeout: Duration::from_secs(120),
            checkpoint_timeout: Duration::from_secs(60),
            status_timeout: Duration::from_secs(60),
            alphabet_depth: 4,
            cannon_depth: 64,
            metadata_version: DEFAULT_METADATA_VERSION,
        }
    }
}

impl DriverConfig {
    /// Parses a [DriverConfig] from JSON. Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a JSON [DriverConfig] from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = DriverConfig::from_json(r#"{ "pollInterval": 50, "alphabetDepth": 3 }"#)
            .unwrap();
        assert_eq!(config.poll_interval, Duration::from_millis(50));
        assert_eq!(config.alphabet_depth, 3);
        assert_eq!(config.proposal_timeout, Duration::from_secs(120));
        assert_eq!(config.status_timeout, Duration::from_secs(60));
        assert_eq!(config.metadata_version, 8);
    }

    #[test]
    fn status_timeout_is_configurable() {
        let config = DriverConfig::from_json(r#"{ "statusTimeout": 250 }"#).unwrap();
        assert_eq!(config.status_timeout, Duration::from_millis(250));
        assert_eq!(config.proposal_timeout, DriverConfig::default().proposal_timeout);
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(DriverConfig::from_json(r#"{ "pollInterval": "soon" }"#).is_err());
    }
}

use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;
use crate::constants::DEFAULT_ELECTION_NAMESPACE;

/// Parameters of the election protocol itself
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ElectionConfig {
    /// Logical path under which all candidacy tokens of this election
    /// group live. Candidates sharing a namespace elect one leader
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Upper bound on how long a candidate waits for a membership-change
    /// notification before re-reading the namespace anyway (milliseconds)
    /// Bounds the staleness window if a notification is lost
    #[serde(default = "default_reconfirm_interval_ms")]
    pub reconfirm_interval_ms: u64,

    /// Pause before the next campaign after a session is lost
    /// (milliseconds). Doubled, with jitter, after each consecutive
    /// bootstrap that failed without resolving a verdict
    #[serde(default = "default_rebootstrap_delay_ms")]
    pub rebootstrap_delay_ms: u64,

    /// Cap on the re-campaign pause (milliseconds)
    #[serde(default = "default_rebootstrap_max_delay_ms")]
    pub rebootstrap_max_delay_ms: u64,
}

impl Default for ElectionConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            reconfirm_interval_ms: default_reconfirm_interval_ms(),
            rebootstrap_delay_ms: default_rebootstrap_delay_ms(),
            rebootstrap_max_delay_ms: default_rebootstrap_max_delay_ms(),
        }
    }
}

impl ElectionConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.namespace.starts_with('/') {
            return Err(Error::Config(ConfigError::Message(format!(
                "election namespace '{}' must be an absolute path",
                self.namespace
            ))));
        }

        if self.namespace.len() < 2 || self.namespace.ends_with('/') {
            return Err(Error::Config(ConfigError::Message(format!(
                "election namespace '{}' must name a non-root node without a trailing slash",
                self.namespace
            ))));
        }

        if self.reconfirm_interval_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "reconfirm_interval_ms must be greater than 0".into(),
            )));
        }

        if self.rebootstrap_delay_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "rebootstrap_delay_ms must be greater than 0".into(),
            )));
        }

        if self.rebootstrap_delay_ms > self.rebootstrap_max_delay_ms {
            return Err(Error::Config(ConfigError::Message(format!(
                "rebootstrap delay {}ms must not exceed its cap {}ms",
                self.rebootstrap_delay_ms, self.rebootstrap_max_delay_ms
            ))));
        }

        Ok(())
    }

    pub fn reconfirm_interval(&self) -> Duration {
        Duration::from_millis(self.reconfirm_interval_ms)
    }

    pub fn rebootstrap_delay(&self) -> Duration {
        Duration::from_millis(self.rebootstrap_delay_ms)
    }

    pub fn rebootstrap_max_delay(&self) -> Duration {
        Duration::from_millis(self.rebootstrap_max_delay_ms)
    }
}

fn default_namespace() -> String {
    DEFAULT_ELECTION_NAMESPACE.to_string()
}
fn default_reconfirm_interval_ms() -> u64 {
    10_000
}
fn default_rebootstrap_delay_ms() -> u64 {
    200
}
fn default_rebootstrap_max_delay_ms() -> u64 {
    10_000
}

use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Connection parameters for the external coordination service
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CoordinationConfig {
    /// Coordination service endpoints, e.g. "localhost:2181"
    /// The connect sequence tries them in order until one accepts
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<String>,

    /// Session timeout negotiated with the coordination service (milliseconds)
    /// The service destroys all ephemeral nodes of a session it has not
    /// heard from within this window
    #[serde(default = "default_session_timeout_ms")]
    pub session_timeout_ms: u64,

    /// Maximum wait for the connect acknowledgment (milliseconds)
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for CoordinationConfig {
    fn default() -> Self {
        Self {
            endpoints: default_endpoints(),
            session_timeout_ms: default_session_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl CoordinationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.endpoints.is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "at least one coordination endpoint must be configured".into(),
            )));
        }

        if self.session_timeout_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "session_timeout_ms must be greater than 0".into(),
            )));
        }

        if self.connect_timeout_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "connect_timeout_ms must be greater than 0".into(),
            )));
        }

        Ok(())
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_millis(self.session_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

fn default_endpoints() -> Vec<String> {
    vec!["localhost:2181".to_string()]
}
fn default_session_timeout_ms() -> u64 {
    3000
}
fn default_connect_timeout_ms() -> u64 {
    3000
}

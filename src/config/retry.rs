use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Basic retry policy template
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default)]
pub struct BackoffPolicy {
    /// Maximum number of attempts before the operation is abandoned
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Single attempt timeout (unit: milliseconds)
    #[serde(default = "default_op_timeout_ms")]
    pub timeout_ms: u64,

    /// Backoff base (unit: milliseconds)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Maximum backoff time (unit: milliseconds)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl BackoffPolicy {
    pub(crate) fn validate(
        &self,
        op_name: &str,
    ) -> Result<()> {
        if self.max_retries == 0 {
            return Err(Error::Config(ConfigError::Message(format!(
                "{op_name} max_retries must be greater than 0",
            ))));
        }

        if self.timeout_ms == 0 {
            return Err(Error::Config(ConfigError::Message(format!(
                "{op_name} timeout_ms must be greater than 0",
            ))));
        }

        if self.base_delay_ms > self.max_delay_ms {
            return Err(Error::Config(ConfigError::Message(format!(
                "{} base delay {}ms must not exceed max delay {}ms",
                op_name, self.base_delay_ms, self.max_delay_ms
            ))));
        }

        Ok(())
    }
}

/// Divide strategies by protocol step
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RetryPolicies {
    // Session establishment strategy (exhaustion here is fatal)
    #[serde(default)]
    pub connect: BackoffPolicy,

    // Candidacy registration strategy
    #[serde(default)]
    pub register: BackoffPolicy,

    // Membership read / leadership resolution strategy
    #[serde(default)]
    pub resolve: BackoffPolicy,
}

// Default value implementation
impl Default for RetryPolicies {
    fn default() -> Self {
        Self {
            connect: BackoffPolicy {
                max_retries: 5,
                timeout_ms: 5000,
                base_delay_ms: 200,
                max_delay_ms: 5000,
            },
            register: BackoffPolicy {
                max_retries: 3,
                timeout_ms: 3000,
                base_delay_ms: 100,
                max_delay_ms: 2000,
            },
            resolve: BackoffPolicy {
                max_retries: 3,
                timeout_ms: 3000,
                base_delay_ms: 100,
                max_delay_ms: 2000,
            },
        }
    }
}

impl RetryPolicies {
    pub fn validate(&self) -> Result<()> {
        self.connect.validate("connect")?;
        self.register.validate("register")?;
        self.resolve.validate("resolve")?;

        Ok(())
    }
}

fn default_max_retries() -> usize {
    3
}
fn default_op_timeout_ms() -> u64 {
    3000
}
fn default_base_delay_ms() -> u64 {
    100
}
fn default_max_delay_ms() -> u64 {
    2000
}

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use super::CandidateHandle;
use super::ElectionController;
use crate::CandidateConfig;
use crate::CoordinationService;
use crate::MemoryCoordination;
use crate::Result;

/// Assembles an election candidate from configuration plus optional
/// component overrides.
///
/// Components default sensibly: the coordination backend defaults to the
/// in-process service and the shutdown token to a fresh one, so a local
/// candidate needs no wiring. Deployments override the backend with an
/// adapter for their coordination cluster and pass the token their signal
/// handling cancels.
pub struct CandidateBuilder {
    config: CandidateConfig,
    service: Option<Arc<dyn CoordinationService>>,
    shutdown: Option<CancellationToken>,
}

impl CandidateBuilder {
    pub fn new(config: CandidateConfig) -> Self {
        Self {
            config,
            service: None,
            shutdown: None,
        }
    }

    /// Starts from the hierarchical configuration sources (defaults, the
    /// `CONFIG_PATH` file, environment overlay).
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(CandidateConfig::new()?))
    }

    /// Applies a configuration file on top of the current values.
    pub fn with_override_config(
        mut self,
        path: &str,
    ) -> Result<Self> {
        info!("with_override_config from: {}", path);
        self.config = self.config.with_override_config(path)?;
        Ok(self)
    }

    /// Overrides the coordination backend the candidate runs against.
    pub fn coordination(
        mut self,
        service: Arc<dyn CoordinationService>,
    ) -> Self {
        self.service = Some(service);
        self
    }

    /// Wires an externally owned cancellation token for graceful shutdown.
    pub fn shutdown_token(
        mut self,
        shutdown: CancellationToken,
    ) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Validates the configuration and assembles the controller with its
    /// observation handle.
    pub fn build(self) -> Result<(ElectionController, CandidateHandle)> {
        let config = self.config.validate()?;
        let service = self
            .service
            .unwrap_or_else(|| Arc::new(MemoryCoordination::new()));
        let shutdown = self.shutdown.unwrap_or_default();
        Ok(ElectionController::new(config, service, shutdown))
    }
}

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::debug;
use tracing::info;

use crate::CoordinationConfig;
use crate::CoordinationError;
use crate::CoordinationEvent;
use crate::CoordinationService;
use crate::CreateMode;
use crate::Error;
use crate::Result;
use crate::SessionHandle;
use crate::SessionId;

/// One live session with the coordination service.
///
/// Owns the session id and the notification channel together, so the
/// consumer that drives the protocol is the only reader of the session's
/// events. Dropping the session without [`Session::close`] leaves cleanup
/// to the service's session timeout.
pub struct Session {
    service: Arc<dyn CoordinationService>,
    session_id: SessionId,
    events: mpsc::UnboundedReceiver<CoordinationEvent>,
    closed: bool,
}

impl Session {
    /// Connects and waits for the service to acknowledge the session.
    ///
    /// The whole sequence is bounded by the configured connect timeout;
    /// if the acknowledgment does not arrive in time the attempt fails
    /// with [`CoordinationError::Timeout`] and the half-open session is
    /// abandoned to the service's own expiry.
    pub async fn connect(
        service: Arc<dyn CoordinationService>,
        config: &CoordinationConfig,
    ) -> Result<Self> {
        let connect_timeout = config.connect_timeout();
        timeout(
            connect_timeout,
            Self::establish(service, config.session_timeout()),
        )
        .await
        .map_err(|_| Error::from(CoordinationError::Timeout(connect_timeout)))?
    }

    async fn establish(
        service: Arc<dyn CoordinationService>,
        session_timeout: Duration,
    ) -> Result<Self> {
        let SessionHandle { session_id, events } = service.connect(session_timeout).await?;
        let mut session = Self {
            service,
            session_id,
            events,
            closed: false,
        };

        match session.next_event().await? {
            CoordinationEvent::SessionConnected => {
                info!(session_id, "Successfully connected to the coordination service");
                Ok(session)
            }
            event => Err(CoordinationError::Connection(format!(
                "expected the session acknowledgment, got {event:?}"
            ))
            .into()),
        }
    }

    pub fn id(&self) -> SessionId {
        self.session_id
    }

    pub async fn create(
        &self,
        path: &str,
        mode: CreateMode,
    ) -> Result<String> {
        self.ensure_open()?;
        self.service.create(self.session_id, path, mode).await
    }

    pub async fn get_children(
        &self,
        path: &str,
    ) -> Result<Vec<String>> {
        self.ensure_open()?;
        self.service.get_children(self.session_id, path).await
    }

    pub async fn watch_children(
        &self,
        path: &str,
    ) -> Result<()> {
        self.ensure_open()?;
        self.service.watch_children(self.session_id, path).await
    }

    /// Waits for the next notification on this session's channel.
    ///
    /// # Errors
    /// - [`CoordinationError::ChannelClosed`] if the service dropped its
    ///   sending side; the session cannot be observed any further
    pub async fn next_event(&mut self) -> Result<CoordinationEvent> {
        self.events
            .recv()
            .await
            .ok_or_else(|| Error::from(CoordinationError::ChannelClosed))
    }

    /// Releases the session and every ephemeral node it owns.
    /// Safe to call more than once; only the first call reaches the
    /// service.
    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        debug!(session_id = self.session_id, "closing coordination session");
        self.service.close(self.session_id).await
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(CoordinationError::NotConnected.into());
        }
        Ok(())
    }
}

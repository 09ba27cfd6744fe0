//! Adapter layer between the election protocol and the coordination
//! service it runs against.
//!
//! The election code never talks to a concrete service. It goes through
//! [`CoordinationService`], which captures the small contract the protocol
//! needs: sessions with server-side liveness, ephemeral sequential nodes,
//! child listing and one-shot child watches. [`memory`] provides the
//! in-process implementation; production deployments plug in an adapter
//! for their coordination cluster behind the same trait.

pub mod memory;

mod event;
mod session;
pub use event::*;
pub use memory::*;
pub use session::*;


// Trait definition of the current module
// -----------------------------------------------------------------------------
// Core model of the election: coordination service contract
//

use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tokio::sync::mpsc;

use crate::Result;

/// Identifier the service assigns to one session at connect time.
/// Never reused, even after the session dies.
pub type SessionId = u64;

/// Everything a successful connect hands back: the assigned session id
/// and the receiving end of the session's notification channel.
///
/// All lifecycle transitions and watch notifications for the session
/// arrive on `events`, in the order the service observed them.
#[derive(Debug)]
pub struct SessionHandle {
    pub session_id: SessionId,
    pub events: mpsc::UnboundedReceiver<CoordinationEvent>,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait CoordinationService: Send + Sync + 'static {
    /// Establishes a new session.
    ///
    /// `session_timeout` is the liveness window negotiated with the
    /// service: if the service hears nothing from the client for that
    /// long, it expires the session and destroys its ephemeral nodes.
    ///
    /// The service queues [`CoordinationEvent::SessionConnected`] as the
    /// first event on the returned channel once the session is live.
    ///
    /// # Errors
    /// - [`CoordinationError::Connection`] if the service is unreachable
    ///
    /// [`CoordinationError::Connection`]: crate::CoordinationError::Connection
    async fn connect(
        &self,
        session_timeout: Duration,
    ) -> Result<SessionHandle>;

    /// Creates a node at `path` and returns the path actually created.
    ///
    /// For [`CreateMode::EphemeralSequential`], `path` is a prefix; the
    /// service appends a zero-padded sequence suffix that is unique and
    /// monotonically increasing across all creations under the same
    /// parent, including concurrent creations from other sessions. The
    /// returned path carries the assigned suffix.
    ///
    /// # Errors
    /// - [`CoordinationError::NotConnected`] if the session is not active
    /// - [`CoordinationError::NodeExists`] for a persistent create on an
    ///   existing path
    /// - [`CoordinationError::NodeNotFound`] if the parent path does not
    ///   exist
    ///
    /// [`CoordinationError::NotConnected`]: crate::CoordinationError::NotConnected
    /// [`CoordinationError::NodeExists`]: crate::CoordinationError::NodeExists
    /// [`CoordinationError::NodeNotFound`]: crate::CoordinationError::NodeNotFound
    async fn create(
        &self,
        session_id: SessionId,
        path: &str,
        mode: CreateMode,
    ) -> Result<String>;

    /// Lists the names (not full paths) of the children of `path`.
    /// No ordering is guaranteed; callers impose their own.
    ///
    /// # Errors
    /// - [`CoordinationError::NotConnected`] if the session is not active
    /// - [`CoordinationError::NodeNotFound`] if `path` does not exist
    ///
    /// [`CoordinationError::NotConnected`]: crate::CoordinationError::NotConnected
    /// [`CoordinationError::NodeNotFound`]: crate::CoordinationError::NodeNotFound
    async fn get_children(
        &self,
        session_id: SessionId,
        path: &str,
    ) -> Result<Vec<String>>;

    /// Arms a one-shot watch on the child set of `path`.
    ///
    /// The next child creation or deletion under `path` delivers one
    /// [`CoordinationEvent::ChildrenChanged`] on the session's channel,
    /// after which the watch is gone and must be re-armed. Arming twice
    /// before the watch fires coalesces into a single registration.
    ///
    /// # Errors
    /// - [`CoordinationError::NotConnected`] if the session is not active
    /// - [`CoordinationError::NodeNotFound`] if `path` does not exist
    ///
    /// [`CoordinationError::NotConnected`]: crate::CoordinationError::NotConnected
    /// [`CoordinationError::NodeNotFound`]: crate::CoordinationError::NodeNotFound
    async fn watch_children(
        &self,
        session_id: SessionId,
        path: &str,
    ) -> Result<()>;

    /// Ends the session and destroys every ephemeral node it owns, firing
    /// the watches of other sessions as those nodes disappear. Closing an
    /// unknown or already-closed session is a no-op.
    async fn close(
        &self,
        session_id: SessionId,
    ) -> Result<()>;
}

/// Session lifecycle and namespace notifications, delivered asynchronously
/// over the channel handed out at connect time.
///
/// Events carry no payload beyond identification. A consumer reacting to
/// `ChildrenChanged` re-reads the namespace itself; the notification only
/// says that a read is worth doing, and spurious notifications are allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinationEvent {
    /// The session is established and operations will be accepted
    SessionConnected,

    /// Connectivity to the service is lost. The session may still be
    /// recovered service-side; no ephemeral state has been dropped yet
    SessionDisconnected,

    /// The service gave up on this session and destroyed every ephemeral
    /// node it owned. The session id is permanently unusable
    SessionExpired,

    /// The child set under a watched path changed (a node appeared or
    /// disappeared). Fired at most once per armed watch
    ChildrenChanged { path: String },
}

/// Durability mode of a node created through the coordination service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateMode {
    /// Survives the creating session. Used for namespace roots
    Persistent,

    /// Bound to the creating session and destroyed with it. The service
    /// appends a unique, monotonically increasing sequence suffix to the
    /// requested path
    EphemeralSequential,
}

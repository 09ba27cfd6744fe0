use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;
use tracing::trace;

use crate::CoordinationError;
use crate::CoordinationEvent;
use crate::CoordinationService;
use crate::CreateMode;
use crate::Result;
use crate::SessionHandle;
use crate::SessionId;
use crate::constants::SEQUENCE_SUFFIX_WIDTH;

/// A node in the in-process hierarchy.
///
/// `owner` is the session that created an ephemeral node; persistent nodes
/// carry no owner and survive every session.
#[derive(Debug, Clone)]
struct NodeRecord {
    owner: Option<SessionId>,
}

/// Service-side view of one live session: the sending half of its
/// notification channel.
#[derive(Debug)]
struct SessionRecord {
    event_tx: mpsc::UnboundedSender<CoordinationEvent>,
}

/// In-process coordination service.
///
/// Implements the full service-side contract the election engine consumes:
/// atomic per-parent sequence assignment, ephemeral ownership with
/// close/expiry cascades, and one-shot child watches delivered over each
/// session's notification channel. All state lives in concurrent maps, so
/// any number of candidates inside one process can share a single instance.
///
/// Sessions never expire on their own here, since the service cannot lose
/// contact with a caller in the same process. Expiry is driven through
/// [`MemoryCoordination::expire_session`], which reproduces exactly what a
/// networked service does when a client goes silent.
pub struct MemoryCoordination {
    /// Full path -> node record
    nodes: DashMap<String, NodeRecord>,
    /// Parent path -> last assigned sequence number. Never decreases,
    /// even when children are deleted
    sequences: DashMap<String, u64>,
    /// Live sessions; removal is what makes a session dead
    sessions: DashMap<SessionId, SessionRecord>,
    /// Parent path -> sessions holding an armed one-shot child watch
    child_watches: DashMap<String, HashSet<SessionId>>,
    next_session_id: AtomicU64,
    reachable: AtomicBool,
}

impl Default for MemoryCoordination {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCoordination {
    pub fn new() -> Self {
        Self {
            nodes: DashMap::new(),
            sequences: DashMap::new(),
            sessions: DashMap::new(),
            child_watches: DashMap::new(),
            next_session_id: AtomicU64::new(1),
            reachable: AtomicBool::new(true),
        }
    }

    /// Fault injection: expires `session_id` as if the service had stopped
    /// hearing from it.
    ///
    /// The owner receives [`CoordinationEvent::SessionExpired`], every
    /// ephemeral node of the session is destroyed, and armed child watches
    /// of other sessions fire for the parents that lost children.
    pub fn expire_session(
        &self,
        session_id: SessionId,
    ) {
        if let Some((_, session)) = self.sessions.remove(&session_id) {
            debug!(session_id, "expiring session");
            let _ = session.event_tx.send(CoordinationEvent::SessionExpired);
            self.purge_ephemerals(session_id);
        }
    }

    /// Fault injection: signals a connectivity loss to `session_id` without
    /// touching its server-side state. The session stays alive and its
    /// ephemeral nodes remain.
    pub fn interrupt_session(
        &self,
        session_id: SessionId,
    ) {
        if let Some(session) = self.sessions.get(&session_id) {
            debug!(session_id, "interrupting session connectivity");
            let _ = session.event_tx.send(CoordinationEvent::SessionDisconnected);
        }
    }

    /// Fault injection: signals that connectivity to `session_id` came back
    /// after an interruption.
    pub fn restore_session(
        &self,
        session_id: SessionId,
    ) {
        if let Some(session) = self.sessions.get(&session_id) {
            debug!(session_id, "restoring session connectivity");
            let _ = session.event_tx.send(CoordinationEvent::SessionConnected);
        }
    }

    /// Fault injection: when `false`, every new connect attempt fails with
    /// a connection error. Existing sessions are unaffected.
    pub fn set_reachable(
        &self,
        reachable: bool,
    ) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    fn require_session(
        &self,
        session_id: SessionId,
    ) -> Result<()> {
        if self.sessions.contains_key(&session_id) {
            Ok(())
        } else {
            Err(CoordinationError::NotConnected.into())
        }
    }

    /// Parent of `path`, or `None` for top-level nodes (their parent is the
    /// implicit root, which is not a node and cannot be watched).
    fn parent_of(path: &str) -> Option<String> {
        match path.rsplit_once('/') {
            Some(("", _)) | None => None,
            Some((parent, _)) => Some(parent.to_string()),
        }
    }

    fn require_parent_exists(
        &self,
        path: &str,
    ) -> Result<()> {
        if let Some(parent) = Self::parent_of(path) {
            if !self.nodes.contains_key(&parent) {
                return Err(CoordinationError::NodeNotFound(parent).into());
            }
        }
        Ok(())
    }

    /// Next sequence number under `parent`. Unique and monotonically
    /// increasing per parent across all sessions; deletions never roll it
    /// back.
    fn next_sequence(
        &self,
        parent: &str,
    ) -> u64 {
        let mut counter = self.sequences.entry(parent.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Fires and disarms every one-shot child watch on `parent`. Sessions
    /// that died since arming are skipped silently.
    fn fire_child_watches(
        &self,
        parent: &str,
    ) {
        if let Some((_, watchers)) = self.child_watches.remove(parent) {
            trace!(parent, watchers = watchers.len(), "firing child watches");
            for session_id in watchers {
                if let Some(session) = self.sessions.get(&session_id) {
                    let _ = session.event_tx.send(CoordinationEvent::ChildrenChanged {
                        path: parent.to_string(),
                    });
                }
            }
        }
    }

    /// Destroys every ephemeral node owned by `session_id` and fires the
    /// child watches of each parent that lost a node.
    fn purge_ephemerals(
        &self,
        session_id: SessionId,
    ) {
        let owned: Vec<String> = self
            .nodes
            .iter()
            .filter(|entry| entry.value().owner == Some(session_id))
            .map(|entry| entry.key().clone())
            .collect();

        let mut touched_parents = HashSet::new();
        for path in owned {
            trace!(session_id, %path, "destroying ephemeral node");
            self.nodes.remove(&path);
            if let Some(parent) = Self::parent_of(&path) {
                touched_parents.insert(parent);
            }
        }

        for parent in touched_parents {
            self.fire_child_watches(&parent);
        }
    }
}

#[async_trait]
impl CoordinationService for MemoryCoordination {
    async fn connect(
        &self,
        _session_timeout: Duration,
    ) -> Result<SessionHandle> {
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(CoordinationError::Connection(
                "coordination service unreachable".to_string(),
            )
            .into());
        }

        let session_id = self.next_session_id.fetch_add(1, Ordering::SeqCst);
        let (event_tx, events) = mpsc::unbounded_channel();

        // Acknowledge before the handle is handed out, so the first event
        // a consumer sees is always the session acknowledgment
        let _ = event_tx.send(CoordinationEvent::SessionConnected);
        self.sessions.insert(session_id, SessionRecord { event_tx });

        debug!(session_id, "session established");
        Ok(SessionHandle { session_id, events })
    }

    async fn create(
        &self,
        session_id: SessionId,
        path: &str,
        mode: CreateMode,
    ) -> Result<String> {
        self.require_session(session_id)?;

        match mode {
            CreateMode::Persistent => {
                self.require_parent_exists(path)?;
                if self.nodes.contains_key(path) {
                    return Err(CoordinationError::NodeExists(path.to_string()).into());
                }
                self.nodes.insert(path.to_string(), NodeRecord { owner: None });
                trace!(session_id, %path, "created persistent node");

                if let Some(parent) = Self::parent_of(path) {
                    self.fire_child_watches(&parent);
                }
                Ok(path.to_string())
            }
            CreateMode::EphemeralSequential => {
                // `path` is a prefix; the parent must already exist
                let parent = Self::parent_of(path)
                    .ok_or_else(|| CoordinationError::NodeNotFound("/".to_string()))?;
                if !self.nodes.contains_key(&parent) {
                    return Err(CoordinationError::NodeNotFound(parent).into());
                }

                let sequence = self.next_sequence(&parent);
                let assigned = format!("{path}{sequence:0width$}", width = SEQUENCE_SUFFIX_WIDTH);
                self.nodes.insert(
                    assigned.clone(),
                    NodeRecord {
                        owner: Some(session_id),
                    },
                );
                trace!(session_id, %assigned, "created ephemeral sequential node");

                self.fire_child_watches(&parent);
                Ok(assigned)
            }
        }
    }

    async fn get_children(
        &self,
        session_id: SessionId,
        path: &str,
    ) -> Result<Vec<String>> {
        self.require_session(session_id)?;
        if !self.nodes.contains_key(path) {
            return Err(CoordinationError::NodeNotFound(path.to_string()).into());
        }

        let prefix = format!("{path}/");
        let children = self
            .nodes
            .iter()
            .filter_map(|entry| {
                entry
                    .key()
                    .strip_prefix(&prefix)
                    .filter(|name| !name.contains('/'))
                    .map(str::to_string)
            })
            .collect();
        Ok(children)
    }

    async fn watch_children(
        &self,
        session_id: SessionId,
        path: &str,
    ) -> Result<()> {
        self.require_session(session_id)?;
        if !self.nodes.contains_key(path) {
            return Err(CoordinationError::NodeNotFound(path.to_string()).into());
        }

        // Arming twice before the watch fires coalesces into one registration
        self.child_watches
            .entry(path.to_string())
            .or_default()
            .insert(session_id);
        trace!(session_id, %path, "armed one-shot child watch");
        Ok(())
    }

    async fn close(
        &self,
        session_id: SessionId,
    ) -> Result<()> {
        if let Some((_, _session)) = self.sessions.remove(&session_id) {
            debug!(session_id, "session closed");
            self.purge_ephemerals(session_id);
        }
        Ok(())
    }
}

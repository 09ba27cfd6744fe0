use tracing::debug;
use tracing::warn;

use super::CandidacyToken;
use crate::ElectionError;
use crate::Error;
use crate::Result;
use crate::Session;

/// What one resolution concluded about this candidate.
///
/// Derived from a single membership snapshot and never carried across
/// snapshots; the next resolution recomputes it from scratch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeadershipVerdict {
    /// This candidate holds the smallest sequence and leads the group
    Leader,
    /// Another candidate leads; `leader` is its node name
    Follower { leader: String },
}

impl LeadershipVerdict {
    pub fn is_leader(&self) -> bool {
        matches!(self, LeadershipVerdict::Leader)
    }
}

/// Computes leadership verdicts from membership snapshots.
pub struct LeadershipResolver {
    namespace: String,
}

impl LeadershipResolver {
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
        }
    }

    /// Reads the current membership and decides whether `my_token` leads.
    ///
    /// The one-shot child watch is re-armed before the namespace is read,
    /// so a membership change racing with the read still produces a
    /// notification; at worst the next resolution sees an unchanged
    /// snapshot. The verdict is a pure function of the snapshot, so
    /// resolving twice against the same membership yields the same answer.
    pub async fn resolve(
        &self,
        session: &Session,
        my_token: &CandidacyToken,
    ) -> Result<LeadershipVerdict> {
        session.watch_children(&self.namespace).await?;
        let children = session.get_children(&self.namespace).await?;

        let mut members = Vec::with_capacity(children.len());
        for name in &children {
            members.push(CandidacyToken::parse(name)?);
        }
        members.sort_unstable();

        // An empty snapshot, or one missing our own node, means this
        // session's registration is gone. Only a fresh one fixes that.
        if members.binary_search(my_token).is_err() {
            warn!(
                namespace = %self.namespace,
                token = %my_token,
                "own candidacy token missing from the membership snapshot"
            );
            return Err(Error::Election(ElectionError::RegistrationVanished {
                namespace: self.namespace.clone(),
                token: my_token.name.clone(),
            }));
        }

        let minimum = &members[0];
        let verdict = if minimum == my_token {
            LeadershipVerdict::Leader
        } else {
            LeadershipVerdict::Follower {
                leader: minimum.name.clone(),
            }
        };

        debug!(
            namespace = %self.namespace,
            members = members.len(),
            token = %my_token,
            ?verdict,
            "resolved leadership"
        );
        Ok(verdict)
    }
}

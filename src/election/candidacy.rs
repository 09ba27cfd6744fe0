use std::cmp::Ordering;
use std::fmt;

use tracing::debug;
use tracing::info;

use crate::CoordinationError;
use crate::CreateMode;
use crate::ElectionError;
use crate::Error;
use crate::Result;
use crate::Session;
use crate::constants::CANDIDATE_PREFIX;

/// One registered candidacy: the node name the service assigned under the
/// election namespace, plus the sequence number parsed from its suffix.
///
/// Ordering is numeric on `sequence`. Zero-padded names happen to sort the
/// same way lexically until the counter outgrows the pad width, so string
/// comparison is never used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidacyToken {
    /// Node name without the namespace path, e.g. `c_12_0000000007`
    pub name: String,
    /// Service-assigned sequence number parsed from the name's suffix
    pub sequence: u64,
}

impl CandidacyToken {
    /// Parses a child node name (namespace path already stripped).
    ///
    /// The sequence is the trailing run of ASCII digits. A name without
    /// one cannot participate in the election order and is rejected.
    pub(crate) fn parse(name: &str) -> Result<Self> {
        let stem = name.trim_end_matches(|c: char| c.is_ascii_digit());
        let suffix = &name[stem.len()..];

        let sequence = suffix
            .parse::<u64>()
            .map_err(|_| ElectionError::MalformedToken(name.to_string()))?;

        Ok(Self {
            name: name.to_string(),
            sequence,
        })
    }
}

impl Ord for CandidacyToken {
    fn cmp(
        &self,
        other: &Self,
    ) -> Ordering {
        // The service never assigns the same sequence twice under one
        // parent; the name tiebreak only keeps the order total
        self.sequence
            .cmp(&other.sequence)
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl PartialOrd for CandidacyToken {
    fn partial_cmp(
        &self,
        other: &Self,
    ) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for CandidacyToken {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Enters a candidate into an election group by creating its ephemeral
/// sequential node under the group's namespace.
pub struct CandidacyRegistrar {
    namespace: String,
}

impl CandidacyRegistrar {
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
        }
    }

    /// Registers this candidate and returns the token the service
    /// assigned.
    ///
    /// The namespace is ensured first, so the first candidate of a fresh
    /// deployment needs no out-of-band setup. Token names embed the
    /// session id (`c_<session>_<sequence>`): a create whose
    /// acknowledgment never arrived leaves a node this session can still
    /// recognize, and a retried call adopts that node instead of
    /// registering a second time. Either way a session holds at most one
    /// token.
    pub async fn register(
        &self,
        session: &Session,
    ) -> Result<CandidacyToken> {
        self.ensure_namespace(session).await?;

        if let Some(token) = self.find_own_token(session).await? {
            info!(
                session_id = session.id(),
                token = %token,
                "adopted candidacy from an unacknowledged registration"
            );
            return Ok(token);
        }

        let prefix = format!("{}/{}{}_", self.namespace, CANDIDATE_PREFIX, session.id());
        let assigned = session.create(&prefix, CreateMode::EphemeralSequential).await?;

        // Verdicts work on child names; drop the namespace path
        let name = match assigned.rsplit_once('/') {
            Some((_, name)) => name,
            None => assigned.as_str(),
        };

        let token = CandidacyToken::parse(name)?;
        info!(session_id = session.id(), token = %token, "registered candidacy");
        Ok(token)
    }

    /// Looks for a token already carrying this session's marker. The
    /// smallest one wins should an earlier life of the session have left
    /// more than one behind.
    async fn find_own_token(
        &self,
        session: &Session,
    ) -> Result<Option<CandidacyToken>> {
        let marker = format!("{}{}_", CANDIDATE_PREFIX, session.id());

        let mut own = Vec::new();
        for name in session.get_children(&self.namespace).await? {
            if name.starts_with(&marker) {
                own.push(CandidacyToken::parse(&name)?);
            }
        }
        own.sort_unstable();
        Ok(own.into_iter().next())
    }

    /// Creates each missing component of the namespace path as a
    /// persistent node. Losing the create race to a peer doing the same
    /// is success.
    async fn ensure_namespace(
        &self,
        session: &Session,
    ) -> Result<()> {
        let mut path = String::with_capacity(self.namespace.len());
        for component in self.namespace.split('/').filter(|c| !c.is_empty()) {
            path.push('/');
            path.push_str(component);

            match session.create(&path, CreateMode::Persistent).await {
                Ok(_) => debug!(%path, "created election namespace node"),
                Err(Error::Coordination(CoordinationError::NodeExists(_))) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

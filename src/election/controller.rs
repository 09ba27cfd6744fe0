use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::trace;
use tracing::warn;

use super::CandidacyRegistrar;
use super::CandidacyToken;
use super::LeadershipResolver;
use super::LeadershipVerdict;
use crate::CandidateConfig;
use crate::CoordinationError;
use crate::CoordinationEvent;
use crate::CoordinationService;
use crate::Error;
use crate::Result;
use crate::Session;
use crate::SessionId;
use crate::utils::retry_with_backoff;

const CONNECT_OP: &str = "connect";
const REGISTER_OP: &str = "register";
const RESOLVE_OP: &str = "resolve";

/// Where a candidate currently stands in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElectionPhase {
    /// Built but not yet running
    #[default]
    Idle,
    /// Establishing a session with the coordination service
    Connecting,
    /// Creating this candidate's ephemeral sequential token
    Registering,
    /// Reading the membership and computing the verdict
    Resolving,
    /// Parked until a membership change, the reconfirm deadline or shutdown
    Waiting,
    /// Stopped; the session is released
    Closed,
}

/// Session-derived state shared with observers. One mutex guards the
/// fields that must change together.
#[derive(Debug, Default)]
pub(crate) struct CandidateState {
    pub(crate) phase: ElectionPhase,
    pub(crate) session_id: Option<SessionId>,
    pub(crate) token: Option<CandidacyToken>,
}

/// Drives one candidate through the election protocol.
///
/// The controller is the single logical control task of the candidate;
/// every [`ElectionPhase`] transition happens here. It owns the session,
/// and observers see the candidate through the [`CandidateHandle`]
/// returned at build time.
pub struct ElectionController {
    config: CandidateConfig,
    service: Arc<dyn CoordinationService>,
    registrar: CandidacyRegistrar,
    resolver: LeadershipResolver,
    state: Arc<Mutex<CandidateState>>,
    verdict_tx: watch::Sender<Option<LeadershipVerdict>>,
    shutdown: CancellationToken,
}

/// Cloneable observation surface over a running candidate.
///
/// Reads never block the control task: phase and token live behind a
/// short-lived mutex, verdicts come over a watch channel.
#[derive(Clone)]
pub struct CandidateHandle {
    state: Arc<Mutex<CandidateState>>,
    verdicts: watch::Receiver<Option<LeadershipVerdict>>,
    shutdown: CancellationToken,
}

impl ElectionController {
    pub(crate) fn new(
        config: CandidateConfig,
        service: Arc<dyn CoordinationService>,
        shutdown: CancellationToken,
    ) -> (Self, CandidateHandle) {
        let namespace = config.election.namespace.as_str();
        let registrar = CandidacyRegistrar::new(namespace);
        let resolver = LeadershipResolver::new(namespace);
        let state = Arc::new(Mutex::new(CandidateState::default()));
        let (verdict_tx, verdicts) = watch::channel(None);

        let handle = CandidateHandle {
            state: state.clone(),
            verdicts,
            shutdown: shutdown.clone(),
        };
        let controller = Self {
            config,
            service,
            registrar,
            resolver,
            state,
            verdict_tx,
            shutdown,
        };
        (controller, handle)
    }

    /// Runs the candidate until shutdown or an unrecoverable error.
    ///
    /// Each campaign is one full bootstrap: connect, register, then follow
    /// the membership until the session dies. Session loss starts the next
    /// campaign with everything rebuilt, after a jittered pause that keeps
    /// doubling, up to the configured cap, while bootstraps fail without
    /// ever resolving a verdict. Only connect-retry exhaustion ends the
    /// controller with an error; shutdown ends it cleanly from any phase.
    pub async fn run(self) -> Result<()> {
        info!(
            namespace = %self.config.election.namespace,
            "election controller starting"
        );

        let base_delay = self.config.election.rebootstrap_delay();
        let max_delay = self.config.election.rebootstrap_max_delay();
        let mut recampaign_delay = base_delay;

        loop {
            let outcome = self.campaign().await;

            // A campaign that resolved a verdict was healthy; losing it
            // does not count toward the failure streak
            if self.verdict_tx.borrow().is_some() {
                recampaign_delay = base_delay;
            }
            self.clear_session_state();

            match outcome {
                Ok(()) | Err(Error::Shutdown) => {
                    self.set_phase(ElectionPhase::Closed);
                    info!("election controller stopped");
                    return Ok(());
                }
                Err(error) if Self::should_rebootstrap(&error) => {
                    if self.shutdown.is_cancelled() {
                        self.set_phase(ElectionPhase::Closed);
                        info!("election controller stopped");
                        return Ok(());
                    }
                    warn!(
                        ?error,
                        delay = ?recampaign_delay,
                        "session lost, re-entering the election"
                    );

                    let jitter = Duration::from_millis(rand::random::<u64>() % 100);
                    tokio::select! {
                        biased;
                        _ = self.shutdown.cancelled() => {
                            self.set_phase(ElectionPhase::Closed);
                            info!("election controller stopped");
                            return Ok(());
                        }
                        _ = sleep(recampaign_delay + jitter) => {}
                    }
                    recampaign_delay = (recampaign_delay * 2).min(max_delay);
                }
                Err(error) => {
                    self.set_phase(ElectionPhase::Closed);
                    error!(?error, "election controller giving up");
                    return Err(error);
                }
            }
        }
    }

    /// One bootstrap cycle. However it ends, the session is released
    /// before returning; the session-derived observer state stays in
    /// place until [`Self::run`] has read it.
    async fn campaign(&self) -> Result<()> {
        self.set_phase(ElectionPhase::Connecting);
        let mut session = self.connect_session().await?;

        let outcome = self.run_session(&mut session).await;

        // Peers observe the departure as soon as the close lands; if the
        // session is already dead this is a no-op
        if let Err(close_error) = session.close().await {
            debug!(?close_error, "session close failed during teardown");
        }
        outcome
    }

    async fn connect_session(&self) -> Result<Session> {
        let service = self.service.clone();
        let coordination = &self.config.coordination;

        let session = retry_with_backoff(
            CONNECT_OP,
            &self.config.retry.connect,
            &self.shutdown,
            || Session::connect(service.clone(), coordination),
        )
        .await?;

        self.state.lock().session_id = Some(session.id());
        Ok(session)
    }

    /// Registers once on the fresh session, then follows the membership
    /// until an error ends the session's usefulness.
    async fn run_session(
        &self,
        session: &mut Session,
    ) -> Result<()> {
        self.set_phase(ElectionPhase::Registering);
        let token = {
            let session_ref: &Session = session;
            retry_with_backoff(
                REGISTER_OP,
                &self.config.retry.register,
                &self.shutdown,
                || self.registrar.register(session_ref),
            )
            .await?
        };
        self.state.lock().token = Some(token.clone());

        loop {
            self.set_phase(ElectionPhase::Resolving);
            let verdict = {
                let session_ref: &Session = session;
                retry_with_backoff(
                    RESOLVE_OP,
                    &self.config.retry.resolve,
                    &self.shutdown,
                    || self.resolver.resolve(session_ref, &token),
                )
                .await?
            };
            self.publish_verdict(verdict);

            self.set_phase(ElectionPhase::Waiting);
            self.wait_for_change(session).await?;
        }
    }

    /// Parks the candidate until another resolution is warranted.
    ///
    /// Wakes on a child-watch notification or on the reconfirm deadline,
    /// so a lost notification delays re-resolution by at most one
    /// reconfirm interval. A disconnect alone does not end the wait; the
    /// service decides the session's fate (recovery or expiry).
    async fn wait_for_change(
        &self,
        session: &mut Session,
    ) -> Result<()> {
        let deadline = sleep(self.config.election.reconfirm_interval());
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    info!("shutdown requested, leaving the election");
                    return Err(Error::Shutdown);
                }
                event = session.next_event() => {
                    match event? {
                        CoordinationEvent::ChildrenChanged { path } => {
                            debug!(%path, "membership change notification");
                            return Ok(());
                        }
                        CoordinationEvent::SessionExpired => {
                            warn!(session_id = session.id(), "session expired");
                            return Err(CoordinationError::SessionExpired {
                                session_id: session.id(),
                            }
                            .into());
                        }
                        CoordinationEvent::SessionDisconnected => {
                            // The session may still be recovered; stay parked
                            warn!("Disconnected from the coordination service");
                        }
                        CoordinationEvent::SessionConnected => {
                            // Notifications may have been lost during the
                            // gap; re-read the membership
                            info!("Reconnected to the coordination service");
                            return Ok(());
                        }
                    }
                }
                _ = &mut deadline => {
                    trace!("reconfirm deadline passed, re-reading the membership");
                    return Ok(());
                }
            }
        }
    }

    /// Emits the verdict to observers on every resolution. Announced
    /// loudly only when it changed, so steady-state re-resolutions keep
    /// the logs quiet.
    fn publish_verdict(
        &self,
        verdict: LeadershipVerdict,
    ) {
        let previous = self.verdict_tx.send_replace(Some(verdict.clone()));
        if previous.as_ref() == Some(&verdict) {
            debug!(?verdict, "leadership verdict unchanged");
            return;
        }

        match &verdict {
            LeadershipVerdict::Leader => info!("I am the leader"),
            LeadershipVerdict::Follower { leader } => {
                info!("I am not the leader, {} is the leader", leader);
            }
        }
    }

    /// Session-scoped errors rebuild the candidate from scratch; connect
    /// exhaustion and configuration errors do not.
    fn should_rebootstrap(error: &Error) -> bool {
        match error {
            Error::RetryExhausted { operation, .. } => *operation != CONNECT_OP,
            error => error.requires_rebootstrap(),
        }
    }

    fn set_phase(
        &self,
        phase: ElectionPhase,
    ) {
        let mut state = self.state.lock();
        if state.phase != phase {
            trace!(from = ?state.phase, to = ?phase, "phase transition");
            state.phase = phase;
        }
    }

    fn clear_session_state(&self) {
        {
            let mut state = self.state.lock();
            state.session_id = None;
            state.token = None;
        }
        self.verdict_tx.send_replace(None);
    }
}

impl CandidateHandle {
    pub fn phase(&self) -> ElectionPhase {
        self.state.lock().phase
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.state.lock().session_id
    }

    pub fn current_token(&self) -> Option<CandidacyToken> {
        self.state.lock().token.clone()
    }

    /// Latest verdict, if the candidate has resolved one on its current
    /// session.
    pub fn verdict(&self) -> Option<LeadershipVerdict> {
        self.verdicts.borrow().clone()
    }

    pub fn is_leader(&self) -> bool {
        self.verdicts
            .borrow()
            .as_ref()
            .map(LeadershipVerdict::is_leader)
            .unwrap_or(false)
    }

    /// Watch channel carrying the verdict of every resolution. `None`
    /// while no session holds a resolved verdict.
    pub fn verdicts(&self) -> watch::Receiver<Option<LeadershipVerdict>> {
        self.verdicts.clone()
    }

    /// Requests a graceful stop. The controller releases its session and
    /// returns `Ok(())` from [`ElectionController::run`].
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

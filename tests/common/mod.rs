use std::sync::Arc;
use std::time::Duration;

use doyen::BackoffPolicy;
use doyen::CandidateBuilder;
use doyen::CandidateConfig;
use doyen::CandidateHandle;
use doyen::CoordinationConfig;
use doyen::ElectionConfig;
use doyen::LeadershipVerdict;
use doyen::MemoryCoordination;
use doyen::Result;
use doyen::RetryPolicies;
use tokio::task::JoinHandle;
use tokio::time;
use tokio::time::timeout;

pub const CONVERGENCE_TIMEOUT: Duration = Duration::from_secs(5);

/// Tight timings for in-process elections: failing operations exhaust
/// quickly and the reconfirm poll is short enough to catch anything a
/// notification race might hide.
pub fn test_config(namespace: &str) -> CandidateConfig {
    let policy = BackoffPolicy {
        max_retries: 3,
        timeout_ms: 500,
        base_delay_ms: 5,
        max_delay_ms: 20,
    };
    CandidateConfig {
        coordination: CoordinationConfig {
            endpoints: vec!["memory".to_string()],
            session_timeout_ms: 1000,
            connect_timeout_ms: 1000,
        },
        election: ElectionConfig {
            namespace: namespace.to_string(),
            reconfirm_interval_ms: 200,
            rebootstrap_delay_ms: 50,
            rebootstrap_max_delay_ms: 1000,
        },
        retry: RetryPolicies {
            connect: policy,
            register: policy,
            resolve: policy,
        },
    }
}

/// One spawned candidate: its observation handle plus the running
/// controller task.
pub struct TestCandidate {
    pub handle: CandidateHandle,
    pub task: JoinHandle<Result<()>>,
}

impl TestCandidate {
    /// Requests shutdown and verifies the controller ends cleanly.
    pub async fn stop(self) {
        self.handle.shutdown();
        self.task
            .await
            .expect("candidate task should join")
            .expect("candidate should stop cleanly");
    }
}

pub fn spawn_candidate(
    service: &Arc<MemoryCoordination>,
    namespace: &str,
) -> TestCandidate {
    let (controller, handle) = CandidateBuilder::new(test_config(namespace))
        .coordination(service.clone())
        .build()
        .expect("candidate should build");
    TestCandidate {
        handle,
        task: tokio::spawn(controller.run()),
    }
}

/// Waits until the candidate has resolved any verdict and returns it.
pub async fn wait_for_verdict(candidate: &TestCandidate) -> LeadershipVerdict {
    let mut verdicts = candidate.handle.verdicts();
    let verdict = timeout(CONVERGENCE_TIMEOUT, verdicts.wait_for(|v| v.is_some()))
        .await
        .expect("verdict should arrive in time")
        .expect("verdict channel should stay open")
        .clone();
    verdict.expect("verdict should be set")
}

pub async fn wait_until(
    what: &str,
    condition: impl Fn() -> bool,
) {
    timeout(CONVERGENCE_TIMEOUT, async {
        while !condition() {
            time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {what}"));
}

/// The leader node name this candidate currently believes in: its own
/// token when it leads, the resolved leader's name when it follows.
pub fn believed_leader(handle: &CandidateHandle) -> Option<String> {
    match handle.verdict()? {
        LeadershipVerdict::Leader => handle.current_token().map(|t| t.name),
        LeadershipVerdict::Follower { leader } => Some(leader),
    }
}

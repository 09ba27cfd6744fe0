//! Case 3: A group of one, and the idempotence of re-resolution.
//!
//! Scenario:
//!
//! 1. A single candidate joins an empty namespace.
//! 2. Nothing else ever changes the membership; the reconfirm poll keeps
//!    re-reading it anyway.
//!
//! Expected Result:
//!
//! - The candidate immediately leads.
//! - Repeated resolutions of the unchanged membership re-emit the same
//!   verdict: still leader, same token, same session.

use std::sync::Arc;
use std::time::Duration;

use doyen::LeadershipVerdict;
use doyen::MemoryCoordination;
use tokio::time::timeout;
use tracing_test::traced_test;

use crate::common::spawn_candidate;
use crate::common::wait_for_verdict;

const NAMESPACE: &str = "/election";

#[tokio::test]
#[traced_test]
async fn test_a_group_of_one_elects_itself() {
    let service = Arc::new(MemoryCoordination::new());

    let candidate = spawn_candidate(&service, NAMESPACE);
    assert_eq!(wait_for_verdict(&candidate).await, LeadershipVerdict::Leader);

    let token = candidate.handle.current_token().expect("token should be set");
    let session = candidate.handle.session_id().expect("session id should be set");
    assert_eq!(token.sequence, 1);

    // Let the reconfirm poll drive at least one re-resolution; every
    // emission of the unchanged membership must carry the same verdict
    let mut verdicts = candidate.handle.verdicts();
    verdicts.borrow_and_update();
    timeout(Duration::from_secs(2), verdicts.changed())
        .await
        .expect("the reconfirm poll should re-emit in time")
        .expect("verdict channel should stay open");

    assert_eq!(*verdicts.borrow(), Some(LeadershipVerdict::Leader));
    assert_eq!(candidate.handle.current_token(), Some(token));
    assert_eq!(candidate.handle.session_id(), Some(session));
    assert!(candidate.handle.is_leader());

    candidate.stop().await;
}

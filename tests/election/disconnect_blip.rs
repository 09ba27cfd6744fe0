//! Case 5: A connectivity blip is not a membership change.
//!
//! Scenario:
//!
//! 1. Candidates A (leader) and B (follower) run steadily.
//! 2. A loses connectivity to the coordination service and regains it
//!    before the service gives up on the session.
//!
//! Expected Result:
//!
//! - A keeps its session and token across the blip; no re-registration
//!   happens.
//! - Leadership never moves: A stays leader, B keeps following A.

use std::sync::Arc;

use doyen::MemoryCoordination;
use tokio::time::timeout;
use tracing_test::traced_test;

use crate::common::CONVERGENCE_TIMEOUT;
use crate::common::believed_leader;
use crate::common::spawn_candidate;
use crate::common::wait_for_verdict;

const NAMESPACE: &str = "/election";

#[tokio::test]
#[traced_test]
async fn test_a_disconnect_blip_does_not_move_leadership() {
    let service = Arc::new(MemoryCoordination::new());

    let a = spawn_candidate(&service, NAMESPACE);
    wait_for_verdict(&a).await;
    let b = spawn_candidate(&service, NAMESPACE);
    wait_for_verdict(&b).await;

    let a_session = a.handle.session_id().expect("session id should be set");
    let a_token = a.handle.current_token().expect("token should be set");
    let a_name = a_token.name.clone();

    // Blip: the reconnection triggers one fresh resolution on A
    let mut a_verdicts = a.handle.verdicts();
    a_verdicts.borrow_and_update();
    service.interrupt_session(a_session);
    service.restore_session(a_session);
    timeout(CONVERGENCE_TIMEOUT, a_verdicts.changed())
        .await
        .expect("the post-blip resolution should be emitted in time")
        .expect("verdict channel should stay open");

    // Same session, same token, same leader
    assert_eq!(a.handle.session_id(), Some(a_session));
    assert_eq!(a.handle.current_token(), Some(a_token));
    assert!(a.handle.is_leader());
    assert_eq!(believed_leader(&b.handle), Some(a_name));
    assert!(!b.handle.is_leader());

    a.stop().await;
    b.stop().await;
}

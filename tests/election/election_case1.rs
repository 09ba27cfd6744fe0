//! Case 1: Leader failover after session expiry, with the old leader
//! rejoining at the back of the queue.
//!
//! Scenario:
//!
//! 1. Candidates A, B, C join one election group in order.
//! 2. A holds the smallest sequence and leads; B and C follow A.
//! 3. A's session expires (crash seen service-side).
//! 4. A's controller re-bootstraps and registers a fresh token.
//!
//! Expected Result:
//!
//! - B is promoted (now the smallest sequence) and C follows B.
//! - A comes back as a follower of B with a sequence larger than every
//!   earlier one; its old sequence is never reused.

use std::sync::Arc;

use doyen::LeadershipVerdict;
use doyen::MemoryCoordination;
use tracing_test::traced_test;

use crate::common::believed_leader;
use crate::common::spawn_candidate;
use crate::common::wait_for_verdict;
use crate::common::wait_until;

const NAMESPACE: &str = "/election";

#[tokio::test]
#[traced_test]
async fn test_leader_failover_and_rejoin() {
    let service = Arc::new(MemoryCoordination::new());

    let a = spawn_candidate(&service, NAMESPACE);
    assert_eq!(wait_for_verdict(&a).await, LeadershipVerdict::Leader);
    let a_name = a.handle.current_token().expect("token should be set").name;
    let a_session = a.handle.session_id().expect("session id should be set");

    let b = spawn_candidate(&service, NAMESPACE);
    assert_eq!(
        wait_for_verdict(&b).await,
        LeadershipVerdict::Follower {
            leader: a_name.clone()
        }
    );
    let b_name = b.handle.current_token().expect("token should be set").name;

    let c = spawn_candidate(&service, NAMESPACE);
    assert_eq!(
        wait_for_verdict(&c).await,
        LeadershipVerdict::Follower {
            leader: a_name.clone()
        }
    );

    // Registration order fixes the sequence order
    let sequences = [
        a.handle.current_token().expect("token should be set").sequence,
        b.handle.current_token().expect("token should be set").sequence,
        c.handle.current_token().expect("token should be set").sequence,
    ];
    assert_eq!(sequences, [1, 2, 3]);

    // The leader crashes
    service.expire_session(a_session);

    wait_until("B to take over leadership", || b.handle.is_leader()).await;
    wait_until("C to follow B", || {
        believed_leader(&c.handle) == Some(b_name.clone())
    })
    .await;

    // A rejoins behind everyone and recognizes B
    wait_until("A to rejoin as a follower of B", || {
        believed_leader(&a.handle) == Some(b_name.clone())
    })
    .await;

    let rejoined = a.handle.current_token().expect("token should be set");
    assert_eq!(rejoined.sequence, 4, "a rejoin must take a fresh, larger sequence");
    assert_ne!(rejoined.name, a_name);
    assert!(!a.handle.is_leader());
    assert!(!c.handle.is_leader());

    a.stop().await;
    b.stop().await;
    c.stop().await;
}

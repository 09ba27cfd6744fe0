//! Case 4: Clean departures re-elect without losing agreement.
//!
//! Scenario:
//!
//! 1. Candidates A, B, C run; A leads.
//! 2. A shuts down gracefully (session closed, token released).
//! 3. B, now the smallest sequence, takes over; later B departs too.
//!
//! Expected Result:
//!
//! - Every departure promotes the next-smallest sequence and the
//!   remaining candidates agree on it.
//! - Each stopped controller returns cleanly.
//! - After the last departure the namespace holds no candidacy tokens.

use std::sync::Arc;

use doyen::LeadershipVerdict;
use doyen::MemoryCoordination;
use doyen::Session;
use tracing_test::traced_test;

use crate::common::believed_leader;
use crate::common::spawn_candidate;
use crate::common::test_config;
use crate::common::wait_for_verdict;
use crate::common::wait_until;

const NAMESPACE: &str = "/election";

#[tokio::test]
#[traced_test]
async fn test_graceful_departures_promote_in_sequence_order() {
    let service = Arc::new(MemoryCoordination::new());

    let a = spawn_candidate(&service, NAMESPACE);
    assert_eq!(wait_for_verdict(&a).await, LeadershipVerdict::Leader);
    let b = spawn_candidate(&service, NAMESPACE);
    wait_for_verdict(&b).await;
    let c = spawn_candidate(&service, NAMESPACE);
    wait_for_verdict(&c).await;

    let b_name = b.handle.current_token().expect("token should be set").name;
    let c_name = c.handle.current_token().expect("token should be set").name;

    // First departure: the leader leaves on its own terms
    a.stop().await;

    wait_until("B to take over leadership", || b.handle.is_leader()).await;
    wait_until("C to follow B", || {
        believed_leader(&c.handle) == Some(b_name.clone())
    })
    .await;

    // Second departure
    b.stop().await;

    wait_until("C to take over leadership", || c.handle.is_leader()).await;
    assert_eq!(believed_leader(&c.handle), Some(c_name));

    c.stop().await;

    // No token may survive its candidate
    let observer = Session::connect(service.clone(), &test_config(NAMESPACE).coordination)
        .await
        .expect("observer connect should succeed");
    let children = observer
        .get_children(NAMESPACE)
        .await
        .expect("namespace listing should succeed");
    assert!(children.is_empty(), "departed candidates must leave nothing behind");
}

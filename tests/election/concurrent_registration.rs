//! Case 2: Concurrent candidacies settle on exactly one leader.
//!
//! Scenario:
//!
//! 1. Five candidates are spawned back to back, registering concurrently
//!    against the same namespace.
//! 2. Every candidate resolves a verdict.
//!
//! Expected Result:
//!
//! - The service hands out five distinct, strictly increasing sequences.
//! - Exactly one candidate believes it is the leader.
//! - All five believe in the same leader: the holder of the smallest
//!   sequence.

use std::collections::HashSet;
use std::sync::Arc;

use doyen::MemoryCoordination;
use tracing_test::traced_test;

use crate::common::TestCandidate;
use crate::common::believed_leader;
use crate::common::spawn_candidate;
use crate::common::wait_for_verdict;

const NAMESPACE: &str = "/election";
const CANDIDATES: usize = 5;

#[tokio::test]
#[traced_test]
async fn test_concurrent_candidacies_elect_exactly_one_leader() {
    let service = Arc::new(MemoryCoordination::new());

    let candidates: Vec<TestCandidate> = (0..CANDIDATES)
        .map(|_| spawn_candidate(&service, NAMESPACE))
        .collect();
    for candidate in &candidates {
        wait_for_verdict(candidate).await;
    }

    // Five distinct sequences, nothing skipped, nothing reused
    let mut sequences: Vec<u64> = candidates
        .iter()
        .map(|c| c.handle.current_token().expect("token should be set").sequence)
        .collect();
    sequences.sort_unstable();
    assert_eq!(sequences, vec![1, 2, 3, 4, 5]);

    // Exactly one self-declared leader
    let leaders: Vec<&TestCandidate> =
        candidates.iter().filter(|c| c.handle.is_leader()).collect();
    assert_eq!(leaders.len(), 1, "exactly one candidate may lead");

    // Unanimous agreement on who that is
    let beliefs: HashSet<Option<String>> =
        candidates.iter().map(|c| believed_leader(&c.handle)).collect();
    assert_eq!(beliefs.len(), 1, "all candidates must name the same leader");

    // And it is the holder of the smallest sequence
    let leader_token = leaders[0].handle.current_token().expect("token should be set");
    assert_eq!(leader_token.sequence, 1);
    assert_eq!(beliefs.into_iter().next(), Some(Some(leader_token.name)));

    for candidate in candidates {
        candidate.stop().await;
    }
}

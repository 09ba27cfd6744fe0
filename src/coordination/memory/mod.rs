//! In-process implementation of the coordination service contract.
//!
//! Gives a cluster of candidates running inside one process the same
//! semantics a networked coordination service would: session-scoped
//! ephemeral nodes, atomic sequence assignment and one-shot child
//! watches, plus fault injection hooks for exercising expiry and
//! connectivity loss.

mod service;
pub use service::*;

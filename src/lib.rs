//! Leader election for peer processes over a ZooKeeper-style coordination
//! service.
//!
//! Each process runs one candidate: it registers an ephemeral sequential
//! token under a shared namespace, and the token with the smallest
//! sequence leads. Watches re-run the resolution whenever the membership
//! changes, so the group converges on exactly one leader after any
//! departure, crash or join.

mod config;
mod constants;
mod coordination;
mod election;
mod errors;
mod utils;

pub use config::*;
pub use coordination::*;
pub use election::*;
pub use errors::*;

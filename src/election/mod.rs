//! The election protocol itself: candidacy registration, leadership
//! resolution and the candidate lifecycle.
//!
//! A candidate volunteers by creating an ephemeral sequential token under
//! the group's namespace ([`CandidacyRegistrar`]), decides leadership by
//! numeric minimum over the membership ([`LeadershipResolver`]) and keeps
//! both current across session loss through the watch-driven loop in
//! [`ElectionController`]. [`CandidateBuilder`] assembles the pieces.

mod builder;
mod candidacy;
mod controller;
mod resolver;

pub use builder::*;
pub use candidacy::*;
pub use controller::*;
pub use resolver::*;

//! Quick-create suggestion flow.
//!
//! # Responsibility
//! - Turn a parsed relation query into ordered completion candidates.
//! - Write accepted candidates back into the query text.
//! - Track the open/closed suggester session as an explicit state machine.
//!
//! # Invariants
//! - Nothing in this module touches storage; known titles are passed in.

pub mod candidate;
pub mod rewrite;
pub mod session;

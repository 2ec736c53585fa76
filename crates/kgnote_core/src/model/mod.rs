//! Knowledge-graph domain model.
//!
//! # Responsibility
//! - Define note kinds and the store read model shared by services.
//! - Define the relation type table that drives parsing and synthesis.
//!
//! # Invariants
//! - Every note is identified by its vault-relative path.
//! - A note title is the file basename without the `.md` extension.

pub mod note;
pub mod relation;

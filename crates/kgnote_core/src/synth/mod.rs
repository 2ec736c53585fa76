//! Title, frontmatter and backlink synthesis.
//!
//! # Responsibility
//! - Turn a parsed relation triple into a canonical note title.
//! - Build new note content from templates with deterministic metadata.
//! - Compute reciprocal metadata: reverse aliases and concept backlinks.
//! - Edit single frontmatter entries of existing notes in place.
//!
//! # Invariants
//! - Everything here is pure text transformation; no store access.

pub mod backlink;
pub mod frontmatter;
pub mod text;
pub mod title;
pub mod yaml_edit;

//! Flutter-facing bindings for kgnote core.

pub mod api;

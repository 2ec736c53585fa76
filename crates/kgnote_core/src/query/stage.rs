//! Grammar stage inference.

use super::is_stage_separator;
use serde::{Deserialize, Serialize};

/// Grammar stage the cursor is logically in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// No stage separator typed yet.
    SelectingRelationType,
    /// One stage separator: typing head concepts.
    EnteringHead,
    /// Two or more stage separators: typing tail concepts.
    EnteringTail,
}

/// Infers the stage from stage-separator counts alone.
pub fn infer_stage(raw: &str) -> Stage {
    match raw.chars().filter(|c| is_stage_separator(*c)).take(2).count() {
        0 => Stage::SelectingRelationType,
        1 => Stage::EnteringHead,
        _ => Stage::EnteringTail,
    }
}

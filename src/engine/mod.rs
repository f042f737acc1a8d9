//! Grade allocation engine.
//!
//! Everything here is a pure function over slot slices: callers pass the
//! current slot list in and receive a new list back.

mod attendance;
mod projection;
mod redistribute;
mod slots;
mod strategy;

pub use projection::{projected_grade, Debouncer};
pub use redistribute::{apply_edit, toggle_pin, EditOutcome};
pub use slots::{collect_ungraded_slots, UngradedSlot};
pub use strategy::{allocate, Strategy};

use crate::calc::EPSILON;
use thiserror::Error;

/// Termination threshold for the iterative passes.
pub const CONVERGENCE_EPSILON: f64 = 1e-4;

/// Safety valve for the sacrifice loop.
pub const MAX_SACRIFICE_ROUNDS: usize = 100;

/// `used` fits inside `limit` up to the planner tolerance.
pub fn within_budget(used: f64, limit: f64) -> bool {
    used <= limit + EPSILON
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("slot index {index} out of range ({len} slots)")]
    SlotOutOfRange { index: usize, len: usize },
}

impl EngineError {
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::SlotOutOfRange { .. } => "not_found",
        }
    }
}

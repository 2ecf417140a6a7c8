//! Trace reconstruction: from symbolic step records to concrete delays.

pub mod entry_solver;
pub mod step;

pub use entry_solver::{EntrySolver, TraceError};
pub use step::TraceStep;

use crate::tapn::ids::TokenId;
use crate::tapn::interval::TimeInvariant;

/// A witness path through the symbolic state space: the fired steps in
/// order plus the bounded invariants of the final marking.
#[derive(Debug, Clone)]
pub struct SymbolicTrace {
    pub steps: Vec<TraceStep>,
    pub final_invariants: Vec<(TokenId, TimeInvariant)>,
}

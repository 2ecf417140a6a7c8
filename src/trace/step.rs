//! Per-transition trace records.

use crate::tapn::ids::{TokenId, TransitionId};
use crate::tapn::interval::{TimeInterval, TimeInvariant};

/// One fired transition on a trace: which tokens it consumed under
/// which guards, which tokens it produced, and the invariants that held
/// on the successor. Enough to rebuild the timing constraints without
/// the intermediate zones.
#[derive(Debug, Clone)]
pub struct TraceStep {
    pub transition: TransitionId,
    pub consumed: Vec<(TokenId, TimeInterval)>,
    pub produced: Vec<TokenId>,
    pub invariants: Vec<(TokenId, TimeInvariant)>,
}

//! The reachability engine: queries, the store, and the search itself.

pub mod pwlist;
pub mod query;
pub mod search;
pub mod successors;
pub mod waiting;

pub use pwlist::{AddResult, PassedWaitingList, StateMeta};
pub use query::{CmpOp, Expr, Quantifier, Query};
pub use search::{Outcome, SearchStats, Verifier};
pub use successors::SuccessorGenerator;
pub use waiting::{SearchOrder, WaitingList};

//! Symbolic reachability for timed-arc Petri nets.
//!
//! Markings pair a discrete token placement with a zone over the token
//! age clocks; the search explores them forward under extrapolation and
//! a coverage relation, optionally abstracting long-aged tokens away by
//! discrete inclusion.

pub mod marking;
pub mod options;
pub mod report;
pub mod tapn;
pub mod trace;
pub mod verify;
pub mod zone;

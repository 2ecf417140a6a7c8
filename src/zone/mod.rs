//! Symbolic representation of token ages as DBM zones.

pub mod bound;
pub mod dbm;

pub use bound::{Bound, Strictness};
pub use dbm::{Dbm, ZoneRelation};

//! Symbolic markings and their stored, possibly abstracted, form.

pub mod inclusion;
pub mod mapping;
pub mod symbolic;

pub use inclusion::{IncPlaces, InclusionMarking, MarkingFactory, StoredMarking};
pub use mapping::TokenMapping;
pub use symbolic::SymbolicMarking;

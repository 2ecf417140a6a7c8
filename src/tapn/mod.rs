//! Model layer: identifiers, time intervals, net structure, and IO.

pub mod ids;
pub mod index_vec;
pub mod interval;
pub mod io;
pub mod net;
pub mod structure;

pub use ids::{PlaceId, StateId, TokenId, TransitionId};
pub use interval::{TimeInterval, TimeInvariant};
pub use net::{ModelError, TimedArcPetriNet};
pub use structure::{InhibitorArc, InputArc, OutputArc, TimedPlace, TimedTransition};

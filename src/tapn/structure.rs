//! Static structure of a timed-arc Petri net: places, transitions, arcs.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::tapn::ids::PlaceId;
use crate::tapn::interval::{TimeInterval, TimeInvariant};

/// A place of the net. The age invariant applies to every resident
/// token; untimed places ignore token ages entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedPlace {
    pub name: String,
    #[serde(default = "TimedPlace::default_invariant")]
    pub invariant: TimeInvariant,
    #[serde(default)]
    pub untimed: bool,
}

impl TimedPlace {
    pub fn new(name: impl Into<String>) -> Self {
        TimedPlace {
            name: name.into(),
            invariant: TimeInvariant::INF,
            untimed: false,
        }
    }

    pub fn with_invariant(name: impl Into<String>, invariant: TimeInvariant) -> Self {
        TimedPlace {
            name: name.into(),
            invariant,
            untimed: false,
        }
    }

    fn default_invariant() -> TimeInvariant {
        TimeInvariant::INF
    }
}

/// Consumes one token from `place` whose age satisfies `guard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputArc {
    pub place: PlaceId,
    pub guard: TimeInterval,
}

/// Produces one fresh token (age zero) into `place`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputArc {
    pub place: PlaceId,
}

/// Disables the transition while any token in `place` can satisfy
/// `guard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InhibitorArc {
    pub place: PlaceId,
    pub guard: TimeInterval,
}

pub type ArcList<T> = SmallVec<[T; 4]>;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedTransition {
    pub name: String,
    pub input_arcs: ArcList<InputArc>,
    pub output_arcs: ArcList<OutputArc>,
    pub inhibitor_arcs: ArcList<InhibitorArc>,
}

impl TimedTransition {
    pub fn new(name: impl Into<String>) -> Self {
        TimedTransition {
            name: name.into(),
            input_arcs: ArcList::new(),
            output_arcs: ArcList::new(),
            inhibitor_arcs: ArcList::new(),
        }
    }
}

impl fmt::Debug for TimedTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TimedTransition").field(&self.name).finish()
    }
}

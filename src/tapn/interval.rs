//! Time intervals on arcs and age invariants on places.

use serde::{Deserialize, Serialize};

use crate::zone::Bound;

/// A guard interval `[a, b]`, `(a, b]`, `[a, b)`, `(a, b)` or the
/// right-open forms with `b = inf`. Endpoints are integers; strictness is
/// tracked per endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeInterval {
    pub lower: i64,
    #[serde(default)]
    pub lower_strict: bool,
    /// `None` means unbounded above.
    pub upper: Option<i64>,
    #[serde(default)]
    pub upper_strict: bool,
}

impl TimeInterval {
    /// `[0, inf)`, the guard that admits every age.
    pub const ZERO_TO_INF: TimeInterval = TimeInterval {
        lower: 0,
        lower_strict: false,
        upper: None,
        upper_strict: false,
    };

    pub fn closed(lower: i64, upper: i64) -> Self {
        TimeInterval {
            lower,
            lower_strict: false,
            upper: Some(upper),
            upper_strict: false,
        }
    }

    pub fn at_least(lower: i64) -> Self {
        TimeInterval {
            lower,
            lower_strict: false,
            upper: None,
            upper_strict: false,
        }
    }

    pub fn is_zero_to_inf(&self) -> bool {
        *self == Self::ZERO_TO_INF
    }

    /// The zone bound for the lower half of the guard: `0 - clock` is at
    /// most `-lower`, strict when the endpoint is open.
    pub fn lower_bound(&self) -> Bound {
        if self.lower_strict {
            Bound::strict(-self.lower)
        } else {
            Bound::weak(-self.lower)
        }
    }

    /// The zone bound for the upper half: `clock - 0` at most `upper`.
    pub fn upper_bound(&self) -> Bound {
        match self.upper {
            Some(upper) if self.upper_strict => Bound::strict(upper),
            Some(upper) => Bound::weak(upper),
            None => Bound::Infinite,
        }
    }

    /// The largest constant the interval compares an age against.
    pub fn max_constant(&self) -> i64 {
        self.upper.unwrap_or(self.lower).max(self.lower)
    }
}

/// A place invariant: an upper bound the age of every resident token must
/// satisfy, or unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeInvariant {
    /// `None` encodes `< inf` (no constraint).
    pub bound: Option<i64>,
    #[serde(default)]
    pub strict: bool,
}

impl TimeInvariant {
    pub const INF: TimeInvariant = TimeInvariant {
        bound: None,
        strict: true,
    };

    pub fn at_most(bound: i64) -> Self {
        TimeInvariant {
            bound: Some(bound),
            strict: false,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.bound.is_none()
    }

    /// The zone bound on `clock - 0`, `None` when the invariant does not
    /// constrain anything.
    pub fn upper_bound(&self) -> Option<Bound> {
        self.bound.map(|b| {
            if self.strict {
                Bound::strict(b)
            } else {
                Bound::weak(b)
            }
        })
    }
}

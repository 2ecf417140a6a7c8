//! Clock-difference bounds: the atomic values stored in a DBM.

use std::fmt;
use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Whether a bound excludes its endpoint.
///
/// `Strict` orders before `Weak` so that for a fixed value the strict
/// bound is the tighter one: `x - y < 5` admits fewer points than
/// `x - y <= 5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Strictness {
    Strict,
    Weak,
}

/// An upper bound on a clock difference: `clock_i - clock_j {<, <=} value`,
/// or unbounded.
///
/// The derived order is total: bounds compare by value, then strictness,
/// and `Infinite` dominates everything. Strictness is a separate field on
/// purpose; it must stay testable independently of the magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Bound {
    Finite(i64, Strictness),
    Infinite,
}

impl Bound {
    /// `x - y <= 0`, the diagonal entry of every consistent DBM.
    pub const ZERO: Bound = Bound::Finite(0, Strictness::Weak);

    pub const fn weak(value: i64) -> Self {
        Bound::Finite(value, Strictness::Weak)
    }

    pub const fn strict(value: i64) -> Self {
        Bound::Finite(value, Strictness::Strict)
    }

    pub const fn is_infinite(self) -> bool {
        matches!(self, Bound::Infinite)
    }

    pub const fn is_strict(self) -> bool {
        matches!(self, Bound::Finite(_, Strictness::Strict))
    }

    /// The finite magnitude, if any.
    pub const fn value(self) -> Option<i64> {
        match self {
            Bound::Finite(v, _) => Some(v),
            Bound::Infinite => None,
        }
    }

    /// Weakened copy of this bound; infinity stays infinity.
    pub fn as_weak(self) -> Self {
        match self {
            Bound::Finite(v, _) => Bound::weak(v),
            Bound::Infinite => Bound::Infinite,
        }
    }

    /// Negation flips both the value and the strictness; used when turning
    /// an upper-bound constraint into the matching lower-bound entry.
    /// Infinity has no negation and is a caller error.
    pub fn negated(self) -> Self {
        match self {
            Bound::Finite(v, Strictness::Weak) => Bound::strict(-v),
            Bound::Finite(v, Strictness::Strict) => Bound::weak(-v),
            Bound::Infinite => panic!("negation of an infinite bound"),
        }
    }
}

impl Add for Bound {
    type Output = Bound;

    /// Path addition: finite bounds add values, and the sum is strict if
    /// either summand is. Anything plus infinity is infinity.
    fn add(self, rhs: Bound) -> Bound {
        match (self, rhs) {
            (Bound::Finite(a, sa), Bound::Finite(b, sb)) => {
                let strictness = if sa == Strictness::Strict || sb == Strictness::Strict {
                    Strictness::Strict
                } else {
                    Strictness::Weak
                };
                Bound::Finite(a + b, strictness)
            }
            _ => Bound::Infinite,
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Finite(v, Strictness::Strict) => write!(f, "<{v}"),
            Bound::Finite(v, Strictness::Weak) => write!(f, "<={v}"),
            Bound::Infinite => write!(f, "<inf"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_is_value_then_strictness() {
        assert!(Bound::strict(3) < Bound::weak(3));
        assert!(Bound::weak(2) < Bound::strict(3));
        assert!(Bound::weak(3) < Bound::strict(4));
        assert!(Bound::weak(i64::MAX) < Bound::Infinite);
        assert_eq!(Bound::ZERO, Bound::weak(0));
    }

    #[test]
    fn addition_propagates_strictness() {
        assert_eq!(Bound::weak(2) + Bound::weak(3), Bound::weak(5));
        assert_eq!(Bound::strict(2) + Bound::weak(3), Bound::strict(5));
        assert_eq!(Bound::weak(2) + Bound::strict(3), Bound::strict(5));
        assert_eq!(Bound::Infinite + Bound::strict(-7), Bound::Infinite);
        assert_eq!(Bound::weak(1) + Bound::Infinite, Bound::Infinite);
    }

    #[test]
    fn negation_swaps_strictness() {
        assert_eq!(Bound::weak(4).negated(), Bound::strict(-4));
        assert_eq!(Bound::strict(-2).negated(), Bound::weak(2));
    }
}

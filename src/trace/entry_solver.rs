//! Solves for concrete firing delays along a symbolic trace.
//!
//! Clock `i` of the entry-time zone is the instant step `i - 1` fired
//! (clock 0 is time zero). Tokens are aged against the instant they were
//! born, which is clock 0 for initial tokens and the producing step's
//! instant for everything else. The zone collects every guard and
//! invariant along the trace; any point of it is a valid timing.

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::tapn::ids::TokenId;
use crate::trace::SymbolicTrace;
use crate::zone::{Bound, Dbm, Strictness};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TraceError {
    #[error("trace timing constraints are unsatisfiable")]
    UnsatisfiableTrace,
}

pub struct EntrySolver<'a> {
    trace: &'a SymbolicTrace,
}

impl<'a> EntrySolver<'a> {
    pub fn new(trace: &'a SymbolicTrace) -> Self {
        EntrySolver { trace }
    }

    /// The delay to wait before each step fires.
    pub fn delays(&self) -> Result<Vec<f64>, TraceError> {
        let zone = self.entry_time_zone()?;
        let times = Self::pick_entry_times(&zone);
        Ok(times.windows(2).map(|w| w[1] - w[0]).collect())
    }

    fn entry_time_zone(&self) -> Result<Dbm, TraceError> {
        let n = self.trace.steps.len();
        let mut zone = Dbm::universe(n);
        let mut birth: FxHashMap<TokenId, usize> = FxHashMap::default();

        for (i, step) in self.trace.steps.iter().enumerate() {
            // invariants held when location i was entered and still at
            // the moment step i fires
            for &(token, invariant) in &step.invariants {
                if let Some(bound) = invariant.upper_bound() {
                    let b = birth.get(&token).copied().unwrap_or(0);
                    if b != i {
                        zone.restrict(i, b, bound);
                    }
                    zone.restrict(i + 1, b, bound);
                }
            }
            for &(token, guard) in &step.consumed {
                let b = birth.get(&token).copied().unwrap_or(0);
                zone.restrict(b, i + 1, guard.lower_bound());
                let upper = guard.upper_bound();
                if !upper.is_infinite() {
                    zone.restrict(i + 1, b, upper);
                }
            }
            for &token in &step.produced {
                birth.insert(token, i + 1);
            }
        }

        for &(token, invariant) in &self.trace.final_invariants {
            if let Some(bound) = invariant.upper_bound() {
                let b = birth.get(&token).copied().unwrap_or(0);
                if b != n {
                    zone.restrict(n, b, bound);
                }
            }
        }

        // entry instants never decrease along the trace
        for i in 0..n {
            zone.restrict(i, i + 1, Bound::weak(0));
        }

        if zone.is_empty() {
            return Err(TraceError::UnsatisfiableTrace);
        }
        Ok(zone)
    }

    /// Fixes the instants one by one, each inside the range the already
    /// fixed ones leave open. Non-strict lower bounds are taken exactly;
    /// strict ones move up by one when there is room, otherwise to the
    /// upper bound or the midpoint.
    fn pick_entry_times(zone: &Dbm) -> Vec<f64> {
        let dim = zone.dim();
        let mut times = vec![0.0f64; dim];
        for i in 1..dim {
            let (mut lower, mut lower_strict) = match zone.at(0, i) {
                Bound::Finite(v, s) => ((-v) as f64, s == Strictness::Strict),
                Bound::Infinite => (0.0, false),
            };
            let (mut upper, mut upper_strict) = match zone.at(i, 0) {
                Bound::Finite(v, s) => (v as f64, s == Strictness::Strict),
                Bound::Infinite => (f64::INFINITY, true),
            };
            for j in 1..i {
                if let Bound::Finite(v, s) = zone.at(i, j) {
                    let candidate = v as f64 + times[j];
                    let strict = s == Strictness::Strict;
                    if candidate < upper || (candidate == upper && strict) {
                        upper = candidate;
                        upper_strict = strict;
                    }
                }
                if let Bound::Finite(v, s) = zone.at(j, i) {
                    let candidate = -(v as f64) + times[j];
                    let strict = s == Strictness::Strict;
                    if candidate > lower || (candidate == lower && strict) {
                        lower = candidate;
                        lower_strict = strict;
                    }
                }
            }
            times[i] = Self::pick_in_range(lower, lower_strict, upper, upper_strict);
        }
        times
    }

    fn pick_in_range(lower: f64, lower_strict: bool, upper: f64, upper_strict: bool) -> f64 {
        debug_assert!(lower <= upper);
        if !lower_strict {
            lower
        } else if upper - lower > 1.0 {
            lower + 1.0
        } else if !upper_strict {
            upper
        } else {
            (lower + upper) / 2.0
        }
    }
}

//! Discrete inclusion abstraction.
//!
//! Tokens that sit in an inclusion-eligible place and have aged past its
//! maximum constant can no longer influence any guard. Such tokens are
//! collapsed into per-place counts, and markings that differ only by
//! having more of them are covered by the larger one.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::marking::symbolic::SymbolicMarking;
use crate::tapn::ids::PlaceId;
use crate::tapn::index_vec::IndexVec;
use crate::tapn::net::TimedArcPetriNet;
use crate::verify::query::{CmpOp, Expr};
use crate::zone::{Bound, Dbm, ZoneRelation};

/// Which places may have their old tokens abstracted away, together
/// with the data needed to test individual tokens.
#[derive(Debug, Clone)]
pub struct IncPlaces {
    candidate: IndexVec<PlaceId, bool>,
    untimed: IndexVec<PlaceId, bool>,
    max_constants: IndexVec<PlaceId, i64>,
}

impl IncPlaces {
    /// Inclusion disabled for every place.
    pub fn none(net: &TimedArcPetriNet) -> Self {
        IncPlaces {
            candidate: IndexVec::from_elem(false, net.num_places()),
            untimed: IndexVec::from_elem(false, net.num_places()),
            max_constants: net.max_constants(),
        }
    }

    /// A place qualifies only when it is flagged, its invariant is
    /// unbounded, and no inhibitor arc watches it.
    pub fn new(net: &TimedArcPetriNet, flagged: &IndexVec<PlaceId, bool>) -> Self {
        let inhibited = net.inhibited_places();
        let mut candidate = IndexVec::from_elem(false, net.num_places());
        let mut untimed = IndexVec::from_elem(false, net.num_places());
        for (id, place) in net.places() {
            candidate[id] = flagged[id] && place.invariant.is_unbounded() && !inhibited[id];
            untimed[id] = place.untimed;
        }
        IncPlaces {
            candidate,
            untimed,
            max_constants: net.max_constants(),
        }
    }

    /// Drops places where extra tokens could flip the query verdict.
    /// An atom is safe only when it is upward closed under the polarity
    /// it occurs with.
    pub fn prune_for_query(&mut self, expr: &Expr) {
        self.prune_expr(expr, true);
    }

    fn prune_expr(&mut self, expr: &Expr, positive: bool) {
        match expr {
            Expr::Bool(_) => {}
            Expr::Not(inner) => self.prune_expr(inner, !positive),
            Expr::And(parts) | Expr::Or(parts) => {
                for part in parts {
                    self.prune_expr(part, positive);
                }
            }
            Expr::Count { place, op, .. } => {
                let upward = match (op, positive) {
                    (CmpOp::Ge | CmpOp::Gt, true) => true,
                    (CmpOp::Le | CmpOp::Lt, false) => true,
                    _ => false,
                };
                if !upward {
                    self.candidate[*place] = false;
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.candidate.iter().any(|&c| c)
    }

    /// A token is abstractable once its place qualifies and its age is
    /// pinned past the place's maximum constant (untimed places need no
    /// age condition).
    pub fn token_eligible(&self, marking: &SymbolicMarking, token: usize) -> bool {
        let place = marking.place_of(token);
        if !self.candidate[place] {
            return false;
        }
        if self.untimed[place] {
            return true;
        }
        marking.age_bounds(token).0 == Bound::strict(-self.max_constants[place])
    }
}

/// Abstracted marking: exact tokens in `eq` (clock `i + 1` belongs to
/// `eq[i]`), abstracted tokens as per-place counts in `inc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InclusionMarking {
    eq: Vec<PlaceId>,
    inc: IndexVec<PlaceId, u32>,
    zone: Dbm,
}

impl InclusionMarking {
    pub fn num_tokens(&self) -> usize {
        self.eq.len() + self.inc.iter().map(|&c| c as usize).sum::<usize>()
    }

    pub fn covered_places(&self) -> usize {
        let mut places: Vec<PlaceId> = self.eq.clone();
        places.extend(
            self.inc
                .iter_enumerated()
                .filter(|(_, &c)| c > 0)
                .map(|(p, _)| p),
        );
        places.sort_unstable();
        places.dedup();
        places.len()
    }

    pub fn discrete_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.eq.hash(&mut hasher);
        hasher.finish()
    }

    /// Coverage check: the exact parts must agree token for token, the
    /// count vectors must be comparable pointwise, and the zone
    /// relation must not contradict the count relation.
    pub fn relation(&self, other: &InclusionMarking) -> ZoneRelation {
        if self.eq != other.eq {
            return ZoneRelation::Different;
        }
        let mut subset = false;
        let mut superset = false;
        for (a, b) in self.inc.iter().zip(other.inc.iter()) {
            if a < b {
                subset = true;
            } else if a > b {
                superset = true;
            }
        }
        let counts = ZoneRelation::from_flags(!superset, !subset);
        let zones = self.zone.relation(&other.zone);
        match (counts, zones) {
            (a, b) if a == b => a,
            (ZoneRelation::Equal, b) => b,
            (a, ZoneRelation::Equal) => a,
            _ => ZoneRelation::Different,
        }
    }
}

/// Selects, once per run, how markings are stored and revived.
#[derive(Debug, Clone)]
pub enum StoredMarking {
    Plain(SymbolicMarking),
    Inclusion(InclusionMarking),
}

impl StoredMarking {
    pub fn discrete_hash(&self) -> u64 {
        match self {
            StoredMarking::Plain(m) => m.discrete_hash(),
            StoredMarking::Inclusion(m) => m.discrete_hash(),
        }
    }

    pub fn relation(&self, other: &StoredMarking) -> ZoneRelation {
        match (self, other) {
            (StoredMarking::Plain(a), StoredMarking::Plain(b)) => {
                if a.placement() != b.placement() {
                    ZoneRelation::Different
                } else {
                    a.zone_relation(b)
                }
            }
            (StoredMarking::Inclusion(a), StoredMarking::Inclusion(b)) => a.relation(b),
            _ => unreachable!("mixed storage variants in one store"),
        }
    }

    pub fn num_tokens(&self) -> usize {
        match self {
            StoredMarking::Plain(m) => m.num_tokens(),
            StoredMarking::Inclusion(m) => m.num_tokens(),
        }
    }

    pub fn covered_places(&self) -> usize {
        match self {
            StoredMarking::Plain(m) => m.covered_places(),
            StoredMarking::Inclusion(m) => m.covered_places(),
        }
    }
}

/// Converts between working markings and their stored form.
#[derive(Debug, Clone)]
pub struct MarkingFactory {
    inc: IncPlaces,
    use_inclusion: bool,
    num_places: usize,
}

impl MarkingFactory {
    pub fn plain(net: &TimedArcPetriNet) -> Self {
        MarkingFactory {
            inc: IncPlaces::none(net),
            use_inclusion: false,
            num_places: net.num_places(),
        }
    }

    pub fn discrete_inclusion(net: &TimedArcPetriNet, inc: IncPlaces) -> Self {
        MarkingFactory {
            inc,
            use_inclusion: true,
            num_places: net.num_places(),
        }
    }

    pub fn uses_inclusion(&self) -> bool {
        self.use_inclusion
    }

    /// The marking must already be canonical.
    pub fn store(&self, marking: &SymbolicMarking) -> StoredMarking {
        if !self.use_inclusion {
            return StoredMarking::Plain(marking.clone());
        }
        let mut eq = Vec::new();
        let mut inc = IndexVec::from_elem(0u32, self.num_places);
        let mut keep = vec![true; marking.num_tokens() + 1];
        for token in 0..marking.num_tokens() {
            if self.inc.token_eligible(marking, token) {
                inc[marking.place_of(token)] += 1;
                keep[token + 1] = false;
            } else {
                eq.push(marking.place_of(token));
            }
        }
        let mut zone = marking.zone().clone();
        zone.resize(&keep);
        StoredMarking::Inclusion(InclusionMarking { eq, inc, zone })
    }

    /// Revives a stored marking as a working one. Abstracted tokens come
    /// back as fresh clocks bounded below by their place's maximum
    /// constant (strictly), or unconstrained for untimed places.
    pub fn retrieve(&self, stored: &StoredMarking, next_id: &mut u32) -> SymbolicMarking {
        match stored {
            StoredMarking::Plain(m) => m.clone(),
            StoredMarking::Inclusion(m) => {
                let mut placement = m.eq.clone();
                let mut zone = m.zone.clone();
                for (place, &count) in m.inc.iter_enumerated() {
                    for _ in 0..count {
                        let clock = zone.dim();
                        zone.add_clocks(1);
                        zone.free_clock(clock);
                        if !self.inc.untimed[place] {
                            zone.restrict(
                                0,
                                clock,
                                Bound::strict(-self.inc.max_constants[place]),
                            );
                        }
                        placement.push(place);
                    }
                }
                let mut marking = SymbolicMarking::from_parts(placement, zone, next_id);
                marking.canonicalize();
                marking
            }
        }
    }
}

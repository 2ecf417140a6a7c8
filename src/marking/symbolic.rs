//! Symbolic markings: a discrete token placement paired with a zone
//! over the token age clocks.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::marking::mapping::TokenMapping;
use crate::tapn::ids::{PlaceId, TokenId};
use crate::tapn::index_vec::IndexVec;
use crate::tapn::interval::{TimeInterval, TimeInvariant};
use crate::zone::{Bound, Dbm, ZoneRelation};

/// One symbolic state of the net: which place each token sits in plus a
/// zone constraining the token ages. Token identities are carried along
/// purely so traces can name tokens consistently; they take no part in
/// equality or hashing.
#[derive(Debug, Clone)]
pub struct SymbolicMarking {
    placement: Vec<PlaceId>,
    ids: Vec<TokenId>,
    mapping: TokenMapping,
    zone: Dbm,
}

impl SymbolicMarking {
    /// The initial marking: every token aged exactly zero.
    pub fn initial(places: &[PlaceId], next_id: &mut u32) -> Self {
        let n = places.len();
        let ids = (0..n)
            .map(|i| TokenId::new(*next_id + i as u32))
            .collect();
        *next_id += n as u32;
        SymbolicMarking {
            placement: places.to_vec(),
            ids,
            mapping: TokenMapping::identity(n),
            zone: Dbm::zero(n),
        }
    }

    /// Builds a marking from a placement and a matching zone, handing
    /// out fresh token identities. Token `i` must own clock `i + 1`.
    pub(crate) fn from_parts(placement: Vec<PlaceId>, zone: Dbm, next_id: &mut u32) -> Self {
        debug_assert_eq!(placement.len() + 1, zone.dim());
        let n = placement.len();
        let ids = (0..n)
            .map(|i| TokenId::new(*next_id + i as u32))
            .collect();
        *next_id += n as u32;
        SymbolicMarking {
            placement,
            ids,
            mapping: TokenMapping::identity(n),
            zone,
        }
    }

    pub fn num_tokens(&self) -> usize {
        self.placement.len()
    }

    pub fn place_of(&self, token: usize) -> PlaceId {
        self.placement[token]
    }

    pub fn id_of(&self, token: usize) -> TokenId {
        self.ids[token]
    }

    pub fn zone(&self) -> &Dbm {
        &self.zone
    }

    pub fn is_empty(&self) -> bool {
        self.zone.is_empty()
    }

    pub fn tokens_in(&self, place: PlaceId) -> impl Iterator<Item = usize> + '_ {
        self.placement
            .iter()
            .enumerate()
            .filter(move |(_, &p)| p == place)
            .map(|(i, _)| i)
    }

    pub fn counts(&self, num_places: usize) -> IndexVec<PlaceId, u32> {
        let mut counts = IndexVec::from_elem(0u32, num_places);
        for &place in &self.placement {
            counts[place] += 1;
        }
        counts
    }

    /// How many distinct places hold at least one token.
    pub fn covered_places(&self) -> usize {
        let mut places: Vec<PlaceId> = self.placement.clone();
        places.sort_unstable();
        places.dedup();
        places.len()
    }

    /// Lets time pass, then re-imposes the age invariant of each
    /// token's place. Invariants held before the delay, so the zone
    /// cannot become empty here.
    pub fn delay(&mut self, invariant_of: impl Fn(PlaceId) -> TimeInvariant) {
        self.zone.future();
        for token in 0..self.num_tokens() {
            self.apply_invariant(token, invariant_of(self.placement[token]));
        }
        debug_assert!(!self.zone.is_empty(), "delay emptied the zone");
    }

    /// Restricts a token's age to a guard interval.
    pub fn constrain(&mut self, token: usize, guard: TimeInterval) {
        let clock = self.mapping.clock_of(token);
        self.zone.restrict(0, clock, guard.lower_bound());
        self.zone.restrict(clock, 0, guard.upper_bound());
    }

    pub fn apply_invariant(&mut self, token: usize, invariant: TimeInvariant) {
        if let Some(bound) = invariant.upper_bound() {
            let clock = self.mapping.clock_of(token);
            self.zone.restrict(clock, 0, bound);
        }
    }

    /// Whether some point of the zone puts this token's age inside the
    /// interval. Never mutates the zone.
    pub fn potentially_satisfies(&self, token: usize, guard: TimeInterval) -> bool {
        let clock = self.mapping.clock_of(token);
        self.zone.can_satisfy(clock, 0, guard.upper_bound())
            && self.zone.can_satisfy(0, clock, guard.lower_bound())
    }

    pub fn reset(&mut self, token: usize) {
        self.zone.reset(self.mapping.clock_of(token));
    }

    pub fn move_token(&mut self, token: usize, place: PlaceId) {
        self.placement[token] = place;
    }

    /// Adds fresh tokens aged exactly zero, one per listed place.
    pub fn add_tokens(&mut self, places: &[PlaceId], next_id: &mut u32) {
        let old_dim = self.zone.dim();
        self.zone.add_clocks(places.len());
        self.mapping.append(old_dim, places.len());
        for (i, &place) in places.iter().enumerate() {
            self.placement.push(place);
            self.ids.push(TokenId::new(*next_id + i as u32));
        }
        *next_id += places.len() as u32;
    }

    /// Removes the listed tokens, highest index first so each pending
    /// removal still points at the right token.
    pub fn remove_tokens(&mut self, tokens: &mut Vec<usize>) {
        tokens.sort_unstable_by_key(|&t| std::cmp::Reverse(t));
        for &token in tokens.iter() {
            let clock = self.mapping.remove(token);
            self.zone.remove_clock(clock);
            self.placement.remove(token);
            self.ids.remove(token);
        }
    }

    pub fn extrapolate(&mut self, max_constants: &IndexVec<PlaceId, i64>) {
        let mut per_clock = vec![0i64; self.zone.dim()];
        for token in 0..self.num_tokens() {
            per_clock[self.mapping.clock_of(token)] = max_constants[self.placement[token]];
        }
        self.zone.extrapolate(&per_clock);
    }

    /// Brings the marking to its canonical form: tokens sorted by
    /// place, then by their zone bounds, and clocks renumbered so token
    /// `i` owns clock `i + 1`. Two markings describe the same state set
    /// exactly when their canonical forms compare equal.
    pub fn canonicalize(&mut self) {
        let n = self.num_tokens();
        for i in 1..n {
            let mut j = i;
            while j > 0 && self.order_after(j - 1, j) {
                self.swap_tokens(j - 1, j);
                j -= 1;
            }
        }
        self.normalize_mapping();
    }

    fn order_after(&self, a: usize, b: usize) -> bool {
        let (pa, pb) = (self.placement[a], self.placement[b]);
        if pa != pb {
            return pa > pb;
        }
        let (ca, cb) = (self.mapping.clock_of(a), self.mapping.clock_of(b));
        let (la, lb) = (self.zone.at(0, ca), self.zone.at(0, cb));
        if la != lb {
            return la > lb;
        }
        let (ua, ub) = (self.zone.at(ca, 0), self.zone.at(cb, 0));
        if ua != ub {
            return ua > ub;
        }
        let (d_ab, d_ba) = (self.zone.at(ca, cb), self.zone.at(cb, ca));
        if cb > ca {
            d_ba > d_ab
        } else {
            d_ab > d_ba
        }
    }

    fn swap_tokens(&mut self, a: usize, b: usize) {
        self.zone
            .swap_clocks(self.mapping.clock_of(a), self.mapping.clock_of(b));
        self.placement.swap(a, b);
        self.ids.swap(a, b);
    }

    fn normalize_mapping(&mut self) {
        for token in 0..self.num_tokens() {
            let want = token + 1;
            let cur = self.mapping.clock_of(token);
            if cur == want {
                continue;
            }
            // token currently holding the wanted clock takes ours
            let other = self
                .mapping
                .token_with_clock(want)
                .unwrap_or_else(|| unreachable!("clock {want} unmapped"));
            self.zone.swap_clocks(cur, want);
            self.mapping.set_clock(token, want);
            self.mapping.set_clock(other, cur);
        }
        debug_assert!(self.mapping.is_identity());
    }

    /// Age bounds of the token, for display purposes.
    pub fn age_bounds(&self, token: usize) -> (Bound, Bound) {
        let clock = self.mapping.clock_of(token);
        (self.zone.at(0, clock), self.zone.at(clock, 0))
    }

    /// Compares two canonical markings with identical placements.
    pub fn zone_relation(&self, other: &SymbolicMarking) -> ZoneRelation {
        debug_assert_eq!(self.placement, other.placement);
        debug_assert!(self.mapping.is_identity() && other.mapping.is_identity());
        self.zone.relation(&other.zone)
    }

    /// Hash of the discrete part only, used to bucket markings whose
    /// zones then get compared pairwise.
    pub fn discrete_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.placement.hash(&mut hasher);
        hasher.finish()
    }

    pub fn placement(&self) -> &[PlaceId] {
        &self.placement
    }
}

impl PartialEq for SymbolicMarking {
    fn eq(&self, other: &Self) -> bool {
        self.placement == other.placement && self.zone == other.zone
    }
}

impl Eq for SymbolicMarking {}

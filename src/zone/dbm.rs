//! Difference-bound-matrix zones over token age clocks.
//!
//! A `Dbm` of dimension `n+1` stores, for every pair of clocks `(i, j)`,
//! the tightest known bound on `clock_i - clock_j`. Clock 0 is the
//! reference clock that is always exactly zero, so row 0 holds lower
//! bounds and column 0 holds upper bounds on individual clocks.
//!
//! All public mutators leave the matrix in canonical (shortest-path
//! closed) form, re-tightening incrementally after a single edit rather
//! than recomputing the full closure. A restriction that produces a
//! negative cycle flags the zone empty through its diagonal; callers must
//! consult [`Dbm::is_empty`] before trusting any read after a restrict.

use std::fmt;

use super::bound::Bound;

/// Outcome of a pointwise comparison of two zones of equal dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneRelation {
    Equal,
    /// Every bound of `self` is at most the corresponding bound of the
    /// other zone: `self` admits a subset of the valuations.
    Subset,
    Superset,
    Different,
}

impl ZoneRelation {
    pub fn from_flags(subset: bool, superset: bool) -> Self {
        match (subset, superset) {
            (true, true) => ZoneRelation::Equal,
            (true, false) => ZoneRelation::Subset,
            (false, true) => ZoneRelation::Superset,
            (false, false) => ZoneRelation::Different,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Dbm {
    dim: usize,
    bounds: Vec<Bound>,
}

impl Dbm {
    /// The most constrained zone: every clock exactly zero. This is the
    /// zone of an initial marking, where all tokens were just created.
    pub fn zero(clocks: usize) -> Self {
        let dim = clocks + 1;
        Dbm {
            dim,
            bounds: vec![Bound::ZERO; dim * dim],
        }
    }

    /// The unconstrained zone: all ages non-negative, nothing else known.
    pub fn universe(clocks: usize) -> Self {
        let dim = clocks + 1;
        let mut dbm = Dbm {
            dim,
            bounds: vec![Bound::Infinite; dim * dim],
        };
        for i in 0..dim {
            // Lower bounds are non-positive; ages never drop below zero.
            dbm.set(0, i, Bound::ZERO);
            dbm.set(i, i, Bound::ZERO);
        }
        dbm
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of token clocks, excluding the reference clock.
    pub fn clocks(&self) -> usize {
        self.dim - 1
    }

    #[inline]
    fn index(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.dim && j < self.dim);
        i * self.dim + j
    }

    #[inline]
    pub fn at(&self, i: usize, j: usize) -> Bound {
        self.bounds[self.index(i, j)]
    }

    #[inline]
    fn set(&mut self, i: usize, j: usize, bound: Bound) {
        let idx = self.index(i, j);
        self.bounds[idx] = bound;
    }

    /// An unsatisfiable restriction is recorded as a negative diagonal
    /// entry; every subsequent read must go through this check first.
    pub fn is_empty(&self) -> bool {
        (0..self.dim).any(|i| self.at(i, i) < Bound::ZERO)
    }

    fn mark_empty(&mut self) {
        self.set(0, 0, Bound::strict(-1));
    }

    /// Tightens `clock_i - clock_j` to `bound` if that is an improvement,
    /// then restores canonical form around the touched edge. On an
    /// inconsistency the zone silently becomes empty.
    pub fn restrict(&mut self, i: usize, j: usize, bound: Bound) {
        if self.is_empty() || bound >= self.at(i, j) {
            return;
        }
        // A bound that closes a negative cycle with the opposite edge
        // empties the zone outright.
        if !bound.is_infinite() && bound + self.at(j, i) < Bound::ZERO {
            self.mark_empty();
            return;
        }
        self.set(i, j, bound);
        self.close_edge(i, j);
    }

    /// Incremental re-closure after tightening edge `(i, j)`, following
    /// the two-pass propagation of the classic DBM close-1 operation.
    fn close_edge(&mut self, i: usize, j: usize) {
        let ij = self.at(i, j);

        for k in 0..self.dim {
            let jk = self.at(j, k);
            if jk.is_infinite() {
                continue;
            }
            let via = ij + jk;
            if via < self.at(i, k) {
                self.set(i, k, via);
            }
        }

        for p in 0..self.dim {
            let pi = self.at(p, i);
            if pi.is_infinite() {
                continue;
            }
            let pj = pi + ij;
            if pj >= self.at(p, j) {
                continue;
            }
            self.set(p, j, pj);
            for q in 0..self.dim {
                let jq = self.at(j, q);
                if jq.is_infinite() {
                    continue;
                }
                let pq = pi + jq;
                if pq < self.at(p, q) {
                    self.set(p, q, pq);
                }
            }
        }

        if (0..self.dim).any(|d| self.at(d, d) < Bound::ZERO) {
            self.mark_empty();
        }
    }

    /// Full Floyd-Warshall closure. Only needed after bulk edits such as
    /// extrapolation or dimension surgery; single restrictions go through
    /// the incremental path.
    pub fn close(&mut self) {
        for k in 0..self.dim {
            for i in 0..self.dim {
                if i == k {
                    continue;
                }
                let ik = self.at(i, k);
                if ik.is_infinite() {
                    continue;
                }
                for j in 0..self.dim {
                    if j == k {
                        continue;
                    }
                    let kj = self.at(k, j);
                    if kj.is_infinite() {
                        continue;
                    }
                    let via = ik + kj;
                    if via < self.at(i, j) {
                        self.set(i, j, via);
                    }
                }
                if self.at(i, i) < Bound::ZERO {
                    self.mark_empty();
                    return;
                }
            }
        }
    }

    /// Unbounded passage of time: upper bounds on all token clocks open
    /// to infinity. Lower bounds and mutual differences are untouched, so
    /// canonical form is preserved.
    pub fn future(&mut self) {
        for i in 1..self.dim {
            self.set(i, 0, Bound::Infinite);
        }
    }

    /// Clock `i` becomes exactly zero; its row and column are rederived
    /// from the reference row and column, which keeps the matrix closed.
    pub fn reset(&mut self, i: usize) {
        debug_assert!(i != 0, "the reference clock is never reset");
        for j in 0..self.dim {
            if j != i {
                self.set(i, j, self.at(0, j));
                self.set(j, i, self.at(j, 0));
            }
        }
        self.set(i, i, Bound::ZERO);
    }

    /// Pointwise coverage comparison; both zones must be canonical and of
    /// the same dimension.
    pub fn relation(&self, other: &Dbm) -> ZoneRelation {
        assert_eq!(self.dim, other.dim, "zone dimensions differ");
        let mut subset = true;
        let mut superset = true;
        for i in 0..self.dim {
            for j in 0..self.dim {
                if !subset && !superset {
                    return ZoneRelation::Different;
                }
                let lhs = self.at(i, j);
                let rhs = other.at(i, j);
                subset &= lhs <= rhs;
                superset &= lhs >= rhs;
            }
        }
        ZoneRelation::from_flags(subset, superset)
    }

    /// True if the zone intersected with `clock_i - clock_j {<,<=} bound`
    /// would be non-empty. Non-mutating; used for transition enabling
    /// tests before committing a firing.
    pub fn can_satisfy(&self, i: usize, j: usize, bound: Bound) -> bool {
        if self.is_empty() {
            return false;
        }
        bound.is_infinite() || !(bound + self.at(j, i) < Bound::ZERO)
    }

    /// Max-constant normalization. `max_constants[i]` is the largest
    /// constant any guard or invariant compares clock `i` against
    /// (`max_constants[0]` is ignored). Bounds above a clock's constant
    /// are opened to infinity and lower bounds below the negated constant
    /// are relaxed to it, which collapses the zone space to finitely many
    /// equivalence classes. Idempotent.
    pub fn extrapolate(&mut self, max_constants: &[i64]) {
        assert_eq!(max_constants.len(), self.dim);
        if self.is_empty() {
            return;
        }
        let mut touched = false;
        for i in 0..self.dim {
            for j in 0..self.dim {
                if i == j {
                    continue;
                }
                let bound = self.at(i, j);
                if bound.is_infinite() {
                    continue;
                }
                if i != 0 && bound > Bound::weak(max_constants[i]) {
                    self.set(i, j, Bound::Infinite);
                    touched = true;
                } else if j != 0 && bound < Bound::strict(-max_constants[j]) {
                    let mut target = Bound::strict(-max_constants[j]);
                    if i == 0 {
                        // row 0 must keep clocks nonnegative
                        target = target.min(Bound::ZERO);
                    }
                    if bound < target {
                        self.set(i, j, target);
                        touched = true;
                    }
                }
            }
        }
        if touched {
            self.close();
        }
    }

    /// Appends `count` fresh clocks, each exactly zero (newborn tokens
    /// have age zero). Closure is preserved: the new rows and columns are
    /// copies of the reference row and column.
    pub fn add_clocks(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        let old_dim = self.dim;
        let new_dim = old_dim + count;
        let mut bounds = vec![Bound::ZERO; new_dim * new_dim];
        for i in 0..old_dim {
            for j in 0..old_dim {
                bounds[i * new_dim + j] = self.at(i, j);
            }
        }
        for c in old_dim..new_dim {
            for j in 0..old_dim {
                bounds[c * new_dim + j] = self.at(0, j);
                bounds[j * new_dim + c] = self.at(j, 0);
            }
            // Fresh clocks agree with each other and the reference.
            for d in old_dim..new_dim {
                bounds[c * new_dim + d] = Bound::ZERO;
            }
        }
        self.dim = new_dim;
        self.bounds = bounds;
    }

    /// Deletes row and column `i`; clocks above shift down by one.
    /// Projection of a closed zone stays closed.
    pub fn remove_clock(&mut self, i: usize) {
        debug_assert!(i != 0 && i < self.dim, "invalid clock removal");
        let old_dim = self.dim;
        let new_dim = old_dim - 1;
        let mut bounds = Vec::with_capacity(new_dim * new_dim);
        for r in (0..old_dim).filter(|&r| r != i) {
            for c in (0..old_dim).filter(|&c| c != i) {
                bounds.push(self.at(r, c));
            }
        }
        self.dim = new_dim;
        self.bounds = bounds;
    }

    /// Forgets everything known about clock `i` except that it is
    /// nonnegative. Closure is preserved.
    pub fn free_clock(&mut self, i: usize) {
        debug_assert!(i != 0 && i < self.dim, "invalid clock free");
        for k in 0..self.dim {
            if k == i {
                continue;
            }
            let upper = self.index(i, k);
            self.bounds[upper] = Bound::Infinite;
            let lower = self.index(k, i);
            self.bounds[lower] = self.at(k, 0);
        }
    }

    /// Exchanges clocks `i` and `j` in place, bounds included.
    pub fn swap_clocks(&mut self, i: usize, j: usize) {
        debug_assert!(i != 0 && j != 0, "cannot swap the reference clock");
        if i == j {
            return;
        }
        for k in 0..self.dim {
            let a = self.index(i, k);
            let b = self.index(j, k);
            self.bounds.swap(a, b);
        }
        for k in 0..self.dim {
            let a = self.index(k, i);
            let b = self.index(k, j);
            self.bounds.swap(a, b);
        }
    }

    /// Projects the zone onto the clocks marked in `keep` (the reference
    /// clock must be kept). Returns the remap table: `remap[old]` is the
    /// new index of a kept clock, `None` for dropped ones.
    pub fn resize(&mut self, keep: &[bool]) -> Vec<Option<usize>> {
        assert_eq!(keep.len(), self.dim);
        assert!(keep[0], "the reference clock cannot be dropped");
        let mut remap = vec![None; self.dim];
        let mut next = 0usize;
        for (old, &kept) in keep.iter().enumerate() {
            if kept {
                remap[old] = Some(next);
                next += 1;
            }
        }
        let new_dim = next;
        let mut bounds = Vec::with_capacity(new_dim * new_dim);
        for r in 0..self.dim {
            if remap[r].is_none() {
                continue;
            }
            for c in 0..self.dim {
                if remap[c].is_some() {
                    bounds.push(self.at(r, c));
                }
            }
        }
        self.dim = new_dim;
        self.bounds = bounds;
        remap
    }
}

impl fmt::Debug for Dbm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dbm(dim={})", self.dim)?;
        for i in 0..self.dim {
            write!(f, "  ")?;
            for j in 0..self.dim {
                write!(f, "{:>8} ", self.at(i, j).to_string())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_zone() -> Dbm {
        // One clock with age in [1, 3].
        let mut dbm = Dbm::universe(1);
        dbm.restrict(0, 1, Bound::weak(-1));
        dbm.restrict(1, 0, Bound::weak(3));
        dbm
    }

    #[test]
    fn restriction_never_grows_the_zone() {
        let original = unit_zone();
        let mut tightened = original.clone();
        tightened.restrict(1, 0, Bound::weak(2));
        assert!(matches!(
            tightened.relation(&original),
            ZoneRelation::Subset | ZoneRelation::Equal
        ));

        let mut unchanged = original.clone();
        unchanged.restrict(1, 0, Bound::weak(10));
        assert_eq!(unchanged.relation(&original), ZoneRelation::Equal);
    }

    #[test]
    fn conflicting_restrictions_empty_the_zone() {
        let mut dbm = unit_zone();
        assert!(!dbm.is_empty());
        dbm.restrict(1, 0, Bound::strict(1)); // age < 1 against age >= 1
        assert!(dbm.is_empty());
    }

    #[test]
    fn future_then_fix_roundtrips() {
        let original = Dbm::zero(2);
        let mut delayed = original.clone();
        delayed.future();
        delayed.restrict(1, 0, Bound::weak(0));
        delayed.restrict(2, 0, Bound::weak(0));
        assert_eq!(delayed.relation(&original), ZoneRelation::Equal);
    }

    #[test]
    fn future_keeps_lower_bounds() {
        let mut dbm = unit_zone();
        dbm.future();
        assert_eq!(dbm.at(0, 1), Bound::weak(-1));
        assert_eq!(dbm.at(1, 0), Bound::Infinite);
    }

    #[test]
    fn reset_pins_clock_to_zero() {
        let mut dbm = unit_zone();
        dbm.reset(1);
        assert_eq!(dbm.at(1, 0), Bound::ZERO);
        assert_eq!(dbm.at(0, 1), Bound::ZERO);
    }

    #[test]
    fn add_then_remove_clock_is_identity() {
        let original = unit_zone();
        let mut grown = original.clone();
        grown.add_clocks(1);
        assert_eq!(grown.dim(), 3);
        // The newborn clock starts at zero.
        assert_eq!(grown.at(2, 0), Bound::ZERO);
        assert_eq!(grown.at(0, 2), Bound::ZERO);
        grown.remove_clock(2);
        assert_eq!(grown.relation(&original), ZoneRelation::Equal);
    }

    #[test]
    fn newborn_clock_tracks_existing_ages() {
        // Existing clock in [1, 3]; a newborn is exactly that much
        // younger: clock1 - clock2 stays within [1, 3].
        let mut dbm = unit_zone();
        dbm.add_clocks(1);
        assert_eq!(dbm.at(1, 2), Bound::weak(3));
        assert_eq!(dbm.at(2, 1), Bound::weak(-1));
    }

    #[test]
    fn extrapolation_is_idempotent() {
        let mut dbm = Dbm::universe(2);
        dbm.restrict(0, 1, Bound::weak(-7));
        dbm.restrict(2, 0, Bound::weak(9));
        let consts = vec![0, 4, 4];
        let mut once = dbm.clone();
        once.extrapolate(&consts);
        let mut twice = once.clone();
        twice.extrapolate(&consts);
        assert_eq!(once.relation(&twice), ZoneRelation::Equal);
        // The bound beyond the max constant opened up.
        assert_eq!(once.at(2, 0), Bound::Infinite);
        // The lower bound relaxed to the strict negated constant.
        assert_eq!(once.at(0, 1), Bound::strict(-4));
    }

    #[test]
    fn extrapolation_widens() {
        let mut dbm = unit_zone();
        let original = dbm.clone();
        dbm.extrapolate(&[0, 2]);
        assert!(matches!(
            original.relation(&dbm),
            ZoneRelation::Subset | ZoneRelation::Equal
        ));
    }

    #[test]
    fn swap_is_symmetric() {
        let mut dbm = Dbm::universe(2);
        dbm.restrict(1, 0, Bound::weak(5));
        dbm.restrict(0, 2, Bound::weak(-2));
        let mut swapped = dbm.clone();
        swapped.swap_clocks(1, 2);
        assert_eq!(swapped.at(2, 0), Bound::weak(5));
        assert_eq!(swapped.at(0, 1), Bound::weak(-2));
        swapped.swap_clocks(1, 2);
        assert_eq!(swapped.relation(&dbm), ZoneRelation::Equal);
    }

    #[test]
    fn resize_projects_and_remaps() {
        let mut dbm = Dbm::universe(3);
        dbm.restrict(2, 0, Bound::weak(4));
        let remap = dbm.resize(&[true, false, true, true]);
        assert_eq!(remap, vec![Some(0), None, Some(1), Some(2)]);
        assert_eq!(dbm.dim(), 3);
        assert_eq!(dbm.at(1, 0), Bound::weak(4));
    }

    #[test]
    fn can_satisfy_is_non_mutating() {
        let dbm = unit_zone();
        // Age in [1, 3]: an upper-bound guard of 2 is satisfiable, an
        // upper bound strictly below the minimum age is not.
        assert!(dbm.can_satisfy(1, 0, Bound::weak(2)));
        assert!(!dbm.can_satisfy(1, 0, Bound::strict(1)));
        assert!(dbm.can_satisfy(0, 1, Bound::weak(-2)));
        assert!(!dbm.can_satisfy(0, 1, Bound::strict(-3)));
    }

    #[test]
    fn freed_clock_keeps_only_nonnegativity() {
        let mut dbm = Dbm::zero(2);
        dbm.restrict(1, 0, Bound::weak(0));
        dbm.free_clock(1);
        assert_eq!(dbm.at(1, 0), Bound::Infinite);
        assert_eq!(dbm.at(0, 1), Bound::ZERO);
        // the other clock is untouched
        assert_eq!(dbm.at(2, 0), Bound::ZERO);
        assert_eq!(dbm.at(2, 1), Bound::ZERO);
        assert_eq!(dbm.at(1, 2), Bound::Infinite);
    }
}

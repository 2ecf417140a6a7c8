//! Differential testing of the zone engine.
//!
//! Random operation sequences are applied both to `Dbm`, which closes
//! incrementally after each restriction, and to a brute-force reference
//! that recomputes the full shortest-path closure from scratch. The two
//! must agree on emptiness and, when nonempty, on every entry.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tapn_reach::zone::{Bound, Dbm, Strictness};

/// Reference zone: same bound algebra, no incremental cleverness.
#[derive(Clone)]
struct RefZone {
    dim: usize,
    bounds: Vec<Vec<Bound>>,
}

impl RefZone {
    fn zero(clocks: usize) -> Self {
        let dim = clocks + 1;
        RefZone {
            dim,
            bounds: vec![vec![Bound::ZERO; dim]; dim],
        }
    }

    fn restrict(&mut self, i: usize, j: usize, bound: Bound) {
        if bound < self.bounds[i][j] {
            self.bounds[i][j] = bound;
        }
        self.close();
    }

    fn future(&mut self) {
        for i in 1..self.dim {
            self.bounds[i][0] = Bound::Infinite;
        }
        self.close();
    }

    fn reset(&mut self, i: usize) {
        for j in 0..self.dim {
            self.bounds[i][j] = self.bounds[0][j];
            self.bounds[j][i] = self.bounds[j][0];
        }
        self.bounds[i][i] = Bound::ZERO;
        self.close();
    }

    fn close(&mut self) {
        for k in 0..self.dim {
            for i in 0..self.dim {
                for j in 0..self.dim {
                    let via = self.bounds[i][k] + self.bounds[k][j];
                    if via < self.bounds[i][j] {
                        self.bounds[i][j] = via;
                    }
                }
            }
        }
    }

    fn is_empty(&self) -> bool {
        (0..self.dim).any(|i| self.bounds[i][i] < Bound::ZERO)
    }
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Restrict(usize, usize, Bound),
    Future,
    Reset(usize),
}

fn random_op(rng: &mut StdRng, dim: usize) -> Op {
    match rng.random_range(0..6) {
        0 => Op::Future,
        1 => Op::Reset(rng.random_range(1..dim)),
        _ => {
            let i = rng.random_range(0..dim);
            let mut j = rng.random_range(0..dim);
            while j == i {
                j = rng.random_range(0..dim);
            }
            let value = rng.random_range(-5..=10);
            let strictness = if rng.random_bool(0.5) {
                Strictness::Strict
            } else {
                Strictness::Weak
            };
            Op::Restrict(i, j, Bound::Finite(value, strictness))
        }
    }
}

fn apply(dbm: &mut Dbm, reference: &mut RefZone, op: Op) {
    match op {
        Op::Restrict(i, j, bound) => {
            dbm.restrict(i, j, bound);
            reference.restrict(i, j, bound);
        }
        Op::Future => {
            dbm.future();
            reference.future();
        }
        Op::Reset(i) => {
            dbm.reset(i);
            reference.reset(i);
        }
    }
}

#[test]
fn incremental_closure_matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(0xD1FF);
    for _ in 0..300 {
        let clocks = rng.random_range(1..=4);
        let dim = clocks + 1;
        let mut dbm = Dbm::zero(clocks);
        let mut reference = RefZone::zero(clocks);

        for _ in 0..rng.random_range(1..=12) {
            let op = random_op(&mut rng, dim);
            apply(&mut dbm, &mut reference, op);

            assert_eq!(
                dbm.is_empty(),
                reference.is_empty(),
                "emptiness diverged after {op:?}"
            );
            if dbm.is_empty() {
                break;
            }
            for i in 0..dim {
                for j in 0..dim {
                    assert_eq!(
                        dbm.at(i, j),
                        reference.bounds[i][j],
                        "entry ({i},{j}) diverged after {op:?}"
                    );
                }
            }
        }
    }
}

#[test]
fn extrapolation_agrees_with_reclosure() {
    // extrapolating a closed zone and closing it again changes nothing
    let mut rng = StdRng::seed_from_u64(0xE17);
    for _ in 0..100 {
        let clocks = rng.random_range(1..=4);
        let dim = clocks + 1;
        let mut dbm = Dbm::zero(clocks);
        let mut reference = RefZone::zero(clocks);
        for _ in 0..rng.random_range(1..=8) {
            apply(&mut dbm, &mut reference, random_op(&mut rng, dim));
        }
        if dbm.is_empty() {
            continue;
        }

        let mut constants = vec![0i64; dim];
        for c in constants.iter_mut().skip(1) {
            *c = rng.random_range(0..=6);
        }
        dbm.extrapolate(&constants);

        let mut reclosed = RefZone::zero(clocks);
        for i in 0..dim {
            for j in 0..dim {
                reclosed.bounds[i][j] = dbm.at(i, j);
            }
        }
        reclosed.close();
        for i in 0..dim {
            for j in 0..dim {
                assert_eq!(dbm.at(i, j), reclosed.bounds[i][j], "not in closed form");
            }
        }
    }
}

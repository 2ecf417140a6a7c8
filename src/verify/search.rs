//! The forward reachability search.

use log::{debug, warn};
use serde::Serialize;

use crate::marking::inclusion::MarkingFactory;
use crate::marking::symbolic::SymbolicMarking;
use crate::tapn::ids::{PlaceId, StateId};
use crate::tapn::net::TimedArcPetriNet;
use crate::trace::SymbolicTrace;
use crate::verify::pwlist::{PassedWaitingList, StateMeta};
use crate::verify::query::{Expr, Query};
use crate::verify::successors::SuccessorGenerator;
use crate::verify::waiting::SearchOrder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    Satisfied,
    NotSatisfied,
    /// The token bound cut off part of the state space without a
    /// witness being found, so no verdict is possible.
    BoundExceeded,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SearchStats {
    pub discovered: usize,
    pub stored: usize,
    pub explored: usize,
    /// Largest token count any marking reached, discarded ones included.
    pub max_used_tokens: usize,
}

pub struct Verifier<'a> {
    net: &'a TimedArcPetriNet,
    query: Query,
    goal: Expr,
    factory: MarkingFactory,
    generator: SuccessorGenerator<'a>,
    pwlist: PassedWaitingList,
    initial_places: Vec<PlaceId>,
    k_bound: Option<usize>,
    next_token_id: u32,
    max_used_tokens: usize,
    bound_hit: bool,
    witness: Option<StateId>,
}

impl<'a> Verifier<'a> {
    pub fn new(
        net: &'a TimedArcPetriNet,
        initial_places: Vec<PlaceId>,
        query: Query,
        factory: MarkingFactory,
        order: SearchOrder,
        k_bound: Option<usize>,
        record_trace: bool,
    ) -> Self {
        let goal = query.search_goal();
        Verifier {
            net,
            query,
            goal,
            factory,
            generator: SuccessorGenerator::new(net, record_trace),
            pwlist: PassedWaitingList::new(order),
            initial_places,
            k_bound,
            next_token_id: 0,
            max_used_tokens: 0,
            bound_hit: false,
            witness: None,
        }
    }

    pub fn verify(&mut self) -> Outcome {
        let mut initial = SymbolicMarking::initial(&self.initial_places, &mut self.next_token_id);
        self.max_used_tokens = initial.num_tokens();
        initial.delay(|p| self.net.place(p).invariant);
        initial.extrapolate(&self.net.max_constants());
        initial.canonicalize();
        self.pwlist
            .add(self.factory.store(&initial), StateMeta::default());

        while let Some(id) = self.pwlist.next_unexplored() {
            let marking = self
                .factory
                .retrieve(self.pwlist.marking(id), &mut self.next_token_id);
            if self.goal.eval(&marking.counts(self.net.num_places())) {
                debug!("witness found after {} states", self.pwlist.stats().explored);
                self.witness = Some(id);
                return self.conclude(true);
            }
            for (succ, step) in self.generator.successors(&marking, &mut self.next_token_id) {
                self.max_used_tokens = self.max_used_tokens.max(succ.num_tokens());
                if let Some(k) = self.k_bound {
                    if succ.num_tokens() > k {
                        self.bound_hit = true;
                        continue;
                    }
                }
                let meta = StateMeta {
                    parent: Some(id),
                    step,
                };
                self.pwlist.add(self.factory.store(&succ), meta);
            }
        }

        if self.bound_hit {
            warn!("search exhausted but the token bound pruned successors");
            return Outcome::BoundExceeded;
        }
        self.conclude(false)
    }

    fn conclude(&self, witness_found: bool) -> Outcome {
        if self.query.outcome_of(witness_found) {
            Outcome::Satisfied
        } else {
            Outcome::NotSatisfied
        }
    }

    pub fn stats(&self) -> SearchStats {
        let store = self.pwlist.stats();
        SearchStats {
            discovered: store.discovered,
            stored: store.stored,
            explored: store.explored,
            max_used_tokens: self.max_used_tokens,
        }
    }

    /// The step sequence leading to the witness, oldest first, plus the
    /// bounded invariants of the witness marking. Only available when
    /// trace recording was on and a witness was found.
    pub fn trace(&mut self) -> Option<SymbolicTrace> {
        let witness = self.witness?;
        let mut steps = Vec::new();
        let mut cursor = witness;
        loop {
            let meta = self.pwlist.meta(cursor);
            match (&meta.step, meta.parent) {
                (Some(step), Some(parent)) => {
                    steps.push(step.clone());
                    cursor = parent;
                }
                _ => break,
            }
        }
        steps.reverse();

        let marking = self
            .factory
            .retrieve(self.pwlist.marking(witness), &mut self.next_token_id);
        let final_invariants = (0..marking.num_tokens())
            .filter_map(|t| {
                let inv = self.net.place(marking.place_of(t)).invariant;
                (!inv.is_unbounded()).then(|| (marking.id_of(t), inv))
            })
            .collect();
        Some(SymbolicTrace {
            steps,
            final_invariants,
        })
    }
}

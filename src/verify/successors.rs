//! Symbolic successor generation.
//!
//! For every transition, tokens that can satisfy each input guard are
//! combined into distinct-token bindings; each binding yields one
//! successor marking, normalized and ready for storage.

use itertools::Itertools;
use log::trace;

use crate::marking::symbolic::SymbolicMarking;
use crate::tapn::ids::{PlaceId, TransitionId};
use crate::tapn::index_vec::IndexVec;
use crate::tapn::net::TimedArcPetriNet;
use crate::tapn::structure::TimedTransition;
use crate::trace::step::TraceStep;

pub struct SuccessorGenerator<'a> {
    net: &'a TimedArcPetriNet,
    max_constants: IndexVec<PlaceId, i64>,
    record_steps: bool,
}

impl<'a> SuccessorGenerator<'a> {
    pub fn new(net: &'a TimedArcPetriNet, record_steps: bool) -> Self {
        SuccessorGenerator {
            net,
            max_constants: net.max_constants(),
            record_steps,
        }
    }

    /// All successors of `marking`, canonicalized. Each comes with its
    /// trace record when recording is on.
    pub fn successors(
        &self,
        marking: &SymbolicMarking,
        next_id: &mut u32,
    ) -> Vec<(SymbolicMarking, Option<TraceStep>)> {
        let mut out = Vec::new();
        for (transition_id, transition) in self.net.transitions() {
            if self.is_inhibited(marking, transition) {
                continue;
            }
            for binding in self.bindings(marking, transition) {
                if let Some(succ) = self.fire(marking, transition_id, transition, &binding, next_id)
                {
                    out.push(succ);
                }
            }
        }
        trace!("{} successors generated", out.len());
        out
    }

    fn is_inhibited(&self, marking: &SymbolicMarking, transition: &TimedTransition) -> bool {
        transition.inhibitor_arcs.iter().any(|arc| {
            marking
                .tokens_in(arc.place)
                .any(|token| marking.potentially_satisfies(token, arc.guard))
        })
    }

    /// One token per input arc, all distinct.
    fn bindings(
        &self,
        marking: &SymbolicMarking,
        transition: &TimedTransition,
    ) -> Vec<Vec<usize>> {
        if transition.input_arcs.is_empty() {
            return vec![Vec::new()];
        }
        let candidates: Vec<Vec<usize>> = transition
            .input_arcs
            .iter()
            .map(|arc| {
                marking
                    .tokens_in(arc.place)
                    .filter(|&t| marking.potentially_satisfies(t, arc.guard))
                    .collect()
            })
            .collect();
        if candidates.iter().any(|c| c.is_empty()) {
            return Vec::new();
        }
        candidates
            .iter()
            .map(|c| c.iter().copied())
            .multi_cartesian_product()
            .filter(|binding| binding.iter().all_unique())
            .collect()
    }

    fn fire(
        &self,
        marking: &SymbolicMarking,
        transition_id: TransitionId,
        transition: &TimedTransition,
        binding: &[usize],
        next_id: &mut u32,
    ) -> Option<(SymbolicMarking, Option<TraceStep>)> {
        let mut succ = marking.clone();
        let mut consumed = Vec::with_capacity(binding.len());
        for (&token, arc) in binding.iter().zip(transition.input_arcs.iter()) {
            succ.constrain(token, arc.guard);
            consumed.push((succ.id_of(token), arc.guard));
        }
        // individually satisfiable guards can still conflict jointly
        if succ.is_empty() {
            return None;
        }

        // invariants of the marking this step fires from, needed to
        // solve for concrete delays later
        let step_invariants = if self.record_steps {
            (0..marking.num_tokens())
                .filter_map(|t| {
                    let inv = self.net.place(marking.place_of(t)).invariant;
                    (!inv.is_unbounded()).then(|| (marking.id_of(t), inv))
                })
                .collect()
        } else {
            Vec::new()
        };

        let mut doomed = binding.to_vec();
        succ.remove_tokens(&mut doomed);

        let outputs: Vec<PlaceId> = transition.output_arcs.iter().map(|a| a.place).collect();
        let first_new = succ.num_tokens();
        succ.add_tokens(&outputs, next_id);
        let produced: Vec<_> = (first_new..succ.num_tokens())
            .map(|t| succ.id_of(t))
            .collect();
        for token in first_new..succ.num_tokens() {
            succ.apply_invariant(token, self.net.place(succ.place_of(token)).invariant);
        }

        succ.delay(|p| self.net.place(p).invariant);
        succ.extrapolate(&self.max_constants);
        succ.canonicalize();

        let step = self.record_steps.then(|| TraceStep {
            transition: transition_id,
            consumed,
            produced,
            invariants: step_invariants,
        });
        Some((succ, step))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tapn::ids::PlaceId;
    use crate::tapn::interval::{TimeInterval, TimeInvariant};
    use crate::tapn::structure::{TimedPlace, TimedTransition};
    use crate::zone::Bound;

    fn producer_net() -> (TimedArcPetriNet, PlaceId, PlaceId) {
        let mut net = TimedArcPetriNet::new();
        let src = net
            .add_place(TimedPlace::with_invariant("src", TimeInvariant::at_most(5)))
            .unwrap();
        let dst = net.add_place(TimedPlace::new("dst")).unwrap();
        let t = net.add_transition(TimedTransition::new("t")).unwrap();
        net.add_input_arc(t, src, TimeInterval::closed(2, 4));
        net.add_output_arc(t, dst);
        (net, src, dst)
    }

    fn initial(net: &TimedArcPetriNet, places: &[PlaceId], next: &mut u32) -> SymbolicMarking {
        let mut m = SymbolicMarking::initial(places, next);
        m.delay(|p| net.place(p).invariant);
        m.extrapolate(&net.max_constants());
        m.canonicalize();
        m
    }

    #[test]
    fn firing_moves_the_token_and_resets_its_age() {
        let (net, src, dst) = producer_net();
        let gen = SuccessorGenerator::new(&net, false);
        let mut next = 0;
        let m = initial(&net, &[src], &mut next);

        let succs = gen.successors(&m, &mut next);
        assert_eq!(succs.len(), 1);
        let succ = &succs[0].0;
        assert_eq!(succ.placement(), &[dst]);
        // the new token was born at zero and dst is unbounded
        assert_eq!(succ.age_bounds(0).0, Bound::ZERO);
        assert_eq!(succ.age_bounds(0).1, Bound::Infinite);
    }

    #[test]
    fn unsatisfiable_guard_disables_the_transition() {
        let mut net = TimedArcPetriNet::new();
        let src = net
            .add_place(TimedPlace::with_invariant("src", TimeInvariant::at_most(1)))
            .unwrap();
        let t = net.add_transition(TimedTransition::new("t")).unwrap();
        net.add_input_arc(t, src, TimeInterval::at_least(3));

        let gen = SuccessorGenerator::new(&net, false);
        let mut next = 0;
        let m = initial(&net, &[src], &mut next);
        assert!(gen.successors(&m, &mut next).is_empty());
    }

    #[test]
    fn inhibitor_blocks_while_a_token_can_match() {
        let (mut net, src, dst) = producer_net();
        let guard_place = net.add_place(TimedPlace::new("watch")).unwrap();
        let t = net.transition_by_name("t").unwrap();
        net.add_inhibitor_arc(t, guard_place, TimeInterval::ZERO_TO_INF);

        let gen = SuccessorGenerator::new(&net, false);
        let mut next = 0;

        let blocked = initial(&net, &[src, guard_place], &mut next);
        assert!(gen.successors(&blocked, &mut next).is_empty());

        let free = initial(&net, &[src], &mut next);
        assert_eq!(gen.successors(&free, &mut next).len(), 1);
        let _ = dst;
    }

    #[test]
    fn two_arcs_need_two_distinct_tokens() {
        let mut net = TimedArcPetriNet::new();
        let p = net.add_place(TimedPlace::new("p")).unwrap();
        let q = net.add_place(TimedPlace::new("q")).unwrap();
        let t = net.add_transition(TimedTransition::new("t")).unwrap();
        net.add_input_arc(t, p, TimeInterval::ZERO_TO_INF);
        net.add_input_arc(t, p, TimeInterval::ZERO_TO_INF);
        net.add_output_arc(t, q);

        let gen = SuccessorGenerator::new(&net, false);
        let mut next = 0;

        let one = initial(&net, &[p], &mut next);
        assert!(gen.successors(&one, &mut next).is_empty());

        let two = initial(&net, &[p, p], &mut next);
        // two tokens, two orderings of the same pair
        assert_eq!(gen.successors(&two, &mut next).len(), 2);
    }

    #[test]
    fn trace_records_name_consumed_and_produced_tokens() {
        let (net, src, _) = producer_net();
        let gen = SuccessorGenerator::new(&net, true);
        let mut next = 0;
        let m = initial(&net, &[src], &mut next);
        let consumed_id = m.id_of(0);

        let succs = gen.successors(&m, &mut next);
        let step = succs[0].1.as_ref().unwrap();
        assert_eq!(step.consumed.len(), 1);
        assert_eq!(step.consumed[0].0, consumed_id);
        assert_eq!(step.produced.len(), 1);
        assert_ne!(step.produced[0], consumed_id);
        // src has a bounded invariant, recorded for the delay solver
        assert_eq!(step.invariants.len(), 1);
        assert_eq!(step.invariants[0].0, consumed_id);
    }
}

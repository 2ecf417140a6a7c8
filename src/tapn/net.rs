//! The timed-arc Petri net itself, assembled through a builder-style API.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tapn::ids::{PlaceId, TransitionId};
use crate::tapn::index_vec::IndexVec;
use crate::tapn::interval::{TimeInterval, TimeInvariant};
use crate::tapn::structure::{InhibitorArc, InputArc, OutputArc, TimedPlace, TimedTransition};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("duplicate place name `{0}`")]
    DuplicatePlace(String),
    #[error("duplicate transition name `{0}`")]
    DuplicateTransition(String),
    #[error("unknown place `{0}`")]
    UnknownPlace(String),
    #[error("unknown transition `{0}`")]
    UnknownTransition(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimedArcPetriNet {
    places: IndexVec<PlaceId, TimedPlace>,
    transitions: IndexVec<TransitionId, TimedTransition>,
    #[serde(skip)]
    place_names: FxHashMap<String, PlaceId>,
    #[serde(skip)]
    transition_names: FxHashMap<String, TransitionId>,
}

impl TimedArcPetriNet {
    pub fn new() -> Self {
        TimedArcPetriNet::default()
    }

    pub fn add_place(&mut self, place: TimedPlace) -> Result<PlaceId, ModelError> {
        if self.place_names.contains_key(&place.name) {
            return Err(ModelError::DuplicatePlace(place.name));
        }
        let name = place.name.clone();
        let id = self.places.push(place);
        self.place_names.insert(name, id);
        Ok(id)
    }

    pub fn add_transition(
        &mut self,
        transition: TimedTransition,
    ) -> Result<TransitionId, ModelError> {
        if self.transition_names.contains_key(&transition.name) {
            return Err(ModelError::DuplicateTransition(transition.name));
        }
        let name = transition.name.clone();
        let id = self.transitions.push(transition);
        self.transition_names.insert(name, id);
        Ok(id)
    }

    pub fn add_input_arc(&mut self, transition: TransitionId, place: PlaceId, guard: TimeInterval) {
        self.transitions[transition].input_arcs.push(InputArc { place, guard });
    }

    pub fn add_output_arc(&mut self, transition: TransitionId, place: PlaceId) {
        self.transitions[transition].output_arcs.push(OutputArc { place });
    }

    pub fn add_inhibitor_arc(
        &mut self,
        transition: TransitionId,
        place: PlaceId,
        guard: TimeInterval,
    ) {
        self.transitions[transition]
            .inhibitor_arcs
            .push(InhibitorArc { place, guard });
    }

    pub fn place(&self, id: PlaceId) -> &TimedPlace {
        &self.places[id]
    }

    pub fn transition(&self, id: TransitionId) -> &TimedTransition {
        &self.transitions[id]
    }

    pub fn num_places(&self) -> usize {
        self.places.len()
    }

    pub fn num_transitions(&self) -> usize {
        self.transitions.len()
    }

    pub fn places(&self) -> impl Iterator<Item = (PlaceId, &TimedPlace)> {
        self.places.iter_enumerated()
    }

    pub fn transitions(&self) -> impl Iterator<Item = (TransitionId, &TimedTransition)> {
        self.transitions.iter_enumerated()
    }

    pub fn place_by_name(&self, name: &str) -> Result<PlaceId, ModelError> {
        self.place_names
            .get(name)
            .copied()
            .ok_or_else(|| ModelError::UnknownPlace(name.to_owned()))
    }

    pub fn transition_by_name(&self, name: &str) -> Result<TransitionId, ModelError> {
        self.transition_names
            .get(name)
            .copied()
            .ok_or_else(|| ModelError::UnknownTransition(name.to_owned()))
    }

    /// Rebuilds the name lookup tables, needed after deserialization.
    pub fn rebuild_name_index(&mut self) {
        self.place_names = self
            .places
            .iter_enumerated()
            .map(|(id, p)| (p.name.clone(), id))
            .collect();
        self.transition_names = self
            .transitions
            .iter_enumerated()
            .map(|(id, t)| (t.name.clone(), id))
            .collect();
    }

    /// Per-place maximum constants for extrapolation. The constant of a
    /// place is the largest finite number appearing in its invariant or
    /// in any guard attached to it; untimed places get -1 so their
    /// clocks extrapolate to the universe.
    pub fn max_constants(&self) -> IndexVec<PlaceId, i64> {
        let mut constants = IndexVec::from_elem(-1, self.places.len());
        for (id, place) in self.places.iter_enumerated() {
            if place.untimed {
                continue;
            }
            constants[id] = constants[id].max(self.invariant_constant(&place.invariant));
        }
        for transition in self.transitions.iter() {
            for arc in &transition.input_arcs {
                if !self.places[arc.place].untimed {
                    let c = &mut constants[arc.place];
                    *c = (*c).max(arc.guard.max_constant());
                }
            }
            for arc in &transition.inhibitor_arcs {
                if !self.places[arc.place].untimed {
                    let c = &mut constants[arc.place];
                    *c = (*c).max(arc.guard.max_constant());
                }
            }
        }
        constants
    }

    /// Which places are the target of an inhibitor arc.
    pub fn inhibited_places(&self) -> IndexVec<PlaceId, bool> {
        let mut inhibited = IndexVec::from_elem(false, self.places.len());
        for transition in self.transitions.iter() {
            for arc in &transition.inhibitor_arcs {
                inhibited[arc.place] = true;
            }
        }
        inhibited
    }

    fn invariant_constant(&self, invariant: &TimeInvariant) -> i64 {
        invariant.bound.unwrap_or(-1)
    }
}

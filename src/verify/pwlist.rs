//! Combined passed and waiting store.
//!
//! Markings are bucketed by their discrete hash; within a bucket the
//! zone relation decides whether a newcomer is covered, covers an
//! existing entry, or is genuinely new.

use log::trace;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::marking::inclusion::StoredMarking;
use crate::tapn::ids::StateId;
use crate::tapn::index_vec::IndexVec;
use crate::trace::step::TraceStep;
use crate::verify::waiting::{SearchOrder, WaitingList};
use crate::zone::ZoneRelation;

/// How a state was reached, for trace reconstruction.
#[derive(Debug, Clone, Default)]
pub struct StateMeta {
    pub parent: Option<StateId>,
    pub step: Option<TraceStep>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddResult {
    /// Stored and enqueued, possibly replacing a covered entry.
    Fresh(StateId),
    /// Covered by an already stored marking.
    Redundant,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StoreStats {
    /// Successors handed to the store, duplicates included.
    pub discovered: usize,
    /// Distinct entries currently stored.
    pub stored: usize,
    /// States popped for exploration.
    pub explored: usize,
}

struct Entry {
    marking: StoredMarking,
    meta: StateMeta,
    in_waiting: bool,
}

pub struct PassedWaitingList {
    buckets: FxHashMap<u64, SmallVec<[StateId; 4]>>,
    entries: IndexVec<StateId, Entry>,
    waiting: WaitingList,
    stats: StoreStats,
}

impl PassedWaitingList {
    pub fn new(order: SearchOrder) -> Self {
        PassedWaitingList {
            buckets: FxHashMap::default(),
            entries: IndexVec::new(),
            waiting: WaitingList::new(order),
            stats: StoreStats::default(),
        }
    }

    /// Applies the coverage rule: a newcomer covered by an existing
    /// entry is dropped; a newcomer strictly covering an existing entry
    /// replaces it in place and the state is explored again; anything
    /// else becomes a new entry. The marking must be in stored form.
    pub fn add(&mut self, marking: StoredMarking, meta: StateMeta) -> AddResult {
        self.stats.discovered += 1;
        let hash = marking.discrete_hash();
        let bucket: SmallVec<[StateId; 4]> = self.buckets.get(&hash).cloned().unwrap_or_default();
        for id in bucket {
            match marking.relation(&self.entries[id].marking) {
                ZoneRelation::Equal | ZoneRelation::Subset => {
                    trace!("marking covered by stored state {id:?}");
                    return AddResult::Redundant;
                }
                ZoneRelation::Superset => {
                    trace!("marking covers stored state {id:?}, replacing");
                    let covered = marking.covered_places();
                    let entry = &mut self.entries[id];
                    entry.marking = marking;
                    entry.meta = meta;
                    if !entry.in_waiting {
                        entry.in_waiting = true;
                        self.waiting.push(id, covered);
                    }
                    return AddResult::Fresh(id);
                }
                ZoneRelation::Different => {}
            }
        }
        let covered = marking.covered_places();
        let id = self.entries.push(Entry {
            marking,
            meta,
            in_waiting: true,
        });
        self.buckets.entry(hash).or_default().push(id);
        self.waiting.push(id, covered);
        self.stats.stored += 1;
        AddResult::Fresh(id)
    }

    pub fn next_unexplored(&mut self) -> Option<StateId> {
        let id = self.waiting.pop()?;
        self.entries[id].in_waiting = false;
        self.stats.explored += 1;
        Some(id)
    }

    pub fn has_waiting(&self) -> bool {
        !self.waiting.is_empty()
    }

    pub fn marking(&self, id: StateId) -> &StoredMarking {
        &self.entries[id].marking
    }

    pub fn meta(&self, id: StateId) -> &StateMeta {
        &self.entries[id].meta
    }

    pub fn stats(&self) -> StoreStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marking::inclusion::MarkingFactory;
    use crate::marking::symbolic::SymbolicMarking;
    use crate::tapn::ids::PlaceId;
    use crate::tapn::interval::{TimeInterval, TimeInvariant};
    use crate::tapn::net::TimedArcPetriNet;
    use crate::tapn::structure::TimedPlace;

    fn one_place_net() -> (TimedArcPetriNet, PlaceId) {
        let mut net = TimedArcPetriNet::new();
        let p = net.add_place(TimedPlace::new("p")).unwrap();
        (net, p)
    }

    fn stored(factory: &MarkingFactory, m: &mut SymbolicMarking) -> StoredMarking {
        m.canonicalize();
        factory.store(m)
    }

    #[test]
    fn equal_marking_is_redundant() {
        let (net, p) = one_place_net();
        let factory = MarkingFactory::plain(&net);
        let mut pw = PassedWaitingList::new(SearchOrder::Bfs);
        let mut next = 0;

        let mut a = SymbolicMarking::initial(&[p], &mut next);
        let mut b = SymbolicMarking::initial(&[p], &mut next);
        assert!(matches!(
            pw.add(stored(&factory, &mut a), StateMeta::default()),
            AddResult::Fresh(_)
        ));
        assert_eq!(
            pw.add(stored(&factory, &mut b), StateMeta::default()),
            AddResult::Redundant
        );
        assert_eq!(pw.stats().stored, 1);
        assert_eq!(pw.stats().discovered, 2);
    }

    #[test]
    fn narrower_zone_is_covered() {
        let (net, p) = one_place_net();
        let factory = MarkingFactory::plain(&net);
        let mut pw = PassedWaitingList::new(SearchOrder::Bfs);
        let mut next = 0;

        let mut wide = SymbolicMarking::initial(&[p], &mut next);
        wide.delay(|_| TimeInvariant::INF);
        pw.add(stored(&factory, &mut wide), StateMeta::default());

        let mut narrow = SymbolicMarking::initial(&[p], &mut next);
        narrow.delay(|_| TimeInvariant::INF);
        narrow.constrain(0, TimeInterval::closed(1, 2));
        assert_eq!(
            pw.add(stored(&factory, &mut narrow), StateMeta::default()),
            AddResult::Redundant
        );
    }

    #[test]
    fn covering_marking_replaces_and_reenqueues() {
        let (net, p) = one_place_net();
        let factory = MarkingFactory::plain(&net);
        let mut pw = PassedWaitingList::new(SearchOrder::Bfs);
        let mut next = 0;

        let mut narrow = SymbolicMarking::initial(&[p], &mut next);
        let first = pw.add(stored(&factory, &mut narrow), StateMeta::default());
        let AddResult::Fresh(id) = first else {
            panic!("expected fresh insertion");
        };

        // the narrow state has already been explored
        assert_eq!(pw.next_unexplored(), Some(id));
        assert!(!pw.has_waiting());

        let mut wide = SymbolicMarking::initial(&[p], &mut next);
        wide.delay(|_| TimeInvariant::INF);
        let replaced = pw.add(stored(&factory, &mut wide), StateMeta::default());
        assert_eq!(replaced, AddResult::Fresh(id));

        // same slot, refined marking, queued for re-exploration
        assert!(pw.has_waiting());
        assert_eq!(pw.next_unexplored(), Some(id));
        assert_eq!(pw.stats().stored, 1);
    }

    #[test]
    fn different_placements_coexist() {
        let mut net = TimedArcPetriNet::new();
        let p = net.add_place(TimedPlace::new("p")).unwrap();
        let q = net.add_place(TimedPlace::new("q")).unwrap();
        let factory = MarkingFactory::plain(&net);
        let mut pw = PassedWaitingList::new(SearchOrder::Bfs);
        let mut next = 0;

        let mut a = SymbolicMarking::initial(&[p], &mut next);
        let mut b = SymbolicMarking::initial(&[q], &mut next);
        assert!(matches!(
            pw.add(stored(&factory, &mut a), StateMeta::default()),
            AddResult::Fresh(_)
        ));
        assert!(matches!(
            pw.add(stored(&factory, &mut b), StateMeta::default()),
            AddResult::Fresh(_)
        ));
        assert_eq!(pw.stats().stored, 2);
    }
}

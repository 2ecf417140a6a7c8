//! Waiting list disciplines for the forward search.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::tapn::ids::StateId;

/// Which discipline orders the frontier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchOrder {
    Bfs,
    Dfs,
    Random,
    CoverMost,
}

impl fmt::Display for SearchOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SearchOrder::Bfs => "bfs",
            SearchOrder::Dfs => "dfs",
            SearchOrder::Random => "random",
            SearchOrder::CoverMost => "cover-most",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CoverEntry {
    covered: usize,
    id: StateId,
}

impl Ord for CoverEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.covered
            .cmp(&other.covered)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for CoverEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

enum Frontier {
    Bfs(VecDeque<StateId>),
    Dfs(Vec<StateId>),
    Random(Vec<StateId>, StdRng),
    CoverMost(BinaryHeap<CoverEntry>),
}

/// The frontier itself. `push` takes the number of distinct covered
/// places as a priority; only the cover-most discipline looks at it.
pub struct WaitingList {
    frontier: Frontier,
}

impl WaitingList {
    pub fn new(order: SearchOrder) -> Self {
        let frontier = match order {
            SearchOrder::Bfs => Frontier::Bfs(VecDeque::new()),
            SearchOrder::Dfs => Frontier::Dfs(Vec::new()),
            SearchOrder::Random => Frontier::Random(Vec::new(), StdRng::from_os_rng()),
            SearchOrder::CoverMost => Frontier::CoverMost(BinaryHeap::new()),
        };
        WaitingList { frontier }
    }

    pub fn push(&mut self, id: StateId, covered: usize) {
        match &mut self.frontier {
            Frontier::Bfs(queue) => queue.push_back(id),
            Frontier::Dfs(stack) => stack.push(id),
            Frontier::Random(pool, _) => pool.push(id),
            Frontier::CoverMost(heap) => heap.push(CoverEntry { covered, id }),
        }
    }

    pub fn pop(&mut self) -> Option<StateId> {
        match &mut self.frontier {
            Frontier::Bfs(queue) => queue.pop_front(),
            Frontier::Dfs(stack) => stack.pop(),
            Frontier::Random(pool, rng) => {
                if pool.is_empty() {
                    return None;
                }
                let i = rng.random_range(0..pool.len());
                Some(pool.swap_remove(i))
            }
            Frontier::CoverMost(heap) => heap.pop().map(|e| e.id),
        }
    }

    pub fn len(&self) -> usize {
        match &self.frontier {
            Frontier::Bfs(queue) => queue.len(),
            Frontier::Dfs(stack) => stack.len(),
            Frontier::Random(pool, _) => pool.len(),
            Frontier::CoverMost(heap) => heap.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u32]) -> Vec<StateId> {
        raw.iter().map(|&i| StateId::new(i)).collect()
    }

    #[test]
    fn bfs_is_fifo_and_dfs_is_lifo() {
        let mut bfs = WaitingList::new(SearchOrder::Bfs);
        let mut dfs = WaitingList::new(SearchOrder::Dfs);
        for id in ids(&[0, 1, 2]) {
            bfs.push(id, 0);
            dfs.push(id, 0);
        }
        assert_eq!(bfs.pop(), Some(StateId::new(0)));
        assert_eq!(dfs.pop(), Some(StateId::new(2)));
    }

    #[test]
    fn cover_most_prefers_wider_markings() {
        let mut list = WaitingList::new(SearchOrder::CoverMost);
        list.push(StateId::new(0), 1);
        list.push(StateId::new(1), 3);
        list.push(StateId::new(2), 2);
        assert_eq!(list.pop(), Some(StateId::new(1)));
        assert_eq!(list.pop(), Some(StateId::new(2)));
        assert_eq!(list.pop(), Some(StateId::new(0)));
    }

    #[test]
    fn random_drains_every_entry() {
        let mut list = WaitingList::new(SearchOrder::Random);
        for id in ids(&[0, 1, 2, 3]) {
            list.push(id, 0);
        }
        let mut seen = Vec::new();
        while let Some(id) = list.pop() {
            seen.push(id);
        }
        seen.sort();
        assert_eq!(seen, ids(&[0, 1, 2, 3]));
    }
}

//! Token index to zone clock index mapping.
//!
//! Clock 0 of every zone is the reference clock, so token `i` of a fresh
//! marking uses clock `i + 1`. The mapping only diverges from that
//! identity layout transiently, while tokens are added and removed
//! during a firing.

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenMapping {
    clocks: Vec<usize>,
}

impl TokenMapping {
    pub fn identity(tokens: usize) -> Self {
        TokenMapping {
            clocks: (1..=tokens).collect(),
        }
    }

    pub fn num_tokens(&self) -> usize {
        self.clocks.len()
    }

    pub fn clock_of(&self, token: usize) -> usize {
        self.clocks[token]
    }

    /// Appends `count` tokens bound to the clocks a zone grown from
    /// `old_dim` dimensions just gained.
    pub fn append(&mut self, old_dim: usize, count: usize) {
        for i in 0..count {
            self.clocks.push(old_dim + i);
        }
        self.debug_check(old_dim + count);
    }

    /// Drops a token and shifts every mapping entry past its clock down
    /// by one, mirroring the zone losing that clock.
    pub fn remove(&mut self, token: usize) -> usize {
        let removed = self.clocks.remove(token);
        for clock in &mut self.clocks {
            if *clock > removed {
                *clock -= 1;
            }
        }
        removed
    }

    pub fn token_with_clock(&self, clock: usize) -> Option<usize> {
        self.clocks.iter().position(|&c| c == clock)
    }

    pub(crate) fn set_clock(&mut self, token: usize, clock: usize) {
        self.clocks[token] = clock;
    }

    pub fn is_identity(&self) -> bool {
        self.clocks.iter().enumerate().all(|(i, &c)| c == i + 1)
    }

    fn debug_check(&self, dim: usize) {
        if cfg!(debug_assertions) {
            let mut seen = vec![false; dim];
            for &clock in &self.clocks {
                debug_assert!(clock >= 1 && clock < dim, "clock {clock} out of range");
                debug_assert!(!seen[clock], "clock {clock} mapped twice");
                seen[clock] = true;
            }
        }
    }
}

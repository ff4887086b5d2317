//! Factor oracle stored as a node graph with per-state transition arrays.
//!
//! States live in an arena and refer to each other by index, so the graph
//! needs no reference counting and is released in one drop. Each state
//! carries a 256-slot transition array for constant-time branching, a
//! 256-bit map flagging which of those slots are extended transitions, and
//! its supply link.
//!
//! Construction has two phases. First a trie over the reversed patterns is
//! grown, reusing the longest existing suffix path. Then a breadth-first
//! pass converts the trie into an oracle: for each state reached from its
//! parent by byte `b`, the parent's supply chain is walked towards the
//! root, and every chain state lacking a `b` transition gains an extended
//! one pointing at the new state. The supply link of the new state is the
//! chain's first existing `b` target, or the root when the chain runs out.
//!
//! The extended bitmap separates the spanning trie from the DAG edges laid
//! over it: a state reached through an internal transition has exactly one
//! such incoming edge, which is what makes the trie shape recoverable from
//! the finished oracle.

use crate::error::{MultibomError, Result};
use crate::oracle::FactorOracle;
use crate::pattern::Pattern;
use std::collections::VecDeque;
use std::mem;

const NONE: u32 = u32::MAX;
const ROOT: u32 = 0;

/// One oracle state: transition array, extended-edge bitmap, supply link.
#[derive(Debug)]
struct DenseState {
    next: [u32; 256],
    extended: [u64; 4],
    supply: u32,
}

impl DenseState {
    fn new() -> Self {
        Self {
            next: [NONE; 256],
            extended: [0; 4],
            supply: NONE,
        }
    }
}

/// Factor oracle with array-per-state transitions.
#[derive(Debug)]
pub struct DenseOracle {
    states: Vec<DenseState>,
    num_transitions: u32,
}

impl DenseOracle {
    fn new_state(&mut self) -> Result<u32> {
        if self.states.len() >= NONE as usize {
            return Err(MultibomError::CapacityExceeded(
                "oracle state count exceeds the 32-bit id width".to_string(),
            ));
        }
        let id = self.states.len() as u32;
        self.states.push(DenseState::new());
        Ok(id)
    }

    fn set_extended(&mut self, state: u32, byte: u8) {
        self.states[state as usize].extended[(byte >> 6) as usize] |= 1 << (byte & 63);
    }

    fn is_extended(&self, state: u32, byte: u8) -> bool {
        self.states[state as usize].extended[(byte >> 6) as usize] & (1 << (byte & 63)) != 0
    }

    /// Insert every pattern reversed, sharing existing suffix paths.
    fn build_trie(&mut self, patterns: &[Pattern]) -> Result<()> {
        for pat in patterns {
            let mut current = ROOT;
            for &b in pat.folded().iter().rev() {
                let next = self.states[current as usize].next[b as usize];
                if next != NONE {
                    current = next;
                } else {
                    let next = self.new_state()?;
                    self.states[current as usize].next[b as usize] = next;
                    self.num_transitions += 1;
                    current = next;
                }
            }
        }
        Ok(())
    }

    /// Add extended transitions by breadth-first traversal of the trie.
    fn weave_oracle(&mut self) {
        let mut queue: VecDeque<(u32, u32, u8)> = VecDeque::new();
        for b in 0..=255u8 {
            let target = self.states[ROOT as usize].next[b as usize];
            if target != NONE {
                queue.push_back((target, ROOT, b));
            }
        }

        while let Some((current, parent, byte)) = queue.pop_front() {
            let mut up = self.states[parent as usize].supply;
            while up != NONE && self.states[up as usize].next[byte as usize] == NONE {
                self.states[up as usize].next[byte as usize] = current;
                self.set_extended(up, byte);
                self.num_transitions += 1;
                up = self.states[up as usize].supply;
            }

            self.states[current as usize].supply = if up != NONE {
                self.states[up as usize].next[byte as usize]
            } else {
                ROOT
            };

            for b in 0..=255u8 {
                let target = self.states[current as usize].next[b as usize];
                if target != NONE && !self.is_extended(current, b) {
                    queue.push_back((target, current, b));
                }
            }
        }
    }

    /// Count of trie edges, excluding the extended DAG edges.
    #[cfg(test)]
    fn internal_transition_count(&self) -> u32 {
        let mut count = 0;
        for (s, state) in self.states.iter().enumerate() {
            for b in 0..=255u8 {
                if state.next[b as usize] != NONE && !self.is_extended(s as u32, b) {
                    count += 1;
                }
            }
        }
        count
    }
}

impl FactorOracle for DenseOracle {
    fn build(patterns: &[Pattern]) -> Result<Self> {
        let mut oracle = DenseOracle {
            states: vec![DenseState::new()],
            num_transitions: 0,
        };
        oracle.build_trie(patterns)?;
        oracle.weave_oracle();
        Ok(oracle)
    }

    fn root(&self) -> u32 {
        ROOT
    }

    #[inline]
    fn transition(&self, state: u32, byte: u8) -> Option<u32> {
        let target = self.states[state as usize].next[byte as usize];
        (target != NONE).then_some(target)
    }

    fn state_count(&self) -> u32 {
        self.states.len() as u32
    }

    fn transition_count(&self) -> u32 {
        self.num_transitions
    }

    fn state_bytes(&self) -> usize {
        mem::size_of::<DenseState>()
    }

    fn repr_name(&self) -> &'static str {
        "node graph"
    }
}

//! Factor oracle stored as a hash-keyed transition table.
//!
//! States are bare 16-bit ids; there are no nodes. Every transition,
//! internal or extended, is one entry in a hash map from (from-state, byte)
//! to target state. Against the node-graph representation this trades a
//! hash probe per lookup for an order-of-magnitude memory reduction, which
//! is what makes very large pattern sets practical.
//!
//! The key hash decorrelates the state id from the byte with a cheap
//! rotate-and-xor mix, `rotl(state, 7) ^ byte`; equality stays field by
//! field on the key struct. The supply function only exists while the
//! oracle is being woven: it lives on the builder and goes away when
//! construction finishes, successfully or not.

use crate::error::{MultibomError, Result};
use crate::oracle::FactorOracle;
use crate::pattern::Pattern;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::mem;

/// State ids start at the root; 0 is reserved for "no state".
const ROOT: u16 = 1;

/// Transition key: source state and the byte labelling the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TransKey {
    from: u16,
    byte: u8,
}

impl Hash for TransKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(u32::from(self.from).rotate_left(7) ^ u32::from(self.byte));
    }
}

/// Factor oracle with hash-keyed transitions.
#[derive(Debug)]
pub struct CompactOracle {
    transitions: FxHashMap<TransKey, u16>,
    num_states: u16,
    num_transitions: u32,
}

/// Construction-time companion of [`CompactOracle`].
///
/// Owns the supply function, which is meaningless once the oracle is woven
/// and is dropped with the builder.
struct CompactOracleBuilder {
    transitions: FxHashMap<TransKey, u16>,
    num_states: u16,
    num_transitions: u32,
    supply: Vec<u16>,
}

impl CompactOracleBuilder {
    fn new() -> Self {
        Self {
            transitions: FxHashMap::default(),
            num_states: 1,
            num_transitions: 0,
            supply: Vec::new(),
        }
    }

    fn new_state(&mut self) -> Result<u16> {
        if self.num_states == u16::MAX {
            return Err(MultibomError::CapacityExceeded(
                "oracle state count exceeds the 16-bit id width".to_string(),
            ));
        }
        self.num_states += 1;
        Ok(self.num_states)
    }

    fn get(&self, from: u16, byte: u8) -> Option<u16> {
        self.transitions.get(&TransKey { from, byte }).copied()
    }

    /// Insert every pattern reversed, sharing existing suffix paths.
    fn build_trie(&mut self, patterns: &[Pattern]) -> Result<()> {
        for pat in patterns {
            let mut current = ROOT;
            for &b in pat.folded().iter().rev() {
                match self.get(current, b) {
                    Some(next) => current = next,
                    None => {
                        let next = self.new_state()?;
                        self.transitions
                            .insert(TransKey { from: current, byte: b }, next);
                        self.num_transitions += 1;
                        current = next;
                    }
                }
            }
        }
        Ok(())
    }

    /// Add extended transitions by breadth-first traversal of the trie.
    fn weave_oracle(&mut self) {
        self.supply = vec![0; self.num_states as usize + 1];

        let mut queue: VecDeque<(u16, TransKey)> = VecDeque::new();
        for byte in 0..=255u8 {
            if let Some(target) = self.get(ROOT, byte) {
                queue.push_back((target, TransKey { from: ROOT, byte }));
            }
        }

        while let Some((current, parent)) = queue.pop_front() {
            let byte = parent.byte;
            let mut up = self.supply[parent.from as usize];
            while up != 0 && self.get(up, byte).is_none() {
                self.transitions
                    .insert(TransKey { from: up, byte }, current);
                self.num_transitions += 1;
                up = self.supply[up as usize];
            }

            self.supply[current as usize] = match up {
                0 => ROOT,
                up => match self.get(up, byte) {
                    Some(target) => target,
                    None => ROOT,
                },
            };

            for byte in 0..=255u8 {
                if let Some(target) = self.get(current, byte) {
                    queue.push_back((target, TransKey { from: current, byte }));
                }
            }
        }
    }

    fn finish(self) -> CompactOracle {
        CompactOracle {
            transitions: self.transitions,
            num_states: self.num_states,
            num_transitions: self.num_transitions,
        }
    }
}

impl FactorOracle for CompactOracle {
    fn build(patterns: &[Pattern]) -> Result<Self> {
        let mut builder = CompactOracleBuilder::new();
        builder.build_trie(patterns)?;
        builder.weave_oracle();
        Ok(builder.finish())
    }

    fn root(&self) -> u32 {
        u32::from(ROOT)
    }

    #[inline]
    fn transition(&self, state: u32, byte: u8) -> Option<u32> {
        self.transitions
            .get(&TransKey {
                from: state as u16,
                byte,
            })
            .map(|&target| u32::from(target))
    }

    fn state_count(&self) -> u32 {
        u32::from(self.num_states)
    }

    fn transition_count(&self) -> u32 {
        self.num_transitions
    }

    fn state_bytes(&self) -> usize {
        mem::size_of::<TransKey>() + mem::size_of::<u16>()
    }

    fn repr_name(&self) -> &'static str {
        "hash table"
    }
}

//! Factor-oracle interface shared by the two graph representations.
//!
//! A factor oracle is a deterministic automaton that accepts at least every
//! factor (contiguous substring) of a set of strings, possibly more. The
//! sliding-window engine only ever asks one question of it: given a state
//! and a byte, is there a transition, and to where. Keeping that question
//! behind a trait lets the node-graph and hash-table representations stay
//! interchangeable and lets tests cross-check them against each other.

use crate::error::Result;
use crate::pattern::Pattern;

/// Automaton storage formats understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleFormat {
    /// Factor oracle; the only implemented format
    Oracle,
    /// Directed acyclic word graph; reserved, not implemented
    Dawg,
}

impl OracleFormat {
    /// Human-readable format name for reports.
    pub fn name(&self) -> &'static str {
        match self {
            OracleFormat::Oracle => "Factor Oracle",
            OracleFormat::Dawg => "DAWG (Directed Acyclic Word Graph)",
        }
    }
}

/// A compiled factor oracle over the reversed, folded pattern set.
pub trait FactorOracle: Sized {
    /// Build the oracle for a frozen pattern set.
    fn build(patterns: &[Pattern]) -> Result<Self>;

    /// The initial state.
    fn root(&self) -> u32;

    /// Follow the transition on `byte`, if one exists.
    fn transition(&self, state: u32, byte: u8) -> Option<u32>;

    /// Number of states, including the root.
    fn state_count(&self) -> u32;

    /// Number of transitions, internal and extended together.
    fn transition_count(&self) -> u32;

    /// In-memory size of one state, for reports.
    fn state_bytes(&self) -> usize;

    /// Short representation name for reports.
    fn repr_name(&self) -> &'static str;
}

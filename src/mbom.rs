//! Multi backward oracle matching engine.
//!
//! MBOM slides a window of width W (the shortest pattern length) across the
//! search buffer and splits the work between two automata. A factor oracle
//! over the reversed patterns reads the window right to left and acts as a
//! filter: the moment it misses a transition, no pattern occurrence can
//! overlap the mismatched suffix. An Aho-Corasick machine then verifies
//! forward from the first position the filter could not clear, reports the
//! real occurrences, and its state depth drives the next window shift.
//! Together the two phases inspect at most 2n bytes of an n-byte buffer,
//! and on typical data far fewer, since most windows die in the filter
//! after a couple of bytes.
//!
//! The engine is generic over the oracle representation; see
//! [`DenseOracle`](crate::DenseOracle) and
//! [`CompactOracle`](crate::CompactOracle). Shifts are capped by the window
//! width, so the approach only pays off when the shortest pattern is at
//! least 3 bytes long; below that plain Aho-Corasick is faster.

use crate::acsm::{AcLayout, Acsm};
use crate::error::{MultibomError, Result};
use crate::fold::{self, DEFAULT_MAX_TEXT};
use crate::oracle::{FactorOracle, OracleFormat};
use crate::pattern::Pattern;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide advisory counters for all MBOM instances.
pub(crate) struct Summary {
    pub(crate) states: AtomicU64,
    pub(crate) transitions: AtomicU64,
    pub(crate) patterns: AtomicU64,
    pub(crate) groups: AtomicU64,
}

impl Summary {
    pub(crate) const fn new() -> Self {
        Self {
            states: AtomicU64::new(0),
            transitions: AtomicU64::new(0),
            patterns: AtomicU64::new(0),
            groups: AtomicU64::new(0),
        }
    }
}

pub(crate) static SUMMARY: Summary = Summary::new();

/// Write the process-wide MBOM accumulator block, if any instance compiled.
pub(crate) fn print_summary(out: &mut dyn Write) -> io::Result<()> {
    let states = SUMMARY.states.load(Ordering::Relaxed);
    if states == 0 {
        return Ok(());
    }
    let transitions = SUMMARY.transitions.load(Ordering::Relaxed);
    writeln!(out, "+--[Multi Backward Oracle Matching overall summary]----")?;
    writeln!(out, "| States           : {}", states)?;
    writeln!(out, "| Transitions      : {}", transitions)?;
    writeln!(
        out,
        "| Groups           : {}",
        SUMMARY.groups.load(Ordering::Relaxed)
    )?;
    writeln!(
        out,
        "| Patterns         : {}",
        SUMMARY.patterns.load(Ordering::Relaxed)
    )?;
    writeln!(
        out,
        "| State density    : {:.1}%",
        100.0 * transitions as f64 / (states as f64 * 256.0)
    )?;
    writeln!(out, "+------------------------------------------------------")
}

/// Outcome of one search pass, kept internal for the inspection-bound
/// accounting.
struct SearchOutcome {
    hits: usize,
    inspections: usize,
}

/// Multi backward oracle matcher, generic over the oracle representation.
#[derive(Debug)]
pub struct Mbom<O: FactorOracle> {
    acsm: Acsm,
    oracle: Option<O>,
    format: OracleFormat,
    min_len: usize,
    max_text: usize,
    hits: AtomicU64,
}

impl<O: FactorOracle> Mbom<O> {
    /// Create an empty matcher.
    pub fn new() -> Self {
        SUMMARY.groups.fetch_add(1, Ordering::Relaxed);
        Self {
            acsm: Acsm::new(AcLayout::Full),
            oracle: None,
            format: OracleFormat::Oracle,
            min_len: 0,
            max_text: DEFAULT_MAX_TEXT,
            hits: AtomicU64::new(0),
        }
    }

    /// Select the automaton storage format.
    ///
    /// Only [`OracleFormat::Oracle`] is implemented; the DAWG format is
    /// reserved and refused.
    pub fn select_format(&mut self, format: OracleFormat) -> Result<()> {
        match format {
            OracleFormat::Oracle => {
                self.format = format;
                Ok(())
            }
            OracleFormat::Dawg => Err(MultibomError::UnsupportedFormat(
                "DAWG storage is reserved but not implemented".to_string(),
            )),
        }
    }

    /// Register a pattern. Fails on empty bytes or after compile.
    pub fn add_pattern(
        &mut self,
        bytes: &[u8],
        nocase: bool,
        offset: u32,
        depth: u32,
        tag: u64,
        iid: u32,
    ) -> Result<()> {
        self.add_record(Pattern::new(bytes, nocase, offset, depth, tag, iid)?)
    }

    pub(crate) fn add_record(&mut self, pat: Pattern) -> Result<()> {
        if self.is_compiled() {
            return Err(MultibomError::AlreadyCompiled(
                "patterns must be added before compile".to_string(),
            ));
        }
        if self.min_len == 0 || self.min_len > pat.len() {
            self.min_len = pat.len();
        }
        self.acsm.add_record(pat)?;
        SUMMARY.patterns.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Build the factor oracle and the verifying state machine.
    pub fn compile(&mut self) -> Result<()> {
        if self.is_compiled() {
            return Err(MultibomError::AlreadyCompiled(
                "compile may only run once".to_string(),
            ));
        }

        let oracle = O::build(self.acsm.patterns())?;
        self.acsm.compile()?;

        SUMMARY
            .states
            .fetch_add(u64::from(oracle.state_count()), Ordering::Relaxed);
        SUMMARY
            .transitions
            .fetch_add(u64::from(oracle.transition_count()), Ordering::Relaxed);
        self.oracle = Some(oracle);
        Ok(())
    }

    /// Scan `text`, reporting every pattern occurrence to `on_match` at its
    /// starting index. Returns the hit count; a callback returning `true`
    /// stops the search at the current count.
    pub fn search<F>(&self, text: &[u8], mut on_match: F) -> Result<usize>
    where
        F: FnMut(u64, usize) -> bool,
    {
        self.search_dyn(text, &mut on_match)
    }

    pub(crate) fn search_dyn(
        &self,
        text: &[u8],
        on_match: &mut dyn FnMut(u64, usize) -> bool,
    ) -> Result<usize> {
        let oracle = match &self.oracle {
            Some(oracle) => oracle,
            None => {
                return Err(MultibomError::CompileRequired(
                    "search requires a compiled matcher".to_string(),
                ))
            }
        };
        if text.len() > self.max_text {
            return Err(MultibomError::BufferTooLarge(format!(
                "{} bytes exceeds the {} byte fold cap",
                text.len(),
                self.max_text
            )));
        }

        if self.min_len == 0 || text.len() < self.min_len {
            return Ok(0);
        }

        let folded = fold::fold_bytes(text);
        let outcome = self.run(oracle, &folded, text, on_match);
        self.hits.fetch_add(outcome.hits as u64, Ordering::Relaxed);
        Ok(outcome.hits)
    }

    /// The window loop proper, over the pre-folded buffer.
    fn run(
        &self,
        oracle: &O,
        folded: &[u8],
        raw: &[u8],
        on_match: &mut dyn FnMut(u64, usize) -> bool,
    ) -> SearchOutcome {
        let n = folded.len();
        let w = self.min_len;
        let end = n - w + 1;

        let mut hits = 0;
        let mut inspections = 0;
        let mut i = 0;
        let mut critpos = 0;
        let mut state = 0u32;

        while i < end && critpos < n {
            // Read the window right to left through the oracle, down to the
            // position the verifier has already cleared.
            let mut j = i + w - 1;
            let mut ostate = oracle.root();
            let factor_holds = loop {
                inspections += 1;
                match oracle.transition(ostate, folded[j]) {
                    None => break false,
                    Some(next) => {
                        ostate = next;
                        if j <= critpos {
                            break true;
                        }
                        j -= 1;
                    }
                }
            };

            // A missing transition proves no occurrence overlaps the
            // mismatched suffix; the verifier restarts just past it.
            if !factor_holds {
                state = 0;
                critpos = j + 1;
            }

            // Verify forward while inside the window, or past it while the
            // machine still carries a prefix at least W deep.
            while critpos < n
                && (critpos < i + w || self.acsm.depth_of(state) as usize >= w)
            {
                inspections += 1;
                state = self.acsm.next_state(state, folded[critpos]);
                critpos += 1;
                if self.acsm.report(state, critpos, raw, &mut hits, on_match) {
                    return SearchOutcome { hits, inspections };
                }
            }

            // Shift the window, keeping the prefix the verifier holds.
            i = critpos - self.acsm.depth_of(state) as usize;
        }

        SearchOutcome { hits, inspections }
    }

    /// True once `compile` has run.
    pub fn is_compiled(&self) -> bool {
        self.oracle.is_some()
    }

    /// Number of registered patterns.
    pub fn pattern_count(&self) -> usize {
        self.acsm.pattern_count()
    }

    /// Length of the shortest registered pattern, 0 when none. This is the
    /// window width of the search.
    pub fn min_pattern_len(&self) -> usize {
        self.min_len
    }

    /// Hits reported by this instance across all searches.
    pub fn match_count(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Cap applied to each search buffer.
    pub fn max_text_len(&self) -> usize {
        self.max_text
    }

    /// Replace the per-search buffer cap.
    pub fn set_max_text_len(&mut self, cap: usize) {
        self.max_text = cap;
        self.acsm.set_max_text_len(cap);
    }

    /// Write an instance report to `out`, followed by the verifier's.
    pub fn print_detail(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "+--[Multi Backward Oracle Matching instance]----")?;
        writeln!(out, "| Alphabet size    : 256 Chars")?;
        writeln!(out, "| Storage format   : {}", self.format.name())?;
        writeln!(out, "| Shortest pattern : {}", self.min_len)?;
        writeln!(out, "| Patterns         : {}", self.acsm.pattern_count())?;
        if let Some(oracle) = &self.oracle {
            writeln!(out, "| Representation   : {}", oracle.repr_name())?;
            writeln!(out, "| Size of state    : {} bytes", oracle.state_bytes())?;
            writeln!(out, "| States           : {}", oracle.state_count())?;
            writeln!(out, "| Transitions      : {}", oracle.transition_count())?;
            writeln!(
                out,
                "| State density    : {:.1}%",
                100.0 * oracle.transition_count() as f64
                    / (oracle.state_count() as f64 * 256.0)
            )?;
        }
        writeln!(out, "+-----------------------------------------------")?;
        self.acsm.print_detail(out)
    }
}

impl<O: FactorOracle> Default for Mbom<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: FactorOracle> Drop for Mbom<O> {
    fn drop(&mut self) {
        SUMMARY.groups.fetch_sub(1, Ordering::Relaxed);
    }
}

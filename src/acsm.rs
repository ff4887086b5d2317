//! Aho-Corasick state machine with selectable transition layouts.
//!
//! The automaton is built in two stages. `add_pattern` grows a byte trie as
//! patterns arrive; `compile` computes failure links by breadth-first
//! traversal, merges match lists down the failure chains, and then resolves
//! the goto and failure functions into a single deterministic next-state
//! function. Search never chases failure links: every state answers every
//! byte.
//!
//! # Transition layouts
//!
//! The deterministic next-state function can be stored four ways, selected
//! at construction:
//!
//! - **Full**: a 256-slot table per state, one load per byte
//! - **Sparse**: sorted (byte, target) pairs, linear scan with early exit
//! - **Banded**: one contiguous run covering all live slots
//! - **SparseBands**: several short runs, split where the gaps get wide
//!
//! All four realise the same abstract function and are indistinguishable
//! from the outside. The root state keeps the full table in every layout
//! since nearly every byte is live there.

use crate::error::{MultibomError, Result};
use crate::fold::{self, DEFAULT_MAX_TEXT};
use crate::pattern::Pattern;
use std::collections::{HashMap, VecDeque};
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};

const ROOT: u32 = 0;

/// Gap width that splits one sparse band from the next.
const BAND_SPLIT_GAP: u8 = 4;

/// Storage layout for the deterministic transition function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcLayout {
    /// 256-slot table per state
    Full,
    /// Sorted (byte, target) pairs per state
    Sparse,
    /// One contiguous band of slots per state
    Banded,
    /// Several contiguous bands per state
    SparseBands,
}

impl AcLayout {
    /// Human-readable layout name for reports.
    pub fn name(&self) -> &'static str {
        match self {
            AcLayout::Full => "Full",
            AcLayout::Sparse => "Sparse",
            AcLayout::Banded => "Banded",
            AcLayout::SparseBands => "Sparse-Banded",
        }
    }
}

/// Trie state used during construction only.
#[derive(Debug)]
struct TrieState {
    children: HashMap<u8, u32>,
    failure: u32,
    depth: u32,
    matches: Vec<u32>,
}

impl TrieState {
    fn new(depth: u32) -> Self {
        Self {
            children: HashMap::new(),
            failure: ROOT,
            depth,
            matches: Vec::new(),
        }
    }
}

/// One contiguous run of transition slots.
#[derive(Debug)]
struct Band {
    first: u8,
    targets: Box<[u32]>,
}

impl Band {
    #[inline]
    fn lookup(&self, byte: u8) -> u32 {
        match byte.checked_sub(self.first) {
            Some(idx) if (idx as usize) < self.targets.len() => self.targets[idx as usize],
            _ => ROOT,
        }
    }
}

/// Per-state transition storage.
#[derive(Debug)]
enum Transitions {
    Full(Box<[u32; 256]>),
    Sparse(Box<[(u8, u32)]>),
    Banded(Band),
    SparseBands(Box<[Band]>),
}

impl Transitions {
    #[inline]
    fn lookup(&self, byte: u8) -> u32 {
        match self {
            Transitions::Full(table) => table[byte as usize],
            Transitions::Sparse(entries) => {
                for &(b, target) in entries.iter() {
                    if b == byte {
                        return target;
                    }
                    if b > byte {
                        break;
                    }
                }
                ROOT
            }
            Transitions::Banded(band) => band.lookup(byte),
            Transitions::SparseBands(bands) => {
                for band in bands.iter() {
                    if byte < band.first {
                        break;
                    }
                    let target = band.lookup(byte);
                    if target != ROOT {
                        return target;
                    }
                }
                ROOT
            }
        }
    }
}

/// Compiled state: depth, match list, and the next-state function.
#[derive(Debug)]
struct AcState {
    depth: u32,
    matches: Box<[u32]>,
    next: Transitions,
}

/// Process-wide advisory counters for all AC instances.
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

/// Write the process-wide AC accumulator block, if any instance compiled.
pub(crate) fn print_summary(out: &mut dyn Write) -> io::Result<()> {
    let states = SUMMARY.states.load(Ordering::Relaxed);
    if states == 0 {
        return Ok(());
    }
    let transitions = SUMMARY.transitions.load(Ordering::Relaxed);
    writeln!(out, "+--[Aho-Corasick state machine overall summary]----")?;
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
    writeln!(out, "+--------------------------------------------------")
}

/// Aho-Corasick pattern matcher.
#[derive(Debug)]
pub struct Acsm {
    layout: AcLayout,
    patterns: Vec<Pattern>,
    trie: Vec<TrieState>,
    states: Vec<AcState>,
    num_transitions: u32,
    min_len: usize,
    max_text: usize,
    hits: AtomicU64,
}

impl Acsm {
    /// Create an empty matcher with the given transition layout.
    pub fn new(layout: AcLayout) -> Self {
        SUMMARY.groups.fetch_add(1, Ordering::Relaxed);
        Self {
            layout,
            patterns: Vec::new(),
            trie: vec![TrieState::new(0)],
            states: Vec::new(),
            num_transitions: 0,
            min_len: 0,
            max_text: DEFAULT_MAX_TEXT,
            hits: AtomicU64::new(0),
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

    /// Register an already-validated pattern record.
    pub(crate) fn add_record(&mut self, pat: Pattern) -> Result<()> {
        if self.is_compiled() {
            return Err(MultibomError::AlreadyCompiled(
                "patterns must be added before compile".to_string(),
            ));
        }

        let idx = self.patterns.len() as u32;
        let mut current = ROOT;
        for (i, &b) in pat.folded().iter().enumerate() {
            current = match self.trie[current as usize].children.get(&b).copied() {
                Some(next) => next,
                None => {
                    let next = self.new_trie_state(i as u32 + 1)?;
                    self.trie[current as usize].children.insert(b, next);
                    next
                }
            };
        }
        self.trie[current as usize].matches.push(idx);

        if self.min_len == 0 || self.min_len > pat.len() {
            self.min_len = pat.len();
        }
        self.patterns.push(pat);
        SUMMARY.patterns.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn new_trie_state(&mut self, depth: u32) -> Result<u32> {
        if self.trie.len() >= u32::MAX as usize {
            return Err(MultibomError::CapacityExceeded(
                "state count exceeds the 32-bit id width".to_string(),
            ));
        }
        let id = self.trie.len() as u32;
        self.trie.push(TrieState::new(depth));
        Ok(id)
    }

    /// Freeze the pattern set: failure links, match-list inheritance, and
    /// the deterministic next-state tables in the chosen layout.
    pub fn compile(&mut self) -> Result<()> {
        if self.is_compiled() {
            return Err(MultibomError::AlreadyCompiled(
                "compile may only run once".to_string(),
            ));
        }

        let order = self.link_failures();

        // Resolve goto + failure into one total function per state. The BFS
        // order guarantees each state's failure target is resolved first.
        let mut tables: Vec<Box<[u32; 256]>> = Vec::with_capacity(self.trie.len());
        let mut root_table = Box::new([ROOT; 256]);
        for (&b, &target) in &self.trie[ROOT as usize].children {
            root_table[b as usize] = target;
        }
        tables.push(root_table);
        for _ in 1..self.trie.len() {
            tables.push(Box::new([ROOT; 256]));
        }
        for &s in &order {
            let failure = self.trie[s as usize].failure;
            let mut table = Box::new([ROOT; 256]);
            for b in 0..=255u8 {
                table[b as usize] = match self.trie[s as usize].children.get(&b) {
                    Some(&target) => target,
                    None => tables[failure as usize][b as usize],
                };
            }
            tables[s as usize] = table;
        }

        self.num_transitions = tables
            .iter()
            .map(|t| t.iter().filter(|&&target| target != ROOT).count() as u32)
            .sum();

        self.states = Vec::with_capacity(self.trie.len());
        for (s, table) in tables.into_iter().enumerate() {
            let depth = self.trie[s].depth;
            let matches = std::mem::take(&mut self.trie[s].matches).into_boxed_slice();
            self.states.push(AcState {
                depth,
                matches,
                next: Self::encode(self.layout, s as u32, table),
            });
        }

        // The trie is construction-only data.
        self.trie.clear();
        self.trie.shrink_to_fit();

        SUMMARY
            .states
            .fetch_add(self.states.len() as u64, Ordering::Relaxed);
        SUMMARY
            .transitions
            .fetch_add(self.num_transitions as u64, Ordering::Relaxed);
        Ok(())
    }

    /// Compute failure links and merge match lists, returning the BFS order
    /// over non-root states.
    fn link_failures(&mut self) -> Vec<u32> {
        let mut order = Vec::with_capacity(self.trie.len().saturating_sub(1));
        let mut queue = VecDeque::new();

        let mut root_children: Vec<(u8, u32)> = self.trie[ROOT as usize]
            .children
            .iter()
            .map(|(&b, &s)| (b, s))
            .collect();
        root_children.sort_unstable_by_key(|&(b, _)| b);
        for (_, child) in root_children {
            self.trie[child as usize].failure = ROOT;
            queue.push_back(child);
        }

        while let Some(s) = queue.pop_front() {
            order.push(s);

            let mut children: Vec<(u8, u32)> = self.trie[s as usize]
                .children
                .iter()
                .map(|(&b, &c)| (b, c))
                .collect();
            children.sort_unstable_by_key(|&(b, _)| b);

            for (b, child) in children {
                queue.push_back(child);

                let mut f = self.trie[s as usize].failure;
                let failure = loop {
                    if let Some(&target) = self.trie[f as usize].children.get(&b) {
                        break target;
                    }
                    if f == ROOT {
                        break ROOT;
                    }
                    f = self.trie[f as usize].failure;
                };
                self.trie[child as usize].failure = failure;

                // Inherit the failure target's match list, which the BFS
                // order has already completed.
                let inherited = self.trie[failure as usize].matches.clone();
                self.trie[child as usize].matches.extend(inherited);
            }
        }

        order
    }

    fn encode(layout: AcLayout, state: u32, table: Box<[u32; 256]>) -> Transitions {
        // The root keeps the dense table regardless of layout.
        if layout == AcLayout::Full || state == ROOT {
            return Transitions::Full(table);
        }

        let live: Vec<(u8, u32)> = table
            .iter()
            .enumerate()
            .filter(|&(_, &target)| target != ROOT)
            .map(|(b, &target)| (b as u8, target))
            .collect();

        match layout {
            AcLayout::Full => Transitions::Full(table),
            AcLayout::Sparse => Transitions::Sparse(live.into_boxed_slice()),
            AcLayout::Banded => Transitions::Banded(Self::band(&table, &live)),
            AcLayout::SparseBands => {
                let mut bands = Vec::new();
                let mut start = 0;
                for i in 1..=live.len() {
                    let split = i == live.len() || live[i].0 - live[i - 1].0 > BAND_SPLIT_GAP;
                    if split {
                        bands.push(Self::band(&table, &live[start..i]));
                        start = i;
                    }
                }
                Transitions::SparseBands(bands.into_boxed_slice())
            }
        }
    }

    fn band(table: &[u32; 256], live: &[(u8, u32)]) -> Band {
        match (live.first(), live.last()) {
            (Some(&(lo, _)), Some(&(hi, _))) => Band {
                first: lo,
                targets: table[lo as usize..=hi as usize].into(),
            },
            _ => Band {
                first: 0,
                targets: Box::new([]),
            },
        }
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
        if !self.is_compiled() {
            return Err(MultibomError::CompileRequired(
                "search requires a compiled matcher".to_string(),
            ));
        }
        if text.len() > self.max_text {
            return Err(MultibomError::BufferTooLarge(format!(
                "{} bytes exceeds the {} byte fold cap",
                text.len(),
                self.max_text
            )));
        }

        let folded = fold::fold_bytes(text);
        let mut state = ROOT;
        let mut nfound = 0;
        for (pos, &b) in folded.iter().enumerate() {
            state = self.next_state(state, b);
            if self.report(state, pos + 1, text, &mut nfound, on_match) {
                break;
            }
        }
        self.hits.fetch_add(nfound as u64, Ordering::Relaxed);
        Ok(nfound)
    }

    /// Deterministic next-state function; total over all 256 bytes.
    #[inline]
    pub(crate) fn next_state(&self, state: u32, byte: u8) -> u32 {
        self.states[state as usize].next.lookup(byte)
    }

    /// Depth of a compiled state, the length of its path label.
    #[inline]
    pub(crate) fn depth_of(&self, state: u32) -> u32 {
        self.states[state as usize].depth
    }

    /// Report every pattern on `state`'s match list ending at `end`,
    /// honouring per-pattern case discipline. Returns true when the
    /// callback stopped the search.
    pub(crate) fn report(
        &self,
        state: u32,
        end: usize,
        raw: &[u8],
        nfound: &mut usize,
        on_match: &mut dyn FnMut(u64, usize) -> bool,
    ) -> bool {
        for &idx in self.states[state as usize].matches.iter() {
            let pat = &self.patterns[idx as usize];
            let start = end - pat.len();
            if !pat.is_nocase() && &raw[start..end] != pat.raw() {
                continue;
            }
            *nfound += 1;
            if on_match(pat.tag(), start) {
                return true;
            }
        }
        false
    }

    /// True once `compile` has run.
    pub fn is_compiled(&self) -> bool {
        !self.states.is_empty()
    }

    /// Registered patterns, in registration order.
    pub(crate) fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Move the pattern records out, leaving the matcher empty of patterns.
    pub(crate) fn take_patterns(&mut self) -> Vec<Pattern> {
        std::mem::take(&mut self.patterns)
    }

    /// Number of trie states built so far (before compile).
    pub(crate) fn trie_states(&self) -> usize {
        self.trie.len()
    }

    /// Number of registered patterns.
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Length of the shortest registered pattern, 0 when none.
    pub fn min_pattern_len(&self) -> usize {
        self.min_len
    }

    /// Compiled state count.
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Count of live transitions across the compiled tables.
    pub fn transition_count(&self) -> u32 {
        self.num_transitions
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
    }

    /// Write an instance report to `out`.
    pub fn print_detail(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "+--[Aho-Corasick state machine instance]----")?;
        writeln!(out, "| Alphabet size    : 256 Chars")?;
        writeln!(out, "| Layout           : {}", self.layout.name())?;
        writeln!(out, "| Shortest pattern : {}", self.min_len)?;
        writeln!(out, "| States           : {}", self.states.len())?;
        writeln!(out, "| Transitions      : {}", self.num_transitions)?;
        writeln!(out, "| Patterns         : {}", self.patterns.len())?;
        if !self.states.is_empty() {
            writeln!(
                out,
                "| State density    : {:.1}%",
                100.0 * self.num_transitions as f64 / (self.states.len() as f64 * 256.0)
            )?;
        }
        writeln!(out, "+-------------------------------------------")
    }
}

impl Drop for Acsm {
    fn drop(&mut self) {
        SUMMARY.groups.fetch_sub(1, Ordering::Relaxed);
    }
}

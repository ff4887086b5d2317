//! Dispatch façade over the pattern-matching engines.
//!
//! An [`Engine`] is a uniform handle: callers pick a method tag, add
//! patterns, compile once, then search. Behind the handle sits one of the
//! concrete matchers, and the [`Method::Auto`] tag defers the choice to
//! compile time, when the pattern set is known. Auto stages patterns in an
//! Aho-Corasick trie; if the shortest pattern is at least 3 bytes the whole
//! set migrates into a backward-oracle matcher (the hash-table oracle when
//! the trie has outgrown the node-graph form), otherwise the staged
//! machine compiles as-is. The handle's method tag is rewritten exactly
//! once by that promotion.
//!
//! The Wu-Manber and KTrie tags are recognised for API stability but their
//! engines live outside this crate, so constructing them is refused.

use crate::acsm::{self, AcLayout, Acsm};
use crate::error::{MultibomError, Result};
use crate::mbom::{self, Mbom};
use crate::oracle_compact::CompactOracle;
use crate::oracle_dense::DenseOracle;
use std::io::{self, Write};
use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};

/// Above this many staged trie states, Auto prefers the hash-table oracle
/// over the node-graph one.
const AUTO_MAX_STATES: usize = 8192;

/// Total bytes handed to [`Engine::search`] process-wide. Advisory.
static BYTES_SEARCHED: AtomicU64 = AtomicU64::new(0);

/// Engine selection tags. The discriminants are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Method {
    /// Modified Wu-Manber; external engine, not constructible here
    Mwm = 0,
    /// Aho-Corasick, original full-table form
    Ac = 1,
    /// Aho-Corasick with full transition tables
    AcFull = 2,
    /// Aho-Corasick with sparse transition lists
    AcSparse = 3,
    /// Aho-Corasick with banded transition tables
    AcBanded = 4,
    /// Aho-Corasick with sparse-banded transition tables
    AcSparseBands = 5,
    /// KTrie with Boyer-Moore shifts; external engine
    Ktbm = 6,
    /// KTrie low-memory form; external engine
    LowMem = 7,
    /// Backward oracle matching over the node-graph oracle
    MbomDense = 8,
    /// Backward oracle matching over the hash-table oracle
    MbomCompact = 9,
    /// Defer the engine choice to compile time
    Auto = 10,
}

impl Method {
    /// Stable integer tag for this method.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Look a method up by its stable tag.
    pub fn from_tag(tag: u8) -> Option<Method> {
        match tag {
            0 => Some(Method::Mwm),
            1 => Some(Method::Ac),
            2 => Some(Method::AcFull),
            3 => Some(Method::AcSparse),
            4 => Some(Method::AcBanded),
            5 => Some(Method::AcSparseBands),
            6 => Some(Method::Ktbm),
            7 => Some(Method::LowMem),
            8 => Some(Method::MbomDense),
            9 => Some(Method::MbomCompact),
            10 => Some(Method::Auto),
            _ => None,
        }
    }
}

#[derive(Debug)]
enum EngineKind {
    Ac(Acsm),
    MbomDense(Mbom<DenseOracle>),
    MbomCompact(Mbom<CompactOracle>),
    Auto(Acsm),
}

/// Uniform handle over one underlying pattern matcher.
#[derive(Debug)]
pub struct Engine {
    method: Method,
    kind: EngineKind,
    verbose: bool,
}

impl Engine {
    /// Create an engine for the given method.
    ///
    /// Fails with `UnsupportedMethod` for tags whose engines live outside
    /// this crate (Mwm, Ktbm, LowMem).
    pub fn new(method: Method) -> Result<Engine> {
        let kind = match method {
            Method::Ac | Method::AcFull => EngineKind::Ac(Acsm::new(AcLayout::Full)),
            Method::AcSparse => EngineKind::Ac(Acsm::new(AcLayout::Sparse)),
            Method::AcBanded => EngineKind::Ac(Acsm::new(AcLayout::Banded)),
            Method::AcSparseBands => EngineKind::Ac(Acsm::new(AcLayout::SparseBands)),
            Method::MbomDense => EngineKind::MbomDense(Mbom::new()),
            Method::MbomCompact => EngineKind::MbomCompact(Mbom::new()),
            Method::Auto => EngineKind::Auto(Acsm::new(AcLayout::Full)),
            Method::Mwm | Method::Ktbm | Method::LowMem => {
                return Err(MultibomError::UnsupportedMethod(format!(
                    "{:?} is not built into this crate",
                    method
                )))
            }
        };
        Ok(Engine {
            method,
            kind,
            verbose: false,
        })
    }

    /// The current method tag. Auto handles report a concrete engine after
    /// compile.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Register a pattern with its metadata and opaque callback tag.
    pub fn add_pattern(
        &mut self,
        bytes: &[u8],
        nocase: bool,
        offset: u32,
        depth: u32,
        tag: u64,
        iid: u32,
    ) -> Result<()> {
        match &mut self.kind {
            EngineKind::Ac(a) | EngineKind::Auto(a) => {
                a.add_pattern(bytes, nocase, offset, depth, tag, iid)
            }
            EngineKind::MbomDense(m) => m.add_pattern(bytes, nocase, offset, depth, tag, iid),
            EngineKind::MbomCompact(m) => m.add_pattern(bytes, nocase, offset, depth, tag, iid),
        }
    }

    /// Freeze the pattern set and build the search structures.
    ///
    /// For Auto handles this is where the engine choice happens and the
    /// method tag is rewritten.
    pub fn compile(&mut self) -> Result<()> {
        if matches!(self.kind, EngineKind::Auto(_)) {
            let placeholder = EngineKind::Ac(Acsm::new(AcLayout::Full));
            let EngineKind::Auto(staging) = mem::replace(&mut self.kind, placeholder) else {
                return Ok(());
            };
            self.promote(staging)?;
        } else {
            match &mut self.kind {
                EngineKind::Ac(a) => a.compile()?,
                EngineKind::MbomDense(m) => m.compile()?,
                EngineKind::MbomCompact(m) => m.compile()?,
                EngineKind::Auto(_) => {}
            }
        }
        if self.verbose {
            self.print_detail(&mut io::stderr()).ok();
        }
        Ok(())
    }

    /// Auto promotion: pick a concrete engine for the staged pattern set.
    fn promote(&mut self, mut staging: Acsm) -> Result<()> {
        if staging.min_pattern_len() >= 3 {
            let cap = staging.max_text_len();
            let wide = staging.trie_states() > AUTO_MAX_STATES;
            let patterns = staging.take_patterns();
            drop(staging);

            if wide {
                let mut m: Mbom<CompactOracle> = Mbom::new();
                m.set_max_text_len(cap);
                for pat in patterns {
                    m.add_record(pat)?;
                }
                m.compile()?;
                self.method = Method::MbomCompact;
                self.kind = EngineKind::MbomCompact(m);
            } else {
                let mut m: Mbom<DenseOracle> = Mbom::new();
                m.set_max_text_len(cap);
                for pat in patterns {
                    m.add_record(pat)?;
                }
                m.compile()?;
                self.method = Method::MbomDense;
                self.kind = EngineKind::MbomDense(m);
            }
        } else {
            staging.compile()?;
            self.method = Method::AcFull;
            self.kind = EngineKind::Ac(staging);
        }
        Ok(())
    }

    /// Scan `text`, reporting every pattern occurrence to `on_match` at its
    /// starting index. Returns the hit count; a callback returning `true`
    /// stops the search at the current count.
    pub fn search<F>(&self, text: &[u8], mut on_match: F) -> Result<usize>
    where
        F: FnMut(u64, usize) -> bool,
    {
        BYTES_SEARCHED.fetch_add(text.len() as u64, Ordering::Relaxed);
        match &self.kind {
            EngineKind::Ac(a) => a.search_dyn(text, &mut on_match),
            EngineKind::MbomDense(m) => m.search_dyn(text, &mut on_match),
            EngineKind::MbomCompact(m) => m.search_dyn(text, &mut on_match),
            EngineKind::Auto(_) => Err(MultibomError::CompileRequired(
                "an Auto engine must be compiled before searching".to_string(),
            )),
        }
    }

    /// Install a rule mask. Only the Wu-Manber engine interprets one, so
    /// this is a no-op for every engine built into this crate.
    pub fn set_rule_mask(&mut self, _mask: &[u64]) {}

    /// Gate a detail report to stderr after each successful compile.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Replace the per-search buffer cap.
    pub fn set_max_text_len(&mut self, cap: usize) {
        match &mut self.kind {
            EngineKind::Ac(a) | EngineKind::Auto(a) => a.set_max_text_len(cap),
            EngineKind::MbomDense(m) => m.set_max_text_len(cap),
            EngineKind::MbomCompact(m) => m.set_max_text_len(cap),
        }
    }

    /// Number of registered patterns.
    pub fn pattern_count(&self) -> usize {
        match &self.kind {
            EngineKind::Ac(a) | EngineKind::Auto(a) => a.pattern_count(),
            EngineKind::MbomDense(m) => m.pattern_count(),
            EngineKind::MbomCompact(m) => m.pattern_count(),
        }
    }

    /// Hits reported by this engine across all searches.
    pub fn match_count(&self) -> u64 {
        match &self.kind {
            EngineKind::Ac(a) | EngineKind::Auto(a) => a.match_count(),
            EngineKind::MbomDense(m) => m.match_count(),
            EngineKind::MbomCompact(m) => m.match_count(),
        }
    }

    /// Write an instance report to `out`.
    pub fn print_detail(&self, out: &mut dyn Write) -> io::Result<()> {
        match &self.kind {
            EngineKind::Ac(a) | EngineKind::Auto(a) => a.print_detail(out),
            EngineKind::MbomDense(m) => m.print_detail(out),
            EngineKind::MbomCompact(m) => m.print_detail(out),
        }
    }
}

/// Write the process-wide summary blocks for every engine family, plus the
/// total byte count.
pub fn print_summary(out: &mut dyn Write) -> io::Result<()> {
    acsm::print_summary(out)?;
    mbom::print_summary(out)?;
    writeln!(
        out,
        "Total bytes searched: {}",
        BYTES_SEARCHED.load(Ordering::Relaxed)
    )
}

/// Total bytes handed to [`Engine::search`] across the process.
pub fn total_bytes_searched() -> u64 {
    BYTES_SEARCHED.load(Ordering::Relaxed)
}

/// Reset the process-wide byte counter.
pub fn reset_bytes_searched() {
    BYTES_SEARCHED.store(0, Ordering::Relaxed);
}

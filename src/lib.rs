//! Multibom - Multi-Pattern Search Engine
//!
//! Multibom finds every occurrence of every registered byte pattern in a
//! search buffer, reporting each hit through a callback. It is built for
//! signature matching over network payloads: thousands of patterns, frozen
//! up front, scanned against a stream of buffers.
//!
//! # Quick Start
//!
//! ```rust
//! use multibom::{Engine, Method};
//!
//! let mut engine = Engine::new(Method::Auto)?;
//! engine.add_pattern(b"attack", false, 0, 0, 1, 0)?;
//! engine.add_pattern(b"Exploit", true, 0, 0, 2, 1)?;
//! engine.compile()?;
//!
//! let mut hits = Vec::new();
//! engine.search(b"an attack EXPLOIT payload", |tag, start| {
//!     hits.push((tag, start));
//!     false // keep going; true stops the search
//! })?;
//! assert_eq!(hits, vec![(1, 3), (2, 10)]);
//! # Ok::<(), multibom::MultibomError>(())
//! ```
//!
//! # Architecture
//!
//! The workhorse is Multi Backward Oracle Matching (MBOM): a factor oracle
//! over the reversed pattern set filters a sliding window right to left,
//! and an Aho-Corasick machine verifies forward from the first position the
//! filter could not clear. The filter skips most of the buffer; the
//! verifier keeps the output exact.
//!
//! ```text
//!        buffer ────────────────────────────────▶
//!        [ window W = shortest pattern ]
//!   filter: oracle reads ◀──────┘   (backward, stops at first miss)
//!   verify: Aho-Corasick ──────▶    (forward from the cleared edge)
//! ```
//!
//! Two oracle representations implement the same automaton: a node graph
//! with per-state transition arrays, and a hash-keyed table that is around
//! 26 times smaller on large rule sets. [`Engine`] picks between them, the
//! plain Aho-Corasick layouts, or automatically at compile time with
//! [`Method::Auto`].

#![warn(missing_docs)]
#![warn(clippy::all)]

// Module declarations
pub mod acsm;
/// Dispatch façade selecting among the matcher engines
pub mod engine;
/// Error types for multibom operations
pub mod error;
mod fold;
pub mod mbom;
/// Factor-oracle interface shared by both representations
pub mod oracle;
pub mod oracle_compact;
pub mod oracle_dense;
/// Pattern records and registration metadata
pub mod pattern;

// Re-exports for consumers

/// Uniform engine handle and method selection
pub use crate::engine::{
    print_summary, reset_bytes_searched, total_bytes_searched, Engine, Method,
};

pub use crate::acsm::{AcLayout, Acsm};
pub use crate::error::{MultibomError, Result};
pub use crate::mbom::Mbom;
pub use crate::oracle::{FactorOracle, OracleFormat};
pub use crate::oracle_compact::CompactOracle;
pub use crate::oracle_dense::DenseOracle;
pub use crate::pattern::Pattern;

// Version information
/// Library version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_engine_families_agree() {
        let patterns: [&[u8]; 4] = [b"he", b"she", b"his", b"hers"];
        let text = b"ushers and fishers";

        let mut reference: Option<Vec<(u64, usize)>> = None;
        for method in [
            Method::Ac,
            Method::AcFull,
            Method::AcSparse,
            Method::AcBanded,
            Method::AcSparseBands,
            Method::MbomDense,
            Method::MbomCompact,
        ] {
            let mut engine = Engine::new(method).unwrap();
            for (i, pat) in patterns.iter().enumerate() {
                engine.add_pattern(pat, false, 0, 0, i as u64, i as u32).unwrap();
            }
            engine.compile().unwrap();

            let mut hits = Vec::new();
            engine
                .search(text, |tag, start| {
                    hits.push((tag, start));
                    false
                })
                .unwrap();

            match &reference {
                Some(expected) => assert_eq!(&hits, expected, "method {:?}", method),
                None => reference = Some(hits),
            }
        }
    }
}

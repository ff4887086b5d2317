//! Pattern records shared by every engine.

use crate::error::{MultibomError, Result};
use crate::fold;

/// A single registered pattern.
///
/// The original bytes are kept for case-sensitive verification against the
/// raw search buffer; the folded (upper-cased) form is what the automata
/// are built from. The `offset` and `depth` fields are caller metadata and
/// are carried through untouched, as is the opaque `tag` handed back to the
/// match callback.
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: Box<[u8]>,
    folded: Box<[u8]>,
    nocase: bool,
    offset: u32,
    depth: u32,
    tag: u64,
    iid: u32,
}

impl Pattern {
    /// Validate and build a pattern record.
    ///
    /// Fails with `InvalidPattern` for an empty byte sequence.
    pub fn new(
        bytes: &[u8],
        nocase: bool,
        offset: u32,
        depth: u32,
        tag: u64,
        iid: u32,
    ) -> Result<Self> {
        if bytes.is_empty() {
            return Err(MultibomError::InvalidPattern(
                "zero-length pattern".to_string(),
            ));
        }

        Ok(Self {
            raw: bytes.into(),
            folded: fold::fold_bytes(bytes).into_boxed_slice(),
            nocase,
            offset,
            depth,
            tag,
            iid,
        })
    }

    /// Original pattern bytes, case preserved.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Upper-cased pattern bytes used by the automata.
    pub fn folded(&self) -> &[u8] {
        &self.folded
    }

    /// Pattern length in bytes.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Always false; zero-length patterns are rejected at construction.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// True when the pattern matches without regard to ASCII case.
    pub fn is_nocase(&self) -> bool {
        self.nocase
    }

    /// Caller-supplied offset metadata, passed through opaquely.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Caller-supplied depth metadata, passed through opaquely.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Opaque caller handle, passed back verbatim to the match callback.
    pub fn tag(&self) -> u64 {
        self.tag
    }

    /// Caller-supplied integer instance id.
    pub fn iid(&self) -> u32 {
        self.iid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pattern_rejected() {
        let err = Pattern::new(b"", false, 0, 0, 0, 0).unwrap_err();
        assert!(matches!(err, MultibomError::InvalidPattern(_)));
    }

    #[test]
    fn test_folded_form_kept_alongside_raw() {
        let pat = Pattern::new(b"GetInfo", true, 4, 128, 77, 3).unwrap();
        assert_eq!(pat.raw(), b"GetInfo");
        assert_eq!(pat.folded(), b"GETINFO");
        assert_eq!(pat.len(), 7);
        assert!(pat.is_nocase());
        assert_eq!(pat.offset(), 4);
        assert_eq!(pat.depth(), 128);
        assert_eq!(pat.tag(), 77);
        assert_eq!(pat.iid(), 3);
    }
}

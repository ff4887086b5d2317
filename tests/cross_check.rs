//! Property-based cross-checks between the matcher engines
//!
//! The three engines answer the same question with very different
//! machinery, which makes them natural oracles for each other. Every case
//! generated here is also checked against a naive quadratic scan, so a
//! shared bug in the automata would still be caught.

use multibom::{AcLayout, Acsm, CompactOracle, DenseOracle, Mbom};
use proptest::prelude::*;

/// Quadratic reference scan, ordered the way the automata report: by end
/// position, then longest pattern first, then registration order.
fn naive(patterns: &[(Vec<u8>, bool)], text: &[u8]) -> Vec<(u64, usize)> {
    let fold = |b: &[u8]| b.to_ascii_uppercase();
    let folded_text = fold(text);

    let mut hits: Vec<(usize, usize, u64)> = Vec::new();
    for (tag, (pat, nocase)) in patterns.iter().enumerate() {
        if pat.len() > text.len() {
            continue;
        }
        for start in 0..=text.len() - pat.len() {
            let end = start + pat.len();
            let matched = if *nocase {
                folded_text[start..end] == fold(pat)[..]
            } else {
                text[start..end] == pat[..]
            };
            if matched {
                hits.push((end, pat.len(), tag as u64));
            }
        }
    }
    hits.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)).then(a.2.cmp(&b.2)));
    hits.into_iter()
        .map(|(end, len, tag)| (tag, end - len))
        .collect()
}

fn collect_acsm(patterns: &[(Vec<u8>, bool)], text: &[u8]) -> Vec<(u64, usize)> {
    let mut acsm = Acsm::new(AcLayout::Sparse);
    for (tag, (pat, nocase)) in patterns.iter().enumerate() {
        acsm.add_pattern(pat, *nocase, 0, 0, tag as u64, tag as u32)
            .unwrap();
    }
    acsm.compile().unwrap();
    let mut hits = Vec::new();
    acsm.search(text, |tag, start| {
        hits.push((tag, start));
        false
    })
    .unwrap();
    hits
}

fn collect_mbom_dense(patterns: &[(Vec<u8>, bool)], text: &[u8]) -> Vec<(u64, usize)> {
    let mut mbom: Mbom<DenseOracle> = Mbom::new();
    for (tag, (pat, nocase)) in patterns.iter().enumerate() {
        mbom.add_pattern(pat, *nocase, 0, 0, tag as u64, tag as u32)
            .unwrap();
    }
    mbom.compile().unwrap();
    let mut hits = Vec::new();
    mbom.search(text, |tag, start| {
        hits.push((tag, start));
        false
    })
    .unwrap();
    hits
}

fn collect_mbom_compact(patterns: &[(Vec<u8>, bool)], text: &[u8]) -> Vec<(u64, usize)> {
    let mut mbom: Mbom<CompactOracle> = Mbom::new();
    for (tag, (pat, nocase)) in patterns.iter().enumerate() {
        mbom.add_pattern(pat, *nocase, 0, 0, tag as u64, tag as u32)
            .unwrap();
    }
    mbom.compile().unwrap();
    let mut hits = Vec::new();
    mbom.search(text, |tag, start| {
        hits.push((tag, start));
        false
    })
    .unwrap();
    hits
}

fn pattern_set() -> impl Strategy<Value = Vec<(Vec<u8>, bool)>> {
    let pat = ("[abAB]{1,6}", any::<bool>())
        .prop_map(|(s, nocase)| (s.into_bytes(), nocase));
    proptest::collection::vec(pat, 1..=5)
}

proptest! {
    #[test]
    fn prop_all_engines_match_reference(
        patterns in pattern_set(),
        text in "[abAB ]{0,60}",
    ) {
        let text = text.into_bytes();
        let expected = naive(&patterns, &text);

        prop_assert_eq!(&collect_acsm(&patterns, &text), &expected);
        prop_assert_eq!(&collect_mbom_dense(&patterns, &text), &expected);
        prop_assert_eq!(&collect_mbom_compact(&patterns, &text), &expected);
    }

    #[test]
    fn prop_oracle_representations_identical(
        patterns in pattern_set(),
        text in "[abAB ]{0,60}",
    ) {
        let text = text.into_bytes();
        prop_assert_eq!(
            collect_mbom_dense(&patterns, &text),
            collect_mbom_compact(&patterns, &text)
        );
    }

    #[test]
    fn prop_hit_count_matches_callbacks(
        patterns in pattern_set(),
        text in "[abAB ]{0,60}",
    ) {
        let text = text.into_bytes();
        let mut mbom: Mbom<DenseOracle> = Mbom::new();
        for (tag, (pat, nocase)) in patterns.iter().enumerate() {
            mbom.add_pattern(pat, *nocase, 0, 0, tag as u64, tag as u32).unwrap();
        }
        mbom.compile().unwrap();

        let mut calls = 0usize;
        let n = mbom.search(&text, |_, _| { calls += 1; false }).unwrap();
        prop_assert_eq!(n, calls);
    }
}

//! Integration tests for pattern matching correctness
//!
//! These tests drive the engine façade end-to-end: pattern registration,
//! compile-time engine selection, search ordering, case discipline, and
//! the error surface.

use multibom::{Engine, Method, MultibomError};

const ALL_METHODS: [Method; 7] = [
    Method::Ac,
    Method::AcFull,
    Method::AcSparse,
    Method::AcBanded,
    Method::AcSparseBands,
    Method::MbomDense,
    Method::MbomCompact,
];

fn build(method: Method, patterns: &[&str]) -> Engine {
    let mut engine = Engine::new(method).unwrap();
    for (i, pat) in patterns.iter().enumerate() {
        engine
            .add_pattern(pat.as_bytes(), false, 0, 0, i as u64, i as u32)
            .unwrap();
    }
    engine.compile().unwrap();
    engine
}

fn collect(engine: &Engine, text: &[u8]) -> Vec<(u64, usize)> {
    let mut hits = Vec::new();
    let n = engine
        .search(text, |tag, start| {
            hits.push((tag, start));
            false
        })
        .unwrap();
    assert_eq!(n, hits.len(), "returned count must equal callback count");
    hits
}

#[test]
fn test_classic_ushers_every_method() {
    for method in ALL_METHODS {
        let engine = build(method, &["he", "she", "his", "hers"]);
        let hits = collect(&engine, b"ushers");
        assert_eq!(
            hits,
            vec![(1, 1), (0, 2), (3, 2)],
            "method {:?} misreported",
            method
        );
    }
}

#[test]
fn test_announcer_every_method() {
    for method in ALL_METHODS {
        let engine = build(method, &["announce", "nouncer", "rence"]);
        let hits = collect(&engine, b"announcer_rence");
        assert_eq!(
            hits,
            vec![(0, 0), (1, 2), (2, 10)],
            "method {:?} misreported",
            method
        );
    }
}

#[test]
fn test_window_alignment_every_method() {
    for method in ALL_METHODS {
        let engine = build(method, &["ABC", "BCD"]);
        let hits = collect(&engine, b"AABCDABC");
        assert_eq!(
            hits,
            vec![(0, 1), (1, 2), (0, 5)],
            "method {:?} misreported",
            method
        );
    }
}

#[test]
fn test_case_insensitive_pattern_matches_any_case() {
    for method in [Method::AcFull, Method::MbomDense, Method::MbomCompact] {
        let mut engine = Engine::new(method).unwrap();
        engine.add_pattern(b"Attack", true, 0, 0, 7, 0).unwrap();
        engine.compile().unwrap();
        assert_eq!(collect(&engine, b"preATTACKpost"), vec![(7, 3)]);
    }
}

#[test]
fn test_case_sensitive_pattern_requires_exact_case() {
    for method in [Method::AcFull, Method::MbomDense, Method::MbomCompact] {
        let mut engine = Engine::new(method).unwrap();
        engine.add_pattern(b"Attack", false, 0, 0, 7, 0).unwrap();
        engine.compile().unwrap();
        assert!(collect(&engine, b"preATTACKpost").is_empty());
        assert_eq!(collect(&engine, b"preAttackpost"), vec![(7, 3)]);
    }
}

#[test]
fn test_mixed_case_disciplines_coexist() {
    for method in ALL_METHODS {
        let mut engine = Engine::new(method).unwrap();
        engine.add_pattern(b"GET", true, 0, 0, 1, 0).unwrap();
        engine.add_pattern(b"admin", false, 0, 0, 2, 1).unwrap();
        engine.compile().unwrap();

        let hits = collect(&engine, b"get /ADMIN get /admin");
        assert_eq!(hits, vec![(1, 0), (1, 11), (2, 16)], "method {:?}", method);
    }
}

#[test]
fn test_repeated_occurrences() {
    for method in ALL_METHODS {
        let engine = build(method, &["xyzxyz"]);
        assert_eq!(
            collect(&engine, b"xyzxyzxyz"),
            vec![(0, 0), (0, 3)],
            "method {:?}",
            method
        );
    }
}

#[test]
fn test_empty_and_short_buffers() {
    for method in ALL_METHODS {
        let engine = build(method, &["needle"]);
        assert!(collect(&engine, b"").is_empty());
        assert!(collect(&engine, b"need").is_empty());
    }
}

#[test]
fn test_callback_short_circuit_returns_partial_count() {
    for method in ALL_METHODS {
        let engine = build(method, &["ab"]);
        let mut calls = 0;
        let n = engine
            .search(b"ab ab ab ab", |_, _| {
                calls += 1;
                calls == 2
            })
            .unwrap();
        assert_eq!(n, 2, "method {:?}", method);
        assert_eq!(calls, 2, "method {:?}", method);
    }
}

#[test]
fn test_buffer_cap_rejected_without_partial_results() {
    let mut engine = build(Method::MbomDense, &["abc"]);
    engine.set_max_text_len(8);
    let mut calls = 0;
    let err = engine
        .search(&b"abc".repeat(100), |_, _| {
            calls += 1;
            false
        })
        .unwrap_err();
    assert!(matches!(err, MultibomError::BufferTooLarge(_)));
    assert_eq!(calls, 0);
}

#[test]
fn test_empty_pattern_rejected_instance_stays_usable() {
    let mut engine = Engine::new(Method::AcFull).unwrap();
    let err = engine.add_pattern(b"", false, 0, 0, 0, 0).unwrap_err();
    assert!(matches!(err, MultibomError::InvalidPattern(_)));

    engine.add_pattern(b"still-fine", false, 0, 0, 1, 0).unwrap();
    engine.compile().unwrap();
    assert_eq!(collect(&engine, b"is still-fine"), vec![(1, 3)]);
}

#[test]
fn test_external_engines_refused() {
    for method in [Method::Mwm, Method::Ktbm, Method::LowMem] {
        assert!(matches!(
            Engine::new(method),
            Err(MultibomError::UnsupportedMethod(_))
        ));
    }
}

#[test]
fn test_auto_selection() {
    // Long shortest pattern promotes to the oracle engine.
    let mut engine = Engine::new(Method::Auto).unwrap();
    engine.add_pattern(b"announce", false, 0, 0, 0, 0).unwrap();
    engine.compile().unwrap();
    assert_eq!(engine.method(), Method::MbomDense);

    // A 2-byte pattern keeps Aho-Corasick.
    let mut engine = Engine::new(Method::Auto).unwrap();
    engine.add_pattern(b"announce", false, 0, 0, 0, 0).unwrap();
    engine.add_pattern(b"he", false, 0, 0, 1, 1).unwrap();
    engine.compile().unwrap();
    assert_eq!(engine.method(), Method::AcFull);
}

#[test]
fn test_detail_report_renders() {
    let engine = build(Method::MbomCompact, &["announce", "rence"]);
    let mut out = Vec::new();
    engine.print_detail(&mut out).unwrap();
    let report = String::from_utf8(out).unwrap();
    assert!(report.contains("Factor Oracle"));
    assert!(report.contains("Aho-Corasick"));
}

#[test]
fn test_summary_report_renders() {
    let engine = build(Method::MbomDense, &["summary-pattern"]);
    engine.search(b"a summary-pattern here", |_, _| false).unwrap();

    let mut out = Vec::new();
    multibom::print_summary(&mut out).unwrap();
    let report = String::from_utf8(out).unwrap();
    assert!(report.contains("Total bytes searched"));
}

#[test]
fn test_pattern_metadata_round_trip() {
    // Offset and depth ride along opaquely; the tag comes back verbatim.
    let mut engine = Engine::new(Method::MbomDense).unwrap();
    engine
        .add_pattern(b"payload", false, 12, 300, u64::MAX, 5)
        .unwrap();
    engine.compile().unwrap();
    assert_eq!(engine.pattern_count(), 1);
    assert_eq!(collect(&engine, b"a payload"), vec![(u64::MAX, 2)]);
}

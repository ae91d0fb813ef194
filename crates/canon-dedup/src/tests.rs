use crate::*;
use crate::grouping::DisjointSet;
use canon_core::{
    CanonicalWeights, ContentItem, EngineConfig, FingerprintScope, StaticReputation,
    ValidationError, CURATED_REPUTATION,
};
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;

fn ts(month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, month, day, 0, 0, 0).unwrap()
}

fn item(content: &str) -> ContentItem {
    ContentItem::new("", content)
}

/// `count` distinct tokens starting at `start`, e.g. `w3 w4 w5`.
fn tokens(start: usize, count: usize) -> String {
    (start..start + count).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
}

// ========== Normalizer ==========

#[test]
fn test_norm_lowercase_punctuation() {
    assert_eq!(normalize("Hello, World!"), "hello world");
}

#[test]
fn test_norm_html() {
    assert_eq!(normalize("<p>Hello <b>there</b></p>"), "hello there");
    assert_eq!(normalize("Tom &amp; Jerry"), "tom jerry");
    assert_eq!(normalize("a<!-- hidden -->b"), "a b");
}

#[test]
fn test_norm_urls() {
    assert_eq!(normalize("see https://example.com/x?y=1 now"), "see now");
    assert_eq!(normalize("www.example.com rocks"), "rocks");
}

#[test]
fn test_norm_apostrophes() {
    assert_eq!(normalize("Don't stop"), "don't stop");
    assert_eq!(normalize("It\u{2019}s here"), "it's here");
    assert_eq!(normalize("'quoted' words'"), "quoted words");
}

#[test]
fn test_norm_whitespace() {
    assert_eq!(normalize("  a \n\t b  "), "a b");
}

#[test]
fn test_norm_empty() {
    assert_eq!(normalize(""), "");
    assert_eq!(normalize("   "), "");
    assert_eq!(normalize("!!! ??? ..."), "");
}

#[test]
fn test_norm_idempotent() {
    let samples = [
        "",
        "Plain text",
        "<div class=\"x\">Mixed <i>HTML</i> &nbsp; and http://a.b/c URLs</div>",
        "rock 'n' roll, don't   panic!!",
        "Ünïcödé ÇAPS and İstanbul",
        "x.'y a''b '' ' ",
        "under_score and-dash",
    ];
    for s in samples {
        let once = normalize(s);
        assert_eq!(normalize(&once), once, "not idempotent for {s:?}");
    }
}

// ========== Fingerprinter ==========

#[test]
fn test_fp_deterministic() {
    let a = fingerprint(&item("Same text here."), FingerprintScope::Content);
    let b = fingerprint(&item("same   TEXT here"), FingerprintScope::Content);
    assert_eq!(a, b);
    assert_eq!(a.to_hex().len(), 64);
}

#[test]
fn test_fp_distinct() {
    let a = fingerprint(&item("alpha beta"), FingerprintScope::Content);
    let b = fingerprint(&item("alpha gamma"), FingerprintScope::Content);
    assert_ne!(a, b);
}

#[test]
fn test_fp_scope() {
    let x = ContentItem::new("X", "abc");
    let y = ContentItem::new("Y", "abc");
    assert_eq!(
        fingerprint(&x, FingerprintScope::Content),
        fingerprint(&y, FingerprintScope::Content)
    );
    assert_ne!(
        fingerprint(&x, FingerprintScope::TitleAndContent),
        fingerprint(&y, FingerprintScope::TitleAndContent)
    );
}

#[test]
fn test_fp_empty_body_uses_title() {
    let a = ContentItem::new("First", "");
    let b = ContentItem::new("Second", "");
    assert_ne!(
        fingerprint(&a, FingerprintScope::Content),
        fingerprint(&b, FingerprintScope::Content)
    );
}

#[test]
fn test_exact_first_occurrence_wins() {
    let items = vec![item("a b c"), item("d e f"), item("A, b c!"), item("a b c")];
    let pairs = detect_exact_duplicates(&items, FingerprintScope::Content);
    assert_eq!(
        pairs,
        vec![
            ExactDuplicatePair { original: 0, duplicate: 2 },
            ExactDuplicatePair { original: 0, duplicate: 3 },
        ]
    );
}

#[test]
fn test_exact_none() {
    let items = vec![item("one"), item("two")];
    assert!(detect_exact_duplicates(&items, FingerprintScope::Content).is_empty());
}

// ========== Shingler ==========

#[test]
fn test_shingle_windows() {
    let s = shingle("one two three four five six", 3).unwrap();
    assert_eq!(s.len(), 4);
    assert!(s.contains("one two three"));
    assert!(s.contains("four five six"));
}

#[test]
fn test_shingle_short_text() {
    let s = shingle("Just two", 5).unwrap();
    assert_eq!(s.len(), 1);
    assert!(s.contains("just two"));
}

#[test]
fn test_shingle_empty_text_not_empty_set() {
    let s = shingle("", 5).unwrap();
    assert_eq!(s.len(), 1);
}

#[test]
fn test_shingle_zero_k() {
    assert_eq!(shingle("a b c", 0), Err(ValidationError::InvalidShingleSize(0)));
}

// ========== MinHash ==========

#[test]
fn test_sig_length() {
    let s = shingle("a b c d e f g", 2).unwrap();
    assert_eq!(sign(&s, 128).unwrap().len(), 128);
    assert_eq!(sign(&s, 7).unwrap().len(), 7);
}

#[test]
fn test_sig_zero_length() {
    let s = shingle("a b c", 2).unwrap();
    assert_eq!(sign(&s, 0), Err(ValidationError::InvalidSignatureLength(0)));
    assert!(MinHasher::new(0).is_err());
}

#[test]
fn test_sig_reproducible_across_instances() {
    let s = shingle(&tokens(0, 40), 3).unwrap();
    let a = MinHasher::new(64).unwrap().sign(&s);
    let b = MinHasher::new(64).unwrap().sign(&s);
    assert_eq!(a, b);
}

#[test]
fn test_sig_prefix_stable() {
    // Band i does not depend on the total number of bands.
    let s = shingle(&tokens(0, 20), 2).unwrap();
    let short = sign(&s, 16).unwrap();
    let long = sign(&s, 128).unwrap();
    assert_eq!(short.values(), &long.values()[..16]);
}

#[test]
fn test_similarity_reflexive() {
    let s = sign(&shingle(&tokens(0, 30), 3).unwrap(), 128).unwrap();
    assert_eq!(similarity(&s, &s).unwrap(), 1.0);
}

#[test]
fn test_similarity_symmetric() {
    let a = sign(&shingle(&tokens(0, 30), 1).unwrap(), 128).unwrap();
    let b = sign(&shingle(&tokens(15, 30), 1).unwrap(), 128).unwrap();
    assert_eq!(similarity(&a, &b).unwrap(), similarity(&b, &a).unwrap());
}

#[test]
fn test_similarity_estimates_jaccard() {
    // True Jaccard 30/50 = 0.6.
    let a = sign(&shingle(&tokens(0, 40), 1).unwrap(), 256).unwrap();
    let b = sign(&shingle(&tokens(10, 40), 1).unwrap(), 256).unwrap();
    let est = similarity(&a, &b).unwrap();
    assert!((0.45..=0.75).contains(&est), "estimate {est}");
}

#[test]
fn test_similarity_disjoint() {
    let a = sign(&shingle(&tokens(0, 20), 1).unwrap(), 128).unwrap();
    let b = sign(&shingle(&tokens(100, 20), 1).unwrap(), 128).unwrap();
    assert!(similarity(&a, &b).unwrap() < 0.05);
}

#[test]
fn test_similarity_length_mismatch() {
    let a = MinHashSignature::from_values(vec![1, 2, 3]);
    let b = MinHashSignature::from_values(vec![1, 2]);
    assert_eq!(
        similarity(&a, &b),
        Err(ValidationError::SignatureLengthMismatch { expected: 3, got: 2 })
    );
}

#[test]
fn test_similarity_empty_signatures() {
    let e = MinHashSignature::from_values(Vec::new());
    assert!(similarity(&e, &e).is_err());
}

// ========== Union-find ==========

#[test]
fn test_disjoint_set_order_independent() {
    let mut a = DisjointSet::new(6);
    a.union(4, 5);
    a.union(1, 4);
    a.union(2, 3);
    let mut b = DisjointSet::new(6);
    b.union(3, 2);
    b.union(5, 1);
    b.union(4, 5);
    assert_eq!(a.components(2), vec![vec![1, 4, 5], vec![2, 3]]);
    assert_eq!(a.components(2), b.components(2));
}

#[test]
fn test_disjoint_set_singletons_dropped() {
    let mut s = DisjointSet::new(3);
    assert!(s.components(2).is_empty());
    assert_eq!(s.components(1).len(), 3);
}

// ========== Near duplicates ==========

fn detector() -> DuplicateDetector {
    DuplicateDetector::new(EngineConfig::default().with_shingle_size(1)).unwrap()
}

#[test]
fn test_near_identical_is_one() {
    let items = vec![item(&tokens(0, 30)), item(&tokens(0, 30))];
    let pairs = detector().detect_near_duplicates(&items, 0.9).unwrap();
    assert_eq!(pairs, vec![NearDuplicatePair { index_a: 0, index_b: 1, similarity: 1.0 }]);
}

#[test]
fn test_near_sorted_desc_then_index() {
    let items = vec![
        item(&tokens(0, 30)),
        item(&tokens(0, 30)),
        item(&tokens(200, 10)),
        item(&tokens(0, 30)),
    ];
    let pairs = detector().detect_near_duplicates(&items, 0.5).unwrap();
    let idx: Vec<(usize, usize)> = pairs.iter().map(|p| (p.index_a, p.index_b)).collect();
    assert_eq!(idx, vec![(0, 1), (0, 3), (1, 3)]);
    assert!(pairs.iter().all(|p| p.similarity == 1.0));
}

#[test]
fn test_near_scores_descending() {
    let items = vec![
        item(&tokens(0, 40)),
        item(&tokens(5, 40)),
        item(&tokens(20, 40)),
        item(&tokens(0, 40)),
    ];
    let pairs = detector().detect_near_duplicates(&items, 0.0).unwrap();
    assert_eq!(pairs.len(), 6);
    for w in pairs.windows(2) {
        assert!(w[0].similarity >= w[1].similarity);
        if w[0].similarity == w[1].similarity {
            assert!((w[0].index_a, w[0].index_b) < (w[1].index_a, w[1].index_b));
        }
    }
}

#[test]
fn test_near_invalid_threshold() {
    let items = vec![item("a"), item("b")];
    assert!(matches!(
        detector().detect_near_duplicates(&items, 1.5),
        Err(ValidationError::InvalidThreshold { .. })
    ));
}

#[test]
fn test_near_sequential_matches_parallel() {
    let items: Vec<ContentItem> = (0..12).map(|i| item(&tokens(i * 3, 25))).collect();
    let par = DuplicateDetector::new(EngineConfig::default().with_shingle_size(1)).unwrap();
    let seq =
        DuplicateDetector::new(EngineConfig::default().with_shingle_size(1).sequential()).unwrap();
    assert_eq!(
        par.detect_near_duplicates(&items, 0.3).unwrap(),
        seq.detect_near_duplicates(&items, 0.3).unwrap()
    );
}

#[test]
fn test_compare_all_stops_when_cancelled() {
    let items: Vec<ContentItem> = (0..8).map(|i| item(&tokens(i * 2, 20))).collect();
    let flag = CancelFlag::new();
    flag.cancel();
    for d in [detector(), DuplicateDetector::new(EngineConfig::default().sequential()).unwrap()] {
        let sigs = d.signatures(&items);
        assert!(d.compare_all(&sigs, 0.1, Some(&flag)).is_none());
        assert!(d.compare_all(&sigs, 0.1, None).is_some());
    }
}

#[test]
fn test_compare_all_live_flag_completes() {
    let items = vec![item(&tokens(0, 30)), item(&tokens(0, 30))];
    let d = detector();
    let sigs = d.signatures(&items);
    let pairs = d.compare_all(&sigs, 0.9, Some(&CancelFlag::new())).unwrap();
    assert_eq!(pairs.len(), 1);
}

#[test]
fn test_detector_rejects_zero_shingle_size() {
    let err = DuplicateDetector::new(EngineConfig::default().with_shingle_size(0)).unwrap_err();
    assert_eq!(err, ValidationError::InvalidShingleSize(0));
}

#[test]
fn test_default_detector_matches_default_config() {
    let built = DuplicateDetector::new(EngineConfig::default()).unwrap();
    let default = DuplicateDetector::default();
    let long = tokens(0, 40);
    for text in ["", "two words", long.as_str()] {
        assert_eq!(built.signature(&item(text)), default.signature(&item(text)));
    }
    // A one-token shift keeps 35 of 37 five-word shingles.
    let a = default.signature(&item(&tokens(0, 40)));
    let b = default.signature(&item(&tokens(1, 40)));
    assert!(similarity(&a, &b).unwrap() > 0.7);
}

// ========== Grouping ==========

#[test]
fn test_group_transitive() {
    // a~b and b~c share a third of their words; a and c share none.
    let items = vec![item(&tokens(0, 30)), item(&tokens(15, 30)), item(&tokens(30, 30))];
    let d = detector();
    let sigs = d.signatures(&items);
    assert!(similarity(&sigs[0], &sigs[2]).unwrap() < 0.1);
    let groups = d.group_cross_source_duplicates(&items, 0.1).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].members, vec![0, 1, 2]);
    assert_eq!(groups[0].count, 3);
}

#[test]
fn test_group_singletons_dropped() {
    let items = vec![item(&tokens(0, 20)), item(&tokens(100, 20)), item(&tokens(0, 20))];
    let groups = detector().group_cross_source_duplicates(&items, 0.8).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].members, vec![0, 2]);
    assert_eq!(groups[0].duplicates.len(), 1);
    assert_eq!(groups[0].similarity, 1.0);
}

#[test]
fn test_group_order_by_lowest_member() {
    let items = vec![
        item(&tokens(100, 20)),
        item(&tokens(0, 20)),
        item(&tokens(100, 20)),
        item(&tokens(0, 20)),
    ];
    let groups = detector().group_cross_source_duplicates(&items, 0.8).unwrap();
    let members: Vec<Vec<usize>> = groups.iter().map(|g| g.members.clone()).collect();
    assert_eq!(members, vec![vec![0, 2], vec![1, 3]]);
}

#[test]
fn test_group_key_shape() {
    let items = vec![item(&tokens(0, 20)), item(&tokens(0, 20))];
    let groups = detector().group_cross_source_duplicates(&items, 0.8).unwrap();
    let key = &groups[0].group_key;
    assert!(key.ends_with("-0"));
    assert_eq!(key.len(), 18);
}

#[test]
fn test_group_uses_injected_reputation() {
    let items = vec![
        item(&tokens(0, 20)).with_source_url("https://low.example"),
        item(&tokens(0, 20)).with_source_url("https://high.example"),
    ];
    let table =
        StaticReputation::from_pairs([("low.example", 0.0), ("high.example", 1.0)]).unwrap();
    let d = detector().with_reputation(Arc::new(table));
    let groups = d.group_cross_source_duplicates(&items, 0.8).unwrap();
    assert_eq!(groups[0].canonical, 1);
    assert_eq!(groups[0].reason, ReasonCode::ComprehensiveAssessment);
}

// ========== Canonical selection ==========

fn pick(items: &[ContentItem]) -> CanonicalChoice {
    let members: Vec<usize> = (0..items.len()).collect();
    select_canonical(items, &members, &*CURATED_REPUTATION, &CanonicalWeights::default()).unwrap()
}

#[test]
fn test_canon_highest_quality() {
    let items = vec![
        item("same body text").with_quality_score(0.6),
        item("same body text").with_quality_score(0.8),
    ];
    let c = pick(&items);
    assert_eq!(c.winner, 1);
    assert_eq!(c.reason, ReasonCode::HighestQuality);
}

#[test]
fn test_canon_original_source() {
    let items = vec![
        item("same body text").with_timestamp(ts(3, 1)),
        item("same body text").with_timestamp(ts(1, 1)),
    ];
    let c = pick(&items);
    assert_eq!(c.winner, 1);
    assert_eq!(c.reason, ReasonCode::OriginalSource);
}

#[test]
fn test_canon_missing_timestamp_disfavoured() {
    let items = vec![item("same body text"), item("same body text").with_timestamp(ts(6, 1))];
    let c = pick(&items);
    assert_eq!(c.winner, 1);
    assert_eq!(c.reason, ReasonCode::OriginalSource);
    assert_eq!(c.scores[0].recency, 0.0);
    assert_eq!(c.scores[1].recency, 1.0);
}

#[test]
fn test_canon_tie_lowest_index() {
    let items = vec![item("same body text"), item("same body text"), item("same body text")];
    let c = pick(&items);
    assert_eq!(c.winner, 0);
    assert_eq!(c.reason, ReasonCode::ComprehensiveAssessment);
}

#[test]
fn test_canon_recency_linear() {
    let items = vec![
        item("x").with_timestamp(ts(1, 1)),
        item("x").with_timestamp(ts(1, 3)),
        item("x").with_timestamp(ts(1, 5)),
    ];
    let c = pick(&items);
    let recency: Vec<f64> = c.scores.iter().map(|s| s.recency).collect();
    assert_eq!(recency, vec![1.0, 0.5, 0.0]);
}

#[test]
fn test_canon_composite_formula() {
    let items = vec![item(&tokens(0, 500))
        .with_quality_score(1.0)
        .with_source_url("https://reuters.com/a")];
    let c = pick(&items);
    // 0.4·1.0 + 0.3·0.5 + 0.2·0.95 + 0.1·0.0
    assert!((c.scores[0].total - 0.74).abs() < 1e-9);
}

#[test]
fn test_canon_member_order_irrelevant() {
    let items = vec![
        item("short").with_quality_score(0.7),
        item("a somewhat longer body of text").with_quality_score(0.7),
    ];
    let w = CanonicalWeights::default();
    let a = select_canonical(&items, &[0, 1], &*CURATED_REPUTATION, &w).unwrap();
    let b = select_canonical(&items, &[1, 0], &*CURATED_REPUTATION, &w).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.winner, 1);
    assert_eq!(a.reason, ReasonCode::MostComplete);
}

#[test]
fn test_canon_empty_group() {
    let items = vec![item("x")];
    assert_eq!(
        select_canonical(&items, &[], &*CURATED_REPUTATION, &CanonicalWeights::default()),
        Err(ValidationError::EmptyGroup)
    );
}

#[test]
fn test_canon_member_out_of_range() {
    let items = vec![item("x")];
    assert_eq!(
        select_canonical(&items, &[0, 5], &*CURATED_REPUTATION, &CanonicalWeights::default()),
        Err(ValidationError::MemberOutOfRange { index: 5, len: 1 })
    );
}

#[test]
fn test_reason_code_serialization() {
    assert_eq!(serde_json::to_string(&ReasonCode::MostComplete).unwrap(), "\"MOST_COMPLETE\"");
    assert_eq!(ReasonCode::ComprehensiveAssessment.as_str(), "COMPREHENSIVE_ASSESSMENT");
}

// ========== Versions ==========

fn titled(title: &str, when: Option<DateTime<Utc>>) -> ContentItem {
    let it = ContentItem::new(title, "body");
    match when {
        Some(t) => it.with_timestamp(t),
        None => it,
    }
}

#[test]
fn test_versions_singletons_unannotated() {
    let items = vec![titled("Alpha", None), titled("Beta", None)];
    let v = track_versions(&items, TITLE_SIMILARITY_THRESHOLD).unwrap();
    assert_eq!(v.len(), 2);
    assert!(v.iter().all(|x| x.version.is_none()));
}

#[test]
fn test_versions_missing_timestamp_oldest() {
    let items = vec![
        titled("Report", None),
        titled("Report", Some(ts(2, 1))),
        titled("report!", Some(ts(1, 1))),
    ];
    let v = track_versions(&items, TITLE_SIMILARITY_THRESHOLD).unwrap();
    let n = |i: usize| v[i].version.as_ref().unwrap().version_number;
    assert_eq!((n(1), n(2), n(0)), (3, 2, 1));
    assert!(v[1].version.as_ref().unwrap().is_latest);
}

#[test]
fn test_versions_fuzzy_threshold() {
    let items = vec![
        titled("breaking news today", None),
        titled("breaking news today update", None),
    ];
    // Jaccard 0.75
    let strict = track_versions(&items, TITLE_SIMILARITY_THRESHOLD).unwrap();
    assert!(strict.iter().all(|x| x.version.is_none()));
    let loose = track_versions(&items, 0.7).unwrap();
    assert!(loose.iter().all(|x| x.version.is_some()));
}

#[test]
fn test_versions_empty_titles_never_chain() {
    let items = vec![titled("", None), titled("  ", None), titled("!!", None)];
    let v = track_versions(&items, TITLE_SIMILARITY_THRESHOLD).unwrap();
    assert!(v.iter().all(|x| x.version.is_none()));
}

#[test]
fn test_versions_links() {
    let items = vec![
        titled("Weekly digest", Some(ts(1, 1))),
        titled("Weekly Digest", Some(ts(1, 15))),
        titled("Other", None),
    ];
    let v = track_versions(&items, TITLE_SIMILARITY_THRESHOLD).unwrap();
    let newest = v[1].version.as_ref().unwrap();
    let oldest = v[0].version.as_ref().unwrap();
    assert_eq!(newest.previous, Some(0));
    assert_eq!(newest.next, None);
    assert_eq!(oldest.next, Some(1));
    assert_eq!(oldest.previous, None);
    assert_eq!(newest.chain_key, oldest.chain_key);
    assert!(v[2].version.is_none());
}

#[test]
fn test_versions_invalid_threshold() {
    assert!(track_versions(&[], -0.5).is_err());
}

// ========== Pipeline ==========

#[test]
fn test_pipeline_cancelled_before_start() {
    let items = vec![item("same text"), item("same text"), item("other")];
    let cancel = CancelFlag::new();
    cancel.cancel();
    let report = DedupPipeline::default().run_with_cancel(&items, &cancel).unwrap();
    assert!(report.cancelled);
    assert_eq!(report.exact_duplicates, vec![ExactDuplicatePair { original: 0, duplicate: 1 }]);
    assert!(report.near_duplicates.is_empty());
    assert!(report.groups.is_empty());
    assert!(report.versions.is_empty());
}

#[test]
fn test_pipeline_not_cancelled() {
    let items = vec![item("same text"), item("same text")];
    let report = DedupPipeline::default().run(&items).unwrap();
    assert!(!report.cancelled);
    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.canonical_of(1), Some(0));
    assert_eq!(report.canonical_of(5), None);
    assert_eq!(report.stats.pairs_compared, 1);
}

#[test]
fn test_pipeline_rejects_bad_config() {
    assert!(DedupPipeline::new(EngineConfig::default().with_signature_length(0)).is_err());
    assert!(DedupPipeline::new(EngineConfig::default().with_shingle_size(0)).is_err());
}

#[test]
fn test_pipeline_group_map() {
    let items = vec![item("x y z"), item("q"), item("x y z")];
    let report = DedupPipeline::default().run(&items).unwrap();
    let map = report.group_map();
    assert_eq!(map.len(), 1);
    let summary = map.values().next().unwrap();
    assert_eq!(summary.canonical, 0);
    assert_eq!(summary.duplicates, vec![2]);
    assert_eq!(summary.count, 2);
}

#[test]
fn test_pipeline_to_json() {
    let items = vec![item("x y z"), item("x y z")];
    let report = DedupPipeline::default().run(&items).unwrap();
    let json = report.to_json().unwrap();
    assert!(json.contains("\"exact_duplicates\""));
    assert!(json.contains("\"COMPREHENSIVE_ASSESSMENT\""));
}

use proptest::prelude::*;

use super::*;

fn config() -> TableConfig {
    TableConfig {
        max_phrase_length: 7,
        table_limit: 0,
        min_score: 0.0,
        policy: LoadPolicy::Strict,
    }
}

fn table(source: &str, target: &str, alignment: &str) -> PhraseTable {
    PhraseTable::from_text(source, target, alignment, config())
        .unwrap()
        .0
}

fn phrases(candidates: &[TranslationCandidate]) -> Vec<(&str, usize)> {
    candidates
        .iter()
        .map(|c| (c.phrase.as_str(), c.count))
        .collect()
}

// --- Loading ---

#[test]
fn test_load_counts_sentences_and_tokens() {
    let (t, report) =
        PhraseTable::from_text("a b c\nd e\n", "x y z\nu v\n", "0-0 1-1 2-2\n0-1 1-0\n", config())
            .unwrap();
    assert_eq!(report.sentences, 2);
    assert_eq!(report.skipped_points, 0);
    assert_eq!(
        t.stats(),
        TableStats {
            sentences: 2,
            source_tokens: 5,
            target_tokens: 5,
            source_vocab: 5,
            target_vocab: 5,
            alignment_points: 5,
        }
    );
    assert_eq!(t.alignment(1).unwrap().targets_of(0), &[1]);
}

#[test]
fn test_load_sentence_count_mismatch() {
    let err = PhraseTable::from_text("a\nb\n", "x\n", "0-0\n0-0\n", config()).unwrap_err();
    assert!(matches!(
        err,
        TableError::SentenceCountMismatch {
            source_sentences: 2,
            target_sentences: 1,
            alignment_lines: 2,
        }
    ));

    let err = PhraseTable::from_text("a\n", "x\n", "", config()).unwrap_err();
    assert!(matches!(err, TableError::SentenceCountMismatch { .. }));
}

#[test]
fn test_load_strict_rejects_malformed_token() {
    let err =
        PhraseTable::from_text("a b\nc\n", "x y\nz\n", "0-0\n0-0 oops\n", config()).unwrap_err();
    match err {
        TableError::Alignment { line, error } => {
            assert_eq!(line, 2);
            assert_eq!(error, AlignmentError::Malformed("oops".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_load_lenient_skips_malformed_token() {
    let config = TableConfig {
        policy: LoadPolicy::Lenient,
        ..config()
    };
    let (t, report) =
        PhraseTable::from_text("a b\n", "x y\n", "0-0 1_1 1-1\n", config).unwrap();
    assert_eq!(report.malformed_points, 1);
    assert_eq!(t.alignment(0).unwrap().point_count(), 2);
    assert_eq!(phrases(&t.lookup("b").unwrap()), vec![("y", 1)]);
}

#[test]
fn test_load_skips_out_of_bounds_points() {
    let (t, report) =
        PhraseTable::from_text("a b\n", "x y\n", "0-0 1-1 2-0 1-5\n", config()).unwrap();
    assert_eq!(report.skipped_points, 2);
    assert_eq!(t.alignment(0).unwrap().point_count(), 2);
}

#[test]
fn test_load_empty_sentences() {
    let t = table("a\n\nb\n", "x\n\ny\n", "0-0\n\n0-0\n");
    assert_eq!(t.sentence_count(), 3);
    assert_eq!(phrases(&t.lookup("b").unwrap()), vec![("y", 1)]);
}

#[test]
fn test_load_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("corpus.src");
    let trg = dir.path().join("corpus.trg");
    let aln = dir.path().join("corpus.aln");
    std::fs::write(&src, "a b\n").unwrap();
    std::fs::write(&trg, "x y\n").unwrap();
    std::fs::write(&aln, "0-0 1-1\n").unwrap();

    let (t, _) = PhraseTable::load(&src, &trg, &aln, config()).unwrap();
    assert_eq!(phrases(&t.lookup("a b").unwrap()), vec![("x y", 1)]);

    let missing = dir.path().join("missing");
    assert!(matches!(
        PhraseTable::load(&missing, &trg, &aln, config()),
        Err(TableError::Io(_))
    ));
}

// --- Lookup ---

#[test]
fn test_lookup_diagonal() {
    let t = table("a b c\n", "x y z\n", "0-0 1-1 2-2\n");
    let result = t.lookup("a").unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].phrase, "x");
    assert_eq!(result[0].score, 1.0);
    assert_eq!(result[0].ids, vec![t.target_vocab().id("x").unwrap()]);
}

#[test]
fn test_lookup_relative_frequency() {
    let t = table(
        "a b\na b\na b\n",
        "x y\nx y\nx y z\n",
        "0-0 1-1\n0-0 1-1\n0-0 1-1 1-2\n",
    );
    let result = t.lookup("a b").unwrap();
    assert_eq!(phrases(&result), vec![("x y", 2), ("x y z", 1)]);
    assert!((result[0].score - 2.0 / 3.0).abs() < 1e-12);
    assert!((result[1].score - 1.0 / 3.0).abs() < 1e-12);
}

#[test]
fn test_lookup_oov_and_empty() {
    let t = table("a b\n", "x y\n", "0-0 1-1\n");
    assert!(t.lookup("q").unwrap().is_empty());
    assert!(t.lookup("a q").unwrap().is_empty());
    assert!(t.lookup("").unwrap().is_empty());
    assert!(t.lookup("   ").unwrap().is_empty());
    assert!(t.lookup("b a").unwrap().is_empty());
}

#[test]
fn test_lookup_boundary_crossing_counts_in_denominator() {
    // "b c" occurs across sentences 0/1 and inside sentence 2.
    let t = table("a b\nc d\nb c\n", "x y\nz w\ny z\n", "0-0 1-1\n0-0 1-1\n0-0 1-1\n");
    let mut stats = QueryStats::new();
    let result = t.lookup_with_stats("b c", &mut stats).unwrap();
    assert_eq!(phrases(&result), vec![("y z", 1)]);
    assert_eq!(result[0].score, 0.5);
    assert_eq!(stats.occurrences, 2);
    assert_eq!(stats.boundary_crossings, 1);
    assert_eq!(stats.sentences_visited, 1);
    assert_eq!(stats.pairs_extracted, 1);
}

#[test]
fn test_lookup_crossing_alignment() {
    let t = table("a b c\n", "x y z\n", "0-0 1-2 2-1\n");
    assert_eq!(phrases(&t.lookup("b").unwrap()), vec![("z", 1)]);
    assert!(t.lookup("a b").unwrap().is_empty());
    assert_eq!(phrases(&t.lookup("b c").unwrap()), vec![("y z", 1)]);
}

#[test]
fn test_lookup_unaligned_source_has_no_candidates() {
    let t = table("a b\n", "x y\n", "0-0\n");
    assert!(t.lookup("b").unwrap().is_empty());
    assert_eq!(t.count_phrase(Side::Source, "b"), 1);
}

#[test]
fn test_lookup_ties_ordered_by_ids() {
    let t = table("a\na\n", "x\ny\n", "0-0\n0-0\n");
    let result = t.lookup("a").unwrap();
    assert_eq!(phrases(&result), vec![("x", 1), ("y", 1)]);
}

#[test]
fn test_lookup_table_limit_and_min_score() {
    let mut t = table(
        "a\na\na\na\n",
        "x\nx\ny\nz\n",
        "0-0\n0-0\n0-0\n0-0\n",
    );
    t.set_config(TableConfig {
        table_limit: 2,
        ..config()
    });
    assert_eq!(phrases(&t.lookup("a").unwrap()), vec![("x", 2), ("y", 1)]);

    t.set_config(TableConfig {
        min_score: 0.3,
        ..config()
    });
    assert_eq!(phrases(&t.lookup("a").unwrap()), vec![("x", 2)]);
}

#[test]
fn test_lookup_respects_max_phrase_length() {
    let mut t = table("a\n", "x y z\n", "0-1\n");
    // Equal counts fall back to id order: x=0, y=1, z=2.
    assert_eq!(
        phrases(&t.lookup("a").unwrap()),
        vec![("x y", 1), ("x y z", 1), ("y", 1), ("y z", 1)]
    );
    t.set_config(TableConfig {
        max_phrase_length: 1,
        ..config()
    });
    assert_eq!(phrases(&t.lookup("a").unwrap()), vec![("y", 1)]);
}

#[test]
fn test_lookup_is_repeatable() {
    let t = table("a b a\nb a\n", "x y x\ny x\n", "0-0 1-1 2-2\n0-0 1-1\n");
    let first = t.lookup("b a").unwrap();
    let second = t.lookup("b a").unwrap();
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn test_lookup_ids_matches_lookup() {
    let t = table("a b\n", "x y\n", "0-0 1-1\n");
    let ids = t.source_vocab().ids_of(["a", "b"]).unwrap();
    assert_eq!(t.lookup_ids(&ids).unwrap(), t.lookup("a b").unwrap());
}

#[test]
fn test_count_phrase_both_sides() {
    let t = table("a b a\n", "x y\n", "0-0\n");
    assert_eq!(t.count_phrase(Side::Source, "a"), 2);
    assert_eq!(t.count_phrase(Side::Source, "a b"), 1);
    assert_eq!(t.count_phrase(Side::Target, "y"), 1);
    assert_eq!(t.count_phrase(Side::Target, "q"), 0);
}

// --- Extension ---

#[test]
fn test_append_makes_phrase_findable() {
    let mut t = table("a b\n", "x y\n", "0-0 1-1\n");
    assert!(t.lookup("c").unwrap().is_empty());

    let report = t.append_sentence_pair("c a", "z x", "0-0 1-1").unwrap();
    assert_eq!(report.sentences, 1);
    assert_eq!(t.sentence_count(), 2);
    assert_eq!(phrases(&t.lookup("c").unwrap()), vec![("z", 1)]);
    assert_eq!(phrases(&t.lookup("a").unwrap()), vec![("x", 2)]);
    assert_eq!(phrases(&t.lookup("c a").unwrap()), vec![("z x", 1)]);
    // New boundary between sentence 0 and 1.
    assert_eq!(t.count_phrase(Side::Source, "b c"), 1);
    assert!(t.lookup("b c").unwrap().is_empty());
}

#[test]
fn test_append_to_empty_table() {
    let mut t = PhraseTable::new(config());
    assert!(t.lookup("a").unwrap().is_empty());
    t.append_sentence_pair("a", "x", "0-0").unwrap();
    assert_eq!(phrases(&t.lookup("a").unwrap()), vec![("x", 1)]);
}

#[test]
fn test_append_malformed_leaves_table_unchanged() {
    let mut t = table("a\n", "x\n", "0-0\n");
    let before = t.stats();
    let err = t.append_sentence_pair("new", "word", "0:0").unwrap_err();
    assert!(matches!(err, TableError::Alignment { line: 2, .. }));
    assert_eq!(t.stats(), before);
    assert!(t.source_vocab().id("new").is_none());
}

#[test]
fn test_append_skips_out_of_bounds_point() {
    let mut t = PhraseTable::new(config());
    let report = t.append_sentence_pair("a", "x", "0-0 0-3").unwrap();
    assert_eq!(report.skipped_points, 1);
    assert_eq!(t.stats().alignment_points, 1);
}

#[test]
fn test_append_batch_matches_single_appends() {
    let pairs = [
        ("a b", "x y", "0-0 1-1"),
        ("b c", "y z", "0-0 1-1"),
        ("c a b", "z x y", "0-0 1-1 2-2 5-5"),
    ];
    let mut batched = table("a\n", "x\n", "0-0\n");
    let report = batched.append_sentence_pairs(pairs).unwrap();
    assert_eq!(report.sentences, 3);
    assert_eq!(report.skipped_points, 1);

    let mut single = table("a\n", "x\n", "0-0\n");
    for (s, t, a) in pairs {
        single.append_sentence_pair(s, t, a).unwrap();
    }

    assert_eq!(batched.stats(), single.stats());
    assert_eq!(
        batched.source().suffixes().positions(),
        single.source().suffixes().positions()
    );
    for phrase in ["a", "b c", "a b", "c a b"] {
        assert_eq!(batched.lookup(phrase).unwrap(), single.lookup(phrase).unwrap());
    }
    assert_eq!(batched.alignment(3).unwrap().sentence(), 3);
}

#[test]
fn test_append_batch_rejected_as_a_whole() {
    let mut t = table("a\n", "x\n", "0-0\n");
    let before = t.stats();
    let err = t
        .append_sentence_pairs([("b", "y", "0-0"), ("c", "z", "0-x")])
        .unwrap_err();
    assert!(matches!(err, TableError::Alignment { line: 3, .. }));
    assert_eq!(t.stats(), before);
    assert!(t.source_vocab().id("b").is_none());
    assert!(t.lookup("b").unwrap().is_empty());
}

#[test]
fn test_vocabulary_full_maps_to_table_error() {
    let err: TableError = VocabularyFull.into();
    assert!(matches!(err, TableError::Vocabulary(VocabularyFull)));
    assert!(err.to_string().contains("vocabulary full"));
}

// --- Persistence ---

#[test]
fn test_save_and_open() {
    let mut t = table("a b c\nb c\n", "x y z\ny z\n", "0-0 1-1 2-2\n0-0 1-1\n");
    t.append_sentence_pair("c a", "z x", "0-0 1-1").unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("table.phsa");
    t.save(&path).unwrap();
    assert!(!path.with_extension("tmp").exists());

    let opened = PhraseTable::open(&path, config()).unwrap();
    assert_eq!(opened.stats(), t.stats());
    for phrase in ["a", "b c", "c a", "a b c", "z"] {
        assert_eq!(opened.lookup(phrase).unwrap(), t.lookup(phrase).unwrap());
    }

    // Vocabulary ids survive, so appending keeps working after reopening.
    let mut opened = opened;
    opened.append_sentence_pair("a d", "x w", "0-0 1-1").unwrap();
    assert_eq!(phrases(&opened.lookup("a").unwrap()), vec![("x", 3)]);
}

#[test]
fn test_from_bytes_rejects_bad_header() {
    let t = table("a\n", "x\n", "0-0\n");
    let bytes = t.to_bytes().unwrap();

    assert!(matches!(
        PhraseTable::from_bytes(&bytes[..3], config()),
        Err(TableError::InvalidHeader)
    ));
    assert!(matches!(
        PhraseTable::from_bytes(&bytes[..12], config()),
        Err(TableError::InvalidHeader)
    ));

    let mut bad = bytes.clone();
    bad[0] = b'X';
    assert!(matches!(
        PhraseTable::from_bytes(&bad, config()),
        Err(TableError::InvalidMagic)
    ));

    let mut bad = bytes.clone();
    bad[4] = 9;
    assert!(matches!(
        PhraseTable::from_bytes(&bad, config()),
        Err(TableError::UnsupportedVersion(9))
    ));

    assert!(matches!(
        PhraseTable::from_bytes(&bytes[..bytes.len() - 1], config()),
        Err(TableError::InvalidHeader)
    ));
}

#[test]
fn test_from_bytes_detects_corruption() {
    let t = table("a b\n", "x y\n", "0-0 1-1\n");
    let mut bytes = t.to_bytes().unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    assert!(matches!(
        PhraseTable::from_bytes(&bytes, config()),
        Err(TableError::ChecksumMismatch)
    ));
}

#[test]
fn test_open_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        PhraseTable::open(&dir.path().join("none.phsa"), config()),
        Err(TableError::Io(_))
    ));
}

// ---------------------------------------------------------------------------
// Property tests
// ---------------------------------------------------------------------------

/// Sentence pairs over a 3-word alphabet per side with random alignments.
fn arb_pairs() -> impl Strategy<Value = Vec<(Vec<u8>, Vec<u8>, Vec<(usize, usize)>)>> {
    let pair = (1usize..5, 1usize..5).prop_flat_map(|(sl, tl)| {
        (
            prop::collection::vec(0u8..3, sl),
            prop::collection::vec(0u8..3, tl),
            prop::collection::vec((0..sl, 0..tl), 0..6),
        )
    });
    prop::collection::vec(pair, 1..6)
}

fn render(
    pairs: &[(Vec<u8>, Vec<u8>, Vec<(usize, usize)>)],
) -> Vec<(String, String, String)> {
    let words = |ids: &[u8], base: u8| {
        ids.iter()
            .map(|&i| ((base + i) as char).to_string())
            .collect::<Vec<_>>()
            .join(" ")
    };
    pairs
        .iter()
        .map(|(s, t, a)| {
            let align = a
                .iter()
                .map(|(i, j)| format!("{i}-{j}"))
                .collect::<Vec<_>>()
                .join(" ");
            (words(s, b'a'), words(t, b'x'), align)
        })
        .collect()
}

fn column(lines: &[(String, String, String)], pick: usize) -> String {
    lines
        .iter()
        .map(|(s, t, a)| {
            let field = match pick {
                0 => s,
                1 => t,
                _ => a,
            };
            format!("{field}\n")
        })
        .collect()
}

proptest! {
    #[test]
    fn appended_table_matches_loaded_table(pairs in arb_pairs()) {
        let lines = render(&pairs);
        let (loaded, _) = PhraseTable::from_text(
            &column(&lines, 0),
            &column(&lines, 1),
            &column(&lines, 2),
            config(),
        )
        .unwrap();

        let mut grown = PhraseTable::new(config());
        for (s, t, a) in &lines {
            grown.append_sentence_pair(s, t, a).unwrap();
        }

        prop_assert_eq!(grown.stats(), loaded.stats());
        for phrase in ["a", "b", "c", "a b", "b a", "c c", "a b c"] {
            prop_assert_eq!(grown.lookup(phrase).unwrap(), loaded.lookup(phrase).unwrap());
        }
    }

    #[test]
    fn scores_are_relative_frequencies(pairs in arb_pairs(), phrase in "[abc]( [abc]){0,2}") {
        let mut t = PhraseTable::new(config());
        for (s, tr, a) in render(&pairs) {
            t.append_sentence_pair(&s, &tr, &a).unwrap();
        }
        let mut stats = QueryStats::new();
        let result = t.lookup_with_stats(&phrase, &mut stats).unwrap();
        prop_assert_eq!(stats.occurrences, t.count_phrase(Side::Source, &phrase));
        prop_assert!(stats.sentences_visited + stats.boundary_crossings == stats.occurrences);
        for c in &result {
            prop_assert!(c.score > 0.0);
            prop_assert_eq!(c.score, c.count as f64 / stats.occurrences as f64);
            prop_assert!(c.ids.len() <= 7);
        }
    }
}

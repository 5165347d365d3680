use std::sync::Arc;
use std::thread;

use phrasa_core::{LoadPolicy, Side, TableConfig, TableError};

use super::*;

fn config() -> TableConfig {
    TableConfig {
        max_phrase_length: 7,
        table_limit: 0,
        min_score: 0.0,
        policy: LoadPolicy::Strict,
    }
}

fn seeded_engine() -> Arc<PhraseEngine> {
    let engine = PhraseEngine::new(config());
    engine
        .append_sentence_pair("the house", "das haus", "0-0 1-1")
        .unwrap();
    engine
        .append_sentence_pair("the small house", "das kleine haus", "0-0 1-1 2-2")
        .unwrap();
    engine
}

#[test]
fn test_lookup_through_engine() {
    let engine = seeded_engine();
    let result = engine.lookup("house").unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].phrase, "haus");
    assert_eq!(result[0].score, 1.0);
    assert_eq!(engine.count_phrase(Side::Target, "das").unwrap(), 2);
    assert_eq!(engine.stats().unwrap().sentences, 2);
}

#[test]
fn test_concurrent_readers_with_writer() {
    let engine = seeded_engine();
    let baseline = engine.lookup("the").unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for _ in 0..200 {
                    let result = engine.lookup("the").unwrap();
                    // "the" always maps to "das"; only the count grows.
                    assert_eq!(result.len(), 1);
                    assert_eq!(result[0].phrase, "das");
                    assert_eq!(result[0].score, 1.0);
                }
            })
        })
        .collect();

    let writer = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for i in 0..50 {
                let source = format!("the word{i}");
                let target = format!("das wort{i}");
                engine.append_sentence_pair(&source, &target, "0-0 1-1").unwrap();
            }
        })
    };

    for r in readers {
        r.join().unwrap();
    }
    writer.join().unwrap();

    assert_eq!(baseline[0].count, 2);
    assert_eq!(engine.lookup("the").unwrap()[0].count, 52);
    assert_eq!(engine.lookup("word49").unwrap()[0].phrase, "wort49");
    assert_eq!(engine.stats().unwrap().sentences, 52);
}

#[test]
fn test_append_batch_through_engine() {
    let engine = seeded_engine();
    let report = engine
        .append_sentence_pairs([("a house", "ein haus", "0-0 1-1"), ("a", "ein", "0-0")])
        .unwrap();
    assert_eq!(report.sentences, 2);
    assert_eq!(engine.lookup("a").unwrap()[0].count, 2);
    assert_eq!(engine.stats().unwrap().sentences, 4);
}

#[test]
fn test_save_and_open() {
    let engine = seeded_engine();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.phsa");
    engine.save(&path).unwrap();

    let reopened = PhraseEngine::open(&path, config()).unwrap();
    assert_eq!(
        reopened.lookup("small house").unwrap(),
        engine.lookup("small house").unwrap()
    );
}

#[test]
fn test_load_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let paths: Vec<_> = ["src", "trg", "aln"]
        .iter()
        .map(|ext| dir.path().join(format!("corpus.{ext}")))
        .collect();
    std::fs::write(&paths[0], "a b\n").unwrap();
    std::fs::write(&paths[1], "x y\n").unwrap();
    std::fs::write(&paths[2], "0-0 1-1 5-5\n").unwrap();

    let (engine, report) = PhraseEngine::load(&paths[0], &paths[1], &paths[2], config()).unwrap();
    assert_eq!(report.skipped_points, 1);
    assert_eq!(engine.lookup("b").unwrap()[0].phrase, "y");
}

#[test]
fn test_error_mapping() {
    let engine = PhraseEngine::new(config());
    let err = engine.append_sentence_pair("a", "x", "zero-zero").unwrap_err();
    assert!(matches!(err, EngineError::InvalidData { .. }));

    let dir = tempfile::tempdir().unwrap();
    let err = PhraseEngine::open(&dir.path().join("missing.phsa"), config())
        .err()
        .unwrap();
    assert!(matches!(err, EngineError::Io { .. }));

    let err: EngineError = TableError::UnknownTargetId(7).into();
    assert!(matches!(err, EngineError::Internal { .. }));
}

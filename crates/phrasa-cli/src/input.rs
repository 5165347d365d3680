//! Plain-text inputs of the command line: parallel sentence-pair files for
//! `append` and query lists for `batch`, plus the JSON record `batch` writes.

use std::fs;
use std::io;

use phrasa_core::TranslationCandidate;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("cannot read {path}: {error}")]
    Io {
        path: String,
        #[source]
        error: io::Error,
    },
    #[error("line count mismatch: source={source_lines}, target={target_lines}, alignment={alignment_lines}")]
    LineCountMismatch {
        source_lines: usize,
        target_lines: usize,
        alignment_lines: usize,
    },
}

/// One source line, its translation and their alignment line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentencePair {
    pub source: String,
    pub target: String,
    pub alignment: String,
}

fn read_lines(path: &str) -> Result<Vec<String>, InputError> {
    let text = fs::read_to_string(path).map_err(|error| InputError::Io {
        path: path.to_string(),
        error,
    })?;
    Ok(text.lines().map(str::to_string).collect())
}

/// Reads three line-parallel files into sentence pairs.
pub fn read_sentence_pairs(
    source: &str,
    target: &str,
    alignment: &str,
) -> Result<Vec<SentencePair>, InputError> {
    let source = read_lines(source)?;
    let target = read_lines(target)?;
    let alignment = read_lines(alignment)?;
    if source.len() != target.len() || source.len() != alignment.len() {
        return Err(InputError::LineCountMismatch {
            source_lines: source.len(),
            target_lines: target.len(),
            alignment_lines: alignment.len(),
        });
    }
    Ok(source
        .into_iter()
        .zip(target)
        .zip(alignment)
        .map(|((source, target), alignment)| SentencePair {
            source,
            target,
            alignment,
        })
        .collect())
}

/// Reads one query per line, skipping blank lines.
pub fn read_queries(path: &str) -> Result<Vec<String>, InputError> {
    Ok(read_lines(path)?
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect())
}

/// One line of `batch` output.
#[derive(Debug, Serialize)]
pub struct BatchRecord<'a> {
    pub query: &'a str,
    pub occurrences: usize,
    pub candidates: &'a [TranslationCandidate],
}

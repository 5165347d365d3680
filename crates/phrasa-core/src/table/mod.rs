//! On-demand phrase table over a suffix-indexed parallel corpus.
//!
//! A lookup counts the source phrase in the source suffix array, maps each
//! occurrence back to its sentence, extracts alignment-consistent target
//! spans there and scores each distinct target phrase by relative frequency.

mod load;
mod persistence;
#[cfg(test)]
mod tests;

pub use load::LoadReport;

use std::collections::BTreeMap;
use std::io;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, debug_span};

use crate::alignment::{AlignmentError, SentenceAlignment};
use crate::corpus::IndexedCorpus;
use crate::settings::settings;
use crate::stats::QueryStats;
use crate::vocab::{TokenId, Vocabulary, VocabularyFull};

/// Unified error type for loading, extending, persisting and querying a
/// phrase table.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error(
        "sentence count mismatch: source={source_sentences}, \
         target={target_sentences}, alignment={alignment_lines}"
    )]
    SentenceCountMismatch {
        source_sentences: usize,
        target_sentences: usize,
        alignment_lines: usize,
    },

    #[error("alignment line {line}: {error}")]
    Alignment {
        line: usize,
        #[source]
        error: AlignmentError,
    },

    #[error("invalid header (too short)")]
    InvalidHeader,

    #[error("invalid magic bytes (expected PHSA)")]
    InvalidMagic,

    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),

    #[error("checksum mismatch")]
    ChecksumMismatch,

    #[error("serialization error: {0}")]
    Serialize(bincode::Error),

    #[error("deserialization error: {0}")]
    Deserialize(bincode::Error),

    #[error("inconsistent index: {0}")]
    Inconsistent(String),

    #[error(transparent)]
    Vocabulary(#[from] VocabularyFull),

    #[error("target id {0} has no vocabulary entry")]
    UnknownTargetId(TokenId),

    #[error("sentence {0} has no alignment record")]
    MissingAlignment(usize),
}

/// How malformed alignment tokens are handled while loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPolicy {
    /// Abort with [`TableError::Alignment`].
    Strict,
    /// Skip the token with a warning and keep the sentence pair.
    Lenient,
}

/// Runtime parameters of a table.
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Maximum target phrase length.
    pub max_phrase_length: usize,
    /// Maximum candidates per lookup; 0 = unlimited.
    pub table_limit: usize,
    pub min_score: f64,
    pub policy: LoadPolicy,
}

impl TableConfig {
    pub fn from_settings() -> Self {
        settings().table_config()
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self::from_settings()
    }
}

/// A scored target phrase returned by a lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationCandidate {
    /// Surface target phrase, tokens joined by single spaces.
    pub phrase: String,
    pub ids: Vec<TokenId>,
    /// Number of extractions that produced this phrase.
    pub count: usize,
    /// `count` divided by the raw occurrence count of the source phrase.
    pub score: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableStats {
    pub sentences: usize,
    pub source_tokens: usize,
    pub target_tokens: usize,
    pub source_vocab: usize,
    pub target_vocab: usize,
    pub alignment_points: usize,
}

/// Corpus side selector for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Target,
}

#[derive(Debug, Clone)]
pub struct PhraseTable {
    config: TableConfig,
    source_vocab: Vocabulary,
    target_vocab: Vocabulary,
    source: IndexedCorpus,
    target: IndexedCorpus,
    alignments: Vec<SentenceAlignment>,
}

impl PhraseTable {
    /// An empty table that grows through [`PhraseTable::append_sentence_pair`].
    pub fn new(config: TableConfig) -> Self {
        Self {
            config,
            source_vocab: Vocabulary::new(),
            target_vocab: Vocabulary::new(),
            source: IndexedCorpus::default(),
            target: IndexedCorpus::default(),
            alignments: Vec::new(),
        }
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: TableConfig) {
        self.config = config;
    }

    pub fn source_vocab(&self) -> &Vocabulary {
        &self.source_vocab
    }

    pub fn target_vocab(&self) -> &Vocabulary {
        &self.target_vocab
    }

    pub fn source(&self) -> &IndexedCorpus {
        &self.source
    }

    pub fn target(&self) -> &IndexedCorpus {
        &self.target
    }

    pub fn alignment(&self, sentence: usize) -> Option<&SentenceAlignment> {
        self.alignments.get(sentence)
    }

    pub fn sentence_count(&self) -> usize {
        self.alignments.len()
    }

    pub fn stats(&self) -> TableStats {
        TableStats {
            sentences: self.sentence_count(),
            source_tokens: self.source.corpus().len(),
            target_tokens: self.target.corpus().len(),
            source_vocab: self.source_vocab.len(),
            target_vocab: self.target_vocab.len(),
            alignment_points: self.alignments.iter().map(|a| a.point_count()).sum(),
        }
    }

    /// Raw occurrence count of a whitespace-separated phrase on one side,
    /// boundary-crossing matches included. OOV phrases count 0.
    pub fn count_phrase(&self, side: Side, phrase: &str) -> usize {
        let (vocab, index) = match side {
            Side::Source => (&self.source_vocab, &self.source),
            Side::Target => (&self.target_vocab, &self.target),
        };
        vocab
            .ids_of(phrase.split_whitespace())
            .map_or(0, |ids| index.count(&ids).count)
    }

    /// Scored translations of a whitespace-separated source phrase.
    ///
    /// An empty phrase, an OOV token or a phrase that never occurs all give an
    /// empty result. Only internal inconsistencies are errors.
    pub fn lookup(&self, phrase: &str) -> Result<Vec<TranslationCandidate>, TableError> {
        self.lookup_with_stats(phrase, &mut QueryStats::new())
    }

    pub fn lookup_with_stats(
        &self,
        phrase: &str,
        stats: &mut QueryStats,
    ) -> Result<Vec<TranslationCandidate>, TableError> {
        let Some(ids) = self.source_vocab.ids_of(phrase.split_whitespace()) else {
            debug!(phrase, "oov source token");
            return Ok(Vec::new());
        };
        self.lookup_ids_with_stats(&ids, stats)
    }

    /// Like [`PhraseTable::lookup`] for callers that already hold source ids.
    pub fn lookup_ids(&self, ids: &[TokenId]) -> Result<Vec<TranslationCandidate>, TableError> {
        self.lookup_ids_with_stats(ids, &mut QueryStats::new())
    }

    pub fn lookup_ids_with_stats(
        &self,
        ids: &[TokenId],
        stats: &mut QueryStats,
    ) -> Result<Vec<TranslationCandidate>, TableError> {
        let _span = debug_span!("lookup", source_len = ids.len()).entered();

        let started = Instant::now();
        let occurrences = self.source.count(ids);
        stats.time_count += started.elapsed();
        stats.occurrences += occurrences.count;
        if occurrences.count == 0 {
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let counts = self.aggregate(ids.len(), &occurrences.last_positions, stats);
        stats.time_extract += started.elapsed();
        let counts = counts?;
        stats.distinct_candidates += counts.len();

        let started = Instant::now();
        let candidates = self.score(counts, occurrences.count);
        stats.time_score += started.elapsed();
        let candidates = candidates?;
        debug!(
            occurrences = occurrences.count,
            candidates = candidates.len()
        );
        Ok(candidates)
    }

    /// Runs extraction for every in-sentence occurrence and counts identical
    /// target id sequences.
    fn aggregate(
        &self,
        source_len: usize,
        last_positions: &[usize],
        stats: &mut QueryStats,
    ) -> Result<BTreeMap<Vec<TokenId>, usize>, TableError> {
        let mut counts: BTreeMap<Vec<TokenId>, usize> = BTreeMap::new();
        for &last in last_positions {
            let Some(m) = self.source.corpus().locate(last, source_len) else {
                stats.boundary_crossings += 1;
                continue;
            };
            stats.sentences_visited += 1;

            let alignment = self
                .alignments
                .get(m.sentence)
                .ok_or(TableError::MissingAlignment(m.sentence))?;
            let target = self
                .target
                .corpus()
                .sentence(m.sentence)
                .ok_or(TableError::MissingAlignment(m.sentence))?;

            for pair in alignment.extract(self.config.max_phrase_length, m.start, m.end) {
                stats.pairs_extracted += 1;
                let span = target
                    .get(pair.start_target..=pair.end_target)
                    .ok_or_else(|| {
                        TableError::Inconsistent(format!(
                            "sentence {} alignment exceeds target length",
                            m.sentence
                        ))
                    })?;
                *counts.entry(span.to_vec()).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    /// Turns counts into candidates ordered by score (ties by id sequence),
    /// then applies `min_score` and `table_limit`.
    fn score(
        &self,
        counts: BTreeMap<Vec<TokenId>, usize>,
        denominator: usize,
    ) -> Result<Vec<TranslationCandidate>, TableError> {
        let mut candidates = Vec::with_capacity(counts.len());
        for (ids, count) in counts {
            let score = count as f64 / denominator as f64;
            if score < self.config.min_score {
                continue;
            }
            let phrase = self.target_phrase(&ids)?;
            candidates.push(TranslationCandidate {
                phrase,
                ids,
                count,
                score,
            });
        }
        // BTreeMap iteration already orders by ids; a stable sort keeps that
        // as the tie-breaker.
        candidates.sort_by(|a, b| b.count.cmp(&a.count));
        if self.config.table_limit > 0 {
            candidates.truncate(self.config.table_limit);
        }
        Ok(candidates)
    }

    fn target_phrase(&self, ids: &[TokenId]) -> Result<String, TableError> {
        let mut words = Vec::with_capacity(ids.len());
        for &id in ids {
            let word = self
                .target_vocab
                .word(id)
                .ok_or(TableError::UnknownTargetId(id))?;
            words.push(word);
        }
        Ok(words.join(" "))
    }
}

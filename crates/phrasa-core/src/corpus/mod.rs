//! Corpus storage and suffix-array indexing.
//!
//! `Corpus` holds one side's sentences as a single flat token sequence plus a
//! table of sentence start offsets. `IndexedCorpus` pairs it with a
//! `SuffixArray` that is kept in sync as sentences are appended.

mod suffix_array;

pub use suffix_array::{Occurrences, SuffixArray};

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::debug_span;

use crate::vocab::TokenId;

/// Flat token sequence of one corpus side with sentence boundaries.
///
/// `starts[i]` is the offset of sentence `i`; sentence `i` ends where
/// sentence `i + 1` starts (or at `tokens.len()` for the last one). Empty
/// sentences share their start with the next sentence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Corpus {
    tokens: Vec<TokenId>,
    starts: Vec<usize>,
}

/// Span of one sentence inside the flat corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentenceSpan {
    pub start: usize,
    pub len: usize,
}

/// A corpus occurrence mapped back to its sentence, with sentence-local
/// inclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentenceMatch {
    pub sentence: usize,
    pub start: usize,
    pub end: usize,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sentence and returns its index.
    pub fn push_sentence(&mut self, ids: impl IntoIterator<Item = TokenId>) -> usize {
        self.starts.push(self.tokens.len());
        self.tokens.extend(ids);
        self.starts.len() - 1
    }

    pub fn tokens(&self) -> &[TokenId] {
        &self.tokens
    }

    /// Total number of tokens across all sentences.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn sentence_count(&self) -> usize {
        self.starts.len()
    }

    pub fn sentence_span(&self, sentence: usize) -> Option<SentenceSpan> {
        let start = *self.starts.get(sentence)?;
        let end = self
            .starts
            .get(sentence + 1)
            .copied()
            .unwrap_or(self.tokens.len());
        Some(SentenceSpan {
            start,
            len: end - start,
        })
    }

    pub fn sentence(&self, sentence: usize) -> Option<&[TokenId]> {
        let span = self.sentence_span(sentence)?;
        Some(&self.tokens[span.start..span.start + span.len])
    }

    /// Length of a sentence in tokens (0 for unknown indices).
    pub fn sentence_len(&self, sentence: usize) -> usize {
        self.sentence_span(sentence).map_or(0, |s| s.len)
    }

    /// Index of the sentence that owns corpus position `pos`.
    pub fn sentence_of(&self, pos: usize) -> Option<usize> {
        if pos >= self.tokens.len() {
            return None;
        }
        // Last start <= pos. Empty sentences share a start with their
        // successor, so this lands on the sentence that actually holds `pos`.
        let upper = self.starts.partition_point(|&s| s <= pos);
        upper.checked_sub(1)
    }

    /// Maps the last-token position of a `len`-token occurrence to its
    /// sentence. Returns `None` when the occurrence starts before the owning
    /// sentence does, i.e. it straddles a sentence boundary.
    pub fn locate(&self, last_pos: usize, len: usize) -> Option<SentenceMatch> {
        if len == 0 {
            return None;
        }
        let sentence = self.sentence_of(last_pos)?;
        let sentence_start = self.starts[sentence];
        let left = (last_pos + 1).checked_sub(len)?;
        if left < sentence_start {
            return None;
        }
        Some(SentenceMatch {
            sentence,
            start: left - sentence_start,
            end: last_pos - sentence_start,
        })
    }

    /// Checks `starts` is monotonic and within bounds.
    pub(crate) fn is_well_formed(&self) -> bool {
        self.starts.windows(2).all(|w| w[0] <= w[1])
            && self.starts.last().map_or(true, |&s| s <= self.tokens.len())
            && self.starts.first().map_or(self.tokens.is_empty(), |&s| s == 0)
    }
}

/// A corpus side together with its suffix array.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexedCorpus {
    corpus: Corpus,
    suffixes: SuffixArray,
}

impl IndexedCorpus {
    /// Builds the suffix array for an already loaded corpus.
    pub fn build(corpus: Corpus) -> Self {
        let _span = debug_span!("build_suffix_array", tokens = corpus.len()).entered();
        let suffixes = SuffixArray::build(corpus.tokens());
        Self { corpus, suffixes }
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn suffixes(&self) -> &SuffixArray {
        &self.suffixes
    }

    /// Appends a sentence and extends the suffix array in place.
    pub fn push_sentence(&mut self, ids: impl IntoIterator<Item = TokenId>) -> usize {
        self.push_sentences(std::iter::once(ids)).start
    }

    /// Appends several sentences and extends the suffix array once for the
    /// whole batch. Returns the new sentence indices.
    pub fn push_sentences<I>(&mut self, sentences: I) -> Range<usize>
    where
        I: IntoIterator,
        I::Item: IntoIterator<Item = TokenId>,
    {
        let old_len = self.corpus.len();
        let first = self.corpus.sentence_count();
        for ids in sentences {
            self.corpus.push_sentence(ids);
        }
        self.suffixes.extend(self.corpus.tokens(), old_len);
        first..self.corpus.sentence_count()
    }

    /// Counts corpus occurrences of `pattern` (see [`SuffixArray::count`]).
    pub fn count(&self, pattern: &[TokenId]) -> Occurrences {
        self.suffixes.count(self.corpus.tokens(), pattern)
    }

    pub(crate) fn is_well_formed(&self) -> bool {
        self.corpus.is_well_formed() && self.suffixes.fits(self.corpus.len())
    }
}

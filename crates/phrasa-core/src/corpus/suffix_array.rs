use std::cmp::Ordering;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::vocab::TokenId;

/// Lexicographic order of every suffix of one token sequence.
///
/// The array stores suffix start positions only; every query takes the text
/// it was built from. Positions are plain offsets, so appending to the text
/// never invalidates them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuffixArray {
    order: Vec<usize>,
}

/// Result of counting a pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Occurrences {
    /// Number of occurrences anywhere in the corpus, including ones that
    /// straddle sentence boundaries.
    pub count: usize,
    /// Corpus position of the last token of each occurrence, in suffix order.
    pub last_positions: Vec<usize>,
}

/// Compares a suffix against `pattern` looking only at the first
/// `pattern.len()` tokens. A suffix shorter than the pattern that matches as
/// far as it goes sorts before it.
fn cmp_prefix(suffix: &[TokenId], pattern: &[TokenId]) -> Ordering {
    let n = suffix.len().min(pattern.len());
    suffix[..n]
        .cmp(&pattern[..n])
        .then(if suffix.len() < pattern.len() {
            Ordering::Less
        } else {
            Ordering::Equal
        })
}

impl SuffixArray {
    pub fn build(text: &[TokenId]) -> Self {
        let mut order: Vec<usize> = (0..text.len()).collect();
        order.sort_unstable_by(|&a, &b| text[a..].cmp(&text[b..]));
        Self { order }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Suffix start positions in sorted order.
    pub fn positions(&self) -> &[usize] {
        &self.order
    }

    /// Index range (into the sorted order) of suffixes starting with `pattern`.
    pub fn range(&self, text: &[TokenId], pattern: &[TokenId]) -> Range<usize> {
        let lo = self
            .order
            .partition_point(|&p| cmp_prefix(&text[p..], pattern) == Ordering::Less);
        let hi = lo
            + self.order[lo..]
                .partition_point(|&p| cmp_prefix(&text[p..], pattern) == Ordering::Equal);
        lo..hi
    }

    /// Counts occurrences of `pattern` as a contiguous substring of `text` and
    /// reports the position of each occurrence's last token. An empty pattern
    /// has no occurrences.
    pub fn count(&self, text: &[TokenId], pattern: &[TokenId]) -> Occurrences {
        if pattern.is_empty() {
            return Occurrences::default();
        }
        let range = self.range(text, pattern);
        let last_positions: Vec<usize> = self.order[range]
            .iter()
            .map(|&start| start + pattern.len() - 1)
            .collect();
        Occurrences {
            count: last_positions.len(),
            last_positions,
        }
    }

    /// Brings the order up to date after `text` grew from `old_len` tokens.
    ///
    /// Only two kinds of suffix can end up out of place: the new ones, and old
    /// ones whose whole text was a proper prefix of another suffix (their
    /// comparison used to stop at the end of the corpus). The latter are
    /// exactly the suffixes that are a prefix of their sorted successor. Both
    /// groups are sorted against the new text and merged back into the
    /// untouched remainder, whose relative order cannot change.
    pub fn extend(&mut self, text: &[TokenId], old_len: usize) {
        debug_assert_eq!(self.order.len(), old_len);
        if text.len() <= old_len {
            return;
        }
        let old_text = &text[..old_len];

        let mut kept = Vec::with_capacity(self.order.len());
        let mut moved: Vec<usize> = (old_len..text.len()).collect();
        for (i, &pos) in self.order.iter().enumerate() {
            let is_prefix_of_next = self
                .order
                .get(i + 1)
                .is_some_and(|&next| old_text[next..].starts_with(&old_text[pos..]));
            if is_prefix_of_next {
                moved.push(pos);
            } else {
                kept.push(pos);
            }
        }
        debug!(
            appended = text.len() - old_len,
            resorted = moved.len(),
            kept = kept.len()
        );

        moved.sort_unstable_by(|&a, &b| text[a..].cmp(&text[b..]));

        let mut merged = Vec::with_capacity(text.len());
        let (mut i, mut j) = (0, 0);
        while i < kept.len() && j < moved.len() {
            if text[kept[i]..] < text[moved[j]..] {
                merged.push(kept[i]);
                i += 1;
            } else {
                merged.push(moved[j]);
                j += 1;
            }
        }
        merged.extend_from_slice(&kept[i..]);
        merged.extend_from_slice(&moved[j..]);
        self.order = merged;
    }

    /// Cheap structural check used after deserialization.
    pub(crate) fn fits(&self, text_len: usize) -> bool {
        self.order.len() == text_len && self.order.iter().all(|&p| p < text_len)
    }
}

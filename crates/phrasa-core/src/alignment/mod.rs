//! Per-sentence word alignments and alignment-consistent phrase extraction.

mod extract;

pub use extract::PhrasePair;

use serde::{Deserialize, Serialize};

/// A single `S-T` alignment point (0-based source and target positions).
pub type AlignmentPoint = (usize, usize);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AlignmentError {
    #[error("malformed alignment token {0:?} (expected S-T)")]
    Malformed(String),

    #[error(
        "alignment point {source_pos}-{target_pos} out of bounds \
         (source length {source_len}, target length {target_len})"
    )]
    OutOfBounds {
        source_pos: usize,
        target_pos: usize,
        source_len: usize,
        target_len: usize,
    },
}

/// Alignment of one sentence pair, stored as two projections of the same
/// point set.
///
/// The record refers to its sentences by index only, so it stays valid while
/// the corpora grow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentenceAlignment {
    sentence: usize,
    /// source position → sorted target positions.
    aligned_src: Vec<Vec<usize>>,
    /// target position → number of source positions aligned to it.
    aligned_count_trg: Vec<u32>,
}

impl SentenceAlignment {
    /// An empty alignment for a sentence pair of the given lengths.
    pub fn new(sentence: usize, source_len: usize, target_len: usize) -> Self {
        Self {
            sentence,
            aligned_src: vec![Vec::new(); source_len],
            aligned_count_trg: vec![0; target_len],
        }
    }

    /// Adds one point. Returns `Ok(false)` if it was already present.
    pub fn add_point(
        &mut self,
        source_pos: usize,
        target_pos: usize,
    ) -> Result<bool, AlignmentError> {
        if source_pos >= self.source_len() || target_pos >= self.target_len() {
            return Err(AlignmentError::OutOfBounds {
                source_pos,
                target_pos,
                source_len: self.source_len(),
                target_len: self.target_len(),
            });
        }
        let targets = &mut self.aligned_src[source_pos];
        match targets.binary_search(&target_pos) {
            Ok(_) => Ok(false),
            Err(at) => {
                targets.insert(at, target_pos);
                self.aligned_count_trg[target_pos] += 1;
                Ok(true)
            }
        }
    }

    pub fn sentence(&self) -> usize {
        self.sentence
    }

    pub fn source_len(&self) -> usize {
        self.aligned_src.len()
    }

    pub fn target_len(&self) -> usize {
        self.aligned_count_trg.len()
    }

    /// Target positions aligned to `source_pos`, ascending.
    pub fn targets_of(&self, source_pos: usize) -> &[usize] {
        self.aligned_src
            .get(source_pos)
            .map_or(&[][..], |v| v.as_slice())
    }

    /// Number of source positions aligned to `target_pos`.
    pub fn target_degree(&self, target_pos: usize) -> u32 {
        self.aligned_count_trg
            .get(target_pos)
            .copied()
            .unwrap_or(0)
    }

    pub fn point_count(&self) -> usize {
        self.aligned_src.iter().map(Vec::len).sum()
    }

    /// Both projections describe the same point set.
    pub(crate) fn is_consistent(&self) -> bool {
        let mut degrees = vec![0u32; self.target_len()];
        for targets in &self.aligned_src {
            for &t in targets {
                match degrees.get_mut(t) {
                    Some(d) => *d += 1,
                    None => return false,
                }
            }
        }
        degrees == self.aligned_count_trg
    }
}

/// Parses one `S-T` token.
pub fn parse_point(token: &str) -> Result<AlignmentPoint, AlignmentError> {
    let malformed = || AlignmentError::Malformed(token.to_string());
    let (s, t) = token.split_once('-').ok_or_else(malformed)?;
    let s = s.parse().map_err(|_| malformed())?;
    let t = t.parse().map_err(|_| malformed())?;
    Ok((s, t))
}

/// Parses every whitespace-separated token of an alignment line, yielding a
/// result per token so callers can choose strict or lenient handling.
pub fn parse_alignment_line(
    line: &str,
) -> impl Iterator<Item = Result<AlignmentPoint, AlignmentError>> + '_ {
    line.split_whitespace().map(parse_point)
}

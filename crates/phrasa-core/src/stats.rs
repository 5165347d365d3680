//! Per-query counters and stage timings.
//!
//! A `QueryStats` is owned by the caller and passed into a lookup, so
//! concurrent queries never share instrumentation state.

use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryStats {
    /// Raw corpus occurrences of the source phrase (the score denominator).
    pub occurrences: usize,
    /// Occurrences dropped because they straddle a sentence boundary.
    pub boundary_crossings: usize,
    /// Occurrences handed to extraction.
    pub sentences_visited: usize,
    /// Phrase pairs produced by extraction, before aggregation.
    pub pairs_extracted: usize,
    /// Distinct target phrases after aggregation, before filtering.
    pub distinct_candidates: usize,
    pub time_count: Duration,
    pub time_extract: Duration,
    pub time_score: Duration,
}

impl QueryStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn time_total(&self) -> Duration {
        self.time_count + self.time_extract + self.time_score
    }

    /// Adds the counters and timings of `other` into `self`.
    pub fn merge(&mut self, other: &QueryStats) {
        self.occurrences += other.occurrences;
        self.boundary_crossings += other.boundary_crossings;
        self.sentences_visited += other.sentences_visited;
        self.pairs_extracted += other.pairs_extracted;
        self.distinct_candidates += other.distinct_candidates;
        self.time_count += other.time_count;
        self.time_extract += other.time_extract;
        self.time_score += other.time_score;
    }
}

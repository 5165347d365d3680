use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, debug_span, warn};

use super::{LoadPolicy, PhraseTable, TableConfig, TableError};
use crate::alignment::{parse_alignment_line, SentenceAlignment};
use crate::corpus::{Corpus, IndexedCorpus};
use crate::vocab::Vocabulary;

/// What a load or append skipped along the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Sentence pairs added.
    pub sentences: usize,
    /// Alignment points that referred past the end of their sentence.
    pub skipped_points: usize,
    /// Malformed alignment tokens skipped under [`LoadPolicy::Lenient`].
    pub malformed_points: usize,
}

impl LoadReport {
    pub fn merge(&mut self, other: &LoadReport) {
        self.sentences += other.sentences;
        self.skipped_points += other.skipped_points;
        self.malformed_points += other.malformed_points;
    }
}

impl PhraseTable {
    /// Loads a table from a source corpus, a target corpus and an alignment
    /// file, one sentence (pair) per line.
    pub fn load(
        source: &Path,
        target: &Path,
        alignment: &Path,
        config: TableConfig,
    ) -> Result<(Self, LoadReport), TableError> {
        Self::from_readers(
            BufReader::new(File::open(source)?),
            BufReader::new(File::open(target)?),
            BufReader::new(File::open(alignment)?),
            config,
        )
    }

    /// In-memory variant of [`PhraseTable::load`].
    pub fn from_text(
        source: &str,
        target: &str,
        alignment: &str,
        config: TableConfig,
    ) -> Result<(Self, LoadReport), TableError> {
        Self::from_readers(
            source.as_bytes(),
            target.as_bytes(),
            alignment.as_bytes(),
            config,
        )
    }

    pub fn from_readers(
        source: impl BufRead,
        target: impl BufRead,
        alignment: impl BufRead,
        config: TableConfig,
    ) -> Result<(Self, LoadReport), TableError> {
        let _span = debug_span!("load_table").entered();

        let mut source_vocab = Vocabulary::new();
        let mut target_vocab = Vocabulary::new();
        let source_corpus = read_corpus(source, &mut source_vocab)?;
        let target_corpus = read_corpus(target, &mut target_vocab)?;
        let alignment_lines = alignment.lines().collect::<Result<Vec<String>, _>>()?;

        let sentences = source_corpus.sentence_count();
        if target_corpus.sentence_count() != sentences || alignment_lines.len() != sentences {
            return Err(TableError::SentenceCountMismatch {
                source_sentences: sentences,
                target_sentences: target_corpus.sentence_count(),
                alignment_lines: alignment_lines.len(),
            });
        }

        let mut report = LoadReport::default();
        let mut alignments = Vec::with_capacity(sentences);
        for (i, line) in alignment_lines.iter().enumerate() {
            alignments.push(build_alignment(
                i,
                source_corpus.sentence_len(i),
                target_corpus.sentence_len(i),
                line,
                config.policy,
                &mut report,
            )?);
        }
        report.sentences = sentences;

        debug!(
            sentences,
            source_tokens = source_corpus.len(),
            target_tokens = target_corpus.len(),
            skipped_points = report.skipped_points
        );

        let table = Self {
            config,
            source_vocab,
            target_vocab,
            source: IndexedCorpus::build(source_corpus),
            target: IndexedCorpus::build(target_corpus),
            alignments,
        };
        Ok((table, report))
    }

    /// Appends one sentence pair, growing both vocabularies, corpora and
    /// suffix arrays.
    ///
    /// The alignment line is checked before anything is modified, so an error
    /// leaves the table unchanged.
    pub fn append_sentence_pair(
        &mut self,
        source_line: &str,
        target_line: &str,
        alignment_line: &str,
    ) -> Result<LoadReport, TableError> {
        self.append_sentence_pairs([(source_line, target_line, alignment_line)])
    }

    /// Appends a batch of `(source, target, alignment)` lines. Every alignment
    /// line is checked first; on error nothing is appended. Each suffix array
    /// is extended once for the whole batch.
    pub fn append_sentence_pairs<'a, I>(&mut self, pairs: I) -> Result<LoadReport, TableError>
    where
        I: IntoIterator<Item = (&'a str, &'a str, &'a str)>,
    {
        let first = self.sentence_count();
        let pairs: Vec<_> = pairs.into_iter().collect();
        let _span = debug_span!("extend", first, sentences = pairs.len()).entered();

        let mut report = LoadReport::default();
        let mut alignments = Vec::with_capacity(pairs.len());
        for (i, &(source_line, target_line, alignment_line)) in pairs.iter().enumerate() {
            alignments.push(build_alignment(
                first + i,
                source_line.split_whitespace().count(),
                target_line.split_whitespace().count(),
                alignment_line,
                self.config.policy,
                &mut report,
            )?);
        }

        let mut source_ids = Vec::with_capacity(pairs.len());
        let mut target_ids = Vec::with_capacity(pairs.len());
        for &(source_line, target_line, _) in &pairs {
            source_ids.push(self.source_vocab.encode_line(source_line)?);
            target_ids.push(self.target_vocab.encode_line(target_line)?);
        }
        self.source.push_sentences(source_ids);
        self.target.push_sentences(target_ids);
        self.alignments.extend(alignments);

        report.sentences = pairs.len();
        Ok(report)
    }
}

fn read_corpus(reader: impl BufRead, vocab: &mut Vocabulary) -> Result<Corpus, TableError> {
    let mut corpus = Corpus::new();
    for line in reader.lines() {
        let line = line?;
        corpus.push_sentence(vocab.encode_line(&line)?);
    }
    Ok(corpus)
}

/// Builds the alignment record of one sentence pair. Out-of-range points are
/// always skipped with a warning; malformed tokens follow `policy`.
fn build_alignment(
    sentence: usize,
    source_len: usize,
    target_len: usize,
    line: &str,
    policy: LoadPolicy,
    report: &mut LoadReport,
) -> Result<SentenceAlignment, TableError> {
    let line_no = sentence + 1;
    let mut alignment = SentenceAlignment::new(sentence, source_len, target_len);
    for point in parse_alignment_line(line) {
        let (s, t) = match point {
            Ok(p) => p,
            Err(error) if policy == LoadPolicy::Lenient => {
                warn!(line = line_no, %error, "skipping malformed alignment token");
                report.malformed_points += 1;
                continue;
            }
            Err(error) => {
                return Err(TableError::Alignment {
                    line: line_no,
                    error,
                })
            }
        };
        if let Err(error) = alignment.add_point(s, t) {
            warn!(line = line_no, %error, "skipping alignment point");
            report.skipped_points += 1;
        }
    }
    Ok(alignment)
}

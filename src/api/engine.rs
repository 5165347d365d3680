use std::path::Path;
use std::sync::{Arc, RwLock};

use phrasa_core::{
    LoadReport, PhraseTable, QueryStats, Side, TableConfig, TableStats, TranslationCandidate,
};
use tracing::debug;

use super::types::poisoned;
use super::EngineError;

/// A phrase table shared between threads. Lookups take the read lock, so
/// they run concurrently; appends take the write lock.
pub struct PhraseEngine {
    table: RwLock<PhraseTable>,
}

impl PhraseEngine {
    pub fn new(config: TableConfig) -> Arc<Self> {
        Self::from_table(PhraseTable::new(config))
    }

    pub fn from_table(table: PhraseTable) -> Arc<Self> {
        Arc::new(Self {
            table: RwLock::new(table),
        })
    }

    pub fn load(
        source: &Path,
        target: &Path,
        alignment: &Path,
        config: TableConfig,
    ) -> Result<(Arc<Self>, LoadReport), EngineError> {
        let (table, report) = PhraseTable::load(source, target, alignment, config)?;
        debug!(
            sentences = report.sentences,
            skipped_points = report.skipped_points,
            malformed_points = report.malformed_points,
            "engine loaded"
        );
        Ok((Self::from_table(table), report))
    }

    pub fn open(path: &Path, config: TableConfig) -> Result<Arc<Self>, EngineError> {
        Ok(Self::from_table(PhraseTable::open(path, config)?))
    }

    pub fn lookup(&self, phrase: &str) -> Result<Vec<TranslationCandidate>, EngineError> {
        let table = self.table.read().map_err(poisoned)?;
        Ok(table.lookup(phrase)?)
    }

    pub fn lookup_with_stats(
        &self,
        phrase: &str,
        stats: &mut QueryStats,
    ) -> Result<Vec<TranslationCandidate>, EngineError> {
        let table = self.table.read().map_err(poisoned)?;
        Ok(table.lookup_with_stats(phrase, stats)?)
    }

    pub fn count_phrase(&self, side: Side, phrase: &str) -> Result<usize, EngineError> {
        let table = self.table.read().map_err(poisoned)?;
        Ok(table.count_phrase(side, phrase))
    }

    pub fn append_sentence_pair(
        &self,
        source_line: &str,
        target_line: &str,
        alignment_line: &str,
    ) -> Result<LoadReport, EngineError> {
        let mut table = self.table.write().map_err(poisoned)?;
        Ok(table.append_sentence_pair(source_line, target_line, alignment_line)?)
    }

    /// Appends a batch under one write lock; see
    /// [`PhraseTable::append_sentence_pairs`].
    pub fn append_sentence_pairs<'a, I>(&self, pairs: I) -> Result<LoadReport, EngineError>
    where
        I: IntoIterator<Item = (&'a str, &'a str, &'a str)>,
    {
        let mut table = self.table.write().map_err(poisoned)?;
        Ok(table.append_sentence_pairs(pairs)?)
    }

    pub fn stats(&self) -> Result<TableStats, EngineError> {
        let table = self.table.read().map_err(poisoned)?;
        Ok(table.stats())
    }

    /// Saves a snapshot. Appends wait until the write has finished.
    pub fn save(&self, path: &Path) -> Result<(), EngineError> {
        let table = self.table.read().map_err(poisoned)?;
        Ok(table.save(path)?)
    }
}

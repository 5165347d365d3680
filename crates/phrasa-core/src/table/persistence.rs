use std::fs::{self, File};
use std::path::Path;

use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use tracing::debug_span;

use super::{PhraseTable, TableConfig, TableError};
use crate::alignment::SentenceAlignment;
use crate::corpus::IndexedCorpus;
use crate::vocab::{TokenId, Vocabulary};

const MAGIC: &[u8; 4] = b"PHSA";
const VERSION: u8 = 1;
const HEADER_SIZE: usize = 4 + 1 + 3 + 8 + 4; // magic + version + reserved + body_len + crc32 = 20

#[derive(Serialize)]
struct TableDataRef<'a> {
    source_vocab: &'a Vocabulary,
    target_vocab: &'a Vocabulary,
    source: &'a IndexedCorpus,
    target: &'a IndexedCorpus,
    alignments: &'a [SentenceAlignment],
}

#[derive(Deserialize)]
struct TableData {
    source_vocab: Vocabulary,
    target_vocab: Vocabulary,
    source: IndexedCorpus,
    target: IndexedCorpus,
    alignments: Vec<SentenceAlignment>,
}

impl PhraseTable {
    /// Serializes vocabularies, corpora, suffix arrays and alignments. The
    /// runtime [`TableConfig`] is not stored.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TableError> {
        let data = TableDataRef {
            source_vocab: &self.source_vocab,
            target_vocab: &self.target_vocab,
            source: &self.source,
            target: &self.target,
            alignments: &self.alignments,
        };
        let body = bincode::serialize(&data).map_err(TableError::Serialize)?;

        let mut buf = Vec::with_capacity(HEADER_SIZE + body.len());
        buf.extend_from_slice(MAGIC);
        buf.push(VERSION);
        buf.extend_from_slice(&[0; 3]);
        buf.extend_from_slice(&(body.len() as u64).to_le_bytes());
        buf.extend_from_slice(&crc32fast::hash(&body).to_le_bytes());
        buf.extend_from_slice(&body);
        Ok(buf)
    }

    pub fn from_bytes(data: &[u8], config: TableConfig) -> Result<Self, TableError> {
        if data.len() < 5 {
            return Err(TableError::InvalidHeader);
        }
        if &data[..4] != MAGIC {
            return Err(TableError::InvalidMagic);
        }
        if data[4] != VERSION {
            return Err(TableError::UnsupportedVersion(data[4]));
        }
        if data.len() < HEADER_SIZE {
            return Err(TableError::InvalidHeader);
        }

        let mut len_bytes = [0u8; 8];
        len_bytes.copy_from_slice(&data[8..16]);
        let mut crc_bytes = [0u8; 4];
        crc_bytes.copy_from_slice(&data[16..20]);
        let body_len = usize::try_from(u64::from_le_bytes(len_bytes))
            .map_err(|_| TableError::InvalidHeader)?;
        let body = data
            .get(HEADER_SIZE..)
            .filter(|b| b.len() == body_len)
            .ok_or(TableError::InvalidHeader)?;
        if crc32fast::hash(body) != u32::from_le_bytes(crc_bytes) {
            return Err(TableError::ChecksumMismatch);
        }

        let data: TableData = bincode::deserialize(body).map_err(TableError::Deserialize)?;
        let table = Self {
            config,
            source_vocab: data.source_vocab,
            target_vocab: data.target_vocab,
            source: data.source,
            target: data.target,
            alignments: data.alignments,
        };
        table.validate()?;
        Ok(table)
    }

    /// Opens a saved table through a read-only mapping.
    pub fn open(path: &Path, config: TableConfig) -> Result<Self, TableError> {
        let _span = debug_span!("open_table").entered();
        let file = File::open(path)?;
        // SAFETY: The file is opened read-only and the mapping is immutable.
        // The Mmap is dropped once deserialization has copied everything out.
        let mmap = unsafe { Mmap::map(&file)? };
        Self::from_bytes(&mmap, config)
    }

    /// Atomic write: write to .tmp then rename.
    pub fn save(&self, path: &Path) -> Result<(), TableError> {
        let bytes = self.to_bytes()?;
        let tmp = path.with_extension("tmp");
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Cross-checks corpora, suffix arrays, alignments and vocabularies of a
    /// deserialized table.
    fn validate(&self) -> Result<(), TableError> {
        let inconsistent = |msg: String| Err(TableError::Inconsistent(msg));

        if !self.source.is_well_formed() {
            return inconsistent("source corpus or suffix array malformed".to_string());
        }
        if !self.target.is_well_formed() {
            return inconsistent("target corpus or suffix array malformed".to_string());
        }

        let sentences = self.alignments.len();
        let source = self.source.corpus();
        let target = self.target.corpus();
        if source.sentence_count() != sentences || target.sentence_count() != sentences {
            return inconsistent(format!(
                "sentence counts differ: source={}, target={}, alignments={sentences}",
                source.sentence_count(),
                target.sentence_count(),
            ));
        }

        for (i, alignment) in self.alignments.iter().enumerate() {
            if alignment.sentence() != i
                || alignment.source_len() != source.sentence_len(i)
                || alignment.target_len() != target.sentence_len(i)
                || !alignment.is_consistent()
            {
                return inconsistent(format!("alignment of sentence {i} does not match"));
            }
        }

        let fits = |tokens: &[TokenId], vocab: &Vocabulary| {
            tokens.iter().all(|&id| (id as usize) < vocab.len())
        };
        if !fits(source.tokens(), &self.source_vocab) {
            return inconsistent("source token outside vocabulary".to_string());
        }
        if !fits(target.tokens(), &self.target_vocab) {
            return inconsistent("target token outside vocabulary".to_string());
        }
        Ok(())
    }
}

pub mod alignment;
pub mod corpus;
pub mod settings;
pub mod stats;
pub mod table;
pub mod vocab;

pub use stats::QueryStats;
pub use table::{
    LoadPolicy, LoadReport, PhraseTable, Side, TableConfig, TableError, TableStats,
    TranslationCandidate,
};

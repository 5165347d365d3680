pub mod api;
pub mod trace_init;

pub use api::{EngineError, PhraseEngine};
pub use phrasa_core::{
    LoadPolicy, LoadReport, PhraseTable, QueryStats, Side, TableConfig, TableError, TableStats,
    TranslationCandidate,
};

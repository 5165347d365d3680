//! Shared engine layer: one phrase table behind a reader/writer lock, with a
//! flat error type for embedders.

mod engine;
#[cfg(test)]
mod tests;
mod types;

pub use engine::PhraseEngine;
pub use types::EngineError;

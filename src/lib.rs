#![warn(missing_docs)]
//! Gesture-to-phrase resolution: fingerspelled streams become classified
//! statements, free-form sentences become animation keyframe sequences.

pub mod assembler;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod embedder;
pub mod error;
pub mod fuzzy;
pub mod segmenter;
pub mod semantic;
pub mod translation;

#[cfg(test)]
mod test_support;

pub use assembler::{match_and_assemble, AssembledResult, AssetSequence, AssetStore};
pub use catalog::{
    Catalog, CatalogDefinition, CatalogEntry, Catalogs, OccupationCatalog, PhraseCatalog,
};
pub use classifier::{classify, Category, ClassifiedStatement, FUZZY_THRESHOLD, SEMANTIC_THRESHOLD};
pub use config::Cli;
pub use embedder::{Embedder, OpenAiEmbedder};
pub use error::PipelineError;
pub use fuzzy::{match_fuzzy, FuzzyMatch};
pub use segmenter::{segment, DEFAULT_TERMINATOR};
pub use semantic::{cosine_similarity, match_semantic, SemanticMatch};
pub use translation::{Completion, CompletionProvider, TranslationError, Translator};

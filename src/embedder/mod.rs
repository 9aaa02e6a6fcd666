//! Embedding backends used to vectorize catalog keys and incoming text.

use anyhow::{anyhow, Result};

pub mod openai;

pub use openai::OpenAiEmbedder;

/// Text embedding backend.
///
/// Implementations must be deterministic for a fixed model: the catalogs are
/// embedded once at startup and compared against per-request embeddings
/// produced by the same backend.
pub trait Embedder: Send + Sync {
    /// Embeds a batch of inputs, returning one vector per input in order.
    fn embed_batch(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Maximum number of inputs accepted by a single `embed_batch` call.
    fn batch_size(&self) -> usize {
        32
    }

    /// Embeds a single string.
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .pop()
            .ok_or_else(|| anyhow!("embedding backend returned no vector"))
    }
}

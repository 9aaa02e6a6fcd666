//! Deterministic embedder used by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{anyhow, Result};

use crate::embedder::Embedder;

/// Looks embeddings up in a fixed table; unknown text is a backend error.
pub struct TableEmbedder {
    dimension: usize,
    vectors: HashMap<String, Vec<f32>>,
    batch_size: usize,
    calls: AtomicUsize,
}

impl TableEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: HashMap::new(),
            batch_size: 32,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with<const N: usize>(mut self, text: &str, vector: [f32; N]) -> Self {
        assert_eq!(N, self.dimension, "vector for {text:?} has the wrong dimension");
        self.vectors.insert(text.to_string(), vector.to_vec());
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Embedder for TableEmbedder {
    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn embed_batch(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        inputs
            .iter()
            .map(|text| {
                self.vectors
                    .get(*text)
                    .cloned()
                    .ok_or_else(|| anyhow!("no test vector for {text:?}"))
            })
            .collect()
    }
}

/// Unit vector at `cos` from the first axis, orthogonal to every other axis
/// except the last one.
pub fn at_cosine<const N: usize>(cos: f32) -> [f32; N] {
    let mut out = [0.0; N];
    out[0] = cos;
    out[N - 1] = (1.0 - cos * cos).sqrt();
    out
}

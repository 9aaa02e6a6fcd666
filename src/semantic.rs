//! Embedding-based nearest-key matching against a catalog.

use crate::catalog::Catalog;
use crate::embedder::Embedder;
use crate::error::{PipelineError, Result};

/// Best catalog entry for a piece of text.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticMatch<'a, P> {
    /// Matched catalog key.
    pub key: &'a str,
    /// Cosine similarity between the text and the key, in `[-1, 1]`.
    pub score: f32,
    /// Payload stored under the key.
    pub payload: &'a P,
}

/// Cosine similarity; vectors of different lengths, zero-length or
/// zero-norm vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        (dot / (na * nb)).clamp(-1.0, 1.0)
    }
}

/// Index and score of the most similar candidate; the first maximum wins.
pub fn best_index<'v, I>(query: &[f32], candidates: I) -> Option<(usize, f32)>
where
    I: IntoIterator<Item = &'v [f32]>,
{
    let mut best: Option<(usize, f32)> = None;
    for (idx, candidate) in candidates.into_iter().enumerate() {
        let score = cosine_similarity(query, candidate);
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((idx, score)),
        }
    }
    best
}

/// Embeds `text` and returns the closest catalog entry.
pub fn match_semantic<'a, P, E>(
    text: &str,
    catalog: &'a Catalog<P>,
    embedder: &E,
) -> Result<SemanticMatch<'a, P>>
where
    E: Embedder + ?Sized,
{
    let query = embedder.embed(text).map_err(PipelineError::Embedding)?;
    let entries = catalog.entries();
    let (idx, score) = best_index(&query, entries.iter().map(|entry| entry.embedding()))
        .ok_or_else(|| PipelineError::Catalog("cannot match against an empty catalog".into()))?;
    let entry = &entries[idx];
    Ok(SemanticMatch {
        key: entry.key(),
        score,
        payload: entry.payload(),
    })
}

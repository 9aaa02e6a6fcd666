//! Classifies a fingerspelled gesture stream as a height, an occupation or a
//! name, and renders the canonical English statement for it.

use serde::Serialize;
use tracing::debug;

use crate::catalog::OccupationCatalog;
use crate::embedder::Embedder;
use crate::error::Result;
use crate::fuzzy::match_fuzzy;
use crate::segmenter::segment;
use crate::semantic::match_semantic;

/// Minimum cosine similarity for a semantic occupation match.
pub const SEMANTIC_THRESHOLD: f32 = 0.70;

/// Minimum fuzzy ratio (0-100) for a lexical occupation match.
pub const FUZZY_THRESHOLD: f32 = 85.0;

/// Statement category, assigned in fixed precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    /// The token is all digits; read as a height in centimetres.
    Height,
    /// The token matched the occupation catalog.
    Occupation,
    /// Fallback: the token is taken as a personal name.
    Name,
}

/// Outcome of classifying one gesture stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedStatement {
    /// Assigned category.
    pub category: Category,
    /// Normalized token (or occupation label).
    pub normalized_value: String,
    /// Canonical English statement.
    pub statement: String,
    /// 1.0 for heights, the semantic score for occupations, 0 for names.
    pub confidence: f32,
    /// Chosen occupation label, when the category is `Occupation`.
    pub matched_occupation: Option<String>,
}

impl ClassifiedStatement {
    fn height(value: String) -> Self {
        Self {
            category: Category::Height,
            statement: format!("My height is {value} cm"),
            normalized_value: value,
            confidence: 1.0,
            matched_occupation: None,
        }
    }

    fn occupation(label: &str, semantic_score: f32) -> Self {
        Self {
            category: Category::Occupation,
            normalized_value: label.to_string(),
            statement: format!("My occupation is {label}"),
            confidence: semantic_score,
            matched_occupation: Some(label.to_string()),
        }
    }

    fn name(token: String) -> Self {
        Self {
            category: Category::Name,
            statement: format!("My Name is {token}"),
            normalized_value: token,
            confidence: 0.0,
            matched_occupation: None,
        }
    }
}

/// Upper-cases the first letter of every word and lower-cases the rest.
/// A word starts at any letter not preceded by another letter.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}

/// Segments and normalizes a raw gesture stream into the token that gets
/// classified.
pub fn normalize_token(stream: &str, terminator: &str) -> String {
    title_case(segment(stream, terminator).trim())
}

fn is_numeric(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|ch| ch.is_ascii_digit())
}

/// Classifies a raw gesture stream.
///
/// Only the embedding backend can fail. An empty token (a stream without a
/// completed letter) is returned as an empty `Name` without touching any
/// backend.
pub fn classify<E>(
    stream: &str,
    terminator: &str,
    occupations: &OccupationCatalog,
    embedder: &E,
) -> Result<ClassifiedStatement>
where
    E: Embedder + ?Sized,
{
    classify_token(normalize_token(stream, terminator), occupations, embedder)
}

/// Classifies an already normalized token.
pub fn classify_token<E>(
    token: String,
    occupations: &OccupationCatalog,
    embedder: &E,
) -> Result<ClassifiedStatement>
where
    E: Embedder + ?Sized,
{
    if token.is_empty() {
        return Ok(ClassifiedStatement::name(token));
    }
    if is_numeric(&token) {
        debug!(%token, "numeric token classified as height");
        return Ok(ClassifiedStatement::height(token));
    }

    let semantic = match_semantic(&token, occupations, embedder)?;
    let fuzzy = match_fuzzy(&token, occupations.keys());
    let fuzzy_score = fuzzy.map(|found| found.score).unwrap_or(0.0);
    debug!(
        %token,
        semantic_label = semantic.key,
        semantic_score = semantic.score,
        fuzzy_label = fuzzy.map(|found| found.label),
        fuzzy_score,
        "occupation evidence"
    );

    if semantic.score >= SEMANTIC_THRESHOLD {
        return Ok(ClassifiedStatement::occupation(semantic.key, semantic.score));
    }
    if let Some(found) = fuzzy.filter(|found| found.score >= FUZZY_THRESHOLD) {
        return Ok(ClassifiedStatement::occupation(found.label, semantic.score));
    }
    Ok(ClassifiedStatement::name(token))
}

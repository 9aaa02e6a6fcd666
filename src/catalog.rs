//! Immutable lookup catalogs paired with precomputed key embeddings.
//!
//! Catalogs are built once at startup and shared read-only between requests.
//! Building embeds every key through the configured [`Embedder`]; if that
//! backend is unavailable the build fails and the service must not start.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::assembler::plain_file_name;
use crate::embedder::Embedder;
use crate::error::{PipelineError, Result};

/// Catalog definition compiled into the crate.
const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

/// One catalog key with its embedding and payload.
#[derive(Debug, Clone)]
pub struct CatalogEntry<P> {
    key: String,
    embedding: Vec<f32>,
    payload: P,
}

impl<P> CatalogEntry<P> {
    /// Canonical key text.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Embedding computed for the key at build time.
    pub fn embedding(&self) -> &[f32] {
        &self.embedding
    }

    /// Payload stored under the key.
    pub fn payload(&self) -> &P {
        &self.payload
    }
}

/// Ordered, non-empty, immutable catalog with unique keys.
#[derive(Debug, Clone)]
pub struct Catalog<P> {
    entries: Vec<CatalogEntry<P>>,
}

/// Phrase -> asset filenames (always at least one).
pub type PhraseCatalog = Catalog<Vec<String>>;

/// Occupation label -> itself.
pub type OccupationCatalog = Catalog<String>;

impl<P> Catalog<P> {
    /// Embeds every key and freezes the catalog in the given order.
    pub fn build<E>(entries: Vec<(String, P)>, embedder: &E) -> Result<Self>
    where
        E: Embedder + ?Sized,
    {
        if entries.is_empty() {
            return Err(PipelineError::Catalog(
                "catalog must contain at least one entry".to_string(),
            ));
        }
        let mut seen = HashSet::with_capacity(entries.len());
        for (key, _) in &entries {
            if key.trim().is_empty() {
                return Err(PipelineError::Catalog("catalog keys must not be blank".to_string()));
            }
            if !seen.insert(key.as_str()) {
                return Err(PipelineError::Catalog(format!("duplicate catalog key '{key}'")));
            }
        }

        let batch_size = embedder.batch_size().max(1);
        let mut embeddings = Vec::with_capacity(entries.len());
        for chunk in entries.chunks(batch_size) {
            let keys: Vec<&str> = chunk.iter().map(|(key, _)| key.as_str()).collect();
            let vectors = embedder
                .embed_batch(&keys)
                .map_err(PipelineError::Embedding)?;
            if vectors.len() != keys.len() {
                return Err(PipelineError::Embedding(anyhow::anyhow!(
                    "embedding backend returned {} vectors for {} keys",
                    vectors.len(),
                    keys.len()
                )));
            }
            debug!(batch = keys.len(), "embedded catalog batch");
            embeddings.extend(vectors);
        }

        let dimension = embeddings.first().map(Vec::len).unwrap_or_default();
        if dimension == 0 || embeddings.iter().any(|vector| vector.len() != dimension) {
            return Err(PipelineError::Embedding(anyhow::anyhow!(
                "embedding backend returned inconsistent vector dimensions"
            )));
        }

        let entries = entries
            .into_iter()
            .zip(embeddings)
            .map(|((key, payload), embedding)| CatalogEntry {
                key,
                embedding,
                payload,
            })
            .collect();
        Ok(Self { entries })
    }

    /// Keys in build order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    /// Cached embedding for `key`.
    pub fn embedding_of(&self, key: &str) -> Option<&[f32]> {
        self.entry(key).map(CatalogEntry::embedding)
    }

    /// Payload stored under `key`.
    pub fn payload_of(&self, key: &str) -> Option<&P> {
        self.entry(key).map(CatalogEntry::payload)
    }

    /// All entries in build order.
    pub fn entries(&self) -> &[CatalogEntry<P>] {
        &self.entries
    }

    /// Number of entries (never zero).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`; catalogs are non-empty by construction.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, key: &str) -> Option<&CatalogEntry<P>> {
        self.entries.iter().find(|entry| entry.key == key)
    }
}

/// Asset list as written in a catalog definition: one filename or several.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum AssetList {
    One(String),
    Many(Vec<String>),
}

impl AssetList {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(file) => vec![file],
            Self::Many(files) => files,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct PhraseDefinition {
    phrase: String,
    assets: AssetList,
}

/// Serialized catalog contents before embedding.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogDefinition {
    phrases: Vec<PhraseDefinition>,
    occupations: Vec<String>,
}

impl CatalogDefinition {
    /// Definition shipped with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Loads a definition from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|err| {
            PipelineError::Catalog(format!("failed to read '{}': {err}", path.display()))
        })?;
        Self::from_json(&raw)
    }

    /// Parses a definition from JSON text.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|err| PipelineError::Catalog(format!("invalid catalog definition: {err}")))
    }

    fn phrase_entries(&self) -> Result<Vec<(String, Vec<String>)>> {
        let mut out = Vec::with_capacity(self.phrases.len());
        for def in &self.phrases {
            let assets = def.assets.clone().into_vec();
            if assets.is_empty() || assets.iter().any(|file| file.trim().is_empty()) {
                return Err(PipelineError::Catalog(format!(
                    "phrase '{}' needs at least one non-blank asset filename",
                    def.phrase
                )));
            }
            if let Some(file) = assets.iter().find(|file| plain_file_name(file).is_none()) {
                return Err(PipelineError::Catalog(format!(
                    "phrase '{}' lists '{file}', which is not a plain filename",
                    def.phrase
                )));
            }
            out.push((def.phrase.clone(), assets));
        }
        Ok(out)
    }

    fn occupation_entries(&self) -> Vec<(String, String)> {
        self.occupations
            .iter()
            .map(|label| (label.clone(), label.clone()))
            .collect()
    }
}

/// The two process-wide catalogs.
#[derive(Debug, Clone)]
pub struct Catalogs {
    /// Phrase catalog used by the animation assembler.
    pub phrases: PhraseCatalog,
    /// Occupation catalog used by the intent classifier.
    pub occupations: OccupationCatalog,
}

impl Catalogs {
    /// Embeds both catalogs from a definition.
    pub fn build<E>(definition: &CatalogDefinition, embedder: &E) -> Result<Self>
    where
        E: Embedder + ?Sized,
    {
        let phrases = Catalog::build(definition.phrase_entries()?, embedder)?;
        let occupations = Catalog::build(definition.occupation_entries(), embedder)?;
        info!(
            phrases = phrases.len(),
            occupations = occupations.len(),
            "catalogs embedded"
        );
        Ok(Self {
            phrases,
            occupations,
        })
    }
}

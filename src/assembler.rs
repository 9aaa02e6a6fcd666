//! Resolves a sentence to a catalog phrase and loads the keyframe tables for
//! each of the phrase's word-units.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use keyframe_table::{read_rows, Row, TableOptions};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use tracing::{debug, warn};

use crate::catalog::PhraseCatalog;
use crate::classifier::SEMANTIC_THRESHOLD;
use crate::embedder::Embedder;
use crate::error::{PipelineError, Result};
use crate::semantic::match_semantic;

/// Message attached to below-threshold results.
pub const NO_MATCH_MESSAGE: &str = "No matching phrase found";

/// Directory of keyframe tables, one file per word-unit.
#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
}

impl AssetStore {
    /// Store rooted at `root`. The directory is not required to exist; every
    /// lookup then reports a missing file.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Asset directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Loads one asset. `Ok(None)` means the file is not on disk.
    pub fn load(&self, file: &str) -> Result<Option<Vec<Row>>> {
        let path = self.resolve(file)?;
        read_rows(&path, TableOptions::for_path(&path)).map_err(|source| PipelineError::Asset {
            file: file.to_string(),
            source,
        })
    }

    fn resolve(&self, file: &str) -> Result<PathBuf> {
        plain_file_name(file)
            .map(|name| self.root.join(name))
            .ok_or_else(|| PipelineError::InvalidAssetName(file.to_string()))
    }
}

/// The single path component of `file`, or `None` if it names anything but a
/// plain file inside the store.
pub(crate) fn plain_file_name(file: &str) -> Option<&OsStr> {
    let mut components = Path::new(file).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) => Some(name),
        _ => None,
    }
}

/// Per-filename keyframe rows in catalog order; `None` marks a missing file.
///
/// Serializes as a JSON object keyed by filename. A filename listed twice is
/// resolved twice but emitted once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetSequence {
    frames: Vec<(String, Option<Vec<Row>>)>,
}

impl AssetSequence {
    /// Rows for `file`: outer `None` if the file is not part of the
    /// sequence, inner `None` if it was missing on disk.
    pub fn get(&self, file: &str) -> Option<Option<&[Row]>> {
        self.frames
            .iter()
            .find(|(name, _)| name == file)
            .map(|(_, rows)| rows.as_deref())
    }

    /// Filenames and rows in catalog order, duplicates included.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&[Row]>)> + '_ {
        self.frames
            .iter()
            .map(|(name, rows)| (name.as_str(), rows.as_deref()))
    }

    /// Number of resolved filenames, duplicates included.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True when no filename was resolved.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Filenames that were not found on disk.
    pub fn missing(&self) -> impl Iterator<Item = &str> + '_ {
        self.iter()
            .filter(|(_, rows)| rows.is_none())
            .map(|(name, _)| name)
    }
}

impl Serialize for AssetSequence {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut emitted: Vec<&str> = Vec::with_capacity(self.frames.len());
        for (name, _) in &self.frames {
            if !emitted.contains(&name.as_str()) {
                emitted.push(name);
            }
        }
        let mut map = serializer.serialize_map(Some(emitted.len()))?;
        for name in emitted {
            let rows = self.get(name).flatten();
            map.serialize_entry(name, &rows)?;
        }
        map.end()
    }
}

/// Outcome of matching a sentence against the phrase catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssembledResult {
    /// Matched phrase, absent below the confidence threshold.
    pub phrase: Option<String>,
    /// Best cosine similarity found.
    pub score: f32,
    /// Keyframe rows per asset filename, absent below the threshold.
    pub sequence: Option<AssetSequence>,
    /// Explanation for a below-threshold result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl AssembledResult {
    fn no_match(score: f32) -> Self {
        Self {
            phrase: None,
            score,
            sequence: None,
            message: Some(NO_MATCH_MESSAGE),
        }
    }

    /// True when a phrase cleared the threshold.
    pub fn is_match(&self) -> bool {
        self.phrase.is_some()
    }
}

/// Matches `sentence` to a phrase and loads every asset the phrase lists.
///
/// Blank input is rejected before any backend call. A best score below the
/// threshold is a normal "no match" outcome; a missing asset file only nulls
/// out its own entry.
pub fn match_and_assemble<E>(
    sentence: &str,
    phrases: &PhraseCatalog,
    embedder: &E,
    store: &AssetStore,
) -> Result<AssembledResult>
where
    E: Embedder + ?Sized,
{
    if sentence.trim().is_empty() {
        return Err(PipelineError::MissingInput("sentence"));
    }
    let found = match_semantic(sentence, phrases, embedder)?;
    debug!(phrase = found.key, score = found.score, "phrase match");
    if found.score < SEMANTIC_THRESHOLD {
        return Ok(AssembledResult::no_match(found.score));
    }

    let mut frames = Vec::with_capacity(found.payload.len());
    for file in found.payload {
        let rows = store.load(file)?;
        if rows.is_none() {
            warn!(file = %file, root = %store.root().display(), "asset file missing");
        }
        frames.push((file.clone(), rows));
    }
    Ok(AssembledResult {
        phrase: Some(found.key.to_string()),
        score: found.score,
        sequence: Some(AssetSequence { frames }),
        message: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::test_support::{at_cosine, TableEmbedder};
    use pretty_assertions::assert_eq;
    use std::fs;

    fn phrases(embedder: &TableEmbedder) -> PhraseCatalog {
        let entries = vec![
            (
                "apa nama".to_string(),
                vec!["Apa.csv".to_string(), "Nama.csv".to_string()],
            ),
            (
                "sama sama".to_string(),
                vec!["Sama.csv".to_string(), "Sama.csv".to_string()],
            ),
        ];
        Catalog::build(entries, embedder).expect("build")
    }

    fn embedder() -> TableEmbedder {
        TableEmbedder::new(4)
            .with("apa nama", [1.0, 0.0, 0.0, 0.0])
            .with("sama sama", [0.0, 1.0, 0.0, 0.0])
            .with("nama awak apa", at_cosine::<4>(0.95))
            .with("cuaca hari ini", at_cosine::<4>(0.40))
            .with("sama-sama", [0.0, 1.0, 0.0, 0.0])
            .with("nama apa", [7.0, 1.0, 1.0, 7.0])
    }

    #[test]
    fn partial_assets_are_surfaced_per_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("Apa.csv"), "frame,x\n0,0.1\n1,0.2\n").expect("write");
        let store = AssetStore::new(dir.path());
        let embedder = embedder();
        let catalog = phrases(&embedder);

        let result =
            match_and_assemble("nama awak apa", &catalog, &embedder, &store).expect("assemble");
        assert!(result.is_match());
        assert_eq!(result.phrase.as_deref(), Some("apa nama"));
        assert!((result.score - 0.95).abs() < 1e-5);

        let sequence = result.sequence.expect("sequence");
        let apa = sequence.get("Apa.csv").expect("listed").expect("present");
        assert_eq!(apa.len(), 2);
        assert_eq!(apa[1]["x"], "0.2");
        assert_eq!(sequence.get("Nama.csv"), Some(None));
        assert_eq!(sequence.missing().collect::<Vec<_>>(), ["Nama.csv"]);
    }

    #[test]
    fn low_score_is_a_no_match() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = AssetStore::new(dir.path());
        let embedder = embedder();
        let catalog = phrases(&embedder);

        let result =
            match_and_assemble("cuaca hari ini", &catalog, &embedder, &store).expect("assemble");
        assert!(!result.is_match());
        assert_eq!(result.sequence, None);
        assert_eq!(result.message, Some(NO_MATCH_MESSAGE));
        assert!((result.score - 0.40).abs() < 1e-5);
    }

    #[test]
    fn score_at_threshold_is_a_match() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = AssetStore::new(dir.path());
        let embedder = embedder();
        let catalog = phrases(&embedder);

        // 7 / |(7, 1, 1, 7)| is exactly 0.7
        let result =
            match_and_assemble("nama apa", &catalog, &embedder, &store).expect("assemble");
        assert_eq!(result.score, SEMANTIC_THRESHOLD);
        assert!(result.is_match());
        assert_eq!(result.phrase.as_deref(), Some("apa nama"));
    }

    #[test]
    fn blank_sentence_rejected_without_backend_calls() {
        let store = AssetStore::new("does-not-matter");
        let embedder = embedder();
        let catalog = phrases(&embedder);
        let calls = embedder.calls();

        assert!(matches!(
            match_and_assemble("   ", &catalog, &embedder, &store),
            Err(PipelineError::MissingInput("sentence"))
        ));
        assert_eq!(embedder.calls(), calls);
    }

    #[test]
    fn duplicate_filenames_resolved_independently() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("Sama.csv"), "frame\n0\n").expect("write");
        let store = AssetStore::new(dir.path());
        let embedder = embedder();
        let catalog = phrases(&embedder);

        let result =
            match_and_assemble("sama-sama", &catalog, &embedder, &store).expect("assemble");
        let sequence = result.sequence.expect("sequence");
        assert_eq!(sequence.len(), 2);
        assert!(sequence.iter().all(|(name, rows)| name == "Sama.csv" && rows.is_some()));

        let json = serde_json::to_value(&sequence).expect("serialize");
        assert_eq!(json, serde_json::json!({"Sama.csv": [{"frame": "0"}]}));
    }

    #[test]
    fn serialized_shape() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("Apa.csv"), "frame,x\n0,0.1\n").expect("write");
        let store = AssetStore::new(dir.path());
        let embedder = embedder();
        let catalog = phrases(&embedder);

        let hit =
            match_and_assemble("apa nama", &catalog, &embedder, &store).expect("assemble");
        let json = serde_json::to_value(&hit).expect("serialize");
        assert_eq!(json["phrase"], "apa nama");
        assert_eq!(json["sequence"]["Apa.csv"][0]["x"], "0.1");
        assert!(json["sequence"]["Nama.csv"].is_null());
        assert!(json.get("message").is_none());

        let miss = serde_json::to_value(
            match_and_assemble("cuaca hari ini", &catalog, &embedder, &store).expect("assemble"),
        )
        .expect("serialize");
        assert!(miss["phrase"].is_null());
        assert!(miss["sequence"].is_null());
        assert_eq!(miss["message"], NO_MATCH_MESSAGE);
    }

    #[test]
    fn asset_names_must_stay_inside_store() {
        let store = AssetStore::new("assets");
        for name in ["../secret.csv", "/etc/passwd", "nested/Apa.csv", ""] {
            assert!(
                matches!(store.load(name), Err(PipelineError::InvalidAssetName(_))),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn malformed_asset_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("Apa.csv"), "frame,x\n0\n").expect("write");
        let store = AssetStore::new(dir.path());
        assert!(matches!(
            store.load("Apa.csv"),
            Err(PipelineError::Asset { file, .. }) if file == "Apa.csv"
        ));
    }
}

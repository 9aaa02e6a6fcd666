//! Command-line and environment configuration shared by the binaries.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};

use crate::assembler::AssetStore;
use crate::catalog::CatalogDefinition;
use crate::embedder::openai::EmbeddingSettings;
use crate::segmenter::DEFAULT_TERMINATOR;
use crate::translation::{AnthropicProvider, OpenAiProvider, Translator};

/// Completion backends available for translation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum TranslationProviderArg {
    /// OpenAI-compatible chat completions.
    Openai,
    /// Anthropic messages API.
    Anthropic,
    /// Skip translation; responses carry no translated text.
    None,
}

/// Service configuration.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "signphrase-api",
    about = "HTTP API that resolves gesture streams and sentences into statements and animation keyframes"
)]
pub struct Cli {
    /// Address to bind the HTTP server to (host:port).
    #[arg(long, env = "SIGNPHRASE_BIND", default_value = "127.0.0.1:5000")]
    pub bind: String,

    /// Directory holding one keyframe table per word-unit.
    #[arg(long, env = "SIGNPHRASE_ASSET_DIR", default_value = "assets")]
    pub asset_dir: PathBuf,

    /// Optional JSON catalog definition (defaults to the built-in catalog).
    #[arg(long, env = "SIGNPHRASE_CATALOG")]
    pub catalog_file: Option<PathBuf>,

    /// Marker separating fingerspelled letters in a gesture stream.
    #[arg(long, env = "SIGNPHRASE_TERMINATOR", default_value = DEFAULT_TERMINATOR)]
    pub terminator: String,

    /// OpenAI API key used for embeddings (and for translation with the openai provider).
    #[arg(long, env = "OPENAI_API_KEY")]
    pub openai_api_key: String,

    /// Base URL for OpenAI-compatible endpoints.
    #[arg(
        long,
        env = "SIGNPHRASE_OPENAI_BASE",
        default_value = "https://api.openai.com/v1"
    )]
    pub openai_base_url: String,

    /// Embedding model identifier.
    #[arg(
        long,
        env = "SIGNPHRASE_EMBEDDING_MODEL",
        default_value = "text-embedding-3-small"
    )]
    pub embedding_model: String,

    /// Optional embedding dimension override.
    #[arg(long, env = "SIGNPHRASE_EMBEDDING_DIMENSIONS")]
    pub embedding_dimensions: Option<usize>,

    /// Max inputs per embedding request.
    #[arg(long, env = "SIGNPHRASE_EMBEDDING_BATCH", default_value_t = 32)]
    pub embedding_batch_size: usize,

    /// Seconds before embedding requests time out.
    #[arg(long, env = "SIGNPHRASE_EMBEDDING_TIMEOUT_SECS", default_value_t = 30)]
    pub embedding_timeout_secs: u64,

    /// Attempts for transient embedding errors.
    #[arg(long, env = "SIGNPHRASE_EMBEDDING_MAX_RETRIES", default_value_t = 5)]
    pub embedding_max_retries: usize,

    /// Translation backend.
    #[arg(
        long,
        env = "SIGNPHRASE_TRANSLATION_PROVIDER",
        value_enum,
        default_value = "openai"
    )]
    pub translation_provider: TranslationProviderArg,

    /// Chat model used with the openai provider.
    #[arg(long, env = "SIGNPHRASE_TRANSLATION_MODEL", default_value = "gpt-4o-mini")]
    pub translation_model: String,

    /// Anthropic API key (required with the anthropic provider).
    #[arg(long, env = "ANTHROPIC_API_KEY")]
    pub anthropic_api_key: Option<String>,

    /// Anthropic model identifier.
    #[arg(
        long,
        env = "SIGNPHRASE_ANTHROPIC_MODEL",
        default_value = "claude-3-5-haiku-latest"
    )]
    pub anthropic_model: String,

    /// Seconds before a translation request times out.
    #[arg(long, env = "SIGNPHRASE_TRANSLATION_TIMEOUT_SECS", default_value_t = 30)]
    pub translation_timeout_secs: u64,

    /// Maximum tokens to request from the completion model.
    #[arg(long, default_value_t = 300)]
    pub translation_max_tokens: usize,

    /// Sampling temperature for translations.
    #[arg(long, default_value_t = 0.2)]
    pub translation_temperature: f32,

    /// Target languages, comma separated.
    #[arg(
        long,
        env = "SIGNPHRASE_TARGET_LANGUAGES",
        default_value = "Malay,Mandarin Chinese,Tamil"
    )]
    pub target_languages: String,

    /// Enable debug logging.
    #[arg(long, short, default_value_t = false)]
    pub verbose: bool,
}

impl Cli {
    /// Settings for the embedding client.
    pub fn embedding_settings(&self) -> EmbeddingSettings {
        EmbeddingSettings {
            api_key: self.openai_api_key.clone(),
            base_url: self.openai_base_url.clone(),
            model: self.embedding_model.clone(),
            dimensions: self.embedding_dimensions,
            timeout: Duration::from_secs(self.embedding_timeout_secs.max(1)),
            max_retries: self.embedding_max_retries.max(1),
            batch_size: self.embedding_batch_size.max(1),
        }
    }

    /// Parsed target language list.
    pub fn target_languages(&self) -> Vec<String> {
        self.target_languages
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Catalog definition from `--catalog-file` or the built-in one.
    pub fn catalog_definition(&self) -> Result<CatalogDefinition> {
        let definition = match &self.catalog_file {
            Some(path) => CatalogDefinition::from_path(path)?,
            None => CatalogDefinition::builtin()?,
        };
        Ok(definition)
    }

    /// Asset store rooted at `--asset-dir`.
    pub fn asset_store(&self) -> AssetStore {
        AssetStore::new(self.asset_dir.clone())
    }

    /// Builds the configured translator; `None` when translation is disabled.
    pub fn build_translator(&self) -> Result<Option<Translator>> {
        let timeout = Duration::from_secs(self.translation_timeout_secs.max(1));
        let provider: Box<dyn crate::translation::CompletionProvider> =
            match self.translation_provider {
                TranslationProviderArg::None => return Ok(None),
                TranslationProviderArg::Openai => Box::new(OpenAiProvider::new(
                    self.openai_api_key.clone(),
                    self.translation_model.clone(),
                    &self.openai_base_url,
                    timeout,
                )?),
                TranslationProviderArg::Anthropic => {
                    let key = self.anthropic_api_key.clone().ok_or_else(|| {
                        anyhow!("ANTHROPIC_API_KEY must be set for the Anthropic provider")
                    })?;
                    Box::new(AnthropicProvider::new(
                        key,
                        self.anthropic_model.clone(),
                        timeout,
                    )?)
                }
            };
        let languages = self.target_languages();
        anyhow::ensure!(!languages.is_empty(), "at least one target language is required");
        Ok(Some(Translator::new(
            provider,
            languages,
            self.translation_temperature,
            self.translation_max_tokens.max(1),
        )))
    }
}

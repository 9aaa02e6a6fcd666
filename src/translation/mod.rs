//! Translation of canonical statements through a hosted completion API.
//!
//! Calls are blocking, bounded by the client timeout and never retried: a
//! failed call surfaces immediately as a [`TranslationError`].

use serde::{Deserialize, Serialize};

mod anthropic;
mod openai;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;

/// Languages a statement is translated into unless configured otherwise.
pub const DEFAULT_TARGET_LANGUAGES: [&str; 3] = ["Malay", "Mandarin Chinese", "Tamil"];

/// Trait implemented by concrete completion providers.
pub trait CompletionProvider: Send + Sync {
    /// Sends one prompt and returns the generated text.
    fn complete(&self, request: &CompletionRequest) -> Result<Completion, TranslationError>;
}

/// Request envelope shared by the providers.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    /// Full prompt text.
    pub prompt: &'a str,
    /// Sampling temperature.
    pub temperature: f32,
    /// Completion token cap.
    pub max_tokens: usize,
}

/// Generated text plus whatever usage accounting the provider reported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Completion {
    /// Generated text.
    pub text: String,
    /// Token usage, when reported.
    pub usage: Option<Usage>,
}

/// Token accounting for one completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens consumed by the prompt.
    pub prompt_tokens: u64,
    /// Tokens generated.
    pub completion_tokens: u64,
    /// Sum of both.
    pub total_tokens: u64,
}

/// Failures from the translation backend.
#[derive(Debug, thiserror::Error)]
pub enum TranslationError {
    /// The request never produced an HTTP response (connect, timeout, TLS).
    #[error("translation request failed: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("translation backend returned {status}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The backend answered but the payload lacked the expected fields.
    #[error("translation response missing expected fields: {reason}")]
    Format {
        /// What was missing or malformed.
        reason: String,
        /// Raw response body.
        raw: String,
    },

    /// The provider could not be configured.
    #[error("translation provider misconfigured: {0}")]
    Config(String),
}

impl TranslationError {
    /// Raw upstream detail (error text or body) for diagnostics.
    pub fn detail(&self) -> &str {
        match self {
            Self::Transport(detail) | Self::Config(detail) => detail,
            Self::Upstream { body, .. } => body,
            Self::Format { raw, .. } => raw,
        }
    }
}

/// Builds the prompt asking for `statement` in every target language.
pub fn translation_prompt(statement: &str, languages: &[String]) -> String {
    let mut prompt = String::new();
    prompt.push_str("Translate the following English sentence into ");
    prompt.push_str(&join_languages(languages));
    prompt.push_str(".\n\nSentence:\n");
    prompt.push_str(statement);
    prompt.push_str("\n\nInstructions:\n");
    for (idx, language) in languages.iter().enumerate() {
        prompt.push_str(&format!(
            "{}. Write one line starting with \"{language}:\" followed by the translation.\n",
            idx + 1
        ));
    }
    prompt.push_str("Do not add explanations.\n");
    prompt
}

fn join_languages(languages: &[String]) -> String {
    match languages {
        [] => String::from("English"),
        [one] => one.clone(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}

/// Translates canonical statements with a fixed provider and settings.
pub struct Translator {
    provider: Box<dyn CompletionProvider>,
    languages: Vec<String>,
    temperature: f32,
    max_tokens: usize,
}

impl Translator {
    /// Wraps a provider with prompt settings.
    pub fn new(
        provider: Box<dyn CompletionProvider>,
        languages: Vec<String>,
        temperature: f32,
        max_tokens: usize,
    ) -> Self {
        Self {
            provider,
            languages,
            temperature,
            max_tokens,
        }
    }

    /// Target languages, in prompt order.
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// Translates one statement.
    pub fn translate(&self, statement: &str) -> Result<Completion, TranslationError> {
        let prompt = translation_prompt(statement, &self.languages);
        self.provider.complete(&CompletionRequest {
            prompt: &prompt,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        })
    }
}

/// Reads the body of a completed response, mapping non-2xx statuses to
/// [`TranslationError::Upstream`].
pub(crate) fn read_body(resp: reqwest::blocking::Response) -> Result<String, TranslationError> {
    let status = resp.status();
    let body = resp
        .text()
        .map_err(|err| TranslationError::Transport(err.to_string()))?;
    if !status.is_success() {
        return Err(TranslationError::Upstream {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

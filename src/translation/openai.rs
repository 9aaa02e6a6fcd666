use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use super::{read_body, Completion, CompletionProvider, CompletionRequest, TranslationError, Usage};

/// OpenAI-compatible chat completions provider.
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    endpoint: String,
    client: Client,
}

impl OpenAiProvider {
    /// Builds a provider for `{base_url}/chat/completions`.
    pub fn new(api_key: String, model: String, base_url: &str, timeout: Duration) -> Result<Self> {
        anyhow::ensure!(!api_key.trim().is_empty(), "missing OpenAI API key");
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build OpenAI HTTP client")?;
        Ok(Self {
            api_key,
            model,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            client,
        })
    }
}

impl CompletionProvider for OpenAiProvider {
    fn complete(&self, request: &CompletionRequest) -> Result<Completion, TranslationError> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", self.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|_| TranslationError::Config("invalid OpenAI API key".to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let body = ChatRequest {
            model: &self.model,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "You are a translator. Reply only with the requested translations.",
                },
                ChatMessage {
                    role: "user",
                    content: request.prompt,
                },
            ],
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .headers(headers)
            .json(&body)
            .send()
            .map_err(|err| TranslationError::Transport(err.to_string()))?;
        parse_chat_response(read_body(resp)?)
    }
}

fn parse_chat_response(raw: String) -> Result<Completion, TranslationError> {
    let parsed: ChatResponse = match serde_json::from_str(&raw) {
        Ok(parsed) => parsed,
        Err(err) => {
            return Err(TranslationError::Format {
                reason: err.to_string(),
                raw,
            })
        }
    };
    let text = parsed
        .choices
        .into_iter()
        .find_map(|choice| choice.message.content)
        .filter(|text| !text.trim().is_empty());
    match text {
        Some(text) => Ok(Completion {
            text,
            usage: parsed.usage,
        }),
        None => Err(TranslationError::Format {
            reason: "no message content in choices".to_string(),
            raw,
        }),
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: usize,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_text_and_usage() {
        let raw = r#"{
            "choices": [{"message": {"role": "assistant", "content": "Malay: Nama saya Ann"}}],
            "usage": {"prompt_tokens": 40, "completion_tokens": 12, "total_tokens": 52}
        }"#;
        let completion = parse_chat_response(raw.to_string()).expect("parse");
        assert_eq!(completion.text, "Malay: Nama saya Ann");
        assert_eq!(
            completion.usage,
            Some(Usage {
                prompt_tokens: 40,
                completion_tokens: 12,
                total_tokens: 52
            })
        );
    }

    #[test]
    fn missing_fields_keep_raw_body() {
        let raw = r#"{"choices": []}"#;
        match parse_chat_response(raw.to_string()) {
            Err(TranslationError::Format { raw: body, .. }) => assert_eq!(body, raw),
            other => panic!("expected format error, got {other:?}"),
        }

        let raw = "<html>gateway</html>";
        assert!(matches!(
            parse_chat_response(raw.to_string()),
            Err(TranslationError::Format { .. })
        ));
    }

    #[test]
    fn endpoint_from_base_url() {
        let provider = OpenAiProvider::new(
            "sk-test".to_string(),
            "gpt-4o-mini".to_string(),
            "https://api.openai.com/v1/",
            Duration::from_secs(5),
        )
        .expect("provider");
        assert_eq!(provider.endpoint, "https://api.openai.com/v1/chat/completions");
    }
}

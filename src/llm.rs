use crate::error::{Error, Result};
use crate::http::HttpClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, warn};

/// LLM provider — determines API format and endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    Anthropic,
    OpenRouter,
}

impl Provider {
    fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Anthropic => "https://api.anthropic.com/v1",
            Self::OpenRouter => "https://openrouter.ai/api/v1",
        }
    }

    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenRouter => "OPENROUTER_API_KEY",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::Anthropic => "claude-3-5-haiku-latest",
            Self::OpenRouter => "openai/gpt-4o-mini",
        }
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "openrouter" => Ok(Self::OpenRouter),
            other => Err(Error::config(format!(
                "unknown provider '{other}' (expected openai, anthropic or openrouter)"
            ))),
        }
    }
}

/// A hosted text-completion service.
///
/// `generate` must honor `stop`: the returned text never contains a stop
/// sequence or anything after it.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str, stop: &[String]) -> Result<String>;

    fn model(&self) -> &str;
}

pub struct LlmClient {
    provider: Provider,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    base_url: String,
    http: HttpClient,
}

// -- Anthropic format --

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "no_stops")]
    stop_sequences: &'a [String],
    messages: Vec<Msg<'a>>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicBlock>,
}

#[derive(Deserialize)]
struct AnthropicBlock {
    text: Option<String>,
}

impl AnthropicResponse {
    /// Text blocks joined by newlines; non-text blocks are skipped.
    fn into_text(self) -> String {
        self.content
            .into_iter()
            .filter_map(|b| b.text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// -- OpenAI-compatible format --

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "no_stops")]
    stop: &'a [String],
    messages: Vec<Msg<'a>>,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

// -- Shared --

fn no_stops(stop: &&[String]) -> bool {
    stop.is_empty()
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

impl LlmClient {
    pub fn new(
        provider: Provider,
        api_key: String,
        model: String,
        temperature: f32,
        max_tokens: u32,
        base_url: Option<String>,
    ) -> Result<Self> {
        let http = HttpClient::new(concat!("prompt-chains/", env!("CARGO_PKG_VERSION")))?;
        let base_url = base_url.unwrap_or_else(|| provider.default_base_url().into());
        Ok(Self {
            provider,
            api_key,
            model,
            temperature,
            max_tokens,
            base_url,
            http,
        })
    }

    /// Build from config, reading the API key from the specified env var.
    pub fn from_config(
        provider: Provider,
        model: String,
        temperature: f32,
        max_tokens: u32,
        api_key_env: Option<String>,
        base_url: Option<String>,
    ) -> Result<Self> {
        let env_var = api_key_env.unwrap_or_else(|| provider.default_api_key_env().into());
        let api_key = std::env::var(&env_var)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                Error::config(format!("{env_var} not set. Export it or add it to .env"))
            })?;
        Self::new(provider, api_key, model, temperature, max_tokens, base_url)
    }

    async fn complete_anthropic(&self, prompt: &str, stop: &[String]) -> Result<String> {
        let request = AnthropicRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stop_sequences: stop,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
        };

        let body = serde_json::to_string(&request)
            .map_err(|e| Error::parse(format!("serialize request: {e}")))?;

        let url = format!("{}/messages", self.base_url);
        let response_text = self
            .http
            .post_json_raw(
                &url,
                &body,
                &[
                    ("x-api-key", &self.api_key),
                    ("anthropic-version", "2023-06-01"),
                ],
            )
            .await
            .map_err(|e| {
                warn!("Anthropic API error: {e}");
                e
            })?;

        let resp: AnthropicResponse = serde_json::from_str(&response_text)
            .map_err(|e| Error::parse(format!("parse Anthropic response: {e}")))?;

        Ok(resp.into_text())
    }

    async fn complete_openai(&self, prompt: &str, stop: &[String]) -> Result<String> {
        // The OpenAI API accepts at most four stop sequences.
        let stop = &stop[..stop.len().min(4)];
        let request = OpenAiRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stop,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
        };

        let body = serde_json::to_string(&request)
            .map_err(|e| Error::parse(format!("serialize request: {e}")))?;

        let url = format!("{}/chat/completions", self.base_url);
        let response_text = self
            .http
            .post_json_raw(
                &url,
                &body,
                &[("Authorization", &format!("Bearer {}", self.api_key))],
            )
            .await
            .map_err(|e| {
                warn!("LLM API error: {e}");
                e
            })?;

        let resp: OpenAiResponse = serde_json::from_str(&response_text)
            .map_err(|e| Error::parse(format!("parse LLM response: {e}")))?;

        resp.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::parse("empty response from LLM"))
    }
}

#[async_trait]
impl LanguageModel for LlmClient {
    async fn generate(&self, prompt: &str, stop: &[String]) -> Result<String> {
        debug!(
            provider = ?self.provider,
            model = %self.model,
            temperature = self.temperature,
            "sending LLM request"
        );

        let text = match self.provider {
            Provider::Anthropic => self.complete_anthropic(prompt, stop).await?,
            Provider::OpenRouter | Provider::OpenAi => self.complete_openai(prompt, stop).await?,
        };
        Ok(truncate_at_stop(&text, stop).to_string())
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Cut `text` at the earliest occurrence of any stop sequence.
pub fn truncate_at_stop<'a>(text: &'a str, stop: &[String]) -> &'a str {
    let cut = stop
        .iter()
        .filter(|s| !s.is_empty())
        .filter_map(|s| text.find(s.as_str()))
        .min();
    match cut {
        Some(idx) => &text[..idx],
        None => text,
    }
}

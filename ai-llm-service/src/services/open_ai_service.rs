//! OpenAI (ChatGPT) service for text generation.
//!
//! Minimal, non-streaming client around the OpenAI REST API. The endpoint is
//! derived from `LlmModelConfig::endpoint` and the configured mode:
//! - POST {endpoint}/v1/chat/completions: chat completion
//! - POST {endpoint}/v1/completions: legacy single-turn text completion
//!
//! Constructor validation:
//! - `cfg.api_key` must be non-empty
//! - `cfg.endpoint` must start with http:// or https://
//!
//! Errors are normalized via unified error types in `error_handler`.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{
    config::{completion_mode::CompletionMode, llm_model_config::LlmModelConfig},
    error_handler::{
        AiLlmError, ConfigError, HttpError, ProviderError, ProviderErrorKind, make_snippet,
        validate_http_endpoint,
    },
    services::CompletionService,
};

/// Thin client for the OpenAI API.
///
/// Constructed from a complete [`LlmModelConfig`]. Internally keeps a
/// preconfigured `reqwest::Client` (with timeout and default headers).
#[derive(Debug)]
pub struct OpenAiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url: String,
    timeout: Duration,
}

impl OpenAiService {
    /// Creates a new [`OpenAiService`] from the given config.
    ///
    /// # Errors
    /// - [`ConfigError::EmptyApiKey`] if `cfg.api_key` is blank
    /// - [`ConfigError::InvalidFormat`] if `cfg.endpoint` is invalid
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.api_key.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey.into());
        }
        validate_http_endpoint("endpoint", &cfg.endpoint)?;

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", cfg.api_key.trim())).map_err(
                |_| ConfigError::InvalidFormat {
                    var: "api_key",
                    reason: "not a valid header value",
                },
            )?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let url = format!("{}{}", cfg.endpoint.trim().trim_end_matches('/'), cfg.mode.path());

        info!(
            mode = %cfg.mode,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = timeout.as_secs(),
            "OpenAiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url,
            timeout,
        })
    }

    /// Performs one **non-streaming** completion request and returns the reply text.
    ///
    /// In chat mode `system` becomes a leading system message; in text mode it
    /// is prepended to the prompt, separated by a blank line.
    ///
    /// # Errors
    /// - [`AiLlmError::Provider`] with `HttpStatus` for non-2xx responses
    /// - [`AiLlmError::Timeout`] when the request exceeds the configured timeout
    /// - [`AiLlmError::HttpTransport`] for other client/network failures
    /// - [`AiLlmError::Provider`] with `Decode` if the JSON cannot be parsed
    /// - [`AiLlmError::Provider`] with `EmptyChoices` if no choice carries text
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AiLlmError> {
        let started = Instant::now();
        let label = self.cfg.mode.label();

        debug!(
            model = %self.cfg.model,
            mode = %self.cfg.mode,
            prompt_len = prompt.len(),
            has_system = system.is_some(),
            "POST {}", self.url
        );

        let request = match self.cfg.mode {
            CompletionMode::Chat => self
                .client
                .post(&self.url)
                .json(&ChatCompletionRequest::from_cfg(&self.cfg, prompt, system)),
            CompletionMode::Text => {
                let full_prompt = match system {
                    Some(sys) => format!("{sys}\n\n{prompt}"),
                    None => prompt.to_string(),
                };
                self.client
                    .post(&self.url)
                    .json(&TextCompletionRequest::from_cfg(&self.cfg, &full_prompt))
            }
        };

        let resp = request.send().await.map_err(|e| self.transport_error(e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                %url,
                %snippet,
                model = %self.cfg.model,
                latency_ms = started.elapsed().as_millis(),
                "OpenAI /v1/{label} returned non-success status"
            );

            return Err(ProviderError::new(
                label,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url,
                    snippet,
                }),
            )
            .into());
        }

        let content = match self.cfg.mode {
            CompletionMode::Chat => {
                let out: ChatCompletionResponse = self.decode(resp, started).await?;
                out.choices.into_iter().find_map(|c| c.message.content)
            }
            CompletionMode::Text => {
                let out: TextCompletionResponse = self.decode(resp, started).await?;
                out.choices.into_iter().find_map(|c| c.text)
            }
        }
        .ok_or_else(|| ProviderError::new(label, ProviderErrorKind::EmptyChoices))?;

        info!(
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis(),
            reply_len = content.len(),
            "completion finished"
        );

        Ok(content)
    }

    async fn decode<T: for<'de> Deserialize<'de>>(
        &self,
        resp: reqwest::Response,
        started: Instant,
    ) -> Result<T, AiLlmError> {
        let label = self.cfg.mode.label();
        resp.json::<T>().await.map_err(|e| {
            error!(
                error = %e,
                model = %self.cfg.model,
                latency_ms = started.elapsed().as_millis(),
                "failed to decode /v1/{label} response"
            );
            AiLlmError::from(ProviderError::new(
                label,
                ProviderErrorKind::Decode(format!("serde error: {e}")),
            ))
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> AiLlmError {
        if e.is_timeout() {
            AiLlmError::Timeout(self.timeout)
        } else {
            AiLlmError::HttpTransport(e)
        }
    }
}

impl CompletionService for OpenAiService {
    async fn complete(&self, prompt: &str) -> Result<String, AiLlmError> {
        self.generate(prompt, None).await
    }
}

/* ===========================================================================
HTTP payloads
======================================================================== */

/// Minimal request body for `/v1/chat/completions` (non-streaming).
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

impl<'a> ChatCompletionRequest<'a> {
    fn from_cfg(cfg: &'a LlmModelConfig, prompt: &'a str, system: Option<&'a str>) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(sys) = system {
            messages.push(ChatMessage {
                role: "system",
                content: sys,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        Self {
            model: &cfg.model,
            messages,
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            max_tokens: cfg.max_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
}

/// Request body for the legacy `/v1/completions` endpoint.
#[derive(Debug, Serialize)]
struct TextCompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

impl<'a> TextCompletionRequest<'a> {
    fn from_cfg(cfg: &'a LlmModelConfig, prompt: &'a str) -> Self {
        Self {
            model: &cfg.model,
            prompt,
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            max_tokens: cfg.max_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TextCompletionResponse {
    choices: Vec<TextChoice>,
}

#[derive(Debug, Deserialize)]
struct TextChoice {
    text: Option<String>,
}

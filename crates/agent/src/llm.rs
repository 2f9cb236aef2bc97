use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use shopmind_core::config::LlmConfig;
use thiserror::Error;
use tracing::{error, info, warn};

pub const APOLOGY_RESPONSE: &str =
    "I apologize, but I couldn't generate a proper response. Please try again.";

const GEMINI_PROVIDER: &str = "gemini";

#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRequest {
    pub transcript: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl GenerationRequest {
    pub fn new(transcript: impl Into<String>, temperature: f32, max_output_tokens: u32) -> Self {
        let temperature = if temperature.is_nan() { 0.0 } else { temperature.clamp(0.0, 1.0) };
        Self { transcript: transcript.into(), temperature, max_output_tokens }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GenerationResult {
    /// Never empty: malformed provider output is replaced by [`APOLOGY_RESPONSE`].
    pub response_text: String,
    pub raw_provider_payload: Value,
}

impl GenerationResult {
    /// Parses a `candidates[0].content.parts[0].text` payload, substituting the
    /// apology text when that path is missing or blank.
    pub fn from_payload(raw_provider_payload: Value) -> Self {
        let response_text = extract_response_text(&raw_provider_payload).unwrap_or_else(|| {
            warn!(
                event_name = "llm.generation.malformed_payload",
                payload = %raw_provider_payload,
                "provider payload had no usable text; substituting apology response"
            );
            APOLOGY_RESPONSE.to_string()
        });
        Self { response_text, raw_provider_payload }
    }

    pub fn is_fallback(&self) -> bool {
        self.response_text == APOLOGY_RESPONSE
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("generation provider timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u128 },
    #[error("generation provider returned HTTP {status}")]
    Provider { status: u16, body: String },
    #[error("generation provider transport failure: {0}")]
    Transport(String),
    #[error("generation provider api key is not configured")]
    MissingApiKey,
}

impl GenerationError {
    /// Whether an outer transport layer may reasonably retry the same request.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Transport(_) => true,
            Self::Provider { status, .. } => *status == 429 || *status >= 500,
            Self::MissingApiKey => false,
        }
    }
}

#[async_trait]
pub trait GenerationClient: Send + Sync {
    fn provider(&self) -> &'static str;

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GenerationError>;
}

/// Google Gemini `generateContent` adapter.
pub struct GeminiClient {
    http: Client,
    endpoint: String,
    api_key: Option<SecretString>,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| GenerationError::Transport(error.to_string()))?;
        let endpoint =
            format!("{}/models/{}:generateContent", base_url.trim_end_matches('/'), model.trim());
        Ok(Self { http, endpoint, api_key, timeout })
    }

    pub fn from_config(llm: &LlmConfig) -> Result<Self, GenerationError> {
        Self::new(&llm.base_url, &llm.model, llm.api_key.clone(), llm.timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn classify_transport_error(&self, error: reqwest::Error) -> GenerationError {
        if error.is_timeout() {
            GenerationError::Timeout { timeout_ms: self.timeout.as_millis() }
        } else {
            GenerationError::Transport(error.without_url().to_string())
        }
    }

    fn log_call(&self, status_code: Option<u16>, started: Instant) {
        info!(
            event_name = "llm.generation.call",
            provider = GEMINI_PROVIDER,
            endpoint = %self.endpoint,
            method = "POST",
            status_code = status_code,
            duration_ms = started.elapsed().as_millis() as u64,
            "generation provider call finished"
        );
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    fn provider(&self) -> &'static str {
        GEMINI_PROVIDER
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GenerationError> {
        let api_key = self.api_key.as_ref().ok_or(GenerationError::MissingApiKey)?;
        let payload = json!({
            "contents": [{ "parts": [{ "text": request.transcript }] }],
            "generationConfig": {
                "temperature": request.temperature,
                "maxOutputTokens": request.max_output_tokens,
            },
        });

        let started = Instant::now();
        let sent = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", api_key.expose_secret())
            .json(&payload)
            .send()
            .await;

        let response = match sent {
            Ok(response) => response,
            Err(source) => {
                self.log_call(None, started);
                let error = self.classify_transport_error(source);
                error!(event_name = "llm.generation.error", error = %error, "generation call failed");
                return Err(error);
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(source) => {
                self.log_call(Some(status.as_u16()), started);
                let error = self.classify_transport_error(source);
                error!(event_name = "llm.generation.error", error = %error, "generation body read failed");
                return Err(error);
            }
        };
        self.log_call(Some(status.as_u16()), started);

        if !status.is_success() {
            error!(
                event_name = "llm.generation.http_error",
                status_code = status.as_u16(),
                response = %body,
                "generation provider returned an error status"
            );
            return Err(GenerationError::Provider { status: status.as_u16(), body });
        }

        let raw = serde_json::from_str::<Value>(&body).unwrap_or(Value::String(body));
        Ok(GenerationResult::from_payload(raw))
    }
}

#[derive(Debug, Default, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Default, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

#[derive(Debug, Default, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Default, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

pub fn extract_response_text(payload: &Value) -> Option<String> {
    let parsed = GeminiResponse::deserialize(payload).ok()?;
    let text = parsed.candidates.into_iter().next()?.content?.parts.into_iter().next()?.text?;
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Replays queued provider outcomes in order; used by tests and offline runs.
#[derive(Default)]
pub struct ScriptedGenerationClient {
    replies: Mutex<VecDeque<Result<Value, GenerationError>>>,
    repeat: Option<Value>,
    delay: Option<Duration>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerationClient {
    pub fn new(replies: Vec<Result<Value, GenerationError>>) -> Self {
        Self { replies: Mutex::new(replies.into()), ..Self::default() }
    }

    /// Answers every request with the same text.
    pub fn replying(text: &str) -> Self {
        Self { repeat: Some(gemini_payload(text)), ..Self::default() }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().map(|requests| requests.clone()).unwrap_or_default()
    }
}

/// A well-formed `generateContent` success body carrying `text`.
pub fn gemini_payload(text: &str) -> Value {
    json!({
        "candidates": [{ "content": { "parts": [{ "text": text }], "role": "model" } }]
    })
}

#[async_trait]
impl GenerationClient for ScriptedGenerationClient {
    fn provider(&self) -> &'static str {
        "scripted"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GenerationError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.replies.lock().ok().and_then(|mut replies| replies.pop_front());
        match (next, &self.repeat) {
            (Some(reply), _) => reply.map(GenerationResult::from_payload),
            (None, Some(payload)) => Ok(GenerationResult::from_payload(payload.clone())),
            (None, None) => {
                Err(GenerationError::Transport("no scripted reply remaining".to_string()))
            }
        }
    }
}

//! Tone-analysis gateway.
//!
//! Wraps the external model endpoint behind a narrow trait so the
//! pipeline never talks HTTP directly and tests can swap in a mock.
//!
//! ### Specification
//!
//! - **Endpoint**: Ollama-compatible `POST {base_url}/api/generate`
//! - **Request**: model name, prompt, `stream: false`
//! - **Normalization**: markdown code fences are stripped before the
//!   response is decoded into a [`ToneAnalysis`].
//! - **Failure classes**: transient (timeout, transport, 429/5xx) and
//!   validation (undecodable payload); see [`GatewayError`].

pub mod error;

pub use error::GatewayError;

use async_trait::async_trait;
use pagecheck_core::{AnalysisConfig, ToneAnalysis};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Default base URL for the analysis endpoint.
const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default model name.
const DEFAULT_MODEL: &str = "llama3.1:8b-instruct";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default cap on input characters sent to the model.
const DEFAULT_MAX_INPUT_CHARS: usize = 1200;

/// Sampling temperature for reproducible-ish summaries.
const TEMPERATURE: f32 = 0.3;

/// Boundary abstraction for the optional external analysis call.
///
/// The pipeline only ever sees this trait; the budget decision of
/// whether to call at all stays with the caller.
#[async_trait]
pub trait AnalysisGateway: Send + Sync {
    /// Analyze tone and readability of the given text.
    async fn analyze(&self, text: &str) -> Result<ToneAnalysis, GatewayError>;
}

/// Analysis gateway client configuration.
#[derive(Debug, Clone)]
pub struct ToneConfig {
    /// Base URL (default: http://localhost:11434).
    pub base_url: String,
    /// Model name passed in the request body.
    pub model: String,
    /// Request timeout (default: 30s).
    pub timeout: Duration,
    /// Input text is truncated to this many characters.
    pub max_input_chars: usize,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }
}

impl From<&AnalysisConfig> for ToneConfig {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            timeout: config.timeout(),
            max_input_chars: config.max_input_chars,
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// HTTP client for the tone-analysis endpoint.
#[derive(Debug, Clone)]
pub struct ToneClient {
    http: reqwest::Client,
    config: ToneConfig,
}

impl ToneClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ToneConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Network(std::sync::Arc::new(e)))?;

        Ok(Self { http, config })
    }

    fn build_prompt(&self, text: &str) -> String {
        let truncated: String = text.chars().take(self.config.max_input_chars).collect();

        format!(
            "You are a concise content analyzer. Analyze the following text for tone and readability.\n\n\
             Provide your response as a JSON object with these exact keys:\n\
             - \"readability\": Brief assessment (max 2 sentences)\n\
             - \"tone\": Brief description (max 2 sentences)\n\
             - \"risks\": Potential issues (max 2 sentences)\n\n\
             Text to analyze:\n{truncated}\n\nResponse (JSON only):"
        )
    }
}

#[async_trait]
impl AnalysisGateway for ToneClient {
    async fn analyze(&self, text: &str) -> Result<ToneAnalysis, GatewayError> {
        if text.trim().is_empty() {
            return Err(GatewayError::InvalidInput("text cannot be empty".to_string()));
        }

        let start = Instant::now();
        let url = format!("{}/api/generate", self.config.base_url);

        tracing::debug!("requesting tone analysis: model={}", self.config.model);

        let request = GenerateRequest {
            model: &self.config.model,
            prompt: self.build_prompt(text),
            stream: false,
            options: GenerateOptions { temperature: TEMPERATURE },
        };

        let http_response = self.http.post(&url).json(&request).send().await.map_err(GatewayError::from)?;

        let status = http_response.status();
        tracing::debug!("analysis endpoint response status: {}", status);

        if status == 429 {
            return Err(GatewayError::RateLimited);
        }

        if status.is_client_error() || status.is_server_error() {
            return Err(GatewayError::HttpError { status: status.as_u16() });
        }

        let bytes = http_response.bytes().await.map_err(GatewayError::from)?;
        let generated: GenerateResponse =
            serde_json::from_slice(&bytes).map_err(|e| GatewayError::Parse(e.to_string()))?;

        let analysis = parse_analysis(&generated.response)?;

        tracing::debug!("tone analysis completed in {:?}", start.elapsed());

        Ok(analysis)
    }
}

/// Decode the model's text output into a structured analysis.
///
/// Models frequently wrap JSON in markdown fences; those are stripped
/// before decoding. Anything that still fails to decode is a
/// validation failure, never retried.
pub fn parse_analysis(raw: &str) -> Result<ToneAnalysis, GatewayError> {
    let cleaned = strip_code_fences(raw);
    serde_json::from_str(&cleaned).map_err(|e| GatewayError::Parse(e.to_string()))
}

fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };

    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim().to_string()
}

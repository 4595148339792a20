use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::instrument;

use super::json_parser::extract_json;
use super::naming::{AnalysisResult, EntityKind, RawAnalysis};
use super::prompts::{
    build_analysis_prompt, build_rename_prompt, ANALYSIS_TEMPERATURE, ANALYSIS_TOP_P,
    RENAME_TOP_P,
};
use crate::config::{Settings, SharedSettings};

const GENERATE_PATH: &str = "/api/generate";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from a generate request
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network failure, timeout or an undecodable body
    #[error("Ollama request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-2xx status
    #[error("Ollama returned HTTP {status}: {body}")]
    Http { status: StatusCode, body: String },

    /// The model produced nothing usable (empty, or the current name again)
    #[error("No suitable name suggestion received")]
    EmptySuggestion,

    /// The HTTP client or its request limiter is unusable
    #[error("Failed to create HTTP client: {0}")]
    Build(String),
}

impl ClientError {
    /// Nothing to do, as opposed to a failure worth showing
    pub fn is_no_change(&self) -> bool {
        matches!(self, Self::EmptySuggestion)
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Http { .. })
    }
}

/// Request body for `POST /api/generate`
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f64,
    top_p: f64,
}

/// Response body of a non-streaming generate call
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
    #[allow(dead_code)]
    #[serde(default)]
    done: bool,
}

/// Source of rename suggestions
///
/// Implemented by [`OllamaClient`]; the refactoring service only depends on
/// this trait.
#[async_trait]
pub trait NameOracle: Send + Sync {
    async fn suggest_rename(
        &self,
        code_excerpt: &str,
        current_name: &str,
        kind: EntityKind,
        extra_context: &str,
    ) -> Result<String, ClientError>;

    async fn analyze_module(&self, source: &str) -> Result<AnalysisResult, ClientError>;
}

/// Client for a local Ollama server
///
/// Clones share one request limit: at most `maxConcurrentRequests` calls are
/// on the wire at once and the rest wait before sending, so the transport
/// timeout only runs while the server is actually working on a request.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: Client,
    settings: SharedSettings,
    permits: Arc<Semaphore>,
}

impl OllamaClient {
    pub fn new(settings: SharedSettings) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        let snapshot = settings.load();
        if !is_local_url(&snapshot.ollama_server) {
            tracing::warn!(
                "Ollama server '{}' is not a local address; code excerpts will leave this machine",
                snapshot.ollama_server
            );
        }
        let permits = Arc::new(Semaphore::new(snapshot.max_concurrent_requests.max(1)));

        Ok(Self {
            http,
            settings,
            permits,
        })
    }

    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    /// Ask for a better name for one entity
    ///
    /// The answer is cleaned with [`clean_response`]. An empty answer, or one
    /// equal to `current_name`, is [`ClientError::EmptySuggestion`].
    #[instrument(skip_all, fields(kind = %kind, current_name = %current_name))]
    pub async fn suggest_rename(
        &self,
        code_excerpt: &str,
        current_name: &str,
        kind: EntityKind,
        extra_context: &str,
    ) -> Result<String, ClientError> {
        let settings = self.settings.load();
        let prompt = build_rename_prompt(code_excerpt, current_name, kind, extra_context);

        let raw = self
            .generate(&settings, &prompt, settings.temperature, RENAME_TOP_P)
            .await?
            .unwrap_or_else(|| current_name.to_string());

        let name = clean_response(&raw);
        if name.is_empty() || name == current_name {
            tracing::debug!("Model kept '{}' unchanged", current_name);
            return Err(ClientError::EmptySuggestion);
        }

        Ok(name)
    }

    /// Ask for a naming review of a whole module
    ///
    /// Malformed JSON from the model is not an error: it yields
    /// [`AnalysisResult::default`].
    #[instrument(skip_all, fields(source_len = source.len()))]
    pub async fn analyze_module(&self, source: &str) -> Result<AnalysisResult, ClientError> {
        let settings = self.settings.load();
        let prompt = build_analysis_prompt(source);

        let raw = self
            .generate(&settings, &prompt, ANALYSIS_TEMPERATURE, ANALYSIS_TOP_P)
            .await?
            .unwrap_or_else(|| "{}".to_string());

        Ok(parse_analysis(&raw))
    }

    /// One non-streaming round trip; `Ok(None)` when the body has no `response`
    ///
    /// Every field of the request comes from the one `settings` snapshot the
    /// caller loaded.
    async fn generate(
        &self,
        settings: &Settings,
        prompt: &str,
        temperature: f64,
        top_p: f64,
    ) -> Result<Option<String>, ClientError> {
        let url = format!("{}{}", normalize_base_url(&settings.ollama_server), GENERATE_PATH);

        let request = GenerateRequest {
            model: &settings.model,
            prompt,
            stream: false,
            options: GenerateOptions { temperature, top_p },
        };

        tracing::debug!(model = %settings.model, prompt_len = prompt.len(), "POST {}", url);

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ClientError::Build("request limiter closed".to_string()))?;
        let response = self.http.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Http { status, body });
        }

        let body: GenerateResponse = response.json().await?;
        Ok(body.response)
    }
}

#[async_trait]
impl NameOracle for OllamaClient {
    async fn suggest_rename(
        &self,
        code_excerpt: &str,
        current_name: &str,
        kind: EntityKind,
        extra_context: &str,
    ) -> Result<String, ClientError> {
        OllamaClient::suggest_rename(self, code_excerpt, current_name, kind, extra_context).await
    }

    async fn analyze_module(&self, source: &str) -> Result<AnalysisResult, ClientError> {
        OllamaClient::analyze_module(self, source).await
    }
}

/// Reduce a free-form answer to a single identifier line
///
/// Removes code fences and backticks, trims, and keeps only the first line.
pub fn clean_response(response: &str) -> String {
    response
        .replace("```", "")
        .replace('`', "")
        .trim()
        .split('\n')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Parse the analysis JSON, falling back to the empty result
pub fn parse_analysis(raw: &str) -> AnalysisResult {
    match extract_json::<RawAnalysis>(raw) {
        Ok(parsed) => parsed.into(),
        Err(e) => {
            tracing::warn!("Analysis response was not valid JSON: {}", e);
            AnalysisResult::default()
        }
    }
}

/// Strip trailing slashes and an OpenAI-style `/v1` suffix
fn normalize_base_url(url: &str) -> String {
    let mut url = url.trim().trim_end_matches('/').to_string();
    if url.ends_with("/v1") {
        url.truncate(url.len() - 3);
    }
    url
}

/// Whether a URL points at localhost or a loopback address
fn is_local_url(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) => match parsed.host() {
            Some(url::Host::Domain(d)) => d == "localhost",
            Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
            Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
            None => true,
        },
        // Malformed URLs fail loudly on the first request instead
        Err(_) => true,
    }
}

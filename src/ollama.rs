//! Local content provider backed by an Ollama instance.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::context::GenerationContext;
use crate::error::{GenerationError, Result};
use crate::generator::ContentProvider;
use crate::http_client::{HttpClient, HttpResponse, ReqwestHttpClient, TransportError};
use crate::normalizer::{self, MAX_AI_TOPICS};
use crate::prompts::{self, GenerationParams};
use crate::providers::{Sleeper, TokioSleeper};
use crate::retry::{send_with_retry, Backoff, RetryPolicy};

pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "mistral";

const RETRY_POLICY: RetryPolicy = RetryPolicy::new(2, Backoff::Linear { step_secs: 3 });

#[derive(Debug, Clone, PartialEq)]
pub struct OllamaSettings {
    pub endpoint: String,
    pub model: String,
    pub request_timeout: Duration,
    pub probe_timeout: Duration,
    pub pull_timeout: Duration,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_OLLAMA_ENDPOINT.to_string(),
            model: DEFAULT_OLLAMA_MODEL.to_string(),
            request_timeout: Duration::from_secs(45),
            probe_timeout: Duration::from_secs(5),
            pull_timeout: Duration::from_secs(300),
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f64,
    num_predict: u32,
    top_p: f64,
    top_k: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

/// Ollama adapter.
///
/// Local models are slow to load, so requests get 45 seconds and timeouts
/// are retried twice with linear backoff (3s, 6s). Availability means the
/// service answers `/api/tags` with at least one installed model.
pub struct OllamaAdapter {
    http: Arc<dyn HttpClient>,
    sleeper: Arc<dyn Sleeper>,
    endpoint: String,
    model: String,
    request_timeout: Duration,
    probe_timeout: Duration,
    pull_timeout: Duration,
    retry: RetryPolicy,
}

impl OllamaAdapter {
    pub fn new(settings: &OllamaSettings) -> Result<Self> {
        Self::with_clients(settings, Arc::new(ReqwestHttpClient::new()), Arc::new(TokioSleeper))
    }

    pub fn with_clients(
        settings: &OllamaSettings,
        http: Arc<dyn HttpClient>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self> {
        let endpoint = settings.endpoint.trim().trim_end_matches('/').to_string();
        if endpoint.is_empty() {
            return Err(GenerationError::Configuration(
                "Ollama endpoint is empty".to_string(),
            ));
        }
        let model = settings.model.trim().to_string();
        if model.is_empty() {
            return Err(GenerationError::Configuration(
                "Ollama model name is empty".to_string(),
            ));
        }

        info!(endpoint = %endpoint, model = %model, "Ollama adapter initialized");

        Ok(Self {
            http,
            sleeper,
            endpoint,
            model,
            request_timeout: settings.request_timeout,
            probe_timeout: settings.probe_timeout,
            pull_timeout: settings.pull_timeout,
            retry: RETRY_POLICY,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Names of the models installed on the Ollama host.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.endpoint);
        let response = self
            .http
            .get(&url, &[], self.probe_timeout)
            .await
            .map_err(|e| self.translate_transport(e, 1))?;
        let body = self.check_status(response)?;

        let tags: TagsResponse = serde_json::from_str(&body)
            .map_err(|e| GenerationError::api(format!("failed to parse Ollama model list: {e}")))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Downloads a model. Blocks until Ollama reports completion.
    pub async fn pull_model(&self, name: &str) -> Result<()> {
        let url = format!("{}/api/pull", self.endpoint);
        let body = serde_json::json!({ "name": name, "stream": false });

        info!(model = name, "pulling Ollama model");
        let response = self
            .http
            .post_json(&url, &[], &body, self.pull_timeout)
            .await
            .map_err(|e| match e {
                TransportError::Timeout(_) => GenerationError::api(format!(
                    "timeout while pulling model '{name}' after {}s",
                    self.pull_timeout.as_secs()
                )),
                other => self.translate_transport(other, 1),
            })?;

        if response.status == 404 {
            return Err(GenerationError::api_status(
                404,
                &format!("model '{name}' does not exist in the Ollama library"),
            ));
        }
        self.check_status(response)?;
        info!(model = name, "Ollama model pulled");
        Ok(())
    }

    fn has_model(models: &[String], wanted: &str) -> bool {
        models
            .iter()
            .any(|m| m == wanted || m.strip_prefix(wanted).is_some_and(|rest| rest.starts_with(':')))
    }

    async fn generate_text(&self, prompt: &str, params: GenerationParams) -> Result<String> {
        let url = format!("{}/api/generate", self.endpoint);
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: params.temperature,
                num_predict: params.max_tokens,
                top_p: params.top_p,
                top_k: params.top_k,
            },
        };
        let body = serde_json::to_value(&request)
            .map_err(|e| GenerationError::api(format!("failed to encode Ollama request: {e}")))?;

        debug!(
            model = %self.model,
            prompt_len = prompt.len(),
            max_tokens = params.max_tokens,
            "invoking Ollama API"
        );

        let response = send_with_retry(&self.retry, self.sleeper.as_ref(), "ollama", || {
            self.http.post_json(&url, &[], &body, self.request_timeout)
        })
        .await
        .map_err(|e| self.translate_transport(e, self.retry.max_attempts()))?;

        if response.status == 404 {
            return Err(GenerationError::api_status(
                404,
                &format!(
                    "model '{}' is not installed; run `ollama pull {}`",
                    self.model, self.model
                ),
            ));
        }
        let body = self.check_status(response)?;

        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| GenerationError::api(format!("failed to parse Ollama response: {e}")))?;
        let text = parsed.response.unwrap_or_default();

        info!(response_len = text.len(), model = %self.model, "Ollama response received");
        Ok(normalizer::clean_local(&text))
    }

    fn translate_transport(&self, err: TransportError, attempts: u32) -> GenerationError {
        match err {
            TransportError::Timeout(_) if attempts == 1 => GenerationError::api(format!(
                "Ollama request timeout at {}",
                self.endpoint
            )),
            TransportError::Timeout(_) => GenerationError::api(format!(
                "Ollama request timeout after {attempts} attempts; the model may still be loading"
            )),
            TransportError::Connect(_) => GenerationError::api(format!(
                "Ollama is not running at {}; start it with `ollama serve`",
                self.endpoint
            )),
            TransportError::Other(msg) => {
                GenerationError::api(format!("Ollama request failed: {msg}"))
            }
        }
    }

    fn check_status(&self, response: HttpResponse) -> Result<String> {
        match response.status {
            401 => Err(GenerationError::Authentication(
                "Ollama rejected the request credentials".to_string(),
            )),
            429 => Err(GenerationError::RateLimit(
                "Ollama is overloaded, try again later".to_string(),
            )),
            _ if !response.is_success() => Err(GenerationError::api_status(
                response.status,
                &response.body,
            )),
            _ => Ok(response.body),
        }
    }
}

#[async_trait]
impl ContentProvider for OllamaAdapter {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn is_available(&self) -> bool {
        match self.list_models().await {
            Ok(models) if models.is_empty() => {
                debug!(endpoint = %self.endpoint, "Ollama has no models installed");
                false
            }
            Ok(models) => {
                if !Self::has_model(&models, &self.model) {
                    warn!(
                        model = %self.model,
                        installed = ?models,
                        "configured Ollama model is not installed"
                    );
                }
                true
            }
            Err(e) => {
                debug!(error = %e, "Ollama availability probe failed");
                false
            }
        }
    }

    async fn generate_description(&self, ctx: &GenerationContext) -> Result<String> {
        self.generate_text(&prompts::description_prompt(ctx), prompts::DESCRIPTION_PARAMS)
            .await
    }

    async fn generate_topics(&self, ctx: &GenerationContext) -> Result<Vec<String>> {
        let text = self
            .generate_text(&prompts::topics_prompt(ctx), prompts::TOPICS_PARAMS)
            .await?;
        Ok(normalizer::parse_topics(&text, MAX_AI_TOPICS))
    }

    async fn generate_readme(&self, ctx: &GenerationContext) -> Result<String> {
        self.generate_text(&prompts::readme_prompt(ctx), prompts::README_PARAMS)
            .await
    }
}

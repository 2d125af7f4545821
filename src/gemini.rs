//! Cloud content provider backed by the Google Gemini REST API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::context::GenerationContext;
use crate::error::{GenerationError, Result};
use crate::generator::ContentProvider;
use crate::http_client::{HttpClient, HttpResponse, ReqwestHttpClient, TransportError};
use crate::normalizer::{self, MAX_AI_TOPICS};
use crate::prompts::{self, GenerationParams};
use crate::providers::{Sleeper, TokioSleeper};
use crate::retry::{send_with_retry, Backoff, RetryPolicy};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

const RETRY_POLICY: RetryPolicy = RetryPolicy::new(3, Backoff::Exponential { base_secs: 2 });

/// Everything needed to talk to Gemini, resolved before construction.
#[derive(Debug, Clone, PartialEq)]
pub struct GeminiSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub request_timeout: Duration,
    pub probe_timeout: Duration,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
    top_p: f64,
    top_k: u32,
}

#[derive(Deserialize, Default)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .unwrap_or_default()
    }
}

/// Gemini adapter.
///
/// Generation requests time out after 30 seconds and are retried up to three
/// times with exponential backoff (2s, 4s, 8s). The availability probe is a
/// single GET against the model-info endpoint.
pub struct GeminiAdapter {
    http: Arc<dyn HttpClient>,
    sleeper: Arc<dyn Sleeper>,
    api_key: String,
    model: String,
    base_url: String,
    request_timeout: Duration,
    probe_timeout: Duration,
    retry: RetryPolicy,
}

impl GeminiAdapter {
    /// Fails with [`GenerationError::Configuration`] when no API key is set.
    pub fn new(settings: &GeminiSettings) -> Result<Self> {
        Self::with_clients(settings, Arc::new(ReqwestHttpClient::new()), Arc::new(TokioSleeper))
    }

    pub fn with_clients(
        settings: &GeminiSettings,
        http: Arc<dyn HttpClient>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self> {
        let api_key = settings
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                GenerationError::Configuration(
                    "no Gemini API key found; run `reposeed --set-gemini-key <key>` \
                     or export GEMINI_API_KEY"
                        .to_string(),
                )
            })?
            .to_string();

        info!(model = %settings.model, "Gemini adapter initialized");

        Ok(Self {
            http,
            sleeper,
            api_key,
            model: settings.model.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            request_timeout: settings.request_timeout,
            probe_timeout: settings.probe_timeout,
            retry: RETRY_POLICY,
        })
    }

    fn model_url(&self) -> String {
        format!("{}/{}?key={}", self.base_url, self.model, self.api_key)
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }

    async fn generate_text(&self, prompt: &str, params: GenerationParams) -> Result<String> {
        let url = self.generate_url();
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_tokens,
                top_p: params.top_p,
                top_k: params.top_k,
            },
        };
        let body = serde_json::to_value(&request)
            .map_err(|e| GenerationError::api(format!("failed to encode Gemini request: {e}")))?;

        debug!(
            model = %self.model,
            prompt_len = prompt.len(),
            max_tokens = params.max_tokens,
            "invoking Gemini API"
        );

        let response = send_with_retry(&self.retry, self.sleeper.as_ref(), "gemini", || {
            self.http.post_json(&url, &[], &body, self.request_timeout)
        })
        .await
        .map_err(|e| self.translate_transport(e))?;

        let text = Self::extract_text(response)?;
        info!(response_len = text.len(), model = %self.model, "Gemini response received");
        Ok(normalizer::clean(&text))
    }

    fn translate_transport(&self, err: TransportError) -> GenerationError {
        match err {
            TransportError::Timeout(_) => GenerationError::api(format!(
                "Gemini API request timeout after {} attempts",
                self.retry.max_attempts()
            )),
            TransportError::Connect(msg) => {
                GenerationError::api(format!("could not connect to Gemini API: {msg}"))
            }
            TransportError::Other(msg) => {
                GenerationError::api(format!("Gemini API request failed: {msg}"))
            }
        }
    }

    fn extract_text(response: HttpResponse) -> Result<String> {
        match response.status {
            401 => Err(GenerationError::Authentication(
                "Gemini rejected the API key".to_string(),
            )),
            429 => Err(GenerationError::RateLimit(
                "Gemini API quota exhausted, try again later".to_string(),
            )),
            _ if !response.is_success() => Err(GenerationError::api_status(
                response.status,
                &response.body,
            )),
            _ => {
                let parsed: GenerateResponse = serde_json::from_str(&response.body).map_err(|e| {
                    GenerationError::api(format!("failed to parse Gemini response: {e}"))
                })?;
                Ok(parsed.into_text())
            }
        }
    }
}

#[async_trait]
impl ContentProvider for GeminiAdapter {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn is_available(&self) -> bool {
        match self.http.get(&self.model_url(), &[], self.probe_timeout).await {
            Ok(response) if response.is_success() => true,
            Ok(response) => {
                debug!(status = response.status, "Gemini availability probe rejected");
                false
            }
            Err(e) => {
                debug!(error = %e, "Gemini availability probe failed");
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::testing::ScriptedHttpClient;
    use crate::providers::testing::RecordingSleeper;
    use serde_json::json;

    fn settings() -> GeminiSettings {
        GeminiSettings {
            api_key: Some("test-key".to_string()),
            base_url: "https://gemini.test/v1beta/models".to_string(),
            ..GeminiSettings::default()
        }
    }

    fn adapter(http: ScriptedHttpClient) -> (GeminiAdapter, Arc<ScriptedHttpClient>, Arc<RecordingSleeper>) {
        let http = Arc::new(http);
        let sleeper = Arc::new(RecordingSleeper::new());
        let adapter = GeminiAdapter::with_clients(&settings(), http.clone(), sleeper.clone())
            .expect("settings carry a key");
        (adapter, http, sleeper)
    }

    fn envelope(text: &str) -> serde_json::Value {
        json!({"candidates": [{"content": {"parts": [{"text": text}]}}]})
    }

    fn ctx() -> GenerationContext {
        GenerationContext::new("api-server").with_language("ruby")
    }

    // =========================================================================
    // Construction
    // =========================================================================

    #[test]
    fn test_new_without_key_is_configuration_error() {
        let err = GeminiAdapter::new(&GeminiSettings::default()).err().unwrap();
        assert!(matches!(err, GenerationError::Configuration(_)));
    }

    #[test]
    fn test_new_with_blank_key_is_configuration_error() {
        let settings = GeminiSettings {
            api_key: Some("   ".to_string()),
            ..GeminiSettings::default()
        };
        assert!(matches!(
            GeminiAdapter::new(&settings),
            Err(GenerationError::Configuration(_))
        ));
    }

    // =========================================================================
    // Generation
    // =========================================================================

    #[tokio::test]
    async fn test_description_strips_code_fence() {
        let (adapter, _, _) = adapter(ScriptedHttpClient::new().respond_json(200, envelope("```\nX\n```")));
        assert_eq!(adapter.generate_description(&ctx()).await.unwrap(), "X");
    }

    #[tokio::test]
    async fn test_request_shape() {
        let (adapter, http, _) = adapter(ScriptedHttpClient::new().respond_json(200, envelope("ok")));
        adapter.generate_description(&ctx()).await.unwrap();

        let request = &http.requests()[0];
        assert_eq!(request.method, "POST");
        assert_eq!(
            request.url,
            "https://gemini.test/v1beta/models/gemini-1.5-flash:generateContent?key=test-key"
        );
        assert_eq!(request.timeout, Duration::from_secs(30));

        let body = request.body.as_ref().unwrap();
        let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.contains("Name: api-server"));
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 100);
        assert_eq!(body["generationConfig"]["topK"], 40);
        assert!(body["generationConfig"]["temperature"].is_number());
        assert!(body["generationConfig"]["topP"].is_number());
    }

    #[tokio::test]
    async fn test_topics_are_parsed() {
        let (adapter, _, _) =
            adapter(ScriptedHttpClient::new().respond_json(200, envelope("Ruby, API, ruby, Web Server")));
        assert_eq!(
            adapter.generate_topics(&ctx()).await.unwrap(),
            vec!["ruby", "api", "web-server"]
        );
    }

    #[tokio::test]
    async fn test_missing_text_yields_empty_string() {
        let (adapter, _, _) = adapter(ScriptedHttpClient::new().respond_json(200, json!({"candidates": []})));
        assert_eq!(adapter.generate_readme(&ctx()).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_invalid_json_is_api_error() {
        let (adapter, _, _) = adapter(ScriptedHttpClient::new().respond(200, "<html>"));
        assert!(matches!(
            adapter.generate_description(&ctx()).await,
            Err(GenerationError::Api { .. })
        ));
    }

    // =========================================================================
    // Error translation
    // =========================================================================

    #[tokio::test]
    async fn test_401_is_authentication_error() {
        let (adapter, _, _) = adapter(ScriptedHttpClient::new().respond(401, "bad key"));
        assert!(matches!(
            adapter.generate_description(&ctx()).await,
            Err(GenerationError::Authentication(_))
        ));
    }

    #[tokio::test]
    async fn test_429_is_rate_limit_error() {
        let (adapter, _, _) = adapter(ScriptedHttpClient::new().respond(429, "slow down"));
        assert!(matches!(
            adapter.generate_description(&ctx()).await,
            Err(GenerationError::RateLimit(_))
        ));
    }

    #[tokio::test]
    async fn test_other_status_carries_code_and_body() {
        let (adapter, http, _) = adapter(ScriptedHttpClient::new().respond(500, "internal oops"));
        let err = adapter.generate_description(&ctx()).await.unwrap_err();

        assert_eq!(err.status(), Some(500));
        assert!(err.to_string().contains("internal oops"));
        assert_eq!(http.request_count(), 1);
    }

    #[tokio::test]
    async fn test_timeouts_retry_with_exponential_backoff() {
        let (adapter, http, sleeper) = adapter(
            ScriptedHttpClient::new()
                .time_out()
                .time_out()
                .time_out()
                .time_out(),
        );
        let err = adapter.generate_description(&ctx()).await.unwrap_err();

        assert!(matches!(err, GenerationError::Api { .. }));
        assert!(err.to_string().contains("timeout"));
        assert_eq!(http.request_count(), 4);
        assert_eq!(
            sleeper.delays(),
            vec![
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8)
            ]
        );
    }

    #[tokio::test]
    async fn test_single_timeout_then_success() {
        let (adapter, _, _) =
            adapter(ScriptedHttpClient::new().time_out().respond_json(200, envelope("Recovered")));
        assert_eq!(adapter.generate_description(&ctx()).await.unwrap(), "Recovered");
    }

    #[tokio::test]
    async fn test_connection_failure_is_api_error() {
        let (adapter, http, _) = adapter(ScriptedHttpClient::new().refuse());
        let err = adapter.generate_description(&ctx()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Api { status: None, .. }));
        assert_eq!(http.request_count(), 1);
    }

    // =========================================================================
    // Availability
    // =========================================================================

    #[tokio::test]
    async fn test_available_when_model_info_succeeds() {
        let (adapter, http, _) = adapter(ScriptedHttpClient::new().respond(200, "{}"));
        assert!(adapter.is_available().await);

        let request = &http.requests()[0];
        assert_eq!(request.method, "GET");
        assert_eq!(
            request.url,
            "https://gemini.test/v1beta/models/gemini-1.5-flash?key=test-key"
        );
        assert_eq!(request.timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_unavailable_on_error_status() {
        let (adapter, _, _) = adapter(ScriptedHttpClient::new().respond(403, "denied"));
        assert!(!adapter.is_available().await);
    }

    #[tokio::test]
    async fn test_probe_never_retries_or_panics() {
        let (adapter, http, sleeper) = adapter(ScriptedHttpClient::new().time_out());
        assert!(!adapter.is_available().await);
        assert_eq!(http.request_count(), 1);
        assert!(sleeper.delays().is_empty());
    }
}

//! Provider selection and per-field generation with template fallback.
//!
//! A [`ContentGenerator`] settles on one backend when it is built (an AI
//! adapter, or templates only) and then generates the description, topics,
//! and README independently. A failing AI call only affects its own field,
//! which is filled from [`TemplateGenerator`] instead.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::context::{GeneratedContent, GenerationContext};
use crate::error::{GenerationError, Result};
use crate::gemini::{GeminiAdapter, GeminiSettings};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::ollama::{OllamaAdapter, OllamaSettings};
use crate::providers::{Sleeper, TokioSleeper};
use crate::templates::TemplateGenerator;

/// Capabilities every AI backend offers.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Short backend identifier, e.g. "gemini".
    fn name(&self) -> &str;

    /// Cheap reachability check. Never fails, only answers.
    async fn is_available(&self) -> bool;

    async fn generate_description(&self, ctx: &GenerationContext) -> Result<String>;

    async fn generate_topics(&self, ctx: &GenerationContext) -> Result<Vec<String>>;

    async fn generate_readme(&self, ctx: &GenerationContext) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    Ollama,
}

impl ProviderKind {
    /// Probe order used by auto-detection.
    pub const AUTO_ORDER: [ProviderKind; 2] = [ProviderKind::Gemini, ProviderKind::Ollama];
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Gemini => write!(f, "gemini"),
            ProviderKind::Ollama => write!(f, "ollama"),
        }
    }
}

/// How the caller wants the backend chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderChoice {
    /// Probe Gemini, then Ollama; first available wins.
    #[default]
    Auto,
    /// Use this backend if it is configured and reachable.
    Named(ProviderKind),
    /// Templates only, no probing.
    Disabled,
}

impl ProviderChoice {
    /// `None` means auto-detect.
    pub fn parse(selector: Option<&str>) -> Result<Self> {
        match selector {
            None => Ok(ProviderChoice::Auto),
            Some(value) => value.parse(),
        }
    }
}

impl FromStr for ProviderChoice {
    type Err = GenerationError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "" | "auto" => Ok(ProviderChoice::Auto),
            "gemini" | "cloud" => Ok(ProviderChoice::Named(ProviderKind::Gemini)),
            "ollama" | "local" => Ok(ProviderChoice::Named(ProviderKind::Ollama)),
            "none" | "false" | "off" | "template" => Ok(ProviderChoice::Disabled),
            _ => Err(GenerationError::UnknownProvider(value.to_string())),
        }
    }
}

/// Resolved configuration for every adapter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AiSettings {
    pub gemini: GeminiSettings,
    pub ollama: OllamaSettings,
}

/// Builds adapters on demand during provider selection.
pub trait ProviderFactory: Send + Sync {
    fn build(&self, kind: ProviderKind) -> Result<Box<dyn ContentProvider>>;
}

/// Production factory: real HTTP adapters sharing one client.
pub struct HttpProviderFactory {
    settings: AiSettings,
    http: Arc<dyn HttpClient>,
    sleeper: Arc<dyn Sleeper>,
}

impl HttpProviderFactory {
    pub fn new(settings: AiSettings) -> Self {
        Self::with_clients(settings, Arc::new(ReqwestHttpClient::new()), Arc::new(TokioSleeper))
    }

    pub fn with_clients(
        settings: AiSettings,
        http: Arc<dyn HttpClient>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            settings,
            http,
            sleeper,
        }
    }
}

impl ProviderFactory for HttpProviderFactory {
    fn build(&self, kind: ProviderKind) -> Result<Box<dyn ContentProvider>> {
        let http = self.http.clone();
        let sleeper = self.sleeper.clone();
        Ok(match kind {
            ProviderKind::Gemini => Box::new(GeminiAdapter::with_clients(
                &self.settings.gemini,
                http,
                sleeper,
            )?),
            ProviderKind::Ollama => Box::new(OllamaAdapter::with_clients(
                &self.settings.ollama,
                http,
                sleeper,
            )?),
        })
    }
}

/// The backend a generator settled on.
pub enum ActiveProvider {
    Ai(Box<dyn ContentProvider>),
    Template,
}

/// Orchestrates generation of all content fields for one repository.
pub struct ContentGenerator {
    provider: ActiveProvider,
    templates: TemplateGenerator,
}

impl ContentGenerator {
    /// Parses the selector and selects a backend.
    ///
    /// The only error is an unrecognised selector. Missing credentials or an
    /// unreachable backend quietly select templates.
    pub async fn from_selector(selector: Option<&str>, settings: AiSettings) -> Result<Self> {
        let choice = ProviderChoice::parse(selector)?;
        Ok(Self::with_factory(choice, &HttpProviderFactory::new(settings)).await)
    }

    pub async fn with_factory(choice: ProviderChoice, factory: &dyn ProviderFactory) -> Self {
        let provider = match choice {
            ProviderChoice::Disabled => {
                info!("AI generation disabled, using templates");
                ActiveProvider::Template
            }
            ProviderChoice::Named(kind) => Self::try_provider(kind, factory)
                .await
                .map_or(ActiveProvider::Template, ActiveProvider::Ai),
            ProviderChoice::Auto => {
                let mut selected = ActiveProvider::Template;
                for kind in ProviderKind::AUTO_ORDER {
                    if let Some(provider) = Self::try_provider(kind, factory).await {
                        selected = ActiveProvider::Ai(provider);
                        break;
                    }
                }
                selected
            }
        };

        match &provider {
            ActiveProvider::Ai(p) => info!(provider = p.name(), "AI provider selected"),
            ActiveProvider::Template => info!("no AI provider available, using templates"),
        }

        Self {
            provider,
            templates: TemplateGenerator::new(),
        }
    }

    /// Generator that never touches the network.
    pub fn template_only() -> Self {
        Self {
            provider: ActiveProvider::Template,
            templates: TemplateGenerator::new(),
        }
    }

    async fn try_provider(
        kind: ProviderKind,
        factory: &dyn ProviderFactory,
    ) -> Option<Box<dyn ContentProvider>> {
        match factory.build(kind) {
            Ok(provider) if provider.is_available().await => Some(provider),
            Ok(_) => {
                warn!(provider = %kind, "AI provider is not reachable");
                None
            }
            Err(e) => {
                warn!(provider = %kind, error = %e, "AI provider could not be configured");
                None
            }
        }
    }

    pub fn is_ai_enabled(&self) -> bool {
        matches!(self.provider, ActiveProvider::Ai(_))
    }

    /// "template" when no AI backend is active.
    pub fn provider_name(&self) -> &str {
        match &self.provider {
            ActiveProvider::Ai(p) => p.name(),
            ActiveProvider::Template => "template",
        }
    }

    /// Generates all three fields. Never fails: any backend error is
    /// replaced by template output for the affected field.
    pub async fn generate(&self, ctx: &GenerationContext) -> GeneratedContent {
        let (description, topics, readme) =
            tokio::join!(self.description(ctx), self.topics(ctx), self.readme(ctx));

        GeneratedContent {
            name: ctx.name.clone(),
            description,
            topics,
            readme,
        }
    }

    async fn description(&self, ctx: &GenerationContext) -> String {
        if let ActiveProvider::Ai(provider) = &self.provider {
            match provider.generate_description(ctx).await {
                Ok(text) if !text.trim().is_empty() => return text,
                Ok(_) => fallback_warning(provider.as_ref(), "description", "empty response"),
                Err(e) => fallback_warning(provider.as_ref(), "description", &e.to_string()),
            }
        }
        self.templates.description(ctx)
    }

    async fn topics(&self, ctx: &GenerationContext) -> Vec<String> {
        if let ActiveProvider::Ai(provider) = &self.provider {
            match provider.generate_topics(ctx).await {
                Ok(topics) if !topics.is_empty() => return topics,
                Ok(_) => fallback_warning(provider.as_ref(), "topics", "empty response"),
                Err(e) => fallback_warning(provider.as_ref(), "topics", &e.to_string()),
            }
        }
        self.templates.topics(ctx)
    }

    async fn readme(&self, ctx: &GenerationContext) -> String {
        if let ActiveProvider::Ai(provider) = &self.provider {
            match provider.generate_readme(ctx).await {
                Ok(text) if !text.trim().is_empty() => return text,
                Ok(_) => fallback_warning(provider.as_ref(), "readme", "empty response"),
                Err(e) => fallback_warning(provider.as_ref(), "readme", &e.to_string()),
            }
        }
        self.templates.readme(ctx)
    }
}

fn fallback_warning(provider: &dyn ContentProvider, field: &str, reason: &str) {
    warn!(
        provider = provider.name(),
        field,
        reason,
        "AI generation failed, falling back to template"
    );
}

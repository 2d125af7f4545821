//! Reposeed - GitHub repository bootstrapping with AI-drafted content.
//!
//! Given a repository name and a few optional facts (language, framework,
//! purpose), reposeed drafts a description, a topic list and a README, then
//! creates the repository on GitHub and uploads them.
//!
//! Content comes from one of two AI backends, or from deterministic
//! templates when neither is usable:
//!
//! - **Gemini** (cloud, needs an API key)
//! - **Ollama** (local, needs a running server and a pulled model)
//!
//! Each field falls back to templates on its own, so a README that times
//! out does not throw away a description that succeeded.
//!
//! # Architecture
//!
//! - [`generator`] - Provider selection and per-field orchestration
//! - [`gemini`] / [`ollama`] - HTTP adapters for each backend
//! - [`templates`] - Template fallback generator
//! - [`normalizer`] - Cleanup of raw model output and topic lists
//! - [`prompts`] - Prompt text and sampling parameters per field
//! - [`retry`] - Bounded retry with exponential or linear backoff
//! - [`github`] - Repository creation client
//! - [`creator`] - The end-to-end workflow behind the CLI
//! - [`prompt_ui`] - Interactive questions and the preview
//! - [`config`] - Config file and environment resolution
//! - [`providers`] - Shared dependency injection traits
//! - [`http_client`] - HTTP client abstraction
//!
//! # Example
//!
//! ```no_run
//! use reposeed::context::GenerationContext;
//! use reposeed::generator::ContentGenerator;
//! use reposeed::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let generator = ContentGenerator::from_selector(Some("auto"), config.ai_settings()).await?;
//!
//!     let ctx = GenerationContext::new("api-server")
//!         .with_language("ruby")
//!         .with_framework("sinatra");
//!     let content = generator.generate(&ctx).await;
//!
//!     println!("{} via {}", content.description, generator.provider_name());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod context;
pub mod creator;
pub mod error;
pub mod gemini;
pub mod generator;
pub mod github;
pub mod http_client;
pub mod normalizer;
pub mod ollama;
pub mod prompt_ui;
pub mod prompts;
pub mod providers;
pub mod retry;
pub mod templates;

use anyhow::{anyhow, Context, Result};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::gemini::GeminiSettings;
use crate::generator::AiSettings;
use crate::ollama::OllamaSettings;

pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const GOOGLE_API_KEY_VAR: &str = "GOOGLE_API_KEY";
pub const GEMINI_MODEL_VAR: &str = "GEMINI_MODEL";
pub const OLLAMA_HOST_VAR: &str = "OLLAMA_HOST";
pub const OLLAMA_MODEL_VAR: &str = "OLLAMA_MODEL";
pub const GITHUB_TOKEN_VAR: &str = "GITHUB_TOKEN";
pub const PROVIDER_VAR: &str = "REPOSEED_PROVIDER";

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default)]
    pub gemini_model: Option<String>,
    #[serde(default)]
    pub ollama_endpoint: Option<String>,
    #[serde(default)]
    pub ollama_model: Option<String>,
    #[serde(default)]
    pub github_token: Option<String>,
    /// Provider selector: gemini, ollama, auto or none.
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub private: bool,
}

impl Config {
    /// Load configuration from file, or create default.
    ///
    /// Values in the file win over environment variables, which only fill
    /// the gaps (see [`Config::with_env`]).
    pub fn load() -> Result<Self> {
        let config = Self::load_or_default(&Self::get_config_path()?)?;
        Ok(config.with_env(|key| std::env::var(key).ok()))
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("could not read config file {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("invalid config file {}", path.display()))?;
            info!("Loaded config from: {}", path.display());
            Ok(config)
        } else {
            Err(anyhow!("Config file not found"))
        }
    }

    /// Like [`Config::load_from_path`], but a missing file means defaults.
    /// A file that exists and does not parse is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from_path(path)
        } else {
            info!("No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Fills unset fields from the environment through `lookup`.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        fill(&mut self.gemini_api_key, || {
            get(GEMINI_API_KEY_VAR).or_else(|| get(GOOGLE_API_KEY_VAR))
        });
        fill(&mut self.gemini_model, || get(GEMINI_MODEL_VAR));
        fill(&mut self.ollama_endpoint, || get(OLLAMA_HOST_VAR));
        fill(&mut self.ollama_model, || get(OLLAMA_MODEL_VAR));
        fill(&mut self.github_token, || get(GITHUB_TOKEN_VAR));
        fill(&mut self.provider, || get(PROVIDER_VAR));
        self
    }

    /// Adapter settings with defaults for anything left unset.
    pub fn ai_settings(&self) -> AiSettings {
        let mut gemini = GeminiSettings {
            api_key: self.gemini_api_key.clone(),
            ..GeminiSettings::default()
        };
        if let Some(model) = &self.gemini_model {
            gemini.model = model.clone();
        }

        let mut ollama = OllamaSettings::default();
        if let Some(endpoint) = &self.ollama_endpoint {
            ollama.endpoint = normalize_endpoint(endpoint);
        }
        if let Some(model) = &self.ollama_model {
            ollama.model = model.clone();
        }

        AiSettings { gemini, ollama }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::get_config_path()?)
    }

    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(config_path, content)?;
        info!("Saved config to: {}", config_path.display());
        Ok(())
    }

    fn get_config_path() -> Result<PathBuf> {
        Ok(Self::get_config_dir()?.join("config.toml"))
    }

    pub fn get_config_dir() -> Result<PathBuf> {
        let home = home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
        Ok(home.join(".reposeed"))
    }

    /// Set the Gemini API key and save the file.
    ///
    /// Starts from the file contents, not the environment, so env values
    /// never get persisted by accident.
    pub fn set_gemini_api_key(api_key: String) -> Result<()> {
        Self::update_file(&Self::get_config_path()?, |config| {
            config.gemini_api_key = Some(api_key)
        })?;
        info!("Gemini API key saved to config file");
        Ok(())
    }

    pub fn set_github_token(token: String) -> Result<()> {
        Self::update_file(&Self::get_config_path()?, |config| {
            config.github_token = Some(token)
        })?;
        info!("GitHub token saved to config file");
        Ok(())
    }

    /// Applies `change` to the file at `path` and writes it back. Refuses to
    /// touch a file it cannot parse.
    pub fn update_file<F>(path: &Path, change: F) -> Result<()>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = Self::load_or_default(path)?;
        change(&mut config);
        config.save_to_path(path)
    }

    pub fn show_config_info() -> Result<()> {
        let config_path = Self::get_config_path()?;
        println!("Configuration file: {}", config_path.display());

        if config_path.exists() {
            println!("Status: Found");
        } else {
            println!("Status: Not found (using defaults)");
        }

        let config = Self::load()?;
        let settings = config.ai_settings();
        println!("Gemini API key: {}", set_or_not(&config.gemini_api_key));
        println!("Gemini model: {}", settings.gemini.model);
        println!("Ollama endpoint: {}", settings.ollama.endpoint);
        println!("Ollama model: {}", settings.ollama.model);
        println!("GitHub token: {}", set_or_not(&config.github_token));
        println!(
            "Provider: {}",
            config.provider.as_deref().unwrap_or("auto")
        );

        println!("\nTo set credentials:");
        println!("  reposeed --set-gemini-key <your-key>");
        println!("  reposeed --set-github-token <your-token>");
        println!("\nOr set environment variables:");
        println!("  export {GEMINI_API_KEY_VAR}=<your-key>");
        println!("  export {GITHUB_TOKEN_VAR}=<your-token>");

        Ok(())
    }
}

fn fill<F>(slot: &mut Option<String>, source: F)
where
    F: FnOnce() -> Option<String>,
{
    if slot.as_deref().is_none_or(|v| v.trim().is_empty()) {
        *slot = source();
    }
}

fn set_or_not(value: &Option<String>) -> &'static str {
    if value.is_some() { "Set" } else { "Not set" }
}

/// OLLAMA_HOST is often given as a bare `host:port`.
fn normalize_endpoint(endpoint: &str) -> String {
    let endpoint = endpoint.trim();
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("http://{endpoint}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_env_fills_missing_values() {
        let config = Config::default().with_env(env(&[
            (GEMINI_API_KEY_VAR, "env-key"),
            (OLLAMA_HOST_VAR, "gpu-box:11434"),
            (OLLAMA_MODEL_VAR, "llama3"),
            (GITHUB_TOKEN_VAR, "ghp_env"),
        ]));

        assert_eq!(config.gemini_api_key.as_deref(), Some("env-key"));
        assert_eq!(config.github_token.as_deref(), Some("ghp_env"));

        let settings = config.ai_settings();
        assert_eq!(settings.ollama.endpoint, "http://gpu-box:11434");
        assert_eq!(settings.ollama.model, "llama3");
    }

    #[test]
    fn test_explicit_values_win_over_env() {
        let config = Config {
            gemini_api_key: Some("file-key".to_string()),
            ollama_model: Some("phi3".to_string()),
            ..Config::default()
        }
        .with_env(env(&[
            (GEMINI_API_KEY_VAR, "env-key"),
            (OLLAMA_MODEL_VAR, "llama3"),
        ]));

        assert_eq!(config.gemini_api_key.as_deref(), Some("file-key"));
        assert_eq!(config.ollama_model.as_deref(), Some("phi3"));
    }

    #[test]
    fn test_google_api_key_is_secondary() {
        let config = Config::default().with_env(env(&[(GOOGLE_API_KEY_VAR, "google")]));
        assert_eq!(config.gemini_api_key.as_deref(), Some("google"));

        let both = Config::default().with_env(env(&[
            (GOOGLE_API_KEY_VAR, "google"),
            (GEMINI_API_KEY_VAR, "gemini"),
        ]));
        assert_eq!(both.gemini_api_key.as_deref(), Some("gemini"));
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let config = Config::default().with_env(env(&[(GEMINI_API_KEY_VAR, "  ")]));
        assert!(config.gemini_api_key.is_none());
    }

    #[test]
    fn test_ai_settings_defaults() {
        let settings = Config::default().ai_settings();

        assert!(settings.gemini.api_key.is_none());
        assert_eq!(settings.gemini.model, "gemini-1.5-flash");
        assert_eq!(settings.gemini.request_timeout, Duration::from_secs(30));
        assert_eq!(settings.ollama.endpoint, "http://localhost:11434");
        assert_eq!(settings.ollama.model, "mistral");
        assert_eq!(settings.ollama.request_timeout, Duration::from_secs(45));
    }

    #[test]
    fn test_save_and_load_roundtrip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            gemini_api_key: Some("abc".to_string()),
            provider: Some("ollama".to_string()),
            license: Some("Apache-2.0".to_string()),
            private: true,
            ..Config::default()
        };

        config.save_to_path(&path)?;
        let loaded = Config::load_from_path(&path)?;

        assert_eq!(loaded, config);
        Ok(())
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_path(&dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn test_missing_file_loads_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let loaded = Config::load_or_default(&dir.path().join("absent.toml"))?;
        assert_eq!(loaded, Config::default());
        Ok(())
    }

    #[test]
    fn test_update_file_keeps_other_settings() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, "github_token = \"ghp_keep\"\nollama_model = \"llama3\"\n")?;

        Config::update_file(&path, |config| config.gemini_api_key = Some("new".to_string()))?;

        let loaded = Config::load_from_path(&path)?;
        assert_eq!(loaded.gemini_api_key.as_deref(), Some("new"));
        assert_eq!(loaded.github_token.as_deref(), Some("ghp_keep"));
        assert_eq!(loaded.ollama_model.as_deref(), Some("llama3"));
        Ok(())
    }

    #[test]
    fn test_update_file_refuses_unparseable_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.toml");
        let broken = "github_token = \"ghp_keep\"\nollama_model = \"llama3\"\nprivate = yes\n";
        fs::write(&path, broken)?;

        let err = Config::update_file(&path, |config| config.gemini_api_key = Some("new".to_string()))
            .unwrap_err();

        assert!(format!("{err:#}").contains("invalid config file"));
        assert_eq!(fs::read_to_string(&path)?, broken);
        assert!(Config::load_or_default(&path).is_err());
        Ok(())
    }

    #[test]
    fn test_partial_file_uses_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, "ollama_model = \"codellama\"\n")?;

        let loaded = Config::load_from_path(&path)?;
        assert_eq!(loaded.ollama_model.as_deref(), Some("codellama"));
        assert!(!loaded.private);
        assert!(loaded.gemini_api_key.is_none());
        Ok(())
    }
}

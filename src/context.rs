//! Input and output records for content generation.

use serde::{Deserialize, Serialize};

/// What the caller knows about the repository to create.
///
/// Optional fields that are blank are treated as absent everywhere, so
/// values coming straight from an interactive prompt can be stored as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationContext {
    pub name: String,
    pub language: Option<String>,
    pub framework: Option<String>,
    pub purpose: Option<String>,
    pub license: Option<String>,
}

impl GenerationContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            ..Self::default()
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = non_blank(language.into());
        self
    }

    pub fn with_framework(mut self, framework: impl Into<String>) -> Self {
        self.framework = non_blank(framework.into());
        self
    }

    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = non_blank(purpose.into());
        self
    }

    pub fn with_license(mut self, license: impl Into<String>) -> Self {
        self.license = non_blank(license.into());
        self
    }

    pub fn language(&self) -> Option<&str> {
        present(&self.language)
    }

    pub fn framework(&self) -> Option<&str> {
        present(&self.framework)
    }

    pub fn purpose(&self) -> Option<&str> {
        present(&self.purpose)
    }

    pub fn license(&self) -> Option<&str> {
        present(&self.license)
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Everything needed to populate a new repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub name: String,
    pub description: String,
    pub topics: Vec<String>,
    pub readme: String,
}

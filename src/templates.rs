//! Deterministic content generation used when no AI backend is active or a
//! backend call fails.
//!
//! Output depends only on the [`GenerationContext`]; there is no I/O and no
//! state carried between calls.

use crate::context::GenerationContext;
use crate::normalizer::dedup_topics;

/// Upper bound on template topics.
pub const MAX_TEMPLATE_TOPICS: usize = 8;

const DEFAULT_LICENSE: &str = "MIT";

/// Framework names that imply a web project.
const WEB_FRAMEWORKS: &[&str] = &[
    "rails", "sinatra", "django", "flask", "fastapi", "express", "next", "nuxt", "laravel",
    "phoenix", "spring", "actix", "axum", "rocket",
];

/// Keyword topics added when the name or framework contains one of the markers.
const KEYWORD_TOPICS: &[(&str, &[&str])] = &[
    ("api", &["api"]),
    ("web", &["web"]),
    ("cli", &["cli", "command"]),
    ("tool", &["tool", "util"]),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateGenerator;

impl TemplateGenerator {
    pub fn new() -> Self {
        Self
    }

    /// "A {language} {framework} project for {purpose}", skipping absent parts.
    pub fn description(&self, ctx: &GenerationContext) -> String {
        let mut words = vec!["a"];
        words.extend(ctx.language());
        words.extend(ctx.framework());
        words.push("project");

        let mut sentence = words.join(" ");
        if let Some(purpose) = ctx.purpose() {
            sentence.push_str(" for ");
            sentence.push_str(purpose);
        }
        capitalize(&sentence)
    }

    pub fn topics(&self, ctx: &GenerationContext) -> Vec<String> {
        let name = ctx.name.to_lowercase();
        let framework = ctx.framework().map(str::to_lowercase).unwrap_or_default();

        let mut candidates: Vec<&str> = Vec::new();
        candidates.extend(ctx.language());
        candidates.extend(ctx.framework());

        for (topic, markers) in KEYWORD_TOPICS {
            let mut matched = markers
                .iter()
                .any(|m| name.contains(m) || framework.contains(m));
            if *topic == "web" {
                matched |= WEB_FRAMEWORKS.iter().any(|w| framework.contains(w));
            }
            if matched {
                candidates.push(*topic);
            }
        }

        dedup_topics(candidates, MAX_TEMPLATE_TOPICS)
    }

    pub fn readme(&self, ctx: &GenerationContext) -> String {
        let title = title_from_name(&ctx.name);
        let license = ctx.license().unwrap_or(DEFAULT_LICENSE);

        let installation = match ctx.language().and_then(install_command) {
            Some(command) => format!("```bash\n{command}\n```"),
            None => "See the project documentation for setup instructions.".to_string(),
        };

        format!(
            "# {title}\n\
             \n\
             {description}\n\
             \n\
             ## Installation\n\
             \n\
             {installation}\n\
             \n\
             ## Usage\n\
             \n\
             Usage instructions coming soon.\n\
             \n\
             ## Contributing\n\
             \n\
             1. Fork the repository\n\
             2. Create a feature branch (`git checkout -b feature/my-feature`)\n\
             3. Commit your changes (`git commit -m 'Add my feature'`)\n\
             4. Push to the branch (`git push origin feature/my-feature`)\n\
             5. Open a Pull Request\n\
             \n\
             ## License\n\
             \n\
             This project is licensed under the {license} License.\n",
            description = self.description(ctx),
        )
    }
}

fn install_command(language: &str) -> Option<&'static str> {
    match language.to_lowercase().as_str() {
        "ruby" => Some("bundle install"),
        "python" => Some("pip install -r requirements.txt"),
        "javascript" | "typescript" => Some("npm install"),
        "go" => Some("go mod download"),
        "rust" => Some("cargo build"),
        _ => None,
    }
}

/// "my-cool_app" -> "My Cool App"
pub fn title_from_name(name: &str) -> String {
    name.split(['-', '_'])
        .filter(|segment| !segment.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

//! Prompt text and sampling parameters for each generated field.

use crate::context::GenerationContext;
use crate::normalizer::MAX_AI_TOPICS;

/// Sampling parameters sent with one generation request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f64,
    pub max_tokens: u32,
    pub top_p: f64,
    pub top_k: u32,
}

pub const DESCRIPTION_PARAMS: GenerationParams = GenerationParams {
    temperature: 0.7,
    max_tokens: 100,
    top_p: 0.8,
    top_k: 40,
};

pub const TOPICS_PARAMS: GenerationParams = GenerationParams {
    temperature: 0.5,
    max_tokens: 60,
    top_p: 0.8,
    top_k: 40,
};

pub const README_PARAMS: GenerationParams = GenerationParams {
    temperature: 0.7,
    max_tokens: 2000,
    top_p: 0.9,
    top_k: 40,
};

fn project_details(ctx: &GenerationContext) -> String {
    let mut details = format!("Name: {}\n", ctx.name);
    if let Some(language) = ctx.language() {
        details.push_str(&format!("Language: {language}\n"));
    }
    if let Some(framework) = ctx.framework() {
        details.push_str(&format!("Framework: {framework}\n"));
    }
    if let Some(purpose) = ctx.purpose() {
        details.push_str(&format!("Purpose: {purpose}\n"));
    }
    details
}

pub fn description_prompt(ctx: &GenerationContext) -> String {
    format!(
        "Write a one-sentence GitHub repository description for this project.\n\n\
         {}\n\
         Rules:\n\
         - Maximum 120 characters\n\
         - No quotes, no markdown, no emojis\n\
         - Respond with the description only",
        project_details(ctx)
    )
}

pub fn topics_prompt(ctx: &GenerationContext) -> String {
    format!(
        "Suggest GitHub topics for this project.\n\n\
         {}\n\
         Rules:\n\
         - At most {MAX_AI_TOPICS} topics\n\
         - Lowercase, words joined with hyphens\n\
         - Respond with a single comma-separated line and nothing else",
        project_details(ctx)
    )
}

pub fn readme_prompt(ctx: &GenerationContext) -> String {
    let license = ctx.license().unwrap_or("MIT");
    format!(
        "Write a README.md in GitHub-flavored Markdown for this project.\n\n\
         {}\n\
         Include these sections: a title, a short description, Installation, \
         Usage, Contributing, and License (state that it is licensed under {license}).\n\
         Respond with the Markdown document only, without wrapping it in a code block.",
        project_details(ctx)
    )
}

use anyhow::{Context, Result, anyhow, bail};
use std::io::{self, BufRead, Write};
use tracing::{info, warn};

use crate::context::{GeneratedContent, GenerationContext};
use crate::generator::ContentGenerator;
use crate::github::{CreatedRepository, GitHubClient};
use crate::prompt_ui::PromptUI;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreateOptions {
    pub private: bool,
    /// Generate and preview only.
    pub dry_run: bool,
    /// Never prompt: optional fields stay empty and creation is confirmed.
    pub assume_yes: bool,
}

#[derive(Debug)]
pub enum CreationOutcome {
    Previewed(GeneratedContent),
    Cancelled,
    Created {
        repository: CreatedRepository,
        content: GeneratedContent,
    },
}

pub struct RepoCreator {
    generator: ContentGenerator,
    github: Option<GitHubClient>,
    ui: PromptUI,
}

impl RepoCreator {
    /// `github` may be `None` for dry runs; creating without it is an error.
    pub fn new(generator: ContentGenerator, github: Option<GitHubClient>) -> Self {
        Self {
            generator,
            github,
            ui: PromptUI::new(),
        }
    }

    pub async fn run(
        &self,
        ctx: GenerationContext,
        options: CreateOptions,
    ) -> Result<CreationOutcome> {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        self.run_with_io(ctx, options, &mut input, &mut io::stdout())
            .await
    }

    pub async fn run_with_io<R: BufRead, W: Write>(
        &self,
        ctx: GenerationContext,
        options: CreateOptions,
        input: &mut R,
        output: &mut W,
    ) -> Result<CreationOutcome> {
        let ctx = if options.assume_yes {
            if ctx.name.is_empty() {
                bail!("a repository name is required when prompts are disabled");
            }
            ctx
        } else {
            self.ui.complete_context_with_io(ctx, input, output)?
        };

        writeln!(
            output,
            "✨ Generating content with {}...",
            self.generator.provider_name()
        )?;
        let content = self.generator.generate(&ctx).await;
        self.ui
            .render_preview_with_io(&content, self.generator.provider_name(), output)?;

        if options.dry_run {
            info!(repo = %content.name, "dry run, nothing created");
            writeln!(output, "Dry run: no repository was created.")?;
            return Ok(CreationOutcome::Previewed(content));
        }

        if !options.assume_yes {
            let question = format!("Create repository '{}' on GitHub?", content.name);
            if !self.ui.confirm_with_io(&question, input, output)? {
                writeln!(output, "Cancelled.")?;
                return Ok(CreationOutcome::Cancelled);
            }
        }

        let github = self.github.as_ref().ok_or_else(|| {
            anyhow!("GitHub token not configured: run `reposeed --set-github-token <token>` or set GITHUB_TOKEN")
        })?;

        let repository = github
            .create_repository(&content.name, &content.description, options.private)
            .await
            .with_context(|| format!("failed to create repository '{}'", content.name))?;
        let owner = repository.owner.login.as_str();

        // The repository exists at this point; later failures only degrade it.
        if let Err(e) = github
            .set_topics(owner, &repository.name, &content.topics)
            .await
        {
            warn!(error = %e, "could not set repository topics");
            writeln!(output, "⚠️  Topics were not set: {e}")?;
        }
        if let Err(e) = github
            .upload_readme(owner, &repository.name, &content.readme)
            .await
        {
            warn!(error = %e, "could not upload README");
            writeln!(output, "⚠️  README was not uploaded: {e}")?;
        }

        writeln!(output, "✅ Created {}", repository.html_url)?;
        writeln!(output, "   git clone {}", repository.clone_url)?;
        Ok(CreationOutcome::Created {
            repository,
            content,
        })
    }
}

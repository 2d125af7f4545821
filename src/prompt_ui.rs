//! Interactive prompts for repository metadata and the pre-creation preview.
//!
//! Every prompt has a `_with_io` form taking any `BufRead`/`Write` pair so it
//! can be driven from tests; the plain forms use stdin/stdout.

use anyhow::{Result, bail};
use std::io::{self, BufRead, Write};
use tracing::debug;

use crate::context::{GeneratedContent, GenerationContext};

/// Lines of README shown in the preview before truncating.
const README_PREVIEW_LINES: usize = 20;

pub struct PromptUI;

impl PromptUI {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    // Core methods with I/O injection (testable)
    // =========================================================================

    /// Asks for whatever `ctx` is missing. The name is required and asked
    /// again until non-blank; the other fields accept an empty answer.
    pub fn complete_context_with_io<R: BufRead, W: Write>(
        &self,
        mut ctx: GenerationContext,
        input: &mut R,
        output: &mut W,
    ) -> Result<GenerationContext> {
        while ctx.name.is_empty() {
            let answer = self.ask(input, output, "Repository name")?;
            if answer.is_empty() {
                writeln!(output, "A repository name is required.")?;
            } else {
                ctx.name = answer;
            }
        }

        if ctx.language().is_none() {
            let answer = self.ask(input, output, "Primary language (optional)")?;
            ctx = ctx.with_language(answer);
        }
        if ctx.framework().is_none() {
            let answer = self.ask(input, output, "Framework (optional)")?;
            ctx = ctx.with_framework(answer);
        }
        if ctx.purpose().is_none() {
            let answer = self.ask(input, output, "What is it for? (optional)")?;
            ctx = ctx.with_purpose(answer);
        }

        debug!(name = %ctx.name, "repository context complete");
        Ok(ctx)
    }

    /// Writes the generated content the way it will land on GitHub.
    pub fn render_preview_with_io<W: Write>(
        &self,
        content: &GeneratedContent,
        provider: &str,
        output: &mut W,
    ) -> Result<()> {
        writeln!(output, "\n{}", "=".repeat(60))?;
        writeln!(output, "📦 {}", content.name)?;
        writeln!(output, "{}", "=".repeat(60))?;
        writeln!(output, "📝 Description: {}", content.description)?;
        if content.topics.is_empty() {
            writeln!(output, "🏷️  Topics: (none)")?;
        } else {
            writeln!(output, "🏷️  Topics: {}", content.topics.join(", "))?;
        }
        writeln!(output, "🤖 Generated by: {provider}")?;
        writeln!(output, "{}", "-".repeat(60))?;

        let lines: Vec<&str> = content.readme.lines().collect();
        for line in lines.iter().take(README_PREVIEW_LINES) {
            writeln!(output, "  {line}")?;
        }
        if lines.len() > README_PREVIEW_LINES {
            writeln!(
                output,
                "  ... ({} more lines)",
                lines.len() - README_PREVIEW_LINES
            )?;
        }
        writeln!(output, "{}", "=".repeat(60))?;
        Ok(())
    }

    /// y/N question. Anything but an explicit yes declines, including EOF.
    pub fn confirm_with_io<R: BufRead, W: Write>(
        &self,
        question: &str,
        input: &mut R,
        output: &mut W,
    ) -> Result<bool> {
        write!(output, "{question} [y/N]: ")?;
        output.flush()?;

        let mut line = String::new();
        input.read_line(&mut line)?;
        Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
    }

    fn ask<R: BufRead, W: Write>(
        &self,
        input: &mut R,
        output: &mut W,
        label: &str,
    ) -> Result<String> {
        write!(output, "{label}: ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            bail!("input closed while asking for {}", label.to_lowercase());
        }
        Ok(line.trim().to_string())
    }

    // =========================================================================
    // Convenience methods using standard I/O
    // =========================================================================

    pub fn complete_context(&self, ctx: GenerationContext) -> Result<GenerationContext> {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        self.complete_context_with_io(ctx, &mut input, &mut io::stdout())
    }

    pub fn render_preview(&self, content: &GeneratedContent, provider: &str) -> Result<()> {
        self.render_preview_with_io(content, provider, &mut io::stdout())
    }

    pub fn confirm(&self, question: &str) -> Result<bool> {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        self.confirm_with_io(question, &mut input, &mut io::stdout())
    }
}

impl Default for PromptUI {
    fn default() -> Self {
        Self::new()
    }
}

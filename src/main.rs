use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::info;
use tracing_subscriber::EnvFilter;

use reposeed::config::Config;
use reposeed::context::GenerationContext;
use reposeed::creator::{CreateOptions, RepoCreator};
use reposeed::generator::ContentGenerator;
use reposeed::github::GitHubClient;
use reposeed::ollama::OllamaAdapter;

fn cli() -> Command {
    Command::new("reposeed")
        .about("Create GitHub repositories with a generated description, topics and README")
        .long_about(
            "reposeed asks for a few facts about a new project, drafts its description, \
             topics and README with Gemini or a local Ollama model (falling back to \
             templates when neither is available), and creates the repository on GitHub.",
        )
        .arg(Arg::new("name").help("Repository name"))
        .arg(Arg::new("language").long("language").short('l').value_name("LANGUAGE").help("Primary programming language"))
        .arg(Arg::new("framework").long("framework").short('f').value_name("FRAMEWORK").help("Framework in use"))
        .arg(Arg::new("purpose").long("purpose").short('p').value_name("TEXT").help("What the project is for"))
        .arg(Arg::new("license").long("license").value_name("LICENSE").help("License named in the README (default: MIT)"))
        .arg(
            Arg::new("provider")
                .long("provider")
                .value_name("PROVIDER")
                .help("AI provider: gemini, ollama, auto or none"),
        )
        .arg(Arg::new("private").long("private").help("Create a private repository").action(ArgAction::SetTrue))
        .arg(Arg::new("dry-run").long("dry-run").help("Generate and preview without creating anything").action(ArgAction::SetTrue))
        .arg(Arg::new("yes").long("yes").short('y').help("Do not prompt; create without confirmation").action(ArgAction::SetTrue))
        .arg(Arg::new("set-gemini-key").long("set-gemini-key").value_name("API_KEY").help("Save the Gemini API key"))
        .arg(Arg::new("set-github-token").long("set-github-token").value_name("TOKEN").help("Save the GitHub token"))
        .arg(Arg::new("config").long("config").help("Show configuration information").action(ArgAction::SetTrue))
        .arg(Arg::new("list-models").long("list-models").help("List models installed in Ollama").action(ArgAction::SetTrue))
        .arg(Arg::new("pull-model").long("pull-model").value_name("MODEL").help("Download a model into Ollama"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();

    // Handle configuration commands
    if let Some(api_key) = matches.get_one::<String>("set-gemini-key") {
        Config::set_gemini_api_key(api_key.clone())?;
        println!("✅ Gemini API key saved successfully");
        return Ok(());
    }

    if let Some(token) = matches.get_one::<String>("set-github-token") {
        Config::set_github_token(token.clone())?;
        println!("✅ GitHub token saved successfully");
        return Ok(());
    }

    if matches.get_flag("config") {
        Config::show_config_info()?;
        return Ok(());
    }

    let config = Config::load()?;
    let settings = config.ai_settings();

    // Handle Ollama model management
    if matches.get_flag("list-models") {
        let ollama = OllamaAdapter::new(&settings.ollama)?;
        let models = ollama.list_models().await?;
        if models.is_empty() {
            println!("No models installed. Try `reposeed --pull-model {}`", ollama.model());
        }
        for model in models {
            let marker = if model.starts_with(ollama.model()) { "*" } else { " " };
            println!("{marker} {model}");
        }
        return Ok(());
    }

    if let Some(model) = matches.get_one::<String>("pull-model") {
        let ollama = OllamaAdapter::new(&settings.ollama)?;
        println!("⬇️  Pulling {model}, this can take a few minutes...");
        ollama.pull_model(model).await?;
        println!("✅ Model {model} is ready");
        return Ok(());
    }

    // Handle repository creation
    let selector = matches
        .get_one::<String>("provider")
        .map(String::as_str)
        .or(config.provider.as_deref());
    let generator = ContentGenerator::from_selector(selector, settings).await?;
    info!(provider = generator.provider_name(), "content generator ready");

    let github = config.github_token.as_deref().map(GitHubClient::new);
    let creator = RepoCreator::new(generator, github);

    let ctx = context_from_args(&matches, &config);
    let options = CreateOptions {
        private: matches.get_flag("private") || config.private,
        dry_run: matches.get_flag("dry-run"),
        assume_yes: matches.get_flag("yes"),
    };

    creator.run(ctx, options).await?;
    Ok(())
}

fn context_from_args(matches: &ArgMatches, config: &Config) -> GenerationContext {
    let arg = |id: &str| matches.get_one::<String>(id).cloned().unwrap_or_default();

    let mut ctx = GenerationContext::new(arg("name"))
        .with_language(arg("language"))
        .with_framework(arg("framework"))
        .with_purpose(arg("purpose"));
    if let Some(license) = matches.get_one::<String>("license").or(config.license.as_ref()) {
        ctx = ctx.with_license(license.clone());
    }
    ctx
}

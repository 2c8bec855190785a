use anyhow::{Context, Result};
use backport_bot::{
    init_telemetry, BackportConfig, GitHubClient, Orchestrator, ProcessCommandExecutor, PullRequestEventPayload,
};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

#[derive(Parser)]
#[command(name = "backport")]
#[command(about = "Backport merged pull requests to the branches named by their labels")]
#[command(long_about = "Reads a GitHub pull_request event and, for every label matching the configured \
                       pattern, cherry-picks the merge commit onto the named base branch and opens a \
                       pull request. Failed backports get a comment with manual instructions.")]
struct Cli {
    /// Human readable logs instead of JSON
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backport the pull request of an event
    Run(EventArgs),
    /// Show the backports an event would create, without touching git or GitHub
    Plan(EventArgs),
    /// Print the effective configuration with the token redacted
    Config,
}

#[derive(Args)]
struct EventArgs {
    /// Path to the pull_request event payload
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    event: PathBuf,

    /// Label pattern overriding the configured one
    #[arg(long, help = "Regex with a named `base` group, e.g. '^backport (?<base>\\S+)$'")]
    pattern: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_telemetry(cli.pretty)?;

    BackportConfig::load_env_file()?;
    let config = BackportConfig::load().context("Failed to load configuration")?;

    match cli.command {
        Commands::Run(args) => tokio::runtime::Runtime::new()?.block_on(async { run_command(config, args).await }),
        Commands::Plan(args) => tokio::runtime::Runtime::new()?.block_on(async { plan_command(config, args).await }),
        Commands::Config => config_command(&config),
    }
}

async fn run_command(mut config: BackportConfig, args: EventArgs) -> Result<()> {
    if let Some(pattern) = args.pattern {
        config.labels.pattern = pattern;
    }

    let payload = read_event(&args.event).await?;
    let pattern = config.label_pattern()?;
    let templates = config.templates();
    let token = config
        .token()
        .context("No GitHub token: set BACKPORT_GITHUB__TOKEN, GITHUB_TOKEN or the github_token input")?;

    let client = GitHubClient::new(
        token,
        config.github.api_url.as_deref(),
        &payload.repository.owner.login,
        &payload.repository.name,
    )?;
    let orchestrator = Orchestrator::new(Arc::new(client), Arc::new(ProcessCommandExecutor::non_interactive()))
        .with_settings(config.orchestrator_settings());

    let result = orchestrator.run(&payload, &pattern, &templates, token).await?;

    let json = serde_json::to_string(&result)?;
    println!("{json}");
    write_github_output("created_pull_requests", &json).await?;
    Ok(())
}

async fn plan_command(mut config: BackportConfig, args: EventArgs) -> Result<()> {
    if let Some(pattern) = args.pattern {
        config.labels.pattern = pattern;
    }

    let payload = read_event(&args.event).await?;
    let pattern = config.label_pattern()?;
    let targets = Orchestrator::plan(&payload, &pattern, &config.templates())?;

    println!("{}", serde_json::to_string_pretty(&targets)?);
    Ok(())
}

fn config_command(config: &BackportConfig) -> Result<()> {
    print!("{}", config.to_toml_redacted()?);
    Ok(())
}

async fn read_event(path: &Path) -> Result<PullRequestEventPayload> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read event payload {}", path.display()))?;
    PullRequestEventPayload::from_json(&json)
        .with_context(|| format!("{} is not a pull_request event payload", path.display()))
}

/// Append `name=value` to the step outputs file when running in GitHub Actions.
async fn write_github_output(name: &str, value: &str) -> Result<()> {
    let Some(path) = std::env::var_os("GITHUB_OUTPUT") else {
        return Ok(());
    };

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .await
        .context("Failed to open GITHUB_OUTPUT")?;
    file.write_all(format!("{name}={value}\n").as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

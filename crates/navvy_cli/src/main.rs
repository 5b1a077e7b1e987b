use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use navvy::{Navvy, NavvyConfig, ProjectRepo, ProviderKind};
use navvy_cli::{logging, repl};

#[derive(Parser)]
#[command(name = "navvy")]
#[command(about = "Chat with a model that edits a git-backed project, one commit per change")]
#[command(version)]
struct Cli {
    /// Initialize PROJECT_PATH as a git repository if it is not one yet
    #[arg(long)]
    init: bool,

    /// Model id sent with each request
    #[arg(long)]
    model: Option<String>,

    /// Chat provider: openai or mock
    #[arg(long)]
    provider: Option<String>,

    /// Project directory; must be a git working tree unless --init is given
    project_path: PathBuf,
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    let mut config = NavvyConfig::from_env()?;
    if let Some(provider) = &cli.provider {
        config = config.with_provider(provider.parse::<ProviderKind>()?);
    }
    if let Some(model) = cli.model {
        config = config.with_model(model);
    }

    if cli.init {
        ProjectRepo::init(&cli.project_path).with_context(|| {
            format!("initializing repository at {}", cli.project_path.display())
        })?;
    }

    let mut navvy = Navvy::from_config(&cli.project_path, &config)
        .with_context(|| format!("opening project {}", cli.project_path.display()))?;
    tracing::info!(
        root = %navvy.project_root().display(),
        provider = %config.provider,
        model = %config.model,
        "session started"
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    repl::run(&mut navvy, stdin.lock(), &mut stdout)
}

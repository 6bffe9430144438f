use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use coderoom_engine::{
    DockerRuntime, EngineConfig, Grader, RunOutcome, StaticCatalog, Submission, SubmissionRunner,
    WorkspaceManager,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "coderoom-cli")]
#[command(about = "Run and grade untrusted submissions in ephemeral sandboxes", long_about = None)]
struct Cli {
    /// Engine configuration file (JSON); defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a source file once and print its captured output
    Run {
        /// Path to the source file to execute
        #[arg(short, long)]
        file: PathBuf,

        /// File whose contents are fed to the program's standard input
        #[arg(long)]
        stdin: Option<PathBuf>,
    },

    /// Grade a source file against a problem's test cases
    Grade {
        /// Problem id to look up in the catalog
        #[arg(short, long)]
        problem: String,

        /// Path to the source file to grade
        #[arg(short, long)]
        file: PathBuf,

        /// Problems catalog file (JSON)
        #[arg(long)]
        catalog: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let runtime = DockerRuntime::new(config.runtime.clone())
        .context("failed to connect to the Docker daemon")?;
    let runner = SubmissionRunner::new(runtime, WorkspaceManager::new(&config.workspace_root));

    let outcome = match cli.command {
        Commands::Run { file, stdin } => {
            let source_code = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read source file {}", file.display()))?;
            let stdin = match stdin {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read stdin file {}", path.display()))?,
                None => String::new(),
            };

            info!(source = %file.display(), "starting scratch run");
            let result = runner.run(&Submission::new(source_code, stdin)).await?;
            RunOutcome::ScratchRun(result)
        }
        Commands::Grade {
            problem,
            file,
            catalog,
        } => {
            let source_code = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read source file {}", file.display()))?;
            let catalog = StaticCatalog::load(&catalog)
                .with_context(|| format!("failed to load catalog from {}", catalog.display()))?;

            info!(problem = %problem, source = %file.display(), "starting grading run");
            let report = Grader::new(runner, catalog).grade(&problem, &source_code).await?;
            RunOutcome::Grade(report)
        }
    };

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

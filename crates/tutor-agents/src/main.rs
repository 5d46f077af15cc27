use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use coordination::{LanguageLabel, Task, TaskMode};
use tracing::info;
use tutor_agents::config::PipelineConfig;
use tutor_agents::contracts::OrchestratorResult;
use tutor_agents::metrics::PipelineMetrics;
use tutor_agents::orchestrator::Orchestrator;
use tutor_agents::server::{self, AppState};
use tutor_agents::session::ConversationSession;

#[derive(Debug, Parser)]
#[command(name = "tutor-agents", version, about = "Verified tutor answer pipeline")]
struct Cli {
    /// TOML config file (overrides TUTOR_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Answer one question and print the result as JSON
    Ask {
        #[arg(long)]
        message: Option<String>,
        #[arg(long, default_value = "explain")]
        mode: TaskMode,
        #[arg(long, default_value = "general")]
        subject: String,
        #[arg(long, default_value = "CBSE")]
        board: String,
        #[arg(long, default_value_t = 10)]
        grade: u8,
        #[arg(long, value_enum)]
        language: Option<LanguageArg>,
        /// Attached document ids (repeatable)
        #[arg(long = "doc")]
        documents: Vec<String>,
        /// Read the whole task from a JSON file instead of flags
        #[arg(long)]
        task_file: Option<PathBuf>,
    },
    /// Run the HTTP service
    Serve {
        /// Listen address (overrides config)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Print JSON Schemas of the task and result contracts
    Schema,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LanguageArg {
    English,
    Hindi,
    Hinglish,
}

impl From<LanguageArg> for LanguageLabel {
    fn from(arg: LanguageArg) -> Self {
        match arg {
            LanguageArg::English => LanguageLabel::English,
            LanguageArg::Hindi => LanguageLabel::Hindi,
            LanguageArg::Hinglish => LanguageLabel::Hinglish,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Schema => {
            let schemas = serde_json::json!({
                "task": schemars::schema_for!(Task),
                "orchestrator_result": schemars::schema_for!(OrchestratorResult),
            });
            println!("{}", serde_json::to_string_pretty(&schemas)?);
            Ok(())
        }
        Command::Serve { bind } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            let metrics = PipelineMetrics::new().context("failed to register metrics")?;
            let orchestrator = Orchestrator::from_config(&config, Some(metrics.clone()));
            info!(
                bind = %config.server.bind,
                max_regenerations = config.max_regenerations,
                prompt_version = orchestrator.prompt_version(),
                "Tutor pipeline starting"
            );
            server::serve(&config.server.bind, AppState::new(orchestrator, metrics)).await
        }
        Command::Ask {
            message,
            mode,
            subject,
            board,
            grade,
            language,
            documents,
            task_file,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let task = match task_file {
                Some(path) => {
                    let raw = std::fs::read_to_string(&path)
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    serde_json::from_str::<Task>(&raw)
                        .with_context(|| format!("failed to parse task in {}", path.display()))?
                }
                None => {
                    let Some(message) = message else {
                        bail!("either --message or --task-file is required");
                    };
                    let mut task = Task::new(message, mode, subject, board, grade)
                        .with_documents(documents);
                    if let Some(language) = language {
                        task = task.with_language(language.into());
                    }
                    task
                }
            };

            let orchestrator = Orchestrator::from_config(&config, None);
            let mut session = ConversationSession::ephemeral();
            let result = orchestrator.run(&task, &mut session).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.is_success() {
                std::process::exit(2);
            }
            Ok(())
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<PipelineConfig> {
    PipelineConfig::load(path).context("failed to load configuration")
}

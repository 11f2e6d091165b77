//! Genie CLI - the terminal Génie
//!
//! `genie [WORDS]...` starts a chat, seeded with WORDS when given.
//! `genie run <TASK>...` asks for a shell command and runs it after confirmation.

mod terminal;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use console::{style, Term};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use genie_core::advisor::{CommandAdvisor, ExecutionOutput, ShellExecutor, SystemShell};
use genie_core::config::{Config, ConfigManager};
use genie_core::session::{SessionConfig, TurnLoop};
use genie_core::{Error, GenAIBackend, ModelGateway};

use terminal::{confirm_execution, error_line, intro, outro, ConsoleDisplay, LineInput};

#[derive(Parser)]
#[command(name = "genie")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "🧞 The terminal Génie - an LLM assistant living in your shell", long_about = None)]
struct Cli {
    /// Model to use (overrides the config file)
    #[arg(short, long)]
    model: Option<String>,

    /// Maximum model calls per chat turn
    #[arg(long)]
    max_steps: Option<usize>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Path to a config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Opening message, or `run` followed by a task to get a shell command
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    words: Vec<String>,
}

enum Mode {
    Chat { initial: Option<String> },
    Run { task: String },
}

impl Cli {
    fn mode(&self) -> Mode {
        match self.words.split_first() {
            Some((first, rest)) if first == "run" => Mode::Run {
                task: rest.join(" "),
            },
            _ => Mode::Chat {
                initial: (!self.words.is_empty()).then(|| self.words.join(" ")),
            },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // A .env in the working directory may carry the API key
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Warn level by default so logs never interfere with the prompt
    let default_filter = if cli.verbose {
        "info,genie_core=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error_line(&e.to_string());
            return Ok(ExitCode::FAILURE);
        }
    };

    let api_key = match config.provider.require_api_key() {
        Ok(key) => key,
        Err(e) => {
            error_line(&e.to_string());
            let var = config
                .provider
                .provider_type
                .api_key_envs()
                .first()
                .copied()
                .unwrap_or("GOOGLE_API_KEY");
            println!("Set it in your shell or in a .env file:");
            println!("  {}", style(format!("export {var}=your_api_key_here")).cyan());
            return Ok(ExitCode::FAILURE);
        }
    };

    let backend = GenAIBackend::with_timeouts(
        config.provider.provider_type,
        &api_key,
        Some(config.provider.model()),
        config.provider.request_timeout(),
        config.provider.connect_timeout(),
    );
    debug!(provider = %backend.provider_type(), model = backend.model(), "Backend ready");
    let gateway = ModelGateway::new(Arc::new(backend), config.agent.system_prompt());

    let workspace = std::env::current_dir()?;

    match cli.mode() {
        Mode::Run { task } => run_advisor(gateway, &task, &workspace, &config).await,
        Mode::Chat { initial } => run_chat(gateway, initial, workspace, &config, cli.verbose).await?,
    }

    Ok(ExitCode::SUCCESS)
}

/// Config file (explicit path or the default location) plus flag overrides
fn load_config(cli: &Cli) -> genie_core::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            ConfigManager::with_path(path.clone())?.into_config()
        }
        // No config directory on this platform means defaults
        None => match ConfigManager::default_config_path() {
            Ok(path) => ConfigManager::with_path(path)?.into_config(),
            Err(_) => Config::default(),
        },
    };

    if let Some(model) = &cli.model {
        config.provider.model = Some(model.clone());
    }
    if let Some(max_steps) = cli.max_steps {
        config.agent.max_steps = max_steps;
    }

    config.validate()?;
    Ok(config)
}

async fn run_chat(
    gateway: ModelGateway,
    initial: Option<String>,
    workspace: PathBuf,
    config: &Config,
    verbose: bool,
) -> anyhow::Result<()> {
    let mut session_config = SessionConfig::new(workspace).with_max_steps(config.agent.max_steps);
    if let Some(message) = initial {
        session_config = session_config.with_initial_message(message);
    }

    let input = LineInput::new()?;

    let term = Term::stdout();
    if term.is_term() {
        term.clear_screen().ok();
    }
    intro("🧞 The terminal Génie");

    let mut turn_loop = TurnLoop::new(
        gateway,
        session_config,
        input,
        ConsoleDisplay::new(verbose),
    );
    let end = turn_loop.run().await;
    debug!(?end, messages = turn_loop.transcript().len(), "Chat finished");

    Ok(())
}

async fn run_advisor(gateway: ModelGateway, task: &str, workspace: &Path, config: &Config) {
    intro("🧞 Calling the Génie");

    let advisor = CommandAdvisor::new(gateway);
    let spinner = terminal::spinner("🤔 The génie is thinking");
    let plan = advisor.propose(task).await;
    spinner.finish_and_clear();

    let plan = match plan {
        Ok(plan) => plan,
        Err(e) => {
            error_line("An error occurred.");
            error_line(&e.to_string());
            return;
        }
    };

    println!("{}", style("💡 The Génie have an idea").bold());
    println!("  {}", style(&plan.raw_command).cyan().bold());

    if !confirm_execution() {
        return;
    }

    let shell = SystemShell::new(workspace).with_timeout(config.shell.timeout());
    match shell
        .execute(&plan.raw_command)
        .await
        .and_then(ExecutionOutput::into_result)
    {
        Ok(output) => print!("{}", output.stdout_lossy()),
        Err(Error::Execution { stderr, .. }) => {
            error_line("An error occured");
            eprint!("{}", stderr);
        }
        Err(e) => {
            error_line("An error occured");
            error_line(&e.to_string());
        }
    }

    outro("Goodbye");
}

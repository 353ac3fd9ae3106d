//! adrflow - conversational Architecture Decision Record generator
//!
//! CLI entry point for starting, resuming and inspecting planning sessions.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use adrflow::agent::extract::format_number;
use adrflow::cli::{Cli, Command, generate_after_help, get_log_path};
use adrflow::config::{Config, LlmConfig};
use adrflow::llm::create_client;
use adrflow::orchestrator::PhaseOrchestrator;
use adrflow::repl::{ReplSession, next_adr_number};
use adrflow::session::{FileSessionStore, SessionStore};
use adrflow::{LlmAgentBackend, TurnRole};

/// Intermediate answers buffered between the agent and the status line
const PROGRESS_BUFFER: usize = 64;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Can't log here until the subscriber is installed
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help(&LlmConfig::default().api_key_env));
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    // Log level is read before the full config so loading itself is logged
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(model = %config.llm.model, style = %config.adr.style, "adrflow loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::New {
            feature,
            context_file,
            session,
        } => {
            debug!(%feature, ?context_file, ?session, "main: matched New command");
            cmd_new(&config, &feature, context_file, session).await
        }
        Command::Resume { session } => {
            debug!(%session, "main: matched Resume command");
            cmd_resume(&config, &session).await
        }
        Command::Sessions => {
            debug!("main: matched Sessions command");
            cmd_sessions(&config).await
        }
        Command::Show { session } => {
            debug!(%session, "main: matched Show command");
            cmd_show(&config, &session).await
        }
    }
}

/// Wire the LLM client, agent, orchestrator and store into a terminal session
fn build_session(config: &Config, session_id: &str) -> Result<ReplSession> {
    debug!(%session_id, "build_session: called");
    config.validate()?;

    let llm = create_client(&config.llm).context("Failed to create LLM client")?;
    let number = next_adr_number(&config.adr.dir)?;
    let (progress_tx, progress_rx) = mpsc::channel(PROGRESS_BUFFER);

    let backend = LlmAgentBackend::new(llm, config.adr.style)
        .with_document_number(format_number(number))
        .with_progress(progress_tx);
    let orchestrator = PhaseOrchestrator::new(Arc::new(backend));
    let store = Arc::new(FileSessionStore::new(&config.session.dir));

    Ok(ReplSession::new(orchestrator, store, session_id, &config.adr.dir).with_progress(progress_rx))
}

/// Start a new planning conversation
async fn cmd_new(
    config: &Config,
    feature: &str,
    context_file: Option<PathBuf>,
    session: Option<String>,
) -> Result<()> {
    debug!(%feature, "cmd_new: called");
    let context = match context_file {
        Some(path) => tokio::fs::read_to_string(&path)
            .await
            .context(format!("Failed to read context file {}", path.display()))?,
        None => String::new(),
    };

    let session_id = session.unwrap_or_else(|| Uuid::now_v7().to_string());
    let mut repl = build_session(config, &session_id)?;
    repl.start(feature, &context).await?;
    Ok(())
}

/// Resume a saved conversation
async fn cmd_resume(config: &Config, session_id: &str) -> Result<()> {
    debug!(%session_id, "cmd_resume: called");
    let store = FileSessionStore::new(&config.session.dir);
    let snapshot = store
        .load(session_id)
        .await?
        .ok_or_else(|| eyre::eyre!("No saved session named {}", session_id))?;

    let mut repl = build_session(config, session_id)?;
    repl.resume(snapshot).await?;
    Ok(())
}

/// List saved sessions with their phase and feature
async fn cmd_sessions(config: &Config) -> Result<()> {
    debug!("cmd_sessions: called");
    let store = FileSessionStore::new(&config.session.dir);
    let ids = store.list().await?;

    if ids.is_empty() {
        println!("No saved sessions in {}", store.dir().display());
        return Ok(());
    }

    for id in ids {
        match store.load(&id).await {
            Ok(Some(snapshot)) => {
                println!("{:<38} {:<16} {}", id.yellow(), snapshot.phase.to_string(), snapshot.feature_request);
            }
            Ok(None) => {}
            Err(e) => println!("{:<38} {}", id.yellow(), format!("unreadable: {}", e).red()),
        }
    }
    Ok(())
}

/// Print a saved session's conversation
async fn cmd_show(config: &Config, session_id: &str) -> Result<()> {
    debug!(%session_id, "cmd_show: called");
    let store = FileSessionStore::new(&config.session.dir);
    let snapshot = store
        .load(session_id)
        .await?
        .ok_or_else(|| eyre::eyre!("No saved session named {}", session_id))?;

    println!("{} {}", "Session:".bright_cyan(), session_id);
    println!("{} {}", "Phase:".bright_cyan(), snapshot.phase);
    println!("{} {}", "Feature:".bright_cyan(), snapshot.feature_request);
    if !snapshot.codebase_context.is_empty() {
        println!("{} {} chars", "Context:".bright_cyan(), snapshot.codebase_context.len());
    }

    for turn in &snapshot.history {
        println!();
        let speaker = match turn.role {
            TurnRole::Agent => "Architect".bright_blue(),
            TurnRole::User => "You".bright_green(),
        };
        println!("{}", speaker.bold());
        println!("{}", turn.content.trim());
    }

    if let Some(document) = &snapshot.generated_document {
        println!();
        println!("{} ADR-{}: {}", "Generated:".bright_cyan(), document.number, document.title);
    }
    Ok(())
}

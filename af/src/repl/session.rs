//! Interactive planning session on the terminal

use std::future::Future;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;
use eyre::{Context, Result, bail};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{Reply, resolve_reply, write_adr};
use crate::domain::{ClarifyingQuestion, ConversationPhase, SelectableOption, SessionSnapshot, StructuredAnswer, TurnRole};
use crate::interpreter::parse_answer;
use crate::orchestrator::{Envelope, PhaseOrchestrator};
use crate::session::SessionStore;

type InputLines = Lines<BufReader<Stdin>>;

/// Terminal session driving one conversation to a written record
pub struct ReplSession {
    orchestrator: PhaseOrchestrator,
    store: Arc<dyn SessionStore>,
    session_id: String,
    adr_dir: PathBuf,
    progress: Option<mpsc::Receiver<StructuredAnswer>>,
}

impl ReplSession {
    /// Create a session saving to `store` under `session_id`
    pub fn new(
        orchestrator: PhaseOrchestrator,
        store: Arc<dyn SessionStore>,
        session_id: impl Into<String>,
        adr_dir: impl Into<PathBuf>,
    ) -> Self {
        let session_id = session_id.into();
        debug!(%session_id, "ReplSession::new: called");
        Self {
            orchestrator,
            store,
            session_id,
            adr_dir: adr_dir.into(),
            progress: None,
        }
    }

    /// Show a live status line from intermediate views while the agent streams
    pub fn with_progress(mut self, rx: mpsc::Receiver<StructuredAnswer>) -> Self {
        self.progress = Some(rx);
        self
    }

    /// Start a new conversation and run it until the record is written or the user quits
    pub async fn start(&mut self, feature_request: &str, codebase_context: &str) -> Result<Option<PathBuf>> {
        debug!(%feature_request, "ReplSession::start: called");
        self.print_banner();

        let envelope = with_progress(
            &mut self.progress,
            self.orchestrator.start_planning(feature_request, codebase_context),
        )
        .await
        .context("Failed to start planning")?;
        self.save().await?;

        let question = match envelope {
            Envelope::PlanningQuestion(question) => Some(question),
            other => {
                warn!(envelope = ?other, "ReplSession::start: unexpected envelope");
                None
            }
        };
        self.run(question).await
    }

    /// Continue a saved conversation from wherever it stopped
    pub async fn resume(&mut self, snapshot: SessionSnapshot) -> Result<Option<PathBuf>> {
        debug!(phase = %snapshot.phase, "ReplSession::resume: called");
        self.orchestrator.import_session(snapshot);
        self.print_banner();

        let mut question = None;
        if self.orchestrator.current_phase() == ConversationPhase::Planning {
            if self.orchestrator.feature_request().is_empty() {
                bail!("Session {} was never started", self.session_id);
            }
            question = self.last_question();
            if question.is_none() {
                bail!("Session {} has no pending question", self.session_id);
            }
        }
        self.run(question).await
    }

    async fn run(&mut self, mut question: Option<ClarifyingQuestion>) -> Result<Option<PathBuf>> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            debug!(phase = %self.orchestrator.current_phase(), "ReplSession::run: loop");
            match self.orchestrator.current_phase() {
                ConversationPhase::Planning => {
                    let Some(current) = &question else {
                        bail!("No question to answer in planning phase");
                    };
                    let options = current.answer.selectable_options();
                    print_question(current, &options);

                    let Some(text) = read_reply(&mut lines, &options).await? else {
                        self.save().await?;
                        println!(
                            "{} Resume with: {}",
                            "Session saved.".dimmed(),
                            format!("adrflow resume {}", self.session_id).yellow()
                        );
                        return Ok(None);
                    };

                    let result = with_progress(&mut self.progress, self.orchestrator.continue_conversation(&text)).await;
                    match result {
                        Ok(Envelope::PlanningQuestion(next)) => question = Some(next),
                        Ok(Envelope::ReadyForAdr(evaluation)) => {
                            println!();
                            println!("{} {}", "Ready to write the ADR:".bright_green(), evaluation.reasoning);
                        }
                        Ok(other) => warn!(envelope = ?other, "ReplSession::run: unexpected envelope"),
                        Err(e) => {
                            println!("{} {}", "Error:".red(), e);
                            let hint = if e.is_retryable() {
                                "Your reply was not recorded. This looks temporary; send it again or /quit."
                            } else {
                                "Your reply was not recorded. Retrying will likely fail the same way; /quit and check the log."
                            };
                            println!("{}", hint.dimmed());
                            continue;
                        }
                    }
                    self.save().await?;
                }
                ConversationPhase::ReadyForGeneration | ConversationPhase::AdrGeneration => {
                    println!("{}", "Writing ADR...".dimmed());
                    if let Err(e) = self.orchestrator.generate_adr().await {
                        self.save().await?;
                        return Err(e).context(format!(
                            "ADR generation failed; resume with `adrflow resume {}`",
                            self.session_id
                        ));
                    }
                    self.save().await?;
                }
                ConversationPhase::Completed => {
                    let Some(document) = self.orchestrator.generated_document() else {
                        bail!("Session {} completed without a document", self.session_id);
                    };
                    let path = write_adr(&self.adr_dir, document)?;
                    info!(path = %path.display(), "ADR written");
                    println!("{} {}", "ADR written to".bright_green(), path.display());
                    return Ok(Some(path));
                }
            }
        }
    }

    /// Rebuild the pending question from the last agent turn
    fn last_question(&self) -> Option<ClarifyingQuestion> {
        let turn = self.orchestrator.conversation_history().last()?;
        if turn.role != TurnRole::Agent {
            return None;
        }
        let mut answer = parse_answer(&turn.content);
        answer.is_complete = true;
        Some(ClarifyingQuestion {
            content: turn.content.clone(),
            answer,
        })
    }

    async fn save(&self) -> Result<()> {
        debug!(session_id = %self.session_id, "ReplSession::save: called");
        self.store
            .save(&self.session_id, &self.orchestrator.export_session())
            .await
            .context("Failed to save session")
    }

    fn print_banner(&self) {
        println!();
        println!("{}", "ADR planning session".bright_cyan().bold());
        println!("Feature: {}", self.orchestrator.feature_request());
        println!("Session: {}", self.session_id.yellow());
        println!(
            "Pick an option by number or type your own answer. {} saves and exits.",
            "/quit".yellow()
        );
    }
}

/// Await `fut` while rendering any intermediate answers that arrive
async fn with_progress<F, T>(progress: &mut Option<mpsc::Receiver<StructuredAnswer>>, fut: F) -> T
where
    F: Future<Output = T>,
{
    let Some(rx) = progress else {
        return fut.await;
    };

    tokio::pin!(fut);
    let result = loop {
        tokio::select! {
            result = &mut fut => break result,
            Some(answer) = rx.recv() => render_status(&answer),
        }
    };

    while rx.try_recv().is_ok() {}
    clear_status();
    result
}

fn render_status(answer: &StructuredAnswer) {
    let header = if answer.header.is_empty() {
        "thinking"
    } else {
        answer.header.as_str()
    };
    let mut line = format!("… {}", header);
    if answer.has_options() {
        line.push_str(&format!(" ({} options)", answer.options.len()));
    }
    print!("\r\x1b[2K{}", line.dimmed());
    let _ = io::stdout().flush();
}

fn clear_status() {
    print!("\r\x1b[2K");
    let _ = io::stdout().flush();
}

fn print_question(question: &ClarifyingQuestion, options: &[SelectableOption]) {
    let answer = &question.answer;
    println!();

    if answer.header.is_empty() && answer.body_text.is_empty() && options.is_empty() {
        println!("{}", question.content.trim());
        println!();
        return;
    }

    if !answer.header.is_empty() {
        println!("{}", answer.header.bright_cyan().bold());
        println!();
    }
    if !answer.body_text.is_empty() {
        println!("{}", answer.body_text);
        println!();
    }
    if options.is_empty() {
        return;
    }

    if answer.option_prompt.is_empty() {
        println!("{}", answer.option_prompt_or_default().bold());
    }
    for (idx, option) in options.iter().enumerate() {
        let marker = if option.recommended {
            format!(" {}", "(recommended)".green())
        } else {
            String::new()
        };
        println!("  {}. {}{}", (idx + 1).to_string().yellow(), option.label, marker);
        for line in option.description.lines() {
            println!("     {}", line.dimmed());
        }
    }
    println!();
}

fn prompt(label: &str) {
    print!("{} ", label.bright_green());
    let _ = io::stdout().flush();
}

/// Read until the user gives a usable reply; `None` means quit or end of input
async fn read_reply(lines: &mut InputLines, options: &[SelectableOption]) -> Result<Option<String>> {
    loop {
        prompt(">");
        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            println!();
            return Ok(None);
        };

        match resolve_reply(&line, options) {
            Reply::Empty => continue,
            Reply::Quit => return Ok(None),
            Reply::Text(text) => return Ok(Some(text)),
            Reply::FreeFormRequested => {
                prompt("Your answer>");
                let Some(line) = lines.next_line().await.context("Failed to read input")? else {
                    println!();
                    return Ok(None);
                };
                let line = line.trim();
                if !line.is_empty() {
                    return Ok(Some(line.to_string()));
                }
            }
        }
    }
}

//! Interactive terminal front end
//!
//! [`ReplSession`] drives a [`crate::orchestrator::PhaseOrchestrator`] from
//! stdin. The helpers here turn typed input into replies and finished
//! records into files.

use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use tracing::debug;

use crate::domain::{Document, SelectableOption};

mod session;

pub use session::ReplSession;

/// What a line of user input means in the planning loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Nothing typed
    Empty,
    /// Save and leave
    Quit,
    /// The free-form entry was picked; the actual text comes next
    FreeFormRequested,
    /// Text to send as the user's turn
    Text(String),
}

/// Interpret `input` against the options currently on screen
///
/// A number in `1..=options.len()` selects that option. Anything else is sent
/// as typed.
pub fn resolve_reply(input: &str, options: &[SelectableOption]) -> Reply {
    let input = input.trim();
    debug!(%input, option_count = %options.len(), "resolve_reply: called");

    match input {
        "" => return Reply::Empty,
        "/quit" | "/q" | "/exit" => return Reply::Quit,
        _ => {}
    }

    if let Ok(n) = input.parse::<usize>()
        && (1..=options.len()).contains(&n)
    {
        let option = &options[n - 1];
        if option.free_form {
            debug!("resolve_reply: free-form entry picked");
            return Reply::FreeFormRequested;
        }
        debug!(value = %option.value, "resolve_reply: option picked");
        return Reply::Text(option_reply(option));
    }

    Reply::Text(input.to_string())
}

fn option_reply(option: &SelectableOption) -> String {
    if option.description.is_empty() {
        format!("I choose: {}", option.label)
    } else {
        format!("I choose: {} ({})", option.label, option.description)
    }
}

/// Next free record number in `dir`, one past the highest `NNNN-*.md` present
pub fn next_adr_number(dir: &Path) -> Result<u32> {
    debug!(?dir, "next_adr_number: called");
    if !dir.exists() {
        debug!("next_adr_number: directory missing, starting at 1");
        return Ok(1);
    }

    let mut highest = 0;
    for entry in std::fs::read_dir(dir).context("Failed to read ADR directory")? {
        let name = entry?.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.ends_with(".md") {
            continue;
        }

        let digits: String = name.chars().take_while(|c| c.is_ascii_digit()).collect();
        if !digits.is_empty()
            && name[digits.len()..].starts_with('-')
            && let Ok(n) = digits.parse::<u32>()
        {
            highest = highest.max(n);
        }
    }

    Ok(highest + 1)
}

/// Write `document` to `<dir>/<number>-<slug>.md` and return the path
pub fn write_adr(dir: &Path, document: &Document) -> Result<PathBuf> {
    debug!(?dir, number = %document.number, "write_adr: called");
    std::fs::create_dir_all(dir).context("Failed to create ADR directory")?;

    let mut slug = slugify(&document.title);
    if slug.is_empty() {
        slug = "decision".to_string();
    }
    let path = dir.join(format!("{}-{}.md", document.number, slug));

    std::fs::write(&path, format!("{}\n", document.content.trim_end())).context("Failed to write ADR file")?;
    Ok(path)
}

/// Slugify a string for use in filenames
fn slugify(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .take(50)
        .collect()
}

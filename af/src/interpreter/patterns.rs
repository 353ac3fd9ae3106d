//! Whole-text extraction of header, body, option list and completion
//!
//! Every function here works on the full accumulated text. Answers are a few
//! KB at most, so re-running the patterns per fragment is cheap enough.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::domain::{DecisionOption, StructuredAnswer};

// Compile regexes once using LazyLock
static HEADER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]+(\S.*?)[ \t]*$").unwrap());

// `<number>. **<title>**` at the start of a line
static OPTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(\d+)\.[ \t]+\*\*(.+?)\*\*").unwrap());

static RECOMMENDED_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"⭐\x{FE0F}?|\bRECOMMENDED\b|[(\[][ \t]*(?i:recommended)[ \t]*[)\]]").unwrap());

static BARE_LIST_NUMBER_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[ \t]*\d+\.$").unwrap());

/// Words that mark a line as the question introducing an option list
const PROMPT_KEYWORDS: &[&str] = &["choose", "select", "option", "prefer"];

/// Tokens signalling the agent has offered its "answer in your own words" exit
const FREE_FORM_MARKERS: &[&str] = &["free-form", "free form", "something else", "your own"];

/// A numbered entry located in the text
struct OptionSpan {
    start: usize,
    option: DecisionOption,
}

/// Derive a structured answer from the full text of one response
///
/// Never fails; missing structure yields empty fields.
pub fn parse_answer(text: &str) -> StructuredAnswer {
    debug!(text_len = %text.len(), "parse_answer: called");
    let header = extract_header(text);
    let spans = extract_options(text);
    let options_start = spans.first().map(|s| s.start);

    let option_prompt = match options_start {
        Some(start) => extract_option_prompt(&text[..start]),
        None => String::new(),
    };

    let body_end = options_start.unwrap_or(text.len());
    let body_start = match &header {
        Some((_, header_end)) if *header_end <= body_end => *header_end,
        _ => 0,
    };
    let body_text = text[body_start..body_end].trim().to_string();

    let options: Vec<DecisionOption> = spans.into_iter().map(|s| s.option).collect();
    let is_complete = looks_complete(text, !options.is_empty());

    StructuredAnswer {
        header: header.map(|(h, _)| h).unwrap_or_default(),
        body_text,
        option_prompt,
        options,
        is_complete,
    }
}

/// First markdown heading and the byte offset where its line ends
fn extract_header(text: &str) -> Option<(String, usize)> {
    let caps = HEADER_REGEX.captures(text)?;
    let whole = caps.get(0)?;
    let title = caps.get(1)?.as_str().trim().to_string();
    debug!(%title, "extract_header: found header");
    Some((title, whole.end()))
}

/// Numbered bold entries in textual order
fn extract_options(text: &str) -> Vec<OptionSpan> {
    let matches: Vec<_> = OPTION_REGEX.captures_iter(text).collect();
    debug!(match_count = %matches.len(), "extract_options: called");

    let mut seen_ids = HashSet::new();
    let mut spans = Vec::with_capacity(matches.len());

    for (position, caps) in matches.iter().enumerate() {
        let (Some(whole), Some(number), Some(title)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };

        let block_end = matches
            .get(position + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(text.len());
        let block = &text[whole.start()..block_end];
        let tail = &text[whole.end()..block_end];

        let number = number.as_str();
        let first_position = number.parse::<u64>().map(|n| n == 1).unwrap_or(false);
        let recommended = RECOMMENDED_REGEX.is_match(block) || first_position;

        let id = if seen_ids.contains(number) {
            debug!(%number, position, "extract_options: duplicate number, suffixing id");
            format!("{}-{}", number, position + 1)
        } else {
            number.to_string()
        };
        seen_ids.insert(id.clone());

        spans.push(OptionSpan {
            start: whole.start(),
            option: DecisionOption {
                id,
                title: strip_markers(title.as_str()),
                description: clean_description(tail),
                recommended,
            },
        });
    }

    spans
}

/// Remove recommendation markers and collapse what is left
fn strip_markers(s: &str) -> String {
    RECOMMENDED_REGEX
        .replace_all(s, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn clean_description(tail: &str) -> String {
    let without_markers = RECOMMENDED_REGEX.replace_all(tail, "");
    let lines: Vec<&str> = without_markers.lines().map(str::trim).collect();
    let joined = lines.join("\n");
    joined
        .trim()
        .trim_start_matches([':', '-', '–', '—'])
        .trim()
        .to_string()
}

/// The question line sitting directly above the option list, if any
fn extract_option_prompt(before_options: &str) -> String {
    let Some(line) = before_options.lines().map(str::trim).rev().find(|l| !l.is_empty()) else {
        return String::new();
    };

    if line.starts_with('#') {
        debug!("extract_option_prompt: nearest line is a heading");
        return String::new();
    }

    let lower = line.to_lowercase();
    if PROMPT_KEYWORDS.iter().any(|k| lower.contains(k)) {
        line.to_string()
    } else {
        String::new()
    }
}

/// Heuristic for "the agent has finished this answer"
///
/// With options, a free-form marker or terminal punctuation counts; without
/// options only terminal punctuation does.
pub fn looks_complete(text: &str, has_options: bool) -> bool {
    let trimmed = text.trim_end();
    if trimmed.is_empty() {
        return false;
    }

    if has_options {
        let lower = trimmed.to_lowercase();
        if FREE_FORM_MARKERS.iter().any(|m| lower.contains(m)) {
            debug!("looks_complete: free-form marker present");
            return true;
        }
    }

    ends_with_terminal_punctuation(trimmed)
}

fn ends_with_terminal_punctuation(trimmed: &str) -> bool {
    if !trimmed.ends_with(['.', '!', '?']) {
        return false;
    }
    // "3." on its own is the start of a list entry, not a sentence end
    let last_line = trimmed.lines().last().unwrap_or_default();
    !BARE_LIST_NUMBER_REGEX.is_match(last_line)
}

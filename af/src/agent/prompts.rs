//! Prompt styles for the LLM-backed agent
//!
//! Each [`DocumentStyle`] shares the same question and readiness conventions
//! and differs in the record template the final document follows.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Turn, TurnRole};

/// Template family for the generated record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStyle {
    /// Context / Decision / Status / Consequences
    #[default]
    Nygard,
    /// Markdown ADR: considered options with pros and cons
    Madr,
}

impl DocumentStyle {
    /// System prompt for clarifying questions
    pub fn question_prompt(&self) -> String {
        debug!(style = %self, "question_prompt: called");
        let focus = match self {
            DocumentStyle::Nygard => "the forces at play, the decision to be made, and its consequences",
            DocumentStyle::Madr => "the decision drivers and the realistic options worth comparing",
        };
        format!("{}\nFocus your questions on {}.\n", QUESTION_PROMPT, focus)
    }

    /// System prompt for readiness evaluation
    pub fn readiness_prompt(&self) -> &'static str {
        READINESS_PROMPT
    }

    /// System prompt for document generation
    pub fn document_prompt(&self) -> String {
        debug!(style = %self, "document_prompt: called");
        let template = match self {
            DocumentStyle::Nygard => NYGARD_TEMPLATE,
            DocumentStyle::Madr => MADR_TEMPLATE,
        };
        format!("{}\n{}", DOCUMENT_PROMPT, template)
    }
}

impl std::fmt::Display for DocumentStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentStyle::Nygard => write!(f, "nygard"),
            DocumentStyle::Madr => write!(f, "madr"),
        }
    }
}

/// Render history as a plain transcript, oldest first
pub fn render_transcript(history: &[Turn]) -> String {
    history
        .iter()
        .map(|turn| {
            let speaker = match turn.role {
                TurnRole::User => "User",
                TurnRole::Agent => "Architect",
            };
            format!("{}: {}", speaker, turn.content.trim())
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// User message asking for the next clarifying question
pub fn question_message(feature_request: &str, codebase_context: &str, history: &[Turn]) -> String {
    let mut msg = format!("## Feature Request\n{}\n", feature_request.trim());

    if !codebase_context.trim().is_empty() {
        msg.push_str(&format!("\n## Codebase Context\n{}\n", codebase_context.trim()));
    }

    if history.is_empty() {
        msg.push_str("\nAsk your first clarifying question.");
    } else {
        msg.push_str(&format!(
            "\n## Conversation So Far\n{}\n\nAsk the next clarifying question. Do not repeat questions already answered.",
            render_transcript(history)
        ));
    }

    msg
}

/// User message asking whether the conversation has gathered enough
pub fn readiness_message(history: &[Turn]) -> String {
    format!(
        "## Conversation So Far\n{}\n\nIs there enough information to write the decision record?",
        render_transcript(history)
    )
}

/// User message asking for the finished record
pub fn document_message(feature_request: &str, history: &[Turn], number: &str) -> String {
    format!(
        "## Feature Request\n{}\n\n## Conversation\n{}\n\nWrite ADR-{} now.",
        feature_request.trim(),
        render_transcript(history),
        number
    )
}

const QUESTION_PROMPT: &str = r#"You are a software architect helping a developer turn a feature request into an Architecture Decision Record.

Ask exactly ONE clarifying question per reply, formatted like this:

# <short heading naming the topic>

<one short paragraph of context explaining why it matters>

Which option do you prefer?

1. **<option title>** ⭐ RECOMMENDED
<one or two lines on trade-offs>
2. **<option title>**
<one or two lines on trade-offs>

Or describe your own approach in free form.

Guidelines:
- Offer 2-4 numbered options when the question has discrete answers; omit the list for open questions
- Mark at most one option with ⭐ RECOMMENDED
- Don't ask about things the user has already explained
- Keep replies short"#;

const READINESS_PROMPT: &str = r#"You judge whether a design conversation has gathered enough information to write an Architecture Decision Record.

Enough means: the problem and its constraints are clear, the main options are known, and the user has indicated a preferred direction.

Reply with ONLY a JSON object, no prose:
{"readyForADR": true|false, "missingInformation": ["..."], "reasoning": "..."}"#;

const DOCUMENT_PROMPT: &str = r###"You are a software architect writing an Architecture Decision Record from a design conversation.

Rules:
- Start with a single level-1 heading: "# ADR-<number>: <title>"
- Record only what the conversation established; do not invent requirements
- End with a "## Implementation Plan" section of numbered steps
- Output markdown only

Use this structure:"###;

const NYGARD_TEMPLATE: &str = r#"
# ADR-<number>: <title>

## Status
Proposed

## Context
<forces, constraints, and the problem>

## Decision
<the decision, stated in active voice>

## Consequences
<what becomes easier, what becomes harder>

## Implementation Plan
1. <step>"#;

const MADR_TEMPLATE: &str = r#"
# ADR-<number>: <title>

## Context and Problem Statement
<problem in two or three sentences>

## Decision Drivers
- <driver>

## Considered Options
- <option>

## Decision Outcome
Chosen option: "<option>", because <justification>.

## Pros and Cons of the Options
### <option>
- Good, because <argument>
- Bad, because <argument>

## Implementation Plan
1. <step>"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_serde_names() {
        assert_eq!(serde_json::to_string(&DocumentStyle::Madr).unwrap(), "\"madr\"");
        let style: DocumentStyle = serde_json::from_str("\"nygard\"").unwrap();
        assert_eq!(style, DocumentStyle::Nygard);
    }

    #[test]
    fn test_document_prompt_differs_by_style() {
        let nygard = DocumentStyle::Nygard.document_prompt();
        let madr = DocumentStyle::Madr.document_prompt();
        assert!(nygard.contains("## Consequences"));
        assert!(madr.contains("## Considered Options"));
        assert!(nygard.contains("## Implementation Plan"));
        assert!(madr.contains("## Implementation Plan"));
    }

    #[test]
    fn test_document_prompt_keeps_quoted_headings() {
        let prompt = DocumentStyle::Nygard.document_prompt();
        assert!(prompt.contains(r##"Start with a single level-1 heading: "# ADR-<number>: <title>""##));
        assert!(prompt.contains(r###"End with a "## Implementation Plan" section"###));
    }

    #[test]
    fn test_question_prompt_describes_option_format() {
        let prompt = DocumentStyle::Nygard.question_prompt();
        assert!(prompt.contains("1. **"));
        assert!(prompt.contains("RECOMMENDED"));
        assert!(prompt.contains("free form"));
    }

    #[test]
    fn test_render_transcript() {
        let history = vec![Turn::agent("Which algorithm?\n"), Turn::user("token bucket")];
        assert_eq!(
            render_transcript(&history),
            "Architect: Which algorithm?\n\nUser: token bucket"
        );
    }

    #[test]
    fn test_question_message_first_and_follow_up() {
        let first = question_message("Add rate limiting", "", &[]);
        assert!(first.contains("Add rate limiting"));
        assert!(!first.contains("Codebase Context"));
        assert!(first.contains("first clarifying question"));

        let follow_up = question_message("Add rate limiting", "axum", &[Turn::user("per tenant")]);
        assert!(follow_up.contains("## Codebase Context\naxum"));
        assert!(follow_up.contains("User: per tenant"));
    }

    #[test]
    fn test_document_message_carries_number() {
        let msg = document_message("Add rate limiting", &[Turn::user("redis")], "0004");
        assert!(msg.contains("Write ADR-0004 now."));
        assert!(msg.contains("User: redis"));
    }
}

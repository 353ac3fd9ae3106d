//! Extraction of structured results from raw model text

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::AgentError;
use crate::domain::{Document, ReadinessEvaluation};
use crate::interpreter::parse_answer;

static ADR_NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bADR[-\s#]*(\d{1,5})\b").unwrap());

static TITLE_PREFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^ADR[-\s#]*\d+\s*[:.\-–—]?\s*").unwrap());

/// Build a document from generated markdown
///
/// The number comes from an `ADR-NNNN` marker in the title heading;
/// `fallback_number` is used when the title carries none.
pub fn parse_document(content: &str, fallback_number: &str) -> Document {
    debug!(content_len = %content.len(), %fallback_number, "parse_document: called");
    let header = parse_answer(content).header;
    let title = TITLE_PREFIX_REGEX.replace(&header, "").trim().to_string();

    // Only the title line names this record; the body may cite others
    let number = ADR_NUMBER_REGEX
        .captures(&header)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .map(format_number)
        .unwrap_or_else(|| fallback_number.to_string());

    Document {
        content: content.trim().to_string(),
        title,
        number,
        implementation_plan: extract_section(content, "implementation plan"),
    }
}

/// Zero-padded four digit record number
pub fn format_number(n: u32) -> String {
    format!("{:04}", n)
}

/// Body of the first heading named `name` (case-insensitive), up to the next
/// heading of the same or higher level
pub fn extract_section(content: &str, name: &str) -> String {
    let mut level = None;
    let mut lines = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim_start();
        let depth = trimmed.chars().take_while(|c| *c == '#').count();
        let is_heading = depth > 0 && trimmed[depth..].starts_with([' ', '\t']);

        match level {
            None => {
                if is_heading && trimmed[depth..].trim().eq_ignore_ascii_case(name) {
                    debug!(depth, "extract_section: section found");
                    level = Some(depth);
                }
            }
            Some(section_depth) => {
                if is_heading && depth <= section_depth {
                    break;
                }
                lines.push(line);
            }
        }
    }

    lines.join("\n").trim().to_string()
}

/// Parse the readiness JSON object, tolerating code fences and surrounding prose
pub fn parse_readiness(text: &str) -> Result<ReadinessEvaluation, AgentError> {
    debug!(text_len = %text.len(), "parse_readiness: called");
    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        return Err(AgentError::InvalidResponse(format!(
            "readiness reply contains no JSON object: {}",
            truncate(text, 200)
        )));
    };
    if end < start {
        return Err(AgentError::InvalidResponse("readiness reply has unbalanced braces".to_string()));
    }

    serde_json::from_str(&text[start..=end])
        .map_err(|e| AgentError::InvalidResponse(format!("readiness JSON did not parse: {}", e)))
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NYGARD_DOC: &str = "# ADR-0007: Use token bucket rate limiting\n\n\
        ## Status\nProposed\n\n\
        ## Decision\nWe will use a token bucket per tenant.\n\n\
        ## Implementation Plan\n1. Add limiter middleware\n2. Store buckets in Redis\n\n\
        ### Rollout\nBehind a flag\n\n\
        ## Notes\nNone\n";

    #[test]
    fn test_parse_document_fields() {
        let doc = parse_document(NYGARD_DOC, "0001");
        assert_eq!(doc.title, "Use token bucket rate limiting");
        assert_eq!(doc.number, "0007");
        assert_eq!(
            doc.implementation_plan,
            "1. Add limiter middleware\n2. Store buckets in Redis\n\n### Rollout\nBehind a flag"
        );
        assert!(doc.content.starts_with("# ADR-0007"));
    }

    #[test]
    fn test_parse_document_fallback_number() {
        let doc = parse_document("# Caching strategy\n\nUse moka.", "0012");
        assert_eq!(doc.number, "0012");
        assert_eq!(doc.title, "Caching strategy");
        assert_eq!(doc.implementation_plan, "");
    }

    #[test]
    fn test_parse_document_pads_short_numbers() {
        let doc = parse_document("# ADR 3 - Pick a queue\n", "0001");
        assert_eq!(doc.number, "0003");
        assert_eq!(doc.title, "Pick a queue");
    }

    #[test]
    fn test_parse_document_ignores_body_references() {
        let doc = parse_document(
            "# Use Redis for buckets\n\n## Status\nAccepted. Supersedes ADR-0003.\n",
            "0008",
        );
        assert_eq!(doc.number, "0008");
        assert_eq!(doc.title, "Use Redis for buckets");

        let doc = parse_document("# ADR-0009: Shard buckets\n\nSupersedes ADR-0003.\n", "0008");
        assert_eq!(doc.number, "0009");
    }

    #[test]
    fn test_extract_section_case_insensitive() {
        let content = "## IMPLEMENTATION PLAN\n- step\n# Next\n";
        assert_eq!(extract_section(content, "implementation plan"), "- step");
    }

    #[test]
    fn test_parse_readiness_plain_and_fenced() {
        let plain = r#"{"readyForADR": true, "missingInformation": [], "reasoning": "clear"}"#;
        assert!(parse_readiness(plain).unwrap().ready_for_adr);

        let fenced = "```json\n{\"readyForADR\": false, \"missingInformation\": [\"load\"], \"reasoning\": \"unknown load\"}\n```";
        let eval = parse_readiness(fenced).unwrap();
        assert!(!eval.ready_for_adr);
        assert_eq!(eval.missing_information, vec!["load"]);
    }

    #[test]
    fn test_parse_readiness_rejects_prose() {
        let err = parse_readiness("Yes, I think we are ready.").unwrap_err();
        assert!(matches!(err, AgentError::InvalidResponse(_)));
    }

    #[test]
    fn test_parse_readiness_rejects_bad_json() {
        assert!(parse_readiness("{ready: yes}").is_err());
    }
}

//! Structured views derived from agent text

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Prompt shown above an option list when the agent did not phrase one
pub const DEFAULT_OPTION_PROMPT: &str = "Which option would you like to go with?";

/// Value carried by the synthetic free-form option
pub const FREE_FORM_VALUE: &str = "__free_form__";

/// Label carried by the synthetic free-form option
pub const FREE_FORM_LABEL: &str = "Something else (type your own answer)";

/// One numbered decision option recognized in agent text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionOption {
    /// Unique within one answer, normally the entry number
    pub id: String,
    pub title: String,
    pub description: String,
    /// Explicitly marked, or first in position
    pub recommended: bool,
}

/// Best-effort structured view of an agent answer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredAnswer {
    pub header: String,
    pub body_text: String,
    pub option_prompt: String,
    pub options: Vec<DecisionOption>,
    pub is_complete: bool,
}

impl StructuredAnswer {
    /// Whether at least one real option was recognized
    pub fn has_options(&self) -> bool {
        !self.options.is_empty()
    }

    /// The agent's option prompt, or the default one if it gave none
    pub fn option_prompt_or_default(&self) -> &str {
        if self.option_prompt.is_empty() {
            DEFAULT_OPTION_PROMPT
        } else {
            &self.option_prompt
        }
    }

    /// Options normalized for selection, plus a trailing free-form entry
    ///
    /// Returns an empty list when no real options exist.
    pub fn selectable_options(&self) -> Vec<SelectableOption> {
        debug!(option_count = %self.options.len(), "selectable_options: called");
        if self.options.is_empty() {
            return Vec::new();
        }

        let mut selectable: Vec<SelectableOption> = self
            .options
            .iter()
            .enumerate()
            .map(|(idx, opt)| SelectableOption {
                value: if opt.id.is_empty() {
                    (idx + 1).to_string()
                } else {
                    opt.id.clone()
                },
                label: opt.title.clone(),
                description: opt.description.clone(),
                recommended: opt.recommended,
                free_form: false,
            })
            .collect();

        selectable.push(SelectableOption::free_form());
        selectable
    }
}

/// An option as offered to whoever is answering the agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectableOption {
    pub value: String,
    pub label: String,
    pub description: String,
    pub recommended: bool,
    /// True only for the synthetic "type your own answer" entry
    pub free_form: bool,
}

impl SelectableOption {
    /// The synthetic free-form entry
    pub fn free_form() -> Self {
        Self {
            value: FREE_FORM_VALUE.to_string(),
            label: FREE_FORM_LABEL.to_string(),
            description: String::new(),
            recommended: false,
            free_form: true,
        }
    }
}

/// A clarifying question from the agent: raw text plus its structured view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarifyingQuestion {
    pub content: String,
    pub answer: StructuredAnswer,
}

/// Backend judgment of whether enough has been gathered to write the document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessEvaluation {
    #[serde(rename = "readyForADR")]
    pub ready_for_adr: bool,
    /// Advisory only
    #[serde(default)]
    pub missing_information: Vec<String>,
    #[serde(default)]
    pub reasoning: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(id: &str, title: &str, recommended: bool) -> DecisionOption {
        DecisionOption {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            recommended,
        }
    }

    #[test]
    fn test_selectable_options_empty_without_real_options() {
        let answer = StructuredAnswer::default();
        assert!(answer.selectable_options().is_empty());
        assert!(!answer.has_options());
    }

    #[test]
    fn test_selectable_options_appends_single_free_form() {
        let answer = StructuredAnswer {
            options: vec![option("1", "Redis", true), option("2", "In-process", false)],
            ..Default::default()
        };

        let selectable = answer.selectable_options();
        assert_eq!(selectable.len(), 3);
        assert_eq!(selectable[0].value, "1");
        assert_eq!(selectable[1].label, "In-process");
        assert!(selectable[2].free_form);
        assert_eq!(selectable[2].value, FREE_FORM_VALUE);
        assert_eq!(selectable.iter().filter(|o| o.free_form).count(), 1);
    }

    #[test]
    fn test_selectable_options_position_fallback_for_empty_id() {
        let answer = StructuredAnswer {
            options: vec![option("", "A", true), option("", "B", false)],
            ..Default::default()
        };

        let values: Vec<_> = answer.selectable_options().into_iter().map(|o| o.value).collect();
        assert_eq!(values, vec!["1", "2", FREE_FORM_VALUE]);
    }

    #[test]
    fn test_option_prompt_or_default() {
        let mut answer = StructuredAnswer::default();
        assert_eq!(answer.option_prompt_or_default(), DEFAULT_OPTION_PROMPT);

        answer.option_prompt = "Which store do you prefer?".to_string();
        assert_eq!(answer.option_prompt_or_default(), "Which store do you prefer?");
    }

    #[test]
    fn test_readiness_deserializes_wire_names() {
        let json = r#"{"readyForADR": true, "missingInformation": ["scale"], "reasoning": "enough"}"#;
        let eval: ReadinessEvaluation = serde_json::from_str(json).unwrap();
        assert!(eval.ready_for_adr);
        assert_eq!(eval.missing_information, vec!["scale"]);
        assert_eq!(eval.reasoning, "enough");
    }

    #[test]
    fn test_readiness_optional_fields_default() {
        let eval: ReadinessEvaluation = serde_json::from_str(r#"{"readyForADR": false}"#).unwrap();
        assert!(!eval.ready_for_adr);
        assert!(eval.missing_information.is_empty());
        assert!(eval.reasoning.is_empty());
    }
}

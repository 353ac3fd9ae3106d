//! Incremental interpretation of streamed agent answers
//!
//! A [`ResponseInterpreter`] is fed the fragments of one answer as they
//! arrive and re-derives a [`StructuredAnswer`] from the whole accumulated
//! text after every fragment, so a heading or option list is picked up as
//! soon as enough text has arrived to recognize it.
//!
//! ```text
//! fragment → accumulate → parse_answer(full text) → StructuredAnswer
//!                                     ↑
//!                        is_complete stays true once set
//! ```
//!
//! One interpreter serves one answer at a time. Call [`ResponseInterpreter::reset`]
//! before reusing it for the next answer; it does not detect that a new answer
//! has started.

mod patterns;

pub use patterns::{looks_complete, parse_answer};

use tracing::debug;

use crate::domain::{SelectableOption, StructuredAnswer};

/// Accumulates fragments of one answer and keeps its latest structured view
#[derive(Debug, Clone, Default)]
pub struct ResponseInterpreter {
    accumulated: String,
    answer: StructuredAnswer,
}

impl ResponseInterpreter {
    /// Create an empty interpreter
    pub fn new() -> Self {
        debug!("ResponseInterpreter::new: called");
        Self::default()
    }

    /// Clear accumulated text and structured fields
    pub fn reset(&mut self) {
        debug!(accumulated_len = %self.accumulated.len(), "ResponseInterpreter::reset: called");
        self.accumulated.clear();
        self.answer = StructuredAnswer::default();
    }

    /// Append a fragment and re-derive the structured view from the full text
    pub fn process_fragment(&mut self, fragment: &str) -> &StructuredAnswer {
        debug!(fragment_len = %fragment.len(), "ResponseInterpreter::process_fragment: called");
        self.accumulated.push_str(fragment);

        let was_complete = self.answer.is_complete;
        let mut answer = parse_answer(&self.accumulated);
        answer.is_complete |= was_complete;
        self.answer = answer;

        &self.answer
    }

    /// Take the final parse once the fragment stream has ended
    ///
    /// The end of the stream is authoritative, so the result is always complete.
    pub fn finish(&mut self) -> StructuredAnswer {
        debug!(accumulated_len = %self.accumulated.len(), "ResponseInterpreter::finish: called");
        let mut answer = parse_answer(&self.accumulated);
        answer.is_complete = true;
        self.answer = answer;
        self.answer.clone()
    }

    /// Latest structured view
    pub fn answer(&self) -> &StructuredAnswer {
        &self.answer
    }

    /// Full text accumulated so far
    pub fn text(&self) -> &str {
        &self.accumulated
    }

    /// Latest options normalized for selection, with the free-form entry appended
    pub fn options(&self) -> Vec<SelectableOption> {
        self.answer.selectable_options()
    }

    /// Whether the latest view has at least one real option
    pub fn has_options(&self) -> bool {
        self.answer.has_options()
    }
}

//! Mock UI implementation for testing.
//!
//! `MockUI` implements the `UserInterface` trait and captures all
//! interactions for later assertion. It can be configured with
//! pre-determined prompt responses.
//!
//! # Example
//!
//! ```
//! use packlint::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.set_prompt_response("readme_link", "https://example.com");
//!
//! ui.message("Formatting 2 files");
//! ui.success("Done");
//!
//! assert!(ui.has_message("Formatting"));
//! assert!(ui.successes().contains(&"Done".to_string()));
//! ```

use std::collections::{HashMap, VecDeque};

use crate::error::Result;

use super::{OutputMode, Prompt, PromptResult, PromptType, SpinnerHandle, UserInterface};

/// Mock UI implementation for testing.
///
/// Supports single responses (via `set_prompt_response`) and queued
/// responses (via `queue_prompt_responses`) for keys asked more than once.
#[derive(Debug, Default)]
pub struct MockUI {
    mode: OutputMode,
    messages: Vec<String>,
    successes: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    spinners: Vec<String>,
    prompt_responses: HashMap<String, String>,
    prompt_queues: HashMap<String, VecDeque<String>>,
    prompts_shown: Vec<String>,
}

impl MockUI {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a response for a prompt key.
    pub fn set_prompt_response(&mut self, key: &str, response: &str) {
        self.prompt_responses
            .insert(key.to_string(), response.to_string());
    }

    /// Queue responses for the same prompt key, returned in order.
    ///
    /// After the queue is exhausted, falls back to `set_prompt_response`
    /// or the prompt default.
    pub fn queue_prompt_responses(&mut self, key: &str, responses: Vec<&str>) {
        let queue = responses.into_iter().map(|s| s.to_string()).collect();
        self.prompt_queues.insert(key.to_string(), queue);
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn spinners(&self) -> &[String] {
        &self.spinners
    }

    /// Keys of the prompts that were shown, in order.
    pub fn prompts_shown(&self) -> &[String] {
        &self.prompts_shown
    }

    pub fn has_message(&self, msg: &str) -> bool {
        self.messages.iter().any(|m| m.contains(msg))
    }

    pub fn has_warning(&self, msg: &str) -> bool {
        self.warnings.iter().any(|m| m.contains(msg))
    }

    pub fn has_error(&self, msg: &str) -> bool {
        self.errors.iter().any(|m| m.contains(msg))
    }

    fn scripted(&mut self, key: &str) -> Option<String> {
        if let Some(response) = self.prompt_queues.get_mut(key).and_then(VecDeque::pop_front) {
            return Some(response);
        }
        self.prompt_responses.get(key).cloned()
    }
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn success(&mut self, msg: &str) {
        self.successes.push(msg.to_string());
    }

    fn warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_string());
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult> {
        self.prompts_shown.push(prompt.key.clone());

        let response = self
            .scripted(&prompt.key)
            .or_else(|| prompt.default.clone())
            .unwrap_or_default();

        Ok(match prompt.prompt_type {
            PromptType::Confirm => {
                PromptResult::Bool(matches!(response.as_str(), "true" | "yes" | "y" | "1"))
            }
            _ => PromptResult::String(response),
        })
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        self.spinners.push(message.to_string());
        Box::new(MockSpinner::new())
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Spinner handle that records its final state.
#[derive(Debug, Default)]
pub struct MockSpinner {
    pub messages: Vec<String>,
    pub finished: Option<String>,
}

impl MockSpinner {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpinnerHandle for MockSpinner {
    fn set_message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn finish_success(&mut self, msg: &str) {
        self.finished = Some(msg.to_string());
    }

    fn finish_error(&mut self, msg: &str) {
        self.finished = Some(msg.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(key: &str, prompt_type: PromptType, default: Option<&str>) -> Prompt {
        Prompt {
            key: key.to_string(),
            question: "Q?".to_string(),
            prompt_type,
            default: default.map(String::from),
        }
    }

    #[test]
    fn captures_output() {
        let mut ui = MockUI::new();
        ui.message("hello");
        ui.warning("careful");
        ui.error("boom");
        assert!(ui.has_message("hell"));
        assert!(ui.has_warning("careful"));
        assert!(ui.has_error("boom"));
    }

    #[test]
    fn queued_responses_come_first() {
        let mut ui = MockUI::new();
        ui.set_prompt_response("k", "fallback");
        ui.queue_prompt_responses("k", vec!["one", "two"]);
        let p = prompt("k", PromptType::Input, None);
        assert_eq!(ui.prompt(&p).unwrap().as_string(), "one");
        assert_eq!(ui.prompt(&p).unwrap().as_string(), "two");
        assert_eq!(ui.prompt(&p).unwrap().as_string(), "fallback");
        assert_eq!(ui.prompts_shown().len(), 3);
    }

    #[test]
    fn confirm_parses_yes() {
        let mut ui = MockUI::new();
        ui.set_prompt_response("ok", "yes");
        assert_eq!(ui.prompt(&prompt("ok", PromptType::Confirm, None)).unwrap(), PromptResult::Bool(true));
        assert_eq!(
            ui.prompt(&prompt("other", PromptType::Confirm, Some("no"))).unwrap(),
            PromptResult::Bool(false)
        );
    }

    #[test]
    fn spinners_are_recorded() {
        let mut ui = MockUI::new();
        let mut spinner = ui.start_spinner("Building graph");
        spinner.finish_success("done");
        assert_eq!(ui.spinners(), ["Building graph".to_string()]);
    }
}

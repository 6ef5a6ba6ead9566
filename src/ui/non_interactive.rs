//! Non-interactive UI for CI/headless environments.

use std::collections::HashMap;

use crate::error::{PacklintError, Result};

use super::theme::PacklintTheme;
use super::{OutputMode, Prompt, PromptResult, PromptType, SpinnerHandle, UserInterface};

/// Prefix of environment variables that answer prompts by key.
const PROMPT_ENV_PREFIX: &str = "PACKLINT_PROMPT_";

/// UI implementation for non-interactive mode.
///
/// Prompts are answered from `PACKLINT_PROMPT_<KEY>` variables, then from
/// the prompt's default. Status goes to stderr.
pub struct NonInteractiveUI {
    mode: OutputMode,
    env_overrides: HashMap<String, String>,
}

impl NonInteractiveUI {
    pub fn new(mode: OutputMode) -> Self {
        let env_overrides = std::env::vars()
            .filter(|(k, _)| k.starts_with(PROMPT_ENV_PREFIX))
            .collect();
        Self { mode, env_overrides }
    }

    /// Create with explicit overrides (for testing).
    pub fn with_overrides(mode: OutputMode, overrides: HashMap<String, String>) -> Self {
        Self {
            mode,
            env_overrides: overrides,
        }
    }

    fn answer(prompt: &Prompt, raw: &str) -> PromptResult {
        match prompt.prompt_type {
            PromptType::Confirm => {
                PromptResult::Bool(matches!(raw.to_ascii_lowercase().as_str(), "true" | "yes" | "y" | "1"))
            }
            _ => PromptResult::String(raw.to_string()),
        }
    }
}

impl UserInterface for NonInteractiveUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            eprintln!("{}", msg);
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            eprintln!("{}", PacklintTheme::plain().format_success(msg));
        }
    }

    fn warning(&mut self, msg: &str) {
        eprintln!("{}", PacklintTheme::plain().format_warning(msg));
    }

    fn error(&mut self, msg: &str) {
        eprintln!("{}", PacklintTheme::plain().format_error(msg));
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult> {
        let env_key = format!("{}{}", PROMPT_ENV_PREFIX, prompt.key.to_uppercase());
        if let Some(value) = self.env_overrides.get(&env_key) {
            return Ok(Self::answer(prompt, value));
        }
        if let Some(default) = &prompt.default {
            return Ok(Self::answer(prompt, default));
        }
        Err(PacklintError::Other(anyhow::anyhow!(
            "Cannot prompt for '{}' in non-interactive mode (no default value)",
            prompt.key
        )))
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_detail() {
            eprintln!("{}", message);
        }
        Box::new(NoopSpinner { mode: self.mode })
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Spinner that only prints its final line.
struct NoopSpinner {
    mode: OutputMode,
}

impl SpinnerHandle for NoopSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish_success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            eprintln!("{}", PacklintTheme::plain().format_success(msg));
        }
    }

    fn finish_error(&mut self, msg: &str) {
        eprintln!("{}", PacklintTheme::plain().format_error(msg));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(key: &str, prompt_type: PromptType, default: Option<&str>) -> Prompt {
        Prompt {
            key: key.to_string(),
            question: "Question?".to_string(),
            prompt_type,
            default: default.map(String::from),
        }
    }

    #[test]
    fn non_interactive_is_not_interactive() {
        assert!(!NonInteractiveUI::with_overrides(OutputMode::Normal, HashMap::new()).is_interactive());
    }

    #[test]
    fn prompt_uses_default() {
        let mut ui = NonInteractiveUI::with_overrides(OutputMode::Normal, HashMap::new());
        let result = ui.prompt(&prompt("url", PromptType::Input, Some("skip"))).unwrap();
        assert_eq!(result, PromptResult::String("skip".into()));
    }

    #[test]
    fn prompt_fails_without_default() {
        let mut ui = NonInteractiveUI::with_overrides(OutputMode::Normal, HashMap::new());
        assert!(ui.prompt(&prompt("url", PromptType::Input, None)).is_err());
    }

    #[test]
    fn prompt_uses_env_override() {
        let overrides = HashMap::from([("PACKLINT_PROMPT_FIX_LINK".to_string(), "yes".to_string())]);
        let mut ui = NonInteractiveUI::with_overrides(OutputMode::Normal, overrides);
        let result = ui.prompt(&prompt("fix_link", PromptType::Confirm, Some("no"))).unwrap();
        assert_eq!(result, PromptResult::Bool(true));
    }
}

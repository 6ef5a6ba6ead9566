//! Interactive terminal UI.

use console::Term;
use std::io::Write;

use crate::error::Result;

use super::{
    prompt_user, NonInteractiveUI, OutputMode, PacklintTheme, ProgressSpinner, Prompt,
    PromptResult, SpinnerHandle, UserInterface,
};

/// Interactive terminal UI implementation.
///
/// Status goes to stderr so stdout carries only the report.
pub struct TerminalUI {
    term: Term,
    theme: PacklintTheme,
    mode: OutputMode,
}

impl TerminalUI {
    pub fn new(mode: OutputMode, use_color: bool) -> Self {
        Self {
            term: Term::stderr(),
            theme: PacklintTheme::for_color(use_color),
            mode,
        }
    }
}

impl UserInterface for TerminalUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", msg).ok();
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", self.theme.format_success(msg)).ok();
        }
    }

    fn warning(&mut self, msg: &str) {
        writeln!(self.term, "{}", self.theme.format_warning(msg)).ok();
    }

    fn error(&mut self, msg: &str) {
        writeln!(self.term, "{}", self.theme.format_error(msg)).ok();
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult> {
        prompt_user(prompt, &self.term)
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_spinners() {
            Box::new(ProgressSpinner::new(message, self.theme.clone()))
        } else {
            Box::new(ProgressSpinner::hidden())
        }
    }

    fn is_interactive(&self) -> bool {
        self.term.is_term()
    }
}

/// Create the UI for the current terminal.
///
/// Falls back to [`NonInteractiveUI`] when `interactive` is false.
pub fn create_ui(interactive: bool, mode: OutputMode) -> Box<dyn UserInterface> {
    create_ui_with_color(interactive, mode, super::should_use_colors())
}

/// Like [`create_ui`] with an explicit color choice (`--no-color`).
pub fn create_ui_with_color(
    interactive: bool,
    mode: OutputMode,
    use_color: bool,
) -> Box<dyn UserInterface> {
    if interactive && Term::stderr().is_term() {
        Box::new(TerminalUI::new(mode, use_color))
    } else {
        Box::new(NonInteractiveUI::new(mode))
    }
}

//! Progress spinners.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use super::theme::PacklintTheme;
use super::SpinnerHandle;

/// A progress spinner for long-running passes such as the graph build.
pub struct ProgressSpinner {
    bar: ProgressBar,
    theme: PacklintTheme,
}

impl ProgressSpinner {
    pub fn new(message: &str, theme: PacklintTheme) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("{spinner:.magenta} {msg}")
        {
            bar.set_style(style);
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar, theme }
    }

    /// A spinner that never draws (quiet mode, non-TTY).
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            theme: PacklintTheme::plain(),
        }
    }

    fn finish(&mut self, text: String) {
        if let Ok(style) = ProgressStyle::default_spinner().template("{msg}") {
            self.bar.set_style(style);
        }
        self.bar.finish_with_message(text);
    }
}

impl SpinnerHandle for ProgressSpinner {
    fn set_message(&mut self, msg: &str) {
        self.bar.set_message(msg.to_string());
    }

    fn finish_success(&mut self, msg: &str) {
        let text = self.theme.format_success(msg);
        self.finish(text);
    }

    fn finish_error(&mut self, msg: &str) {
        let text = self.theme.format_error(msg);
        self.finish(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_spinner_accepts_every_call() {
        let mut spinner = ProgressSpinner::hidden();
        spinner.set_message("Building content graph");
        spinner.finish_success("Graph built");
        assert!(spinner.bar.is_finished());
    }
}

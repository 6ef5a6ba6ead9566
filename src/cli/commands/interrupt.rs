//! Ctrl-C handling for long-running commands.

use std::sync::OnceLock;

use tracing::{debug, warn};

use crate::validate::CancellationToken;

static INTERRUPT: OnceLock<CancellationToken> = OnceLock::new();

/// The process-wide token that Ctrl-C cancels.
///
/// The first call installs the signal handler. A run that picks up this
/// token stops between validators, keeps its partial results and skips the
/// fix pass.
pub fn interrupt_token() -> CancellationToken {
    INTERRUPT
        .get_or_init(|| {
            let token = CancellationToken::new();
            let handler_token = token.clone();
            match ctrlc::set_handler(move || handler_token.cancel()) {
                Ok(()) => debug!("Installed Ctrl-C handler"),
                Err(e) => warn!("Could not install Ctrl-C handler: {}", e),
            }
            token
        })
        .clone()
}

//! packlint CLI entry point.

use std::io::IsTerminal;
use std::process::ExitCode;

use clap::Parser;
use packlint::cli::commands::EXIT_INVALID;
use packlint::cli::{Cli, CommandDispatcher};
use packlint::ui::{create_ui_with_color, should_use_colors, OutputMode};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("packlint=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("packlint=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("packlint starting with args: {:?}", cli);

    let output_mode = OutputMode::from_flags(cli.verbose, cli.quiet);
    let use_color = !cli.no_color && should_use_colors();

    let content_root = match cli.root.clone() {
        Some(root) => root,
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                eprintln!("Error: cannot read the current directory: {}", e);
                return ExitCode::from(EXIT_INVALID as u8);
            }
        },
    };

    let is_interactive = std::io::stdin().is_terminal() && std::io::stderr().is_terminal();
    let mut ui = create_ui_with_color(is_interactive, output_mode, use_color);

    let dispatcher = CommandDispatcher::new(content_root)
        .with_config_path(cli.config.clone())
        .with_color(use_color);

    match dispatcher.dispatch(&cli, ui.as_mut()) {
        Ok(result) => ExitCode::from(result.exit_code as u8),
        Err(e) => {
            ui.error(&format!("Error: {}", e));
            ExitCode::from(EXIT_INVALID as u8)
        }
    }
}

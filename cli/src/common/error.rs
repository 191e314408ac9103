//! Error handling utilities for the CLI.

use pika::{Error, RenderConfig, render_error_to};

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, Error>;

/// Render an error to stderr and exit with code 1.
///
/// `filename` labels source snippets of syntax errors.
pub fn render_and_exit(error: Error, no_color: bool, filename: Option<&str>) -> ! {
    let config = RenderConfig {
        color: !no_color,
        filename,
        ..Default::default()
    };
    render_error_to(&error, &mut std::io::stderr(), &config).ok();
    std::process::exit(1);
}

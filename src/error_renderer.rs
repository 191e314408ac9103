//! Error rendering using ariadne
//!
//! Syntax errors in assembly text are rendered as annotated source snippets;
//! assembly and machine errors have no source position and render as a
//! single line.

use crate::Error;
use crate::asm::ParseError;
use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};
use std::io::Write;

/// Character set for rendering error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharSet {
    /// Use Unicode characters for rich visual output.
    #[default]
    Unicode,
    /// Use ASCII-only characters for compatibility.
    Ascii,
}

/// Configuration for error rendering.
#[derive(Debug, Clone)]
pub struct RenderConfig<'a> {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
    /// The filename to display in error messages.
    /// Defaults to "<unknown>" if not provided.
    pub filename: Option<&'a str>,
    /// The character set to use for rendering.
    pub charset: CharSet,
}

impl Default for RenderConfig<'_> {
    fn default() -> Self {
        RenderConfig::default()
    }
}

impl RenderConfig<'_> {
    const fn default() -> Self {
        Self {
            color: true,
            filename: None,
            charset: CharSet::Unicode,
        }
    }
}

/// Render an error to stderr using the default config.
///
/// # Example
/// ```no_run
/// use pika::api::{self, MachineOptions};
/// use pika::render_error;
///
/// if let Err(e) = api::run_text("PushI x\n", &MachineOptions::default(), std::io::sink()) {
///     render_error(&e);
/// }
/// ```
pub fn render_error(error: &Error) {
    render_error_to(error, &mut std::io::stderr(), &RenderConfig::default()).ok();
}

/// Render an error to a writer with the given configuration.
///
/// # Example
/// ```
/// use pika::api::{self, MachineOptions};
/// use pika::{RenderConfig, render_error_to};
///
/// let error = api::run_text("Jump $nowhere\n", &MachineOptions::default(), std::io::sink())
///     .unwrap_err();
/// let mut buf = Vec::new();
/// let config = RenderConfig { color: false, ..Default::default() };
/// render_error_to(&error, &mut buf, &config).unwrap();
/// assert_eq!(
///     String::from_utf8(buf).unwrap(),
///     "Error: assembly failed: label `$nowhere` is never defined\n"
/// );
/// ```
pub fn render_error_to(
    error: &Error,
    writer: &mut dyn Write,
    config: &RenderConfig,
) -> std::io::Result<()> {
    let filename = config.filename.unwrap_or("<unknown>");

    match error {
        Error::Parse { error, text } => render_parse_error(text, error, writer, config, filename),
        Error::Assemble(_) | Error::Machine(_) | Error::Input(_) => {
            writeln!(writer, "Error: {}", error)
        }
    }
}

fn render_parse_error(
    source: &str,
    error: &ParseError,
    writer: &mut dyn Write,
    config: &RenderConfig,
    filename: &str,
) -> std::io::Result<()> {
    let mut colors = ColorGenerator::new();
    colors.next(); // Skip the first color.

    let ariadne_charset = match config.charset {
        CharSet::Unicode => ariadne::CharSet::Unicode,
        CharSet::Ascii => ariadne::CharSet::Ascii,
    };
    let ariadne_config = ariadne::Config::default()
        .with_color(config.color)
        .with_char_set(ariadne_charset);

    let message = format!("syntax error: {}", error.message);
    Report::build(ReportKind::Error, (filename, error.span.clone()))
        .with_message(&message)
        .with_config(ariadne_config)
        .with_label(
            Label::new((filename, error.span.clone()))
                .with_message(&error.message)
                .with_color(colors.next()),
        )
        .finish()
        .write((filename, Source::from(source)), &mut *writer)
}

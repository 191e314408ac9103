//! The public error type.
//!
//! Each stage has its own error; [`Error`] gathers them at the API boundary
//! and keeps enough context (the assembly text for parse errors) to render a
//! report.

use thiserror::Error;

use crate::asm::ParseError;
use crate::vm::{AssembleError, MachineError};

#[derive(Debug, Error)]
pub enum Error {
    /// Assembly text failed to parse. `text` is the input, for rendering.
    #[error("syntax error: {error}")]
    Parse { error: ParseError, text: String },

    #[error("assembly failed: {0}")]
    Assemble(#[from] AssembleError),

    #[error("machine error: {0}")]
    Machine(#[from] MachineError),

    /// The input could not be read or decoded.
    #[error("{0}")]
    Input(String),
}

impl Error {
    pub(crate) fn parse(error: ParseError, text: &str) -> Self {
        Error::Parse {
            error,
            text: text.to_string(),
        }
    }
}

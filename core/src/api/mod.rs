//! Public entry points.
//!
//! ```
//! use pika_core::api::{self, CompileOptions, MachineOptions};
//! use pika_core::tree::build::*;
//!
//! let program = program(0, vec![print(vec![item(int(42)), newline()])]);
//! let execution =
//!     api::run_program(&program, &CompileOptions::default(), &MachineOptions::default())
//!         .unwrap();
//! assert_eq!(execution.output, "42\n");
//! ```

mod error;
mod options;

use std::io::Write;

use tracing::debug;

pub use error::Error;
pub use options::{CompileOptions, MachineOptions};

use crate::asm::{self, Fragment};
use crate::codegen;
use crate::tree::Program;
use crate::vm::{Image, Machine};

/// Generates the complete assembly program for `program`.
pub fn compile(program: &Program, options: &CompileOptions) -> Fragment {
    codegen::generate(program, options)
}

/// The observable result of running a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    /// Everything the program printed, decoded lossily as UTF-8.
    pub output: String,
    /// Instructions executed.
    pub steps: u64,
}

/// Compiles `program`, assembles it, and runs it to completion.
pub fn run_program(
    program: &Program,
    compile_options: &CompileOptions,
    machine_options: &MachineOptions,
) -> Result<Execution, Error> {
    let code = compile(program, compile_options);
    let mut output = Vec::new();
    let steps = run_code(&code, machine_options, &mut output)?;
    Ok(Execution {
        output: String::from_utf8_lossy(&output).into_owned(),
        steps,
    })
}

/// Assembles already generated code and runs it, writing its output to `out`.
pub fn run_code(code: &Fragment, options: &MachineOptions, out: impl Write) -> Result<u64, Error> {
    let image = Image::assemble(code.instructions())?;
    let mut machine = Machine::new(&image, options, out)?;
    Ok(machine.run()?)
}

/// Parses, assembles and runs assembly text, writing its output to `out`.
pub fn run_text(
    text: &str,
    options: &MachineOptions,
    out: impl Write,
) -> Result<u64, Error> {
    let instructions = asm::parse(text).map_err(|error| Error::parse(error, text))?;
    debug!(instructions = instructions.len(), "Parsed assembly");
    let image = Image::assemble(&instructions)?;
    let mut machine = Machine::new(&image, options, out)?;
    Ok(machine.run()?)
}

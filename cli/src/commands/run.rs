//! The `run` command - run assembly text or a typed program tree.

use std::io::Write;

use pika::Error;
use pika::api::{self, CompileOptions, MachineOptions};
use tracing::debug;

use crate::cli::RunArgs;
use crate::common::CliResult;
use crate::common::error::render_and_exit;
use crate::common::input::{is_program_tree, read_input, read_program};

/// Run the run command.
pub fn run(args: RunArgs, no_color: bool) -> CliResult<()> {
    let (content, display_name) = read_input(&args.file).map_err(Error::Input)?;

    let options = MachineOptions {
        memory_size: args.memory_size,
        max_steps: args.max_steps,
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let steps = if args.tree || is_program_tree(&args.file) {
        let program = read_program(&content, &display_name)?;
        let compile_options = CompileOptions {
            memory_manager: !args.no_memory_manager,
        };
        let code = api::compile(&program, &compile_options);
        api::run_code(&code, &options, &mut out)?
    } else {
        match api::run_text(&content, &options, &mut out) {
            Ok(steps) => steps,
            Err(error @ Error::Parse { .. }) => {
                out.flush().ok();
                render_and_exit(error, no_color, Some(&display_name))
            }
            Err(error) => return Err(error),
        }
    };
    out.flush().ok();

    debug!(steps, file = %display_name, "Program halted");
    Ok(())
}

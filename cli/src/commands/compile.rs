//! The `compile` command - generate assembly for a typed program tree.

use pika::Error;
use pika::api::{self, CompileOptions};
use tracing::debug;

use crate::cli::CompileArgs;
use crate::common::CliResult;
use crate::common::input::{read_input, read_program};

/// Run the compile command.
pub fn run(args: CompileArgs) -> CliResult<()> {
    let (content, display_name) = read_input(&args.file).map_err(Error::Input)?;
    let program = read_program(&content, &display_name)?;

    let options = CompileOptions {
        memory_manager: !args.no_memory_manager,
    };
    let code = api::compile(&program, &options);
    debug!(instructions = code.len(), "Generated program");

    match &args.output {
        Some(path) => std::fs::write(path, code.to_string())
            .map_err(|e| Error::Input(format!("{}: {}", path.display(), e))),
        None => {
            print!("{}", code);
            Ok(())
        }
    }
}

//! The `completions` command - generate shell completions.

use clap::CommandFactory;
use clap_complete::generate;

use crate::cli::{Cli, CompletionsArgs};

/// Print a completion script for `args.shell` covering `compile`, `run`,
/// `completions` and their flags.
pub fn run(args: CompletionsArgs) {
    let mut cmd = Cli::command();
    generate(args.shell, &mut cmd, "pika", &mut std::io::stdout());
}

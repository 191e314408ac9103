//! Command-line interface definitions.
//!
//! This module contains only clap struct definitions - no business logic.
//! All command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use pika::api::MachineOptions;

/// Pika - compile typed programs to stack machine assembly and run them
#[derive(Parser, Debug)]
#[command(name = "pika", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate assembly for a typed program tree (JSON)
    Compile(CompileArgs),

    /// Run an assembly file, or a typed program tree (`.json`)
    Run(RunArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `compile` command.
#[derive(Args, Debug)]
pub struct CompileArgs {
    /// Typed program tree to compile (use - for stdin)
    pub file: String,

    /// Write the assembly here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Leave out the allocator and the discard routine
    #[arg(long)]
    pub no_memory_manager: bool,
}

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// File to run (use - for stdin); `.json` files are typed program trees
    pub file: String,

    /// Read the input as a typed program tree (JSON) whatever its name
    #[arg(long)]
    pub tree: bool,

    /// Size of the machine's memory in bytes
    #[arg(long, default_value_t = MachineOptions::DEFAULT_MEMORY_SIZE)]
    pub memory_size: usize,

    /// Stop with an error after this many instructions
    #[arg(long)]
    pub max_steps: Option<u64>,

    /// When running a tree, leave out the allocator and the discard routine
    #[arg(long)]
    pub no_memory_manager: bool,
}

/// Arguments for the `completions` command.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

//! Pika - code generation and runtime for a small typed language on a stack
//! machine.
//!
//! # Overview
//!
//! The front end (parsing, scoping, type checking) hands over a typed tree,
//! [`tree::Program`]. This crate turns that tree into assembly for a stack
//! machine with flat byte-addressed memory, together with the runtime library
//! the generated code relies on: printing, rational arithmetic, array and
//! string operations, a first-fit allocator and recursive freeing.
//!
//! The same crate ships the machine itself, so a program can be compiled and
//! run end to end.
//!
//! # Quick Start
//!
//! ```
//! use pika::api::{self, CompileOptions, MachineOptions};
//! use pika::tree::Type;
//! use pika::tree::build::*;
//!
//! // print [1, 2, 3]
//! let program = program(
//!     0,
//!     vec![print(vec![
//!         item(array(Type::Integer, vec![int(1), int(2), int(3)])),
//!         newline(),
//!     ])],
//! );
//!
//! let execution =
//!     api::run_program(&program, &CompileOptions::default(), &MachineOptions::default())
//!         .unwrap();
//! assert_eq!(execution.output, "[1, 2, 3]\n");
//! ```
//!
//! # Assembly Text
//!
//! Generated code prints as one instruction per line and parses back with
//! [`asm::parse`], so it can be inspected, stored and run later:
//!
//! ```
//! use pika::api::{self, MachineOptions};
//!
//! let mut out = Vec::new();
//! let text = "PushI 40\nPushI 2\nAdd\nPStack\nHalt\n";
//! api::run_text(text, &MachineOptions::default(), &mut out).unwrap();
//! assert_eq!(String::from_utf8(out).unwrap(), "Stack: [42]\n");
//! ```

// Error rendering utilities
pub mod error_renderer;
pub use error_renderer::{CharSet, RenderConfig, render_error, render_error_to};

// Re-export public API from pika_core
pub use pika_core::api::{self, CompileOptions, Error, Execution, MachineOptions};
pub use pika_core::{asm, codegen, tree, vm};

//! Code generation: typed tree in, one flat ASM fragment out.
//!
//! The generated program is laid out as
//!
//! ```text
//! memory manager initialization   (optional)
//! runtime environment             pointers, strings, scratch, faults, subroutines
//! $global-memory-block            DataZ <global scope size>
//! $$main                          the program, then Halt
//! memory manager epilogue         (optional), ending with $heap-memory
//! ```

mod calling;
mod generator;
mod labeller;
pub mod memory_manager;
mod operators;
mod print;
pub mod record;
pub mod runtime;
mod scratch;

pub use generator::{CodeGenerator, generate};
pub use labeller::{LabelSource, Labeller};
pub use runtime::Fault;
pub use scratch::ScratchContext;

//! The target assembly language: instructions, fragments, and text.

mod fragment;
mod instruction;
mod text;

pub use fragment::{Fragment, FragmentKind};
pub use instruction::Instruction;
pub use text::{ParseError, parse};

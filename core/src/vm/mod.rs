//! An emulator for the target stack machine.
//!
//! [`Image::assemble`] resolves labels and lays out data; [`Machine`] runs
//! the result, writing `Printf` output to any [`std::io::Write`].

mod error;
mod image;
mod machine;
mod printf;

pub use error::{AssembleError, MachineError};
pub use image::Image;
pub use machine::{Machine, Word};
pub use printf::format_g;

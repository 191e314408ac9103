use std::io;

use ecow::EcoString;
use thiserror::Error;

/// Failure to turn an instruction list into a loadable [`Image`].
///
/// [`Image`]: crate::vm::Image
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssembleError {
    #[error("label `{0}` is defined more than once")]
    DuplicateLabel(EcoString),
    #[error("label `{0}` is never defined")]
    UndefinedLabel(EcoString),
    #[error("`{opcode}` needs a code label, but `{label}` labels data")]
    NotCodeLabel {
        opcode: &'static str,
        label: EcoString,
    },
    #[error("`DataZ` given a negative size ({0})")]
    NegativeDataSize(i32),
}

/// A fault of the machine itself.
///
/// Well-formed generated programs never raise these; their own runtime
/// faults print a message and halt normally.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("stack underflow at instruction {pc}")]
    StackUnderflow { pc: usize },
    #[error("expected {expected} on the stack at instruction {pc}")]
    TypeMismatch { pc: usize, expected: &'static str },
    #[error("access of {width} bytes at address {address} is out of bounds at instruction {pc}")]
    MemoryOutOfBounds {
        pc: usize,
        address: i64,
        width: usize,
    },
    #[error("integer division by zero at instruction {pc}")]
    DivisionByZero { pc: usize },
    #[error("jump to {target} is outside the program at instruction {pc}")]
    BadJumpTarget { pc: usize, target: i32 },
    #[error("step limit of {limit} exceeded")]
    StepLimitExceeded { limit: u64 },
    #[error("program data ({data} bytes) does not fit in {memory} bytes of memory")]
    ImageTooLarge { data: usize, memory: usize },
    #[error("failed to write program output")]
    Output(#[from] io::Error),
}

//! Knobs for code generation and for the emulator.

/// Options for [`compile`](crate::api::compile).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Emit the allocator (and the discard routine that depends on it).
    ///
    /// Programs that never allocate can turn this off for a smaller image.
    pub memory_manager: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            memory_manager: true,
        }
    }
}

/// Options for [`Machine`](crate::vm::Machine).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineOptions {
    /// Bytes of memory; `Memtop` pushes this value.
    pub memory_size: usize,
    /// Stop with [`MachineError::StepLimitExceeded`] after this many
    /// instructions.
    ///
    /// [`MachineError::StepLimitExceeded`]: crate::vm::MachineError::StepLimitExceeded
    pub max_steps: Option<u64>,
}

impl MachineOptions {
    pub const DEFAULT_MEMORY_SIZE: usize = 1 << 20;
}

impl Default for MachineOptions {
    fn default() -> Self {
        Self {
            memory_size: Self::DEFAULT_MEMORY_SIZE,
            max_steps: None,
        }
    }
}

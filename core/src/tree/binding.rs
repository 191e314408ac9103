//! Bindings: what a name resolves to after scoping.

use ecow::EcoString;
use serde::{Deserialize, Serialize};

use crate::asm::{Fragment, Instruction::*};
use crate::codegen::runtime::{FRAME_POINTER, GLOBAL_MEMORY_BLOCK};
use crate::tree::Type;

/// Where a binding lives.
///
/// Offsets are in bytes. Globals are relative to the global memory block;
/// locals and parameters are relative to the frame pointer of the enclosing
/// lambda (locals negative, parameters non-negative).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryLocation {
    Global(i32),
    Local(i32),
    Parameter(i32),
}

impl MemoryLocation {
    pub fn offset(&self) -> i32 {
        match *self {
            MemoryLocation::Global(offset)
            | MemoryLocation::Local(offset)
            | MemoryLocation::Parameter(offset) => offset,
        }
    }

    /// Code pushing the absolute address `offset + delta` bytes into this location.
    fn address_code(&self, delta: i32) -> Fragment {
        let mut code = Fragment::address();
        match self {
            MemoryLocation::Global(offset) => {
                code.extend([PushD(GLOBAL_MEMORY_BLOCK.into()), PushI(offset + delta), Add]);
            }
            MemoryLocation::Local(offset) | MemoryLocation::Parameter(offset) => {
                code.extend([
                    PushD(FRAME_POINTER.into()),
                    LoadI,
                    PushI(offset + delta),
                    Add,
                ]);
            }
        }
        code
    }
}

/// A resolved name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub name: EcoString,
    pub ty: Type,
    pub location: MemoryLocation,
    #[serde(default)]
    pub mutable: bool,
}

impl Binding {
    pub fn new(name: impl Into<EcoString>, ty: Type, location: MemoryLocation) -> Self {
        Binding {
            name: name.into(),
            ty,
            location,
            mutable: false,
        }
    }

    pub fn mutable(mut self) -> Self {
        self.mutable = true;
        self
    }

    /// Code leaving the binding's address on the stack.
    pub fn address_code(&self) -> Fragment {
        self.location.address_code(0)
    }

    /// Address of the one-byte "already initialized" flag of a static binding.
    ///
    /// Static bindings are allocated one byte larger than their type; the flag
    /// sits right after the value.
    pub fn companion_address_code(&self) -> Fragment {
        self.location.address_code(self.ty.size())
    }
}

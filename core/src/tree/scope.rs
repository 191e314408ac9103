//! Storage allocation for scopes.
//!
//! Front ends use these to lay out bindings the same way the generator
//! expects to find them: the program scope grows upward through the global
//! memory block, procedure scopes grow downward below the 8-byte frame
//! overhead, and parameters sit above the frame pointer with the last
//! parameter at offset zero.

use smallvec::SmallVec;

use crate::tree::{MemoryLocation, Type};

/// Bytes reserved at the base of every frame: saved frame pointer and return address.
pub const FRAME_OVERHEAD: i32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    Program,
    Procedure,
}

/// Allocates bindings of one scope and its nested subscopes.
///
/// Subscopes reuse the space of their siblings; the scope's final size is the
/// high-water mark.
#[derive(Debug, Clone)]
pub struct ScopeAllocator {
    kind: ScopeKind,
    current: i32,
    max: i32,
    marks: SmallVec<[i32; 8]>,
}

impl ScopeAllocator {
    /// The outermost scope, allocated in the global memory block.
    pub fn program() -> Self {
        ScopeAllocator {
            kind: ScopeKind::Program,
            current: 0,
            max: 0,
            marks: SmallVec::new(),
        }
    }

    /// The locals of a lambda body, below the frame overhead.
    pub fn procedure() -> Self {
        ScopeAllocator {
            kind: ScopeKind::Procedure,
            current: 0,
            max: 0,
            marks: SmallVec::new(),
        }
    }

    pub fn allocate(&mut self, ty: &Type) -> MemoryLocation {
        self.allocate_bytes(ty.size())
    }

    /// Allocates a static binding: the value plus its one-byte companion flag.
    pub fn allocate_static(&mut self, ty: &Type) -> MemoryLocation {
        self.allocate_bytes(ty.size() + 1)
    }

    pub fn allocate_bytes(&mut self, size: i32) -> MemoryLocation {
        let start = self.current;
        self.current += size;
        self.max = self.max.max(self.current);
        match self.kind {
            ScopeKind::Program => MemoryLocation::Global(start),
            ScopeKind::Procedure => MemoryLocation::Local(-FRAME_OVERHEAD - self.current),
        }
    }

    /// Opens a subscope.
    pub fn enter(&mut self) {
        self.marks.push(self.current);
    }

    /// Closes the innermost subscope, releasing its space for reuse.
    pub fn leave(&mut self) {
        self.current = self
            .marks
            .pop()
            .expect("leave() without matching enter() (scope bug)");
    }

    /// Final byte size of the scope, excluding any frame overhead.
    pub fn allocated_size(&self) -> i32 {
        self.max
    }
}

/// Collects parameter types and assigns frame-relative offsets once all are known.
#[derive(Debug, Clone, Default)]
pub struct ParameterAllocator {
    sizes: SmallVec<[i32; 8]>,
}

impl ParameterAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, ty: &Type) {
        self.sizes.push(ty.size());
    }

    /// Offsets of every parameter, in declaration order.
    ///
    /// Arguments are written below the caller's stack pointer in declaration
    /// order, so the last parameter ends up at the frame pointer and parameter
    /// `k` at the combined size of the parameters after it.
    pub fn locations(&self) -> Vec<MemoryLocation> {
        let mut offset = self.allocated_size();
        self.sizes
            .iter()
            .map(|size| {
                offset -= size;
                MemoryLocation::Parameter(offset)
            })
            .collect()
    }

    pub fn allocated_size(&self) -> i32 {
        self.sizes.iter().sum()
    }
}

#[cfg(test)]
#[path = "scope_test.rs"]
mod scope_test;

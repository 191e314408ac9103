//! The typed tree: the contract between the front end and the code generator.
//!
//! Every expression carries its resolved type, every storage location a
//! [`Binding`] that knows how to emit its address, every operator a resolved
//! [`Signature`], and every scope its final byte size. The tree is
//! serde-serializable so a front end in another process can hand it over as
//! JSON.

mod binding;
pub mod build;
mod node;
mod scope;
mod types;

pub use binding::{Binding, MemoryLocation};
pub use node::{
    ComparisonOp, Expr, ExprKind, ForKind, FullGenerator, Lambda, PrintItem, Program, Signature,
    Snippet, Statement,
};
pub use scope::{FRAME_OVERHEAD, ParameterAllocator, ScopeAllocator};
pub use types::Type;

//! The Pika back end: a code generator from a typed tree to the assembly
//! language of a stack machine with flat memory, the runtime library every
//! generated program carries, and an emulator to run the result.

pub mod api;
pub mod asm;
pub mod codegen;
pub mod tree;
pub mod vm;

/// Test utilities for enabling logging in tests
#[cfg(test)]
pub mod test_utils {
    /// Initialize tracing subscriber for tests with DEBUG level.
    /// Call this at the start of tests where you want to see logging output.
    pub fn init_test_logging() {
        use tracing_subscriber::{EnvFilter, fmt};

        // Try to initialize, ignore error if already initialized
        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }
}

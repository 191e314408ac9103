//! Unique label generation.

use ecow::{EcoString, eco_format};

/// Hands out [`Labeller`]s with distinct serial numbers.
///
/// One source is owned by each code generator, so labels are unique within
/// a generated program.
#[derive(Debug, Default)]
pub struct LabelSource {
    next: u32,
}

impl LabelSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A labeller for one construct, e.g. `labeller("compare")` yields
    /// `-compare-7-true`, `-compare-7-join`, ...
    pub fn labeller(&mut self, prefix: &str) -> Labeller {
        self.next += 1;
        Labeller {
            base: eco_format!("-{}-{}-", prefix, self.next),
        }
    }
}

/// Labels for one construct, sharing a serial number.
#[derive(Debug, Clone)]
pub struct Labeller {
    base: EcoString,
}

impl Labeller {
    pub fn label(&self, suffix: &str) -> EcoString {
        eco_format!("{}{}", self.base, suffix)
    }
}

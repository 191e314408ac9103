//! Save/restore of shared scratch words around reentrant constructs.
//!
//! Loop bookkeeping and operator state live in global scratch words. Any
//! construct that uses them while a call may run (for loops, map/reduce/
//! fold/zip, recursive discard) pushes their current values onto the operand
//! stack first and pops them back, in reverse order, when it is done.

use smallvec::SmallVec;

use crate::asm::Fragment;
use crate::tree::Type;

#[derive(Debug, Clone)]
pub struct ScratchContext {
    words: SmallVec<[&'static str; 8]>,
}

impl ScratchContext {
    pub fn new(words: &[&'static str]) -> Self {
        ScratchContext {
            words: SmallVec::from_slice(words),
        }
    }

    /// Operand-stack words the saved context occupies.
    pub fn depth(&self) -> usize {
        self.words.len()
    }

    /// `[] -> [w1 .. wn]`
    pub fn save(&self) -> Fragment {
        let mut code = Fragment::void();
        for word in &self.words {
            code.load_i(word);
        }
        code
    }

    /// `[w1 .. wn] -> []`
    pub fn restore(&self) -> Fragment {
        let mut code = Fragment::void();
        for word in self.words.iter().rev() {
            code.store_i(word);
        }
        code
    }

    /// Restores the context from beneath a value of `ty` left on the stack:
    /// `[w1 .. wn value] -> [value]`.
    ///
    /// The value passes through `cell`, which must not be one of the saved words.
    pub fn restore_under(&self, ty: &Type, cell: &str) -> Fragment {
        debug_assert!(!self.words.iter().any(|word| *word == cell));
        let mut code = Fragment::void();
        code.stash(ty, cell);
        code.append(self.restore());
        code.unstash(ty, cell);
        code
    }
}

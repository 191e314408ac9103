//! Instruction fragments: the unit of code generation.
//!
//! Every tree node produces exactly one fragment, which its parent consumes
//! exactly once by appending it. Besides `append`, fragments carry a few
//! instruction "macros" for the load/store patterns the generator repeats
//! everywhere, and the single type-directed load and store.

use core::fmt;

use crate::asm::Instruction::{self, *};
use crate::codegen::runtime::{RATIONAL_STORE_ADDRESS, RATIONAL_STORE_DENOMINATOR};
use crate::tree::Type;

/// What a fragment leaves on the operand stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    /// Nothing.
    Void,
    /// A value of the node's type.
    Value,
    /// The address of a value of the node's type.
    Address,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    kind: FragmentKind,
    instructions: Vec<Instruction>,
}

impl Fragment {
    pub fn new(kind: FragmentKind) -> Self {
        Fragment {
            kind,
            instructions: Vec::new(),
        }
    }

    pub fn void() -> Self {
        Self::new(FragmentKind::Void)
    }

    pub fn value() -> Self {
        Self::new(FragmentKind::Value)
    }

    pub fn address() -> Self {
        Self::new(FragmentKind::Address)
    }

    pub fn kind(&self) -> FragmentKind {
        self.kind
    }

    pub fn is_address(&self) -> bool {
        self.kind == FragmentKind::Address
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn into_instructions(self) -> Vec<Instruction> {
        self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn emit(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    /// Moves all of `other`'s instructions onto the end of this fragment.
    pub fn append(&mut self, other: Fragment) {
        self.instructions.extend(other.instructions);
    }

    /// Converts an address fragment into a value fragment by loading through
    /// the address. Value fragments pass through unchanged.
    ///
    /// This is the only place addresses become values.
    pub fn into_value(mut self, ty: &Type) -> Fragment {
        match self.kind {
            FragmentKind::Value => self,
            FragmentKind::Address => {
                self.load(ty);
                self.kind = FragmentKind::Value;
                self
            }
            FragmentKind::Void => panic!("void fragment used as a {} value (type checker bug)", ty),
        }
    }

    // === Label macros ===

    /// `[] -> [mem[label]]`
    pub fn load_i(&mut self, label: &str) {
        self.extend([PushD(label.into()), LoadI]);
    }

    /// `[value] -> []`, storing into `mem[label]`.
    pub fn store_i(&mut self, label: &str) {
        self.extend([PushD(label.into()), Exchange, StoreI]);
    }

    /// `[] -> [mem[label]]` for a single byte.
    pub fn load_c(&mut self, label: &str) {
        self.extend([PushD(label.into()), LoadC]);
    }

    /// `[value] -> []`, storing one byte into `mem[label]`.
    pub fn store_c(&mut self, label: &str) {
        self.extend([PushD(label.into()), Exchange, StoreC]);
    }

    /// `[] -> []`, adding one to the word at `label`.
    pub fn increment_i(&mut self, label: &str) {
        self.extend([PushD(label.into()), Duplicate, LoadI, PushI(1), Add, StoreI]);
    }

    /// `[] -> []`, subtracting one from the word at `label`.
    pub fn decrement_i(&mut self, label: &str) {
        self.extend([
            PushD(label.into()),
            Duplicate,
            LoadI,
            PushI(1),
            Subtract,
            StoreI,
        ]);
    }

    // === Offset macros ===

    /// `[base] -> [base + offset]`
    pub fn add_offset(&mut self, offset: i32) {
        if offset != 0 {
            self.extend([PushI(offset), Add]);
        }
    }

    /// `[base] -> [mem[base + offset]]`
    pub fn read_i(&mut self, offset: i32) {
        self.add_offset(offset);
        self.emit(LoadI);
    }

    /// `[base value] -> []`, storing the word at `base + offset`.
    pub fn write_i(&mut self, offset: i32) {
        if offset != 0 {
            self.extend([Exchange, PushI(offset), Add, Exchange]);
        }
        self.emit(StoreI);
    }

    // === Type-directed load and store ===

    /// `[addr] -> [value]`
    ///
    /// Rationals load as two words, numerator beneath denominator.
    pub fn load(&mut self, ty: &Type) {
        match ty {
            Type::Boolean | Type::Character => self.emit(LoadC),
            Type::Integer | Type::String | Type::Array(_) | Type::Lambda { .. } => self.emit(LoadI),
            Type::Floating => self.emit(LoadF),
            Type::Rational => {
                self.extend([Duplicate, LoadI, Exchange, PushI(4), Add, LoadI]);
            }
            Type::Void => panic!("load of a void value (type checker bug)"),
        }
    }

    /// `[addr value] -> []`
    pub fn store(&mut self, ty: &Type) {
        match ty {
            Type::Boolean | Type::Character => self.emit(StoreC),
            Type::Integer | Type::String | Type::Array(_) | Type::Lambda { .. } => {
                self.emit(StoreI)
            }
            Type::Floating => self.emit(StoreF),
            Type::Rational => {
                // [addr num den]
                self.store_i(RATIONAL_STORE_DENOMINATOR);
                self.extend([Exchange, Duplicate]);
                self.store_i(RATIONAL_STORE_ADDRESS);
                self.extend([Exchange, StoreI]);
                self.load_i(RATIONAL_STORE_ADDRESS);
                self.add_offset(4);
                self.load_i(RATIONAL_STORE_DENOMINATOR);
                self.emit(StoreI);
            }
            Type::Void => panic!("store of a void value (type checker bug)"),
        }
    }

    /// `[value] -> []`, parking the value in the scratch cell at `label`.
    ///
    /// The cell must be at least as large as the value; nothing that could
    /// re-enter may run before the matching [`Fragment::unstash`].
    pub fn stash(&mut self, ty: &Type, label: &str) {
        match ty {
            Type::Void => {}
            Type::Rational => {
                self.extend([PushD(label.into()), PushI(4), Add, Exchange, StoreI]);
                self.store_i(label);
            }
            _ => {
                self.emit(PushD(label.into()));
                self.emit(Exchange);
                self.store(ty);
            }
        }
    }

    /// `[] -> [value]`, reloading a value parked by [`Fragment::stash`].
    pub fn unstash(&mut self, ty: &Type, label: &str) {
        if *ty != Type::Void {
            self.emit(PushD(label.into()));
            self.load(ty);
        }
    }

    /// `[n words] -> []` for a value of the given type.
    pub fn discard_value(&mut self, ty: &Type) {
        for _ in 0..ty.stack_words() {
            self.emit(Pop);
        }
    }
}

impl Extend<Instruction> for Fragment {
    fn extend<I: IntoIterator<Item = Instruction>>(&mut self, iter: I) {
        self.instructions.extend(iter);
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instruction in &self.instructions {
            writeln!(f, "{}", instruction)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "fragment_test.rs"]
mod fragment_test;

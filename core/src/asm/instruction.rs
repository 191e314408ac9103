//! The target machine's instruction set.
//!
//! # Stack Discipline
//!
//! Stack effect notation: `[..., operand1, operand2] -> [..., result]`.
//! Stores take the address beneath the value: `[addr value] -> []`.
//! Label operands name either a code label (`Label`) or a data label
//! (`DLabel`); both share one namespace.

use ecow::EcoString;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    // ========================================================================
    // Stack
    // ========================================================================
    PushI(i32),
    PushF(f64),
    /// Push the address of a label (data address or code index).
    PushD(EcoString),
    Pop,
    Duplicate,
    Exchange,

    // ========================================================================
    // Integer arithmetic (32-bit, wrapping)
    // ========================================================================
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Negate,

    // ========================================================================
    // Floating arithmetic
    // ========================================================================
    FAdd,
    FSubtract,
    FMultiply,
    FDivide,
    FNegate,

    // ========================================================================
    // Conversions
    // ========================================================================
    /// int -> float
    ConvertF,
    /// float -> int, truncating
    ConvertI,

    // ========================================================================
    // Logical (0 is false, anything else true) and bitwise
    // ========================================================================
    And,
    Or,
    BNegate,
    BTAnd,
    BTOr,
    BTXor,
    BTNot,

    // ========================================================================
    // Control
    // ========================================================================
    Jump(EcoString),
    JumpTrue(EcoString),
    JumpFalse(EcoString),
    JumpPos(EcoString),
    JumpNeg(EcoString),
    JumpFPos(EcoString),
    JumpFNeg(EcoString),
    JumpFZero(EcoString),
    /// Push the return address, jump to the label.
    Call(EcoString),
    /// `[target] -> [return address]`, jumping to `target`.
    CallV,
    /// `[return address] -> []`, jumping to it.
    Return,
    PopPC,
    PushPC,

    // ========================================================================
    // Memory
    // ========================================================================
    /// Push the first address past the end of memory.
    Memtop,
    LoadC,
    LoadI,
    LoadF,
    StoreC,
    StoreI,
    StoreF,

    // ========================================================================
    // Output and termination
    // ========================================================================
    /// `[args.. format] -> []`; the first specifier takes the deepest argument.
    Printf,
    PStack,
    Halt,
    Nop,

    // ========================================================================
    // Directives
    // ========================================================================
    Label(EcoString),
    DLabel(EcoString),
    DataC(u8),
    DataI(i32),
    DataF(f64),
    /// Characters followed by a zero byte.
    DataS(EcoString),
    /// A run of zero bytes.
    DataZ(i32),
    /// The 4-byte address of a label.
    DataD(EcoString),
}

impl Instruction {
    /// The opcode mnemonic as written in assembly text.
    pub fn opcode(&self) -> &'static str {
        use Instruction::*;
        match self {
            PushI(_) => "PushI",
            PushF(_) => "PushF",
            PushD(_) => "PushD",
            Pop => "Pop",
            Duplicate => "Duplicate",
            Exchange => "Exchange",
            Add => "Add",
            Subtract => "Subtract",
            Multiply => "Multiply",
            Divide => "Divide",
            Remainder => "Remainder",
            Negate => "Negate",
            FAdd => "FAdd",
            FSubtract => "FSubtract",
            FMultiply => "FMultiply",
            FDivide => "FDivide",
            FNegate => "FNegate",
            ConvertF => "ConvertF",
            ConvertI => "ConvertI",
            And => "And",
            Or => "Or",
            BNegate => "BNegate",
            BTAnd => "BTAnd",
            BTOr => "BTOr",
            BTXor => "BTXor",
            BTNot => "BTNot",
            Jump(_) => "Jump",
            JumpTrue(_) => "JumpTrue",
            JumpFalse(_) => "JumpFalse",
            JumpPos(_) => "JumpPos",
            JumpNeg(_) => "JumpNeg",
            JumpFPos(_) => "JumpFPos",
            JumpFNeg(_) => "JumpFNeg",
            JumpFZero(_) => "JumpFZero",
            Call(_) => "Call",
            CallV => "CallV",
            Return => "Return",
            PopPC => "PopPC",
            PushPC => "PushPC",
            Memtop => "Memtop",
            LoadC => "LoadC",
            LoadI => "LoadI",
            LoadF => "LoadF",
            StoreC => "StoreC",
            StoreI => "StoreI",
            StoreF => "StoreF",
            Printf => "Printf",
            PStack => "PStack",
            Halt => "Halt",
            Nop => "Nop",
            Label(_) => "Label",
            DLabel(_) => "DLabel",
            DataC(_) => "DataC",
            DataI(_) => "DataI",
            DataF(_) => "DataF",
            DataS(_) => "DataS",
            DataZ(_) => "DataZ",
            DataD(_) => "DataD",
        }
    }

    /// Whether this is an assembler directive rather than an executable instruction.
    pub fn is_directive(&self) -> bool {
        use Instruction::*;
        matches!(
            self,
            Label(_) | DLabel(_) | DataC(_) | DataI(_) | DataF(_) | DataS(_) | DataZ(_) | DataD(_)
        )
    }

    /// The label operand, if this instruction has one.
    pub fn label(&self) -> Option<&EcoString> {
        use Instruction::*;
        match self {
            PushD(label) | Jump(label) | JumpTrue(label) | JumpFalse(label) | JumpPos(label)
            | JumpNeg(label) | JumpFPos(label) | JumpFNeg(label) | JumpFZero(label)
            | Call(label) | Label(label) | DLabel(label) | DataD(label) => Some(label),
            _ => None,
        }
    }
}

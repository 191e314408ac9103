//! Nodes of the typed tree handed to the code generator.

use ecow::EcoString;
use serde::{Deserialize, Serialize};

use crate::asm::Instruction;
use crate::tree::{Binding, Type};

/// A whole program: the statements of the outermost block plus the size of
/// the global scope they were allocated in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub global_scope_size: i32,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForKind {
    /// `for index i of sequence`: the variable takes 0, 1, .., length-1.
    Index,
    /// `for elem e of sequence`: the variable takes each element in turn.
    Element,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrintItem {
    Expression(Expr),
    Newline,
    Space,
    Tab,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statement {
    Declaration {
        binding: Binding,
        value: Expr,
        #[serde(default)]
        is_static: bool,
    },
    /// `target := value`; the target must generate an address.
    Assignment {
        target: Expr,
        value: Expr,
    },
    Print(Vec<PrintItem>),
    If {
        condition: Expr,
        then_block: Vec<Statement>,
        #[serde(default)]
        else_block: Option<Vec<Statement>>,
    },
    While {
        condition: Expr,
        body: Vec<Statement>,
    },
    For {
        kind: ForKind,
        variable: Binding,
        sequence: Expr,
        body: Vec<Statement>,
    },
    Break,
    Continue,
    Return(Option<Expr>),
    /// `call f(x)`: invoke and throw the result away.
    Call(Expr),
    /// `dealloc a`: explicit recursive free of an array or string record.
    Release(Expr),
    Block(Vec<Statement>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub ty: Type,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprKind {
    Boolean(bool),
    Character(u8),
    Integer(i32),
    Floating(f64),
    String(EcoString),
    Identifier(Binding),
    Operation {
        signature: Signature,
        operands: Vec<Expr>,
    },
    Comparison {
        op: ComparisonOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    PopulatedArray(Vec<Expr>),
    Lambda(Box<Lambda>),
    Invocation {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
    },
    Map {
        array: Box<Expr>,
        lambda: Box<Expr>,
    },
    Reduce {
        array: Box<Expr>,
        lambda: Box<Expr>,
    },
    Fold {
        array: Box<Expr>,
        #[serde(default)]
        base: Option<Box<Expr>>,
        lambda: Box<Expr>,
    },
    Zip {
        first: Box<Expr>,
        second: Box<Expr>,
        lambda: Box<Expr>,
    },
}

/// A function literal with its scopes already laid out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lambda {
    pub parameters: Vec<Binding>,
    pub body: Vec<Statement>,
    pub parameter_scope_size: i32,
    pub local_scope_size: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Equal,
    NotEqual,
}

/// The code generation strategy chosen for an operator application.
///
/// Resolved once by the type checker and matched, never looked up, during
/// generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signature {
    /// Operands are generated, then this single instruction is appended.
    Instruction(Instruction),
    /// Operands are generated, then a fixed snippet is appended.
    Snippet(Snippet),
    /// The generator receives the raw operand fragments and composes them itself.
    Full(FullGenerator),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Snippet {
    IntegerDivide,
    FloatingDivide,
    RationalAdd,
    RationalSubtract,
    RationalMultiply,
    RationalDivide,
    RationalNegate,
    /// `a // b` on two integers.
    FormRational,
    /// `x /# n`: a rational or floating value restated over denominator `n`.
    Rationalize,
    /// `x over n`: numerator of `x` restated over denominator `n`.
    ExpressOver,
    IntegerToRational,
    CharacterToRational,
    FloatingToRational,
    RationalToInteger,
    RationalToFloating,
    IntegerToCharacter,
    IntegerToBoolean,
    ArrayAllocate,
    ArrayClone,
    ArrayLength,
    ArrayReverse,
    StringLength,
    StringReverse,
    Substring,
    StringConcatenate,
    StringCharacterConcatenate,
    CharacterStringConcatenate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FullGenerator {
    ShortCircuitAnd,
    ShortCircuitOr,
    ArrayIndex,
    StringIndex,
}

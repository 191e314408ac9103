//! Terse constructors for hand-built typed trees.
//!
//! ```
//! use pika_core::tree::{build::*, MemoryLocation, Type};
//!
//! let x = binding("x", Type::Integer, MemoryLocation::Global(0));
//! let program = program(4, vec![
//!     declare(&x, int(20)),
//!     print(vec![item(add(ident(&x), int(22))), newline()]),
//! ]);
//! assert_eq!(program.body.len(), 2);
//! ```

use ecow::EcoString;

use crate::asm::Instruction;
use crate::tree::{
    Binding, ComparisonOp, Expr, ExprKind, ForKind, FullGenerator, Lambda, MemoryLocation,
    ParameterAllocator, PrintItem, Program, Signature, Snippet, Statement, Type,
};

pub fn program(global_scope_size: i32, body: Vec<Statement>) -> Program {
    Program {
        global_scope_size,
        body,
    }
}

pub fn binding(name: &str, ty: Type, location: MemoryLocation) -> Binding {
    Binding::new(name, ty, location).mutable()
}

// === Literals ===

pub fn boolean(value: bool) -> Expr {
    expr(Type::Boolean, ExprKind::Boolean(value))
}

pub fn character(value: char) -> Expr {
    expr(Type::Character, ExprKind::Character(value as u8))
}

pub fn int(value: i32) -> Expr {
    expr(Type::Integer, ExprKind::Integer(value))
}

pub fn float(value: f64) -> Expr {
    expr(Type::Floating, ExprKind::Floating(value))
}

pub fn string(value: &str) -> Expr {
    expr(Type::String, ExprKind::String(EcoString::from(value)))
}

/// `numerator // denominator`, reduced at run time.
pub fn rational(numerator: i32, denominator: i32) -> Expr {
    snippet(
        Snippet::FormRational,
        Type::Rational,
        vec![int(numerator), int(denominator)],
    )
}

pub fn ident(binding: &Binding) -> Expr {
    expr(binding.ty.clone(), ExprKind::Identifier(binding.clone()))
}

// === Operators ===

pub fn instruction(instruction: Instruction, ty: Type, operands: Vec<Expr>) -> Expr {
    operation(Signature::Instruction(instruction), ty, operands)
}

pub fn snippet(snippet: Snippet, ty: Type, operands: Vec<Expr>) -> Expr {
    operation(Signature::Snippet(snippet), ty, operands)
}

pub fn full(generator: FullGenerator, ty: Type, operands: Vec<Expr>) -> Expr {
    operation(Signature::Full(generator), ty, operands)
}

pub fn add(lhs: Expr, rhs: Expr) -> Expr {
    arithmetic(lhs, rhs, Instruction::Add, Instruction::FAdd, Snippet::RationalAdd)
}

pub fn subtract(lhs: Expr, rhs: Expr) -> Expr {
    arithmetic(
        lhs,
        rhs,
        Instruction::Subtract,
        Instruction::FSubtract,
        Snippet::RationalSubtract,
    )
}

pub fn multiply(lhs: Expr, rhs: Expr) -> Expr {
    arithmetic(
        lhs,
        rhs,
        Instruction::Multiply,
        Instruction::FMultiply,
        Snippet::RationalMultiply,
    )
}

pub fn divide(lhs: Expr, rhs: Expr) -> Expr {
    let ty = lhs.ty.clone();
    let signature = match ty {
        Type::Integer => Snippet::IntegerDivide,
        Type::Floating => Snippet::FloatingDivide,
        Type::Rational => Snippet::RationalDivide,
        ref other => panic!("cannot divide {}", other),
    };
    snippet(signature, ty, vec![lhs, rhs])
}

fn arithmetic(
    lhs: Expr,
    rhs: Expr,
    integer: Instruction,
    floating: Instruction,
    rational: Snippet,
) -> Expr {
    let ty = lhs.ty.clone();
    match ty {
        Type::Integer => instruction(integer, ty, vec![lhs, rhs]),
        Type::Floating => instruction(floating, ty, vec![lhs, rhs]),
        Type::Rational => snippet(rational, ty, vec![lhs, rhs]),
        ref other => panic!("no arithmetic on {}", other),
    }
}

pub fn compare(op: ComparisonOp, lhs: Expr, rhs: Expr) -> Expr {
    expr(
        Type::Boolean,
        ExprKind::Comparison {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
    )
}

pub fn and(lhs: Expr, rhs: Expr) -> Expr {
    full(FullGenerator::ShortCircuitAnd, Type::Boolean, vec![lhs, rhs])
}

pub fn or(lhs: Expr, rhs: Expr) -> Expr {
    full(FullGenerator::ShortCircuitOr, Type::Boolean, vec![lhs, rhs])
}

// === Arrays and strings ===

pub fn array(element: Type, elements: Vec<Expr>) -> Expr {
    expr(Type::array(element), ExprKind::PopulatedArray(elements))
}

/// `new [element](length)`.
pub fn alloc(element: Type, length: Expr) -> Expr {
    snippet(Snippet::ArrayAllocate, Type::array(element), vec![length])
}

pub fn index(array: Expr, index: Expr) -> Expr {
    match array.ty.clone() {
        Type::String => full(
            FullGenerator::StringIndex,
            Type::Character,
            vec![array, index],
        ),
        ty => full(
            FullGenerator::ArrayIndex,
            ty.element().clone(),
            vec![array, index],
        ),
    }
}

pub fn length(sequence: Expr) -> Expr {
    let signature = match sequence.ty {
        Type::String => Snippet::StringLength,
        _ => Snippet::ArrayLength,
    };
    snippet(signature, Type::Integer, vec![sequence])
}

pub fn substring(string: Expr, start: Expr, end: Expr) -> Expr {
    snippet(Snippet::Substring, Type::String, vec![string, start, end])
}

// === Functions ===

/// A lambda whose parameters are laid out with [`ParameterAllocator`].
///
/// Returns the lambda expression and the parameter bindings to use in `body`.
pub fn lambda(
    parameters: &[(&str, Type)],
    result: Type,
    local_scope_size: i32,
    body: impl FnOnce(&[Binding]) -> Vec<Statement>,
) -> Expr {
    let mut allocator = ParameterAllocator::new();
    for (_, ty) in parameters {
        allocator.push(ty);
    }
    let bindings: Vec<Binding> = parameters
        .iter()
        .zip(allocator.locations())
        .map(|((name, ty), location)| binding(name, ty.clone(), location))
        .collect();
    let body = body(&bindings);
    let ty = Type::lambda(
        parameters.iter().map(|(_, ty)| ty.clone()).collect(),
        result,
    );
    expr(
        ty,
        ExprKind::Lambda(Box::new(Lambda {
            parameters: bindings,
            body,
            parameter_scope_size: allocator.allocated_size(),
            local_scope_size,
        })),
    )
}

pub fn invoke(callee: Expr, arguments: Vec<Expr>) -> Expr {
    let result = callee.ty.signature().1.clone();
    expr(
        result,
        ExprKind::Invocation {
            callee: Box::new(callee),
            arguments,
        },
    )
}

pub fn map(array: Expr, lambda: Expr) -> Expr {
    let result = lambda.ty.signature().1.clone();
    expr(
        Type::array(result),
        ExprKind::Map {
            array: Box::new(array),
            lambda: Box::new(lambda),
        },
    )
}

pub fn reduce(array: Expr, lambda: Expr) -> Expr {
    expr(
        array.ty.clone(),
        ExprKind::Reduce {
            array: Box::new(array),
            lambda: Box::new(lambda),
        },
    )
}

pub fn fold(array: Expr, base: Option<Expr>, lambda: Expr) -> Expr {
    let result = lambda.ty.signature().1.clone();
    expr(
        result,
        ExprKind::Fold {
            array: Box::new(array),
            base: base.map(Box::new),
            lambda: Box::new(lambda),
        },
    )
}

pub fn zip(first: Expr, second: Expr, lambda: Expr) -> Expr {
    let result = lambda.ty.signature().1.clone();
    expr(
        Type::array(result),
        ExprKind::Zip {
            first: Box::new(first),
            second: Box::new(second),
            lambda: Box::new(lambda),
        },
    )
}

// === Statements ===

pub fn declare(binding: &Binding, value: Expr) -> Statement {
    Statement::Declaration {
        binding: binding.clone(),
        value,
        is_static: false,
    }
}

pub fn declare_static(binding: &Binding, value: Expr) -> Statement {
    Statement::Declaration {
        binding: binding.clone(),
        value,
        is_static: true,
    }
}

pub fn assign(target: Expr, value: Expr) -> Statement {
    Statement::Assignment { target, value }
}

pub fn print(items: Vec<PrintItem>) -> Statement {
    Statement::Print(items)
}

pub fn item(expr: Expr) -> PrintItem {
    PrintItem::Expression(expr)
}

pub fn newline() -> PrintItem {
    PrintItem::Newline
}

pub fn space() -> PrintItem {
    PrintItem::Space
}

pub fn if_else(
    condition: Expr,
    then_block: Vec<Statement>,
    else_block: Option<Vec<Statement>>,
) -> Statement {
    Statement::If {
        condition,
        then_block,
        else_block,
    }
}

pub fn while_loop(condition: Expr, body: Vec<Statement>) -> Statement {
    Statement::While { condition, body }
}

pub fn for_loop(kind: ForKind, variable: &Binding, sequence: Expr, body: Vec<Statement>) -> Statement {
    Statement::For {
        kind,
        variable: variable.clone(),
        sequence,
        body,
    }
}

pub fn return_value(value: Expr) -> Statement {
    Statement::Return(Some(value))
}

pub fn call(invocation: Expr) -> Statement {
    Statement::Call(invocation)
}

pub fn release(value: Expr) -> Statement {
    Statement::Release(value)
}

fn operation(signature: Signature, ty: Type, operands: Vec<Expr>) -> Expr {
    expr(ty, ExprKind::Operation { signature, operands })
}

fn expr(ty: Type, kind: ExprKind) -> Expr {
    Expr { ty, kind }
}

//! Operator expansions, dispatched on the resolved [`Signature`] variant.
//!
//! [`Signature`]: crate::tree::Signature

mod arithmetic;
mod comparison;
mod higher_order;
mod sequence;
mod string;

pub use comparison::comparison;
pub use higher_order::{fold, map, reduce, zip};

use crate::asm::{Fragment, Instruction::*};
use crate::codegen::labeller::LabelSource;
use crate::tree::{FullGenerator, Snippet, Type};

/// Appends `snippet`, whose operand values are already on the stack.
pub fn snippet(
    code: &mut Fragment,
    snippet: Snippet,
    operands: &[&Type],
    result: &Type,
    labels: &mut LabelSource,
) {
    match snippet {
        Snippet::IntegerDivide => arithmetic::integer_divide(code),
        Snippet::FloatingDivide => arithmetic::floating_divide(code),
        Snippet::RationalAdd => arithmetic::rational_add(code),
        Snippet::RationalSubtract => arithmetic::rational_subtract(code),
        Snippet::RationalMultiply => arithmetic::rational_multiply(code),
        Snippet::RationalDivide => arithmetic::rational_divide(code),
        Snippet::RationalNegate => arithmetic::rational_negate(code),
        Snippet::FormRational => arithmetic::lowest_terms(code),
        Snippet::Rationalize => arithmetic::rationalize(code, operands[0]),
        Snippet::ExpressOver => arithmetic::express_over(code, operands[0]),
        Snippet::IntegerToRational | Snippet::CharacterToRational => code.emit(PushI(1)),
        Snippet::FloatingToRational => arithmetic::floating_to_rational(code),
        Snippet::RationalToInteger => code.emit(Divide),
        Snippet::RationalToFloating => arithmetic::rational_to_floating(code),
        Snippet::IntegerToCharacter => code.extend([PushI(127), BTAnd]),
        Snippet::IntegerToBoolean => code.extend([PushI(1), And]),
        Snippet::ArrayAllocate => sequence::allocate(code, result.element()),
        Snippet::ArrayClone => sequence::clone(code, operands[0].element()),
        Snippet::ArrayLength => sequence::length(code, operands[0]),
        Snippet::ArrayReverse => sequence::reverse(code, operands[0], labels),
        Snippet::StringLength => sequence::length(code, operands[0]),
        Snippet::StringReverse => sequence::reverse(code, operands[0], labels),
        Snippet::Substring => string::substring(code, labels),
        Snippet::StringConcatenate => string::concatenate(code),
        Snippet::StringCharacterConcatenate => string::append_character(code),
        Snippet::CharacterStringConcatenate => string::prepend_character(code),
    }
}

/// Composes a full generator from its raw operand fragments.
///
/// Operands arrive unconverted; the generator decides when (and whether)
/// each one runs.
pub fn full(
    generator: FullGenerator,
    mut operands: Vec<Fragment>,
    operand_types: &[&Type],
    labels: &mut LabelSource,
) -> Fragment {
    match generator {
        FullGenerator::ShortCircuitAnd | FullGenerator::ShortCircuitOr => {
            let rhs = operands.pop().expect("missing operand (type checker bug)");
            let lhs = operands.pop().expect("missing operand (type checker bug)");
            short_circuit(generator == FullGenerator::ShortCircuitAnd, lhs, rhs, labels)
        }
        FullGenerator::ArrayIndex | FullGenerator::StringIndex => {
            let index = operands.pop().expect("missing operand (type checker bug)");
            let sequence = operands.pop().expect("missing operand (type checker bug)");
            sequence::index(
                sequence.into_value(operand_types[0]),
                index.into_value(operand_types[1]),
                operand_types[0],
                labels,
            )
        }
    }
}

/// `lhs && rhs` or `lhs || rhs`; the right side only runs when it decides
/// the result.
fn short_circuit(is_and: bool, lhs: Fragment, rhs: Fragment, labels: &mut LabelSource) -> Fragment {
    let join = labels.labeller(if is_and { "and" } else { "or" }).label("join");
    let mut code = Fragment::value();
    code.append(lhs.into_value(&Type::Boolean));
    code.emit(Duplicate);
    code.emit(if is_and {
        JumpFalse(join.clone())
    } else {
        JumpTrue(join.clone())
    });
    code.emit(Pop);
    code.append(rhs.into_value(&Type::Boolean));
    code.emit(Label(join));
    code
}

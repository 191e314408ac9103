//! Print statements: type-directed `Printf` sequences.

use crate::asm::{Fragment, Instruction::*};
use crate::codegen::labeller::LabelSource;
use crate::codegen::record::{ARRAY_HEADER_SIZE, ARRAY_LENGTH_OFFSET, STRING_HEADER_SIZE, null_check};
use crate::codegen::runtime::{
    CHARACTER_FORMAT, CLOSE_BRACKET_STRING, FALSE_STRING, FLOATING_FORMAT, INTEGER_FORMAT,
    LAMBDA_STRING, MINUS_STRING, NEWLINE_STRING, OPEN_BRACKET_STRING, PRINT_DENOMINATOR,
    PRINT_NUMERATOR, SEPARATOR_STRING, SLASH_STRING, SPACE_STRING, STRING_FORMAT, TAB_STRING,
    TRUE_STRING, UNDERSCORE_STRING,
};
use crate::tree::Type;

/// Prints a fixed runtime string.
pub fn print_constant(code: &mut Fragment, label: &str) {
    code.extend([PushD(label.into()), Printf]);
}

pub fn newline(code: &mut Fragment) {
    print_constant(code, NEWLINE_STRING);
}

pub fn space(code: &mut Fragment) {
    print_constant(code, SPACE_STRING);
}

pub fn tab(code: &mut Fragment) {
    print_constant(code, TAB_STRING);
}

/// `[value] -> []`, printing a value of type `ty`.
pub fn print_value(code: &mut Fragment, ty: &Type, labels: &mut LabelSource) {
    match ty {
        Type::Integer => formatted(code, INTEGER_FORMAT),
        Type::Character => formatted(code, CHARACTER_FORMAT),
        Type::Floating => formatted(code, FLOATING_FORMAT),
        Type::Boolean => {
            let labels = labels.labeller("print-boolean");
            code.emit(JumpFalse(labels.label("false")));
            code.extend([PushD(TRUE_STRING.into()), Jump(labels.label("join"))]);
            code.extend([Label(labels.label("false")), PushD(FALSE_STRING.into())]);
            code.emit(Label(labels.label("join")));
            formatted(code, STRING_FORMAT);
        }
        Type::String => {
            null_check(code);
            code.add_offset(STRING_HEADER_SIZE);
            formatted(code, STRING_FORMAT);
        }
        Type::Lambda { .. } => {
            code.emit(Pop);
            print_constant(code, LAMBDA_STRING);
        }
        Type::Rational => print_rational(code, labels),
        Type::Array(element) => print_array(code, element, labels),
        Type::Void => panic!("print of a void value (type checker bug)"),
    }
}

fn formatted(code: &mut Fragment, format: &str) {
    code.extend([PushD(format.into()), Printf]);
}

/// `[numerator denominator] -> []`
///
/// Prints `0`, or an optional `-`, the integral part if non-zero, `_` when
/// both parts are present, and `num/den` for the fraction.
fn print_rational(code: &mut Fragment, labels: &mut LabelSource) {
    let labels = labels.labeller("print-rational");
    let nonzero = labels.label("nonzero");
    let positive = labels.label("positive");
    let fraction = labels.label("fraction");
    let end = labels.label("end");

    code.store_i(PRINT_DENOMINATOR);
    code.store_i(PRINT_NUMERATOR);

    code.load_i(PRINT_NUMERATOR);
    code.emit(JumpTrue(nonzero.clone()));
    code.emit(PushI(0));
    formatted(code, INTEGER_FORMAT);
    code.emit(Jump(end.clone()));

    code.emit(Label(nonzero));
    code.load_i(PRINT_NUMERATOR);
    code.emit(JumpPos(positive.clone()));
    print_constant(code, MINUS_STRING);
    code.load_i(PRINT_NUMERATOR);
    code.emit(Negate);
    code.store_i(PRINT_NUMERATOR);

    code.emit(Label(positive));
    integral_part(code);
    code.emit(JumpFalse(fraction.clone()));
    integral_part(code);
    formatted(code, INTEGER_FORMAT);
    fractional_part(code);
    code.emit(JumpFalse(end.clone()));
    print_constant(code, UNDERSCORE_STRING);

    code.emit(Label(fraction));
    fractional_part(code);
    formatted(code, INTEGER_FORMAT);
    print_constant(code, SLASH_STRING);
    code.load_i(PRINT_DENOMINATOR);
    formatted(code, INTEGER_FORMAT);

    code.emit(Label(end));
}

fn integral_part(code: &mut Fragment) {
    code.load_i(PRINT_NUMERATOR);
    code.load_i(PRINT_DENOMINATOR);
    code.emit(Divide);
}

fn fractional_part(code: &mut Fragment) {
    code.load_i(PRINT_NUMERATOR);
    code.load_i(PRINT_DENOMINATOR);
    code.emit(Remainder);
}

/// `[array] -> []`, printed as `[a, b, c]`.
///
/// The cursor and remaining count stay on the operand stack, so nested
/// arrays recurse without any shared state.
fn print_array(code: &mut Fragment, element: &Type, labels: &mut LabelSource) {
    let names = labels.labeller("print-array");
    let body = names.label("body");
    let done = names.label("done");

    null_check(code);
    code.emit(Duplicate);
    code.read_i(ARRAY_LENGTH_OFFSET);
    code.emit(Exchange);
    code.add_offset(ARRAY_HEADER_SIZE);
    code.emit(Exchange);
    print_constant(code, OPEN_BRACKET_STRING);

    // [cursor remaining]
    code.extend([Duplicate, JumpFalse(done.clone())]);
    code.emit(Label(body.clone()));
    code.extend([Exchange, Duplicate]);
    code.load(element);
    print_value(code, element, labels);
    code.add_offset(element.size());
    code.extend([Exchange, PushI(1), Subtract]);
    code.extend([Duplicate, JumpFalse(done.clone())]);
    print_constant(code, SEPARATOR_STRING);
    code.emit(Jump(body));

    code.emit(Label(done));
    code.extend([Pop, Pop]);
    print_constant(code, CLOSE_BRACKET_STRING);
}

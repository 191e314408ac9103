//! Division checks, rational arithmetic and numeric casts.
//!
//! Rational operands arrive as `[n1 d1 n2 d2]`, already in lowest terms, and
//! every rational result goes back through `$lowest-terms`.

use crate::asm::{Fragment, Instruction::{self, *}};
use crate::codegen::runtime::{
    Fault, LOWEST_TERMS, RATIONAL_FIRST_DENOMINATOR, RATIONAL_FIRST_NUMERATOR, RATIONAL_OVER,
    RATIONAL_SECOND_DENOMINATOR, RATIONAL_SECOND_NUMERATOR,
};
use crate::tree::Type;

/// Denominator used when a float is turned into a rational: the product of
/// the first nine primes.
pub const FLOATING_TO_RATIONAL_DENOMINATOR: i32 = 223_092_870;

pub fn integer_divide(code: &mut Fragment) {
    code.extend([
        Duplicate,
        JumpFalse(Fault::IntegerDivideByZero.label().into()),
        Divide,
    ]);
}

pub fn floating_divide(code: &mut Fragment) {
    code.extend([
        Duplicate,
        JumpFZero(Fault::FloatingDivideByZero.label().into()),
        FDivide,
    ]);
}

/// `[n d] -> [n' d']`
pub fn lowest_terms(code: &mut Fragment) {
    code.emit(Call(LOWEST_TERMS.into()));
}

/// `[n1 d1 n2 d2] -> []`
fn stash_operands(code: &mut Fragment) {
    code.store_i(RATIONAL_SECOND_DENOMINATOR);
    code.store_i(RATIONAL_SECOND_NUMERATOR);
    code.store_i(RATIONAL_FIRST_DENOMINATOR);
    code.store_i(RATIONAL_FIRST_NUMERATOR);
}

fn product(code: &mut Fragment, lhs: &str, rhs: &str) {
    code.load_i(lhs);
    code.load_i(rhs);
    code.emit(Multiply);
}

/// `n1*d2 (op) n2*d1` over `d1*d2`.
fn cross_sum(code: &mut Fragment, op: Instruction) {
    stash_operands(code);
    product(code, RATIONAL_FIRST_NUMERATOR, RATIONAL_SECOND_DENOMINATOR);
    product(code, RATIONAL_SECOND_NUMERATOR, RATIONAL_FIRST_DENOMINATOR);
    code.emit(op);
    product(code, RATIONAL_FIRST_DENOMINATOR, RATIONAL_SECOND_DENOMINATOR);
    lowest_terms(code);
}

pub fn rational_add(code: &mut Fragment) {
    cross_sum(code, Add);
}

pub fn rational_subtract(code: &mut Fragment) {
    cross_sum(code, Subtract);
}

pub fn rational_multiply(code: &mut Fragment) {
    stash_operands(code);
    product(code, RATIONAL_FIRST_NUMERATOR, RATIONAL_SECOND_NUMERATOR);
    product(code, RATIONAL_FIRST_DENOMINATOR, RATIONAL_SECOND_DENOMINATOR);
    lowest_terms(code);
}

/// Dividing by a zero rational faults through `$lowest-terms`.
pub fn rational_divide(code: &mut Fragment) {
    stash_operands(code);
    product(code, RATIONAL_FIRST_NUMERATOR, RATIONAL_SECOND_DENOMINATOR);
    product(code, RATIONAL_FIRST_DENOMINATOR, RATIONAL_SECOND_NUMERATOR);
    lowest_terms(code);
}

pub fn rational_negate(code: &mut Fragment) {
    code.extend([Exchange, Negate, Exchange]);
}

/// `[x over] -> [rational]`: `x` rounded towards zero to a multiple of
/// `1/over`, then reduced.
pub fn rationalize(code: &mut Fragment, operand: &Type) {
    code.extend([
        Duplicate,
        JumpFalse(Fault::RationalZeroDenominator.label().into()),
    ]);
    code.store_i(RATIONAL_OVER);
    match operand {
        Type::Rational => {
            code.store_i(RATIONAL_FIRST_DENOMINATOR);
            code.load_i(RATIONAL_OVER);
            code.emit(Multiply);
            code.load_i(RATIONAL_FIRST_DENOMINATOR);
            code.emit(Divide);
        }
        Type::Floating => {
            code.load_i(RATIONAL_OVER);
            code.extend([ConvertF, FMultiply, ConvertI]);
        }
        other => panic!("cannot rationalize {} (type checker bug)", other),
    }
    code.load_i(RATIONAL_OVER);
    lowest_terms(code);
}

/// `[x over] -> [integer]`: the numerator `x` would have over `over`.
pub fn express_over(code: &mut Fragment, operand: &Type) {
    match operand {
        Type::Rational => {
            code.store_i(RATIONAL_OVER);
            code.store_i(RATIONAL_FIRST_DENOMINATOR);
            code.load_i(RATIONAL_OVER);
            code.emit(Multiply);
            code.load_i(RATIONAL_FIRST_DENOMINATOR);
            code.emit(Divide);
        }
        Type::Floating => code.extend([ConvertF, FMultiply, ConvertI]),
        other => panic!("cannot express {} over an integer (type checker bug)", other),
    }
}

pub fn floating_to_rational(code: &mut Fragment) {
    code.emit(PushI(FLOATING_TO_RATIONAL_DENOMINATOR));
    rationalize(code, &Type::Floating);
}

/// `[n d] -> [n/d as float]`
pub fn rational_to_floating(code: &mut Fragment) {
    code.store_i(RATIONAL_FIRST_DENOMINATOR);
    code.emit(ConvertF);
    code.load_i(RATIONAL_FIRST_DENOMINATOR);
    code.extend([ConvertF, FDivide]);
}

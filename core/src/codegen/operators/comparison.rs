//! Relational operators.
//!
//! Every comparison subtracts its operands and branches on the sign of the
//! difference. Rationals are cross-multiplied first; their denominators are
//! positive, so the sign is preserved.

use ecow::EcoString;

use crate::asm::{Fragment, Instruction::{self, *}};
use crate::codegen::labeller::LabelSource;
use crate::codegen::runtime::{
    RATIONAL_FIRST_DENOMINATOR, RATIONAL_SECOND_DENOMINATOR, RATIONAL_SECOND_NUMERATOR,
};
use crate::tree::{ComparisonOp, Type};

/// `lhs op rhs`, both operands already converted to values of `ty`.
pub fn comparison(
    op: ComparisonOp,
    ty: &Type,
    lhs: Fragment,
    rhs: Fragment,
    labels: &mut LabelSource,
) -> Fragment {
    let labels = labels.labeller("compare");
    let on_true = labels.label("true");
    let on_false = labels.label("false");
    let join = labels.label("join");

    let mut code = Fragment::value();
    code.emit(Label(labels.label("arg1")));
    code.append(lhs);
    code.emit(Label(labels.label("arg2")));
    code.append(rhs);
    code.emit(Label(labels.label("sub")));

    let floating = match ty {
        Type::Floating => {
            code.emit(FSubtract);
            true
        }
        Type::Rational => {
            // [n1 d1 n2 d2] -> [n1*d2 - n2*d1]
            code.store_i(RATIONAL_SECOND_DENOMINATOR);
            code.store_i(RATIONAL_SECOND_NUMERATOR);
            code.store_i(RATIONAL_FIRST_DENOMINATOR);
            code.load_i(RATIONAL_SECOND_DENOMINATOR);
            code.emit(Multiply);
            code.load_i(RATIONAL_SECOND_NUMERATOR);
            code.load_i(RATIONAL_FIRST_DENOMINATOR);
            code.extend([Multiply, Subtract]);
            false
        }
        Type::Void => panic!("comparison of void values (type checker bug)"),
        _ => {
            code.emit(Subtract);
            false
        }
    };

    type Branch = fn(EcoString) -> Instruction;
    let positive: Branch = if floating { JumpFPos } else { JumpPos };
    let negative: Branch = if floating { JumpFNeg } else { JumpNeg };
    let zero: Branch = if floating { JumpFZero } else { JumpFalse };
    let (branch, taken, fallthrough) = match op {
        ComparisonOp::Greater => (positive, &on_true, &on_false),
        ComparisonOp::GreaterEqual => (negative, &on_false, &on_true),
        ComparisonOp::Less => (negative, &on_true, &on_false),
        ComparisonOp::LessEqual => (positive, &on_false, &on_true),
        ComparisonOp::Equal => (zero, &on_true, &on_false),
        ComparisonOp::NotEqual => (zero, &on_false, &on_true),
    };
    code.emit(branch(taken.clone()));
    code.emit(Jump(fallthrough.clone()));

    code.extend([Label(on_true), PushI(1), Jump(join.clone())]);
    code.extend([Label(on_false), PushI(0)]);
    code.emit(Label(join));
    code
}

//! map, reduce, fold and zip as counted loops around the calling convention.
//!
//! Each expansion saves the operator words it uses, stores every operand in
//! them as soon as it is evaluated, and restores them from beneath its result
//! at the end. Anything it calls that runs another expansion does the same,
//! so the words are intact whenever a call returns.

use ecow::EcoString;
use tracing::debug;

use crate::asm::{Fragment, Instruction::*};
use crate::codegen::calling::invocation;
use crate::codegen::labeller::{LabelSource, Labeller};
use crate::codegen::memory_manager::DEALLOCATE;
use crate::codegen::record::{
    ARRAY_HEADER_SIZE, ARRAY_LENGTH_OFFSET, allocate_empty_array, array_status, element_address,
    null_check,
};
use crate::codegen::runtime::{
    CLONE_ARRAY, Fault, OPERATOR_ARRAY, OPERATOR_COUNT, OPERATOR_INDEX, OPERATOR_LAMBDA,
    OPERATOR_LENGTH, OPERATOR_OTHER_ARRAY, OPERATOR_RESULT, OPERATOR_RETURN, OPERATOR_TRANSFER,
};
use crate::codegen::scratch::ScratchContext;
use crate::tree::Type;

/// `map(array, lambda)`: both fragments are values.
pub fn map(
    array: Fragment,
    array_type: &Type,
    lambda: Fragment,
    lambda_type: &Type,
    labels: &mut LabelSource,
) -> Fragment {
    let element = array_type.element();
    let result = lambda_type.signature().1;
    debug!(%element, %result, "Expanding map");

    let context = ScratchContext::new(&[
        OPERATOR_LAMBDA,
        OPERATOR_ARRAY,
        OPERATOR_INDEX,
        OPERATOR_LENGTH,
        OPERATOR_RESULT,
    ]);
    let labels = labels.labeller("map");
    let mut code = context.save();
    operand(&mut code, array, OPERATOR_ARRAY);
    code.append(lambda);
    code.store_i(OPERATOR_LAMBDA);
    operand_length(&mut code, OPERATOR_ARRAY);

    code.load_i(OPERATOR_LENGTH);
    allocate_empty_array(&mut code, array_status(result), result.size());
    code.store_i(OPERATOR_RESULT);

    let (head, done) = begin_loop(&mut code, &labels, 0);
    code.load_i(OPERATOR_RESULT);
    code.load_i(OPERATOR_INDEX);
    element_address(&mut code, ARRAY_HEADER_SIZE, result.size());
    invocation(
        &mut code,
        callee(),
        vec![(current_element(OPERATOR_ARRAY, element), element)],
        result,
    );
    code.store(result);
    end_loop(&mut code, head, done);

    code.load_i(OPERATOR_RESULT);
    finish(code, &context, &Type::array(result.clone()))
}

/// `zip(first, second, lambda)`, faulting unless both arrays have the same
/// length.
pub fn zip(
    first: Fragment,
    first_type: &Type,
    second: Fragment,
    second_type: &Type,
    lambda: Fragment,
    lambda_type: &Type,
    labels: &mut LabelSource,
) -> Fragment {
    let first_element = first_type.element();
    let second_element = second_type.element();
    let result = lambda_type.signature().1;
    debug!(%first_element, %second_element, %result, "Expanding zip");

    let context = ScratchContext::new(&[
        OPERATOR_LAMBDA,
        OPERATOR_ARRAY,
        OPERATOR_OTHER_ARRAY,
        OPERATOR_INDEX,
        OPERATOR_LENGTH,
        OPERATOR_RESULT,
    ]);
    let labels = labels.labeller("zip");
    let mut code = context.save();
    operand(&mut code, first, OPERATOR_ARRAY);
    operand(&mut code, second, OPERATOR_OTHER_ARRAY);
    code.append(lambda);
    code.store_i(OPERATOR_LAMBDA);

    code.load_i(OPERATOR_ARRAY);
    code.read_i(ARRAY_LENGTH_OFFSET);
    code.load_i(OPERATOR_OTHER_ARRAY);
    code.read_i(ARRAY_LENGTH_OFFSET);
    code.extend([
        Subtract,
        JumpTrue(Fault::ZipLengthMismatch.label().into()),
    ]);
    operand_length(&mut code, OPERATOR_ARRAY);

    code.load_i(OPERATOR_LENGTH);
    allocate_empty_array(&mut code, array_status(result), result.size());
    code.store_i(OPERATOR_RESULT);

    let (head, done) = begin_loop(&mut code, &labels, 0);
    code.load_i(OPERATOR_RESULT);
    code.load_i(OPERATOR_INDEX);
    element_address(&mut code, ARRAY_HEADER_SIZE, result.size());
    invocation(
        &mut code,
        callee(),
        vec![
            (current_element(OPERATOR_ARRAY, first_element), first_element),
            (
                current_element(OPERATOR_OTHER_ARRAY, second_element),
                second_element,
            ),
        ],
        result,
    );
    code.store(result);
    end_loop(&mut code, head, done);

    code.load_i(OPERATOR_RESULT);
    finish(code, &context, &Type::array(result.clone()))
}

/// `fold(array, base, lambda)`. The accumulator stays on the operand stack
/// between calls. Without a base the first element seeds it and the loop
/// starts at the second. An empty array faults either way.
pub fn fold(
    array: Fragment,
    array_type: &Type,
    base: Option<Fragment>,
    lambda: Fragment,
    lambda_type: &Type,
    labels: &mut LabelSource,
) -> Fragment {
    let element = array_type.element();
    let accumulator = lambda_type.signature().1;
    debug!(%element, %accumulator, has_base = base.is_some(), "Expanding fold");

    let context = ScratchContext::new(&[
        OPERATOR_LAMBDA,
        OPERATOR_ARRAY,
        OPERATOR_INDEX,
        OPERATOR_LENGTH,
    ]);
    let labels = labels.labeller("fold");
    let mut code = context.save();
    operand(&mut code, array, OPERATOR_ARRAY);
    operand_length(&mut code, OPERATOR_ARRAY);
    code.load_i(OPERATOR_LENGTH);
    code.emit(JumpFalse(Fault::FoldEmptyArray.label().into()));

    let first = match base {
        Some(base) => {
            code.append(base);
            0
        }
        None => {
            code.append(current_element_at(OPERATOR_ARRAY, 0, element));
            1
        }
    };
    code.append(lambda);
    code.store_i(OPERATOR_LAMBDA);

    // [accumulator]
    let (head, done) = begin_loop(&mut code, &labels, first);
    code.stash(accumulator, OPERATOR_TRANSFER);
    let mut previous = Fragment::value();
    previous.unstash(accumulator, OPERATOR_TRANSFER);
    invocation(
        &mut code,
        callee(),
        vec![
            (previous, accumulator),
            (current_element(OPERATOR_ARRAY, element), element),
        ],
        accumulator,
    );
    end_loop(&mut code, head, done);

    finish(code, &context, accumulator)
}

/// `reduce(array, lambda)`: the elements for which `lambda` holds, in order.
///
/// A first pass records each verdict in a byte mask and counts the keepers;
/// the second copies them into a result of exactly that length.
pub fn reduce(
    array: Fragment,
    array_type: &Type,
    lambda: Fragment,
    labels: &mut LabelSource,
) -> Fragment {
    let element = array_type.element();
    let size = element.size();
    debug!(%element, "Expanding reduce");

    let context = ScratchContext::new(&[
        OPERATOR_LAMBDA,
        OPERATOR_ARRAY,
        OPERATOR_INDEX,
        OPERATOR_LENGTH,
        OPERATOR_RESULT,
        OPERATOR_COUNT,
    ]);
    let labels = labels.labeller("reduce");
    let mut code = context.save();
    operand(&mut code, array, OPERATOR_ARRAY);
    code.append(lambda);
    code.store_i(OPERATOR_LAMBDA);
    operand_length(&mut code, OPERATOR_ARRAY);

    // The mask lives in OPERATOR_RESULT until the second pass.
    code.load_i(OPERATOR_LENGTH);
    allocate_empty_array(&mut code, 0, 1);
    code.store_i(OPERATOR_RESULT);
    code.emit(PushI(0));
    code.store_i(OPERATOR_COUNT);

    let (head, done) = begin_loop(&mut code, &labels, 0);
    let skip = labels.label("skip");
    code.load_i(OPERATOR_RESULT);
    code.load_i(OPERATOR_INDEX);
    element_address(&mut code, ARRAY_HEADER_SIZE, 1);
    invocation(
        &mut code,
        callee(),
        vec![(current_element(OPERATOR_ARRAY, element), element)],
        &Type::Boolean,
    );
    code.extend([Duplicate, JumpFalse(skip.clone())]);
    code.increment_i(OPERATOR_COUNT);
    code.extend([Label(skip), StoreC]);
    end_loop(&mut code, head, done);

    // [] -> [kept]
    code.load_i(OPERATOR_COUNT);
    allocate_empty_array(&mut code, array_status(element), size);
    code.emit(PushI(0));
    code.store_i(OPERATOR_COUNT);

    let copy_head = labels.label("copy");
    let copy_next = labels.label("copy-next");
    let copy_done = labels.label("copy-done");
    code.emit(PushI(0));
    code.store_i(OPERATOR_INDEX);
    code.emit(Label(copy_head.clone()));
    loop_test(&mut code, &copy_done);
    code.load_i(OPERATOR_RESULT);
    code.load_i(OPERATOR_INDEX);
    element_address(&mut code, ARRAY_HEADER_SIZE, 1);
    code.extend([LoadC, JumpFalse(copy_next.clone())]);
    code.emit(Duplicate);
    code.load_i(OPERATOR_COUNT);
    element_address(&mut code, ARRAY_HEADER_SIZE, size);
    code.load_i(OPERATOR_ARRAY);
    code.load_i(OPERATOR_INDEX);
    element_address(&mut code, ARRAY_HEADER_SIZE, size);
    code.extend([PushI(size), Call(CLONE_ARRAY.into())]);
    code.increment_i(OPERATOR_COUNT);
    code.emit(Label(copy_next));
    code.increment_i(OPERATOR_INDEX);
    code.emit(Jump(copy_head));
    code.emit(Label(copy_done));

    code.load_i(OPERATOR_RESULT);
    code.emit(Call(DEALLOCATE.into()));
    finish(code, &context, array_type)
}

// === Shared pieces ===

/// Appends an array operand, faults if it is null, and parks it at `cell`.
fn operand(code: &mut Fragment, array: Fragment, cell: &str) {
    code.append(array);
    null_check(code);
    code.store_i(cell);
}

fn operand_length(code: &mut Fragment, cell: &str) {
    code.load_i(cell);
    code.read_i(ARRAY_LENGTH_OFFSET);
    code.store_i(OPERATOR_LENGTH);
}

fn callee() -> Fragment {
    let mut code = Fragment::value();
    code.load_i(OPERATOR_LAMBDA);
    code
}

/// `[] -> [array[index]]` for the array parked at `cell`.
fn current_element(cell: &str, element: &Type) -> Fragment {
    let mut code = Fragment::value();
    code.load_i(cell);
    code.load_i(OPERATOR_INDEX);
    element_address(&mut code, ARRAY_HEADER_SIZE, element.size());
    code.load(element);
    code
}

fn current_element_at(cell: &str, index: i32, element: &Type) -> Fragment {
    let mut code = Fragment::value();
    code.load_i(cell);
    code.add_offset(ARRAY_HEADER_SIZE + index * element.size());
    code.load(element);
    code
}

/// `[] -> []`, leaving the loop once the index reaches the length.
fn loop_test(code: &mut Fragment, done: &str) {
    code.load_i(OPERATOR_LENGTH);
    code.load_i(OPERATOR_INDEX);
    code.extend([Subtract, JumpFalse(done.into())]);
}

fn begin_loop(
    code: &mut Fragment,
    labels: &Labeller,
    first: i32,
) -> (EcoString, EcoString) {
    let head = labels.label("loop");
    let done = labels.label("done");
    code.emit(PushI(first));
    code.store_i(OPERATOR_INDEX);
    code.emit(Label(head.clone()));
    loop_test(code, &done);
    (head, done)
}

fn end_loop(code: &mut Fragment, head: EcoString, done: EcoString) {
    code.increment_i(OPERATOR_INDEX);
    code.emit(Jump(head));
    code.emit(Label(done));
}

/// `[saved.. result] -> [result]` as a value fragment.
fn finish(mut code: Fragment, context: &ScratchContext, result: &Type) -> Fragment {
    code.append(context.restore_under(result, OPERATOR_RETURN));
    let mut value = Fragment::value();
    value.append(code);
    value
}

//! Operators shared by arrays and strings: allocation, length, clone,
//! reverse and indexing.

use crate::asm::{Fragment, Instruction::*};
use crate::codegen::labeller::LabelSource;
use crate::codegen::record::{
    ARRAY_HEADER_SIZE, ARRAY_LENGTH_OFFSET, DYNAMIC_STRING_STATUS, allocate_empty_array,
    allocate_string, array_status, element_address, null_check, sequence_layout,
};
use crate::codegen::runtime::{
    CLONE_ARRAY, Fault, INDEXING_ARRAY, INDEXING_INDEX, SEQUENCE_INDEX, SEQUENCE_SOURCE,
};
use crate::tree::Type;

/// `[length] -> [array]`
pub fn allocate(code: &mut Fragment, element: &Type) {
    allocate_empty_array(code, array_status(element), element.size());
}

/// `[sequence] -> [length]`
pub fn length(code: &mut Fragment, sequence: &Type) {
    let (_, length_offset, _) = sequence_layout(sequence);
    null_check(code);
    code.read_i(length_offset);
}

/// `[array] -> [copy]`: a shallow copy; nested arrays are shared.
pub fn clone(code: &mut Fragment, element: &Type) {
    let size = element.size();
    null_check(code);
    code.store_i(SEQUENCE_SOURCE);
    source_length(code, ARRAY_LENGTH_OFFSET);
    allocate(code, element);

    code.emit(Duplicate);
    code.add_offset(ARRAY_HEADER_SIZE);
    code.load_i(SEQUENCE_SOURCE);
    code.add_offset(ARRAY_HEADER_SIZE);
    source_length(code, ARRAY_LENGTH_OFFSET);
    code.extend([PushI(size), Multiply, Call(CLONE_ARRAY.into())]);
}

/// `[sequence] -> [reversed copy]`
pub fn reverse(code: &mut Fragment, sequence: &Type, labels: &mut LabelSource) {
    let (header, length_offset, size) = sequence_layout(sequence);
    let labels = labels.labeller("reverse");
    let head = labels.label("loop");
    let done = labels.label("done");

    null_check(code);
    code.store_i(SEQUENCE_SOURCE);
    source_length(code, length_offset);
    match sequence {
        Type::String => allocate_string(code, DYNAMIC_STRING_STATUS),
        _ => allocate(code, sequence.element()),
    }
    code.emit(PushI(0));
    code.store_i(SEQUENCE_INDEX);

    // [copy], copying source[i] to copy[length - 1 - i]
    code.emit(Label(head.clone()));
    source_length(code, length_offset);
    code.load_i(SEQUENCE_INDEX);
    code.extend([Subtract, JumpFalse(done.clone())]);
    code.emit(Duplicate);
    source_length(code, length_offset);
    code.load_i(SEQUENCE_INDEX);
    code.extend([Subtract, PushI(1), Subtract]);
    element_address(code, header, size);
    code.load_i(SEQUENCE_SOURCE);
    code.load_i(SEQUENCE_INDEX);
    element_address(code, header, size);
    code.extend([PushI(size), Call(CLONE_ARRAY.into())]);
    code.increment_i(SEQUENCE_INDEX);
    code.emit(Jump(head));
    code.emit(Label(done));
}

/// `[] -> [length of the sequence in SEQUENCE_SOURCE]`
fn source_length(code: &mut Fragment, length_offset: i32) {
    code.load_i(SEQUENCE_SOURCE);
    code.read_i(length_offset);
}

/// `sequence[index]` as an address, after null and bounds checks.
pub fn index(
    sequence: Fragment,
    index: Fragment,
    ty: &Type,
    labels: &mut LabelSource,
) -> Fragment {
    let (header, length_offset, size) = sequence_layout(ty);
    let in_bounds = labels.labeller("index").label("in-bounds");
    let out_of_bounds = Fault::IndexOutOfBounds.label();

    let mut code = Fragment::address();
    code.append(sequence);
    code.append(index);
    code.store_i(INDEXING_INDEX);
    null_check(&mut code);
    code.store_i(INDEXING_ARRAY);

    code.load_i(INDEXING_INDEX);
    code.emit(JumpNeg(out_of_bounds.into()));
    code.load_i(INDEXING_INDEX);
    code.load_i(INDEXING_ARRAY);
    code.read_i(length_offset);
    code.extend([
        Subtract,
        JumpNeg(in_bounds.clone()),
        Jump(out_of_bounds.into()),
    ]);

    code.emit(Label(in_bounds));
    code.load_i(INDEXING_ARRAY);
    code.load_i(INDEXING_INDEX);
    element_address(&mut code, header, size);
    code
}

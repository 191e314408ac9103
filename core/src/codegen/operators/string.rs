//! String builders. Every result is a fresh dynamic string record.

use crate::asm::{Fragment, Instruction::*};
use crate::codegen::labeller::LabelSource;
use crate::codegen::record::{
    DYNAMIC_STRING_STATUS, STRING_HEADER_SIZE, STRING_LENGTH_OFFSET, allocate_string, null_check,
};
use crate::codegen::runtime::{
    CLONE_ARRAY, Fault, STRING_CHARACTER, STRING_END, STRING_FIRST, STRING_SECOND, STRING_START,
};

/// `[string start end] -> [string]`, characters `start..end`.
pub fn substring(code: &mut Fragment, labels: &mut LabelSource) {
    let labels = labels.labeller("substring");
    let start_ok = labels.label("start-ok");
    let indices_ok = labels.label("indices-ok");
    let out_of_bounds = Fault::IndexOutOfBounds.label();

    code.store_i(STRING_END);
    code.store_i(STRING_START);
    null_check(code);
    code.store_i(STRING_FIRST);

    code.load_i(STRING_START);
    code.emit(JumpNeg(out_of_bounds.into()));
    code.load_i(STRING_START);
    length_of(code, STRING_FIRST);
    code.extend([Subtract, JumpNeg(start_ok.clone()), Jump(out_of_bounds.into())]);
    code.emit(Label(start_ok));
    length_of(code, STRING_FIRST);
    code.load_i(STRING_END);
    code.extend([Subtract, JumpNeg(out_of_bounds.into())]);
    span(code);
    code.extend([
        JumpPos(indices_ok.clone()),
        Jump(Fault::SubstringIndices.label().into()),
    ]);

    code.emit(Label(indices_ok));
    span(code);
    allocate_string(code, DYNAMIC_STRING_STATUS);
    code.emit(Duplicate);
    code.add_offset(STRING_HEADER_SIZE);
    characters_of(code, STRING_FIRST);
    code.load_i(STRING_START);
    code.emit(Add);
    span(code);
    code.emit(Call(CLONE_ARRAY.into()));
}

/// `[first second] -> [first ++ second]`
pub fn concatenate(code: &mut Fragment) {
    null_check(code);
    code.store_i(STRING_SECOND);
    null_check(code);
    code.store_i(STRING_FIRST);

    length_of(code, STRING_FIRST);
    length_of(code, STRING_SECOND);
    code.emit(Add);
    allocate_string(code, DYNAMIC_STRING_STATUS);
    copy_characters(code, STRING_FIRST, 0);

    code.emit(Duplicate);
    code.add_offset(STRING_HEADER_SIZE);
    length_of(code, STRING_FIRST);
    code.emit(Add);
    copy_from(code, STRING_SECOND);
}

/// `[string character] -> [string ++ character]`
pub fn append_character(code: &mut Fragment) {
    code.store_i(STRING_CHARACTER);
    null_check(code);
    code.store_i(STRING_FIRST);

    length_of(code, STRING_FIRST);
    code.add_offset(1);
    allocate_string(code, DYNAMIC_STRING_STATUS);
    copy_characters(code, STRING_FIRST, 0);

    code.emit(Duplicate);
    code.add_offset(STRING_HEADER_SIZE);
    length_of(code, STRING_FIRST);
    code.emit(Add);
    code.load_i(STRING_CHARACTER);
    code.emit(StoreC);
}

/// `[character string] -> [character ++ string]`
pub fn prepend_character(code: &mut Fragment) {
    null_check(code);
    code.store_i(STRING_FIRST);
    code.store_i(STRING_CHARACTER);

    length_of(code, STRING_FIRST);
    code.add_offset(1);
    allocate_string(code, DYNAMIC_STRING_STATUS);

    code.emit(Duplicate);
    code.add_offset(STRING_HEADER_SIZE);
    code.load_i(STRING_CHARACTER);
    code.emit(StoreC);
    copy_characters(code, STRING_FIRST, 1);
}

/// `[] -> [length of the string at label]`
fn length_of(code: &mut Fragment, label: &str) {
    code.load_i(label);
    code.read_i(STRING_LENGTH_OFFSET);
}

/// `[] -> [address of the first character of the string at label]`
fn characters_of(code: &mut Fragment, label: &str) {
    code.load_i(label);
    code.add_offset(STRING_HEADER_SIZE);
}

/// `[] -> [end - start]`
fn span(code: &mut Fragment) {
    code.load_i(STRING_END);
    code.load_i(STRING_START);
    code.emit(Subtract);
}

/// `[result] -> [result]`, copying the characters of the string at `label`
/// into `result`, `skip` characters in.
fn copy_characters(code: &mut Fragment, label: &str, skip: i32) {
    code.emit(Duplicate);
    code.add_offset(STRING_HEADER_SIZE + skip);
    copy_from(code, label);
}

/// `[result destination] -> [result]`
fn copy_from(code: &mut Fragment, label: &str) {
    characters_of(code, label);
    length_of(code, label);
    code.emit(Call(CLONE_ARRAY.into()));
}

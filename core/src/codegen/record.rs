//! Heap records: layout constants and the shared allocation builders.
//!
//! ```text
//! array:  [typeId=7:4][status:4][elementSize:4][length:4][elements ...]
//! string: [typeId=6:4][status:4][length:4][characters ...][0]
//! ```
//!
//! Builders keep the fresh record pointer on the operand stack rather than in
//! a shared temporary, so element expressions may themselves build records
//! or call functions.

use static_assertions::const_assert;
use static_assertions::const_assert_eq;

use crate::asm::{Fragment, Instruction::*};
use crate::codegen::memory_manager::ALLOCATE;
use crate::codegen::runtime::{
    ARRAY_DATASIZE_TEMPORARY, ARRAY_LENGTH_TEMPORARY, CLEAR_N_BYTES, Fault,
    STRING_LENGTH_TEMPORARY,
};
use crate::tree::Type;

pub const TYPE_ID_OFFSET: i32 = 0;
pub const STATUS_OFFSET: i32 = 4;

pub const ARRAY_TYPE_ID: i32 = 7;
pub const ARRAY_ELEMENT_SIZE_OFFSET: i32 = 8;
pub const ARRAY_LENGTH_OFFSET: i32 = 12;
pub const ARRAY_HEADER_SIZE: i32 = 16;

pub const STRING_TYPE_ID: i32 = 6;
pub const STRING_LENGTH_OFFSET: i32 = 8;
pub const STRING_HEADER_SIZE: i32 = 12;

/// Status bits.
pub const STATUS_IMMUTABLE: i32 = 0b0001;
pub const STATUS_REFERENCE: i32 = 0b0010;
pub const STATUS_DELETED: i32 = 0b0100;
pub const STATUS_PERMANENT: i32 = 0b1000;

pub const STRING_LITERAL_STATUS: i32 = STATUS_PERMANENT | STATUS_IMMUTABLE;
pub const DYNAMIC_STRING_STATUS: i32 = STATUS_IMMUTABLE;
/// Either bit set means discard leaves the record alone.
pub const SKIP_DISCARD_MASK: i32 = STATUS_DELETED | STATUS_PERMANENT;

const_assert_eq!(ARRAY_HEADER_SIZE, ARRAY_LENGTH_OFFSET + 4);
const_assert_eq!(STRING_HEADER_SIZE, STRING_LENGTH_OFFSET + 4);
const_assert_eq!(STATUS_DELETED & STATUS_PERMANENT, 0);
const_assert!(STRING_LITERAL_STATUS & SKIP_DISCARD_MASK != 0);
const_assert!(DYNAMIC_STRING_STATUS & SKIP_DISCARD_MASK == 0);

/// Status of a fresh array whose elements have type `element`.
pub fn array_status(element: &Type) -> i32 {
    if element.is_reference() {
        STATUS_REFERENCE
    } else {
        0
    }
}

/// Header size, length offset and element size of a sequence type.
pub fn sequence_layout(sequence: &Type) -> (i32, i32, i32) {
    match sequence {
        Type::String => (STRING_HEADER_SIZE, STRING_LENGTH_OFFSET, 1),
        Type::Array(element) => (ARRAY_HEADER_SIZE, ARRAY_LENGTH_OFFSET, element.size()),
        other => panic!("{} is not a sequence (type checker bug)", other),
    }
}

/// `[record] -> [record]`, faulting on a null pointer.
pub fn null_check(code: &mut Fragment) {
    code.extend([Duplicate, JumpFalse(Fault::NullArray.label().into())]);
}

/// `[size] -> [record]`: allocates `size` bytes and writes the common header.
pub fn allocate_record(code: &mut Fragment, type_id: i32, status: i32) {
    code.emit(Call(ALLOCATE.into()));
    code.extend([Duplicate, PushI(type_id)]);
    code.write_i(TYPE_ID_OFFSET);
    code.extend([Duplicate, PushI(status)]);
    code.write_i(STATUS_OFFSET);
}

/// `[length] -> [array]`: a zero-filled array, faulting on a negative length.
pub fn allocate_empty_array(code: &mut Fragment, status: i32, element_size: i32) {
    code.extend([
        Duplicate,
        JumpNeg(Fault::NegativeArrayLength.label().into()),
        Duplicate,
    ]);
    code.store_i(ARRAY_LENGTH_TEMPORARY);
    code.extend([PushI(element_size), Multiply, Duplicate]);
    code.store_i(ARRAY_DATASIZE_TEMPORARY);
    code.add_offset(ARRAY_HEADER_SIZE);
    allocate_record(code, ARRAY_TYPE_ID, status);

    code.extend([Duplicate, PushI(element_size)]);
    code.write_i(ARRAY_ELEMENT_SIZE_OFFSET);
    code.emit(Duplicate);
    code.load_i(ARRAY_LENGTH_TEMPORARY);
    code.write_i(ARRAY_LENGTH_OFFSET);

    code.emit(Duplicate);
    code.add_offset(ARRAY_HEADER_SIZE);
    code.load_i(ARRAY_DATASIZE_TEMPORARY);
    code.emit(Call(CLEAR_N_BYTES.into()));
}

/// `[] -> [array]`: an array holding the given element values, in order.
pub fn allocate_populated_array(code: &mut Fragment, element: &Type, elements: Vec<Fragment>) {
    let size = element.size();
    let length = elements.len() as i32;
    code.emit(PushI(ARRAY_HEADER_SIZE + length * size));
    allocate_record(code, ARRAY_TYPE_ID, array_status(element));
    code.extend([Duplicate, PushI(size)]);
    code.write_i(ARRAY_ELEMENT_SIZE_OFFSET);
    code.extend([Duplicate, PushI(length)]);
    code.write_i(ARRAY_LENGTH_OFFSET);

    for (i, value) in elements.into_iter().enumerate() {
        code.emit(Duplicate);
        code.add_offset(ARRAY_HEADER_SIZE + i as i32 * size);
        code.append(value);
        code.store(element);
    }
}

/// `[length] -> [string]`: a string record with its trailing zero written.
///
/// The characters themselves are left for the caller to fill in.
pub fn allocate_string(code: &mut Fragment, status: i32) {
    code.emit(Duplicate);
    code.store_i(STRING_LENGTH_TEMPORARY);
    code.add_offset(STRING_HEADER_SIZE + 1);
    allocate_record(code, STRING_TYPE_ID, status);

    code.emit(Duplicate);
    code.load_i(STRING_LENGTH_TEMPORARY);
    code.write_i(STRING_LENGTH_OFFSET);

    code.emit(Duplicate);
    code.add_offset(STRING_HEADER_SIZE);
    code.load_i(STRING_LENGTH_TEMPORARY);
    code.extend([Add, PushI(0), StoreC]);
}

/// `[sequence index] -> [element address]` without any checks.
pub fn element_address(code: &mut Fragment, header_size: i32, element_size: i32) {
    if element_size != 1 {
        code.extend([PushI(element_size), Multiply]);
    }
    code.emit(Add);
    code.add_offset(header_size);
}

/// A static string record in the data segment, permanently allocated.
pub fn string_literal(code: &mut Fragment, label: &str, text: &str) {
    code.extend([
        DLabel(label.into()),
        DataI(STRING_TYPE_ID),
        DataI(STRING_LITERAL_STATUS),
        DataI(text.len() as i32),
        DataS(text.into()),
        PushD(label.into()),
    ]);
}

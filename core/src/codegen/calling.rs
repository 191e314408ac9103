//! The calling convention for function values.
//!
//! ```text
//!              higher addresses
//!   caller SP ->+------------------+
//!               | argument 0       |  parameter offsets are relative to FP
//!               | ..               |
//!               | argument n-1     |
//!          FP ->+------------------+
//!               | saved FP         |  FP - 4
//!               | return address   |  FP - 8
//!               +------------------+
//!               | locals           |  FP - 8 - local size
//!          SP ->+------------------+
//! ```
//!
//! On return the caller's stack pointer is restored and the result is written
//! into the bytes just below it, where the caller reads it back.

use crate::asm::{Fragment, Instruction::*};
use crate::codegen::runtime::{
    FRAME_POINTER, RETURN_ADDRESS_TEMPORARY, RETURN_FRAME_TEMPORARY, STACK_POINTER,
};
use crate::tree::{FRAME_OVERHEAD, Type};

const SAVED_FRAME_OFFSET: i32 = -4;
const RETURN_ADDRESS_OFFSET: i32 = -8;

/// Callee prologue, entered with `[return address]` on the operand stack.
pub fn enter_frame(code: &mut Fragment, local_scope_size: i32) {
    code.load_i(STACK_POINTER);
    code.add_offset(SAVED_FRAME_OFFSET);
    code.load_i(FRAME_POINTER);
    code.emit(StoreI);

    code.load_i(STACK_POINTER);
    code.add_offset(RETURN_ADDRESS_OFFSET);
    code.extend([Exchange, StoreI]);

    code.load_i(STACK_POINTER);
    code.store_i(FRAME_POINTER);
    move_stack_pointer(code, -(FRAME_OVERHEAD + local_scope_size));
}

/// `[] -> [slot]`: where the result of the current function goes.
pub fn return_slot(code: &mut Fragment, parameter_scope_size: i32, result: &Type) {
    code.load_i(FRAME_POINTER);
    code.add_offset(parameter_scope_size - result.size());
}

/// The shared exit of a function body, entered with `[slot value]` (or
/// nothing for void functions).
///
/// The return address and saved frame pointer are read out before the result
/// is written, since a result wider than the parameters overlaps them.
pub fn leave_frame(code: &mut Fragment, parameter_scope_size: i32, result: &Type) {
    code.load_i(FRAME_POINTER);
    code.read_i(RETURN_ADDRESS_OFFSET);
    code.store_i(RETURN_ADDRESS_TEMPORARY);
    code.load_i(FRAME_POINTER);
    code.read_i(SAVED_FRAME_OFFSET);
    code.store_i(RETURN_FRAME_TEMPORARY);

    code.load_i(FRAME_POINTER);
    code.add_offset(parameter_scope_size);
    code.store_i(STACK_POINTER);

    if *result != Type::Void {
        code.store(result);
    }

    code.load_i(RETURN_FRAME_TEMPORARY);
    code.store_i(FRAME_POINTER);
    code.load_i(RETURN_ADDRESS_TEMPORARY);
    code.emit(Return);
}

/// `[] -> [result]`: calls `callee` with the given argument values.
///
/// Each argument is written into a fresh slot below the stack pointer, in
/// declaration order. The stack pointer moves before the argument is
/// evaluated so nested calls build their frames below the slot.
pub fn invocation(code: &mut Fragment, callee: Fragment, arguments: Vec<(Fragment, &Type)>, result: &Type) {
    for (argument, ty) in arguments {
        code.load_i(STACK_POINTER);
        code.extend([PushI(ty.size()), Subtract, Duplicate]);
        code.store_i(STACK_POINTER);
        code.append(argument);
        code.store(ty);
    }
    code.append(callee);
    code.emit(CallV);

    if *result != Type::Void {
        code.load_i(STACK_POINTER);
        code.extend([PushI(result.size()), Subtract]);
        code.load(result);
    }
}

fn move_stack_pointer(code: &mut Fragment, delta: i32) {
    code.load_i(STACK_POINTER);
    code.add_offset(delta);
    code.store_i(STACK_POINTER);
}

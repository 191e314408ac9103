//! The runtime environment emitted at the top of every program.
//!
//! It declares the frame and stack pointers, the scratch words the generator
//! uses for its own bookkeeping, the strings `Printf` needs, one handler per
//! runtime fault, and a small library of subroutines reached by `Call`.
//!
//! Leaf subroutines (clear-n-bytes, clone-array, lowest-terms) keep their
//! return address and working state in their own cells. Discard recurses, so
//! it keeps its return address on the operand stack and brackets its cursor
//! with a [`ScratchContext`].

use crate::asm::{Fragment, Instruction::*};
use crate::codegen::memory_manager::DEALLOCATE;
use crate::codegen::record::{
    ARRAY_HEADER_SIZE, ARRAY_LENGTH_OFFSET, STATUS_DELETED, STATUS_OFFSET, STATUS_REFERENCE,
    SKIP_DISCARD_MASK,
};
use crate::codegen::scratch::ScratchContext;

// === Fixed labels ===

pub const EAT_LOCATION_ZERO: &str = "$eat-location-zero";
pub const FRAME_POINTER: &str = "$frame-pointer";
pub const STACK_POINTER: &str = "$stack-pointer";
pub const GLOBAL_MEMORY_BLOCK: &str = "$global-memory-block";
pub const MAIN_PROGRAM: &str = "$$main";

// === Subroutines ===

/// `[base count] -> []`
pub const CLEAR_N_BYTES: &str = "$clear-n-bytes";
/// `[destination source count] -> []`
pub const CLONE_ARRAY: &str = "$clone-array";
/// `[numerator denominator] -> [numerator denominator]`, reduced.
pub const LOWEST_TERMS: &str = "$lowest-terms";
/// `[record] -> []`
pub const DISCARD_RECORD: &str = "$discard-record";

// === Printf strings ===

pub const INTEGER_FORMAT: &str = "$print-format-integer";
pub const FLOATING_FORMAT: &str = "$print-format-floating";
pub const CHARACTER_FORMAT: &str = "$print-format-character";
pub const STRING_FORMAT: &str = "$print-format-string";
pub const NEWLINE_STRING: &str = "$print-newline";
pub const SPACE_STRING: &str = "$print-space";
pub const TAB_STRING: &str = "$print-tab";
pub const TRUE_STRING: &str = "$print-true";
pub const FALSE_STRING: &str = "$print-false";
pub const MINUS_STRING: &str = "$print-minus";
pub const UNDERSCORE_STRING: &str = "$print-underscore";
pub const SLASH_STRING: &str = "$print-slash";
pub const OPEN_BRACKET_STRING: &str = "$print-open-bracket";
pub const CLOSE_BRACKET_STRING: &str = "$print-close-bracket";
pub const SEPARATOR_STRING: &str = "$print-separator";
pub const LAMBDA_STRING: &str = "$print-lambda";

const PRINTF_STRINGS: &[(&str, &str)] = &[
    (INTEGER_FORMAT, "%d"),
    (FLOATING_FORMAT, "%g"),
    (CHARACTER_FORMAT, "%c"),
    (STRING_FORMAT, "%s"),
    (NEWLINE_STRING, "\n"),
    (SPACE_STRING, " "),
    (TAB_STRING, "\t"),
    (TRUE_STRING, "true"),
    (FALSE_STRING, "false"),
    (MINUS_STRING, "-"),
    (UNDERSCORE_STRING, "_"),
    (SLASH_STRING, "/"),
    (OPEN_BRACKET_STRING, "["),
    (CLOSE_BRACKET_STRING, "]"),
    (SEPARATOR_STRING, ", "),
    (LAMBDA_STRING, "<lambda>"),
];

// === Scratch words ===

pub const RATIONAL_STORE_ADDRESS: &str = "$rational-store-address";
pub const RATIONAL_STORE_DENOMINATOR: &str = "$rational-store-denominator";
pub const RATIONAL_FIRST_NUMERATOR: &str = "$rational-first-numerator";
pub const RATIONAL_FIRST_DENOMINATOR: &str = "$rational-first-denominator";
pub const RATIONAL_SECOND_NUMERATOR: &str = "$rational-second-numerator";
pub const RATIONAL_SECOND_DENOMINATOR: &str = "$rational-second-denominator";
pub const RATIONAL_OVER: &str = "$rational-over";

pub const ARRAY_LENGTH_TEMPORARY: &str = "$array-length-temporary";
pub const ARRAY_DATASIZE_TEMPORARY: &str = "$array-datasize-temporary";
pub const STRING_LENGTH_TEMPORARY: &str = "$string-length-temporary";
pub const SEQUENCE_SOURCE: &str = "$sequence-source";
pub const SEQUENCE_INDEX: &str = "$sequence-index";
pub const INDEXING_ARRAY: &str = "$a-indexing-array";
pub const INDEXING_INDEX: &str = "$a-indexing-index";
pub const STRING_FIRST: &str = "$string-first";
pub const STRING_SECOND: &str = "$string-second";
pub const STRING_START: &str = "$string-start";
pub const STRING_END: &str = "$string-end";
pub const STRING_CHARACTER: &str = "$string-character";

pub const FOR_IDENTIFIER: &str = "$for-identifier";
pub const FOR_SEQUENCE: &str = "$for-sequence";
pub const FOR_LENGTH: &str = "$for-length";
pub const FOR_INDEX: &str = "$for-index";

pub const OPERATOR_LAMBDA: &str = "$operator-lambda";
pub const OPERATOR_ARRAY: &str = "$operator-array";
pub const OPERATOR_OTHER_ARRAY: &str = "$operator-other-array";
pub const OPERATOR_INDEX: &str = "$operator-index";
pub const OPERATOR_LENGTH: &str = "$operator-length";
pub const OPERATOR_RESULT: &str = "$operator-result";
pub const OPERATOR_COUNT: &str = "$operator-count";
/// Eight-byte cell for handing a value across a stack rearrangement.
pub const OPERATOR_TRANSFER: &str = "$operator-transfer";
/// Eight-byte cell carrying an operator's result past its scratch restore.
pub const OPERATOR_RETURN: &str = "$operator-return";

pub const RETURN_ADDRESS_TEMPORARY: &str = "$return-address-temporary";
pub const RETURN_FRAME_TEMPORARY: &str = "$return-frame-temporary";

pub const PRINT_NUMERATOR: &str = "$print-numerator";
pub const PRINT_DENOMINATOR: &str = "$print-denominator";

pub const DISCARD_CURSOR: &str = "$discard-cursor";
pub const DISCARD_REMAINING: &str = "$discard-remaining";
pub const DISCARD_POINTER: &str = "$discard-pointer";

const SCRATCH_WORDS: &[(&str, i32)] = &[
    (RATIONAL_STORE_ADDRESS, 4),
    (RATIONAL_STORE_DENOMINATOR, 4),
    (RATIONAL_FIRST_NUMERATOR, 4),
    (RATIONAL_FIRST_DENOMINATOR, 4),
    (RATIONAL_SECOND_NUMERATOR, 4),
    (RATIONAL_SECOND_DENOMINATOR, 4),
    (RATIONAL_OVER, 4),
    (ARRAY_LENGTH_TEMPORARY, 4),
    (ARRAY_DATASIZE_TEMPORARY, 4),
    (STRING_LENGTH_TEMPORARY, 4),
    (SEQUENCE_SOURCE, 4),
    (SEQUENCE_INDEX, 4),
    (INDEXING_ARRAY, 4),
    (INDEXING_INDEX, 4),
    (STRING_FIRST, 4),
    (STRING_SECOND, 4),
    (STRING_START, 4),
    (STRING_END, 4),
    (STRING_CHARACTER, 4),
    (FOR_IDENTIFIER, 4),
    (FOR_SEQUENCE, 4),
    (FOR_LENGTH, 4),
    (FOR_INDEX, 4),
    (OPERATOR_LAMBDA, 4),
    (OPERATOR_ARRAY, 4),
    (OPERATOR_OTHER_ARRAY, 4),
    (OPERATOR_INDEX, 4),
    (OPERATOR_LENGTH, 4),
    (OPERATOR_RESULT, 4),
    (OPERATOR_COUNT, 4),
    (OPERATOR_TRANSFER, 8),
    (OPERATOR_RETURN, 8),
    (RETURN_ADDRESS_TEMPORARY, 4),
    (RETURN_FRAME_TEMPORARY, 4),
    (PRINT_NUMERATOR, 4),
    (PRINT_DENOMINATOR, 4),
    (DISCARD_CURSOR, 4),
    (DISCARD_REMAINING, 4),
    (DISCARD_POINTER, 4),
];

// === Runtime faults ===

const GENERAL_RUNTIME_ERROR: &str = "$$general-runtime-error";
const GENERAL_RUNTIME_ERROR_FORMAT: &str = "$errors-general-message";

/// A fatal condition detected by generated code. Each has a handler label
/// that prints `Runtime error: <message>` and halts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    IntegerDivideByZero,
    FloatingDivideByZero,
    RationalZeroDenominator,
    NullArray,
    IndexOutOfBounds,
    SubstringIndices,
    NegativeArrayLength,
    MissingReturn,
    ZipLengthMismatch,
    FoldEmptyArray,
}

impl Fault {
    pub const ALL: [Fault; 10] = [
        Fault::IntegerDivideByZero,
        Fault::FloatingDivideByZero,
        Fault::RationalZeroDenominator,
        Fault::NullArray,
        Fault::IndexOutOfBounds,
        Fault::SubstringIndices,
        Fault::NegativeArrayLength,
        Fault::MissingReturn,
        Fault::ZipLengthMismatch,
        Fault::FoldEmptyArray,
    ];

    /// The handler to jump to.
    pub fn label(self) -> &'static str {
        match self {
            Fault::IntegerDivideByZero => "$$i-divide-by-zero",
            Fault::FloatingDivideByZero => "$$f-divide-by-zero",
            Fault::RationalZeroDenominator => "$$r-zero-denominator",
            Fault::NullArray => "$$null-array",
            Fault::IndexOutOfBounds => "$$index-out-of-bounds",
            Fault::SubstringIndices => "$$substring-indices",
            Fault::NegativeArrayLength => "$$negative-array-length",
            Fault::MissingReturn => "$$missing-return",
            Fault::ZipLengthMismatch => "$$zip-length-mismatch",
            Fault::FoldEmptyArray => "$$fold-empty-array",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Fault::IntegerDivideByZero => "integer divide by zero",
            Fault::FloatingDivideByZero => "floating divide by zero",
            Fault::RationalZeroDenominator => "rational number given 0 as denominator",
            Fault::NullArray => "Null array indexed",
            Fault::IndexOutOfBounds => "Index out of bounds",
            Fault::SubstringIndices => "Second index smaller or equal to first one in substring",
            Fault::NegativeArrayLength => "Array provided with negative length",
            Fault::MissingReturn => "Reached end of function without return statement",
            Fault::ZipLengthMismatch => "Both arrays given different lengths in zip operator",
            Fault::FoldEmptyArray => "Trying to apply fold operation on empty array",
        }
    }

    fn message_label(self) -> String {
        format!("$errors-{}", &self.label()[2..])
    }
}

/// The environment prologue. Execution falls into it first and leaves it by
/// jumping to [`MAIN_PROGRAM`].
///
/// Discard hands records back to the allocator, so it is only emitted when
/// the memory manager is linked in.
pub fn environment(with_discard: bool) -> Fragment {
    let mut code = Fragment::void();
    code.extend([DLabel(EAT_LOCATION_ZERO.into()), DataZ(8)]);
    code.extend([DLabel(FRAME_POINTER.into()), DataI(0)]);
    code.extend([DLabel(STACK_POINTER.into()), DataI(0)]);
    code.extend([Memtop, Duplicate]);
    code.store_i(FRAME_POINTER);
    code.store_i(STACK_POINTER);
    code.emit(Jump(MAIN_PROGRAM.into()));

    for (label, text) in PRINTF_STRINGS {
        code.extend([DLabel((*label).into()), DataS((*text).into())]);
    }
    for (label, size) in SCRATCH_WORDS {
        code.extend([DLabel((*label).into()), DataZ(*size)]);
    }

    code.append(fault_handlers());
    code.append(clear_n_bytes());
    code.append(clone_array());
    code.append(lowest_terms());
    if with_discard {
        code.append(discard_record());
    }
    code
}

fn fault_handlers() -> Fragment {
    let mut code = Fragment::void();
    code.extend([
        DLabel(GENERAL_RUNTIME_ERROR_FORMAT.into()),
        DataS("Runtime error: %s\n".into()),
        Label(GENERAL_RUNTIME_ERROR.into()),
        PushD(GENERAL_RUNTIME_ERROR_FORMAT.into()),
        Printf,
        Halt,
    ]);
    for fault in Fault::ALL {
        let message = fault.message_label();
        code.extend([
            DLabel(message.as_str().into()),
            DataS(fault.message().into()),
            Label(fault.label().into()),
            PushD(message.as_str().into()),
            Jump(GENERAL_RUNTIME_ERROR.into()),
        ]);
    }
    code
}

/// A leaf subroutine's private cells.
fn cells(code: &mut Fragment, names: &[&str]) {
    for name in names {
        code.extend([DLabel((*name).into()), DataI(0)]);
    }
}

fn clear_n_bytes() -> Fragment {
    const RETURN: &str = "$clear-n-bytes-return";
    const COUNT: &str = "$clear-n-bytes-count";
    const CURSOR: &str = "$clear-n-bytes-cursor";
    const LOOP: &str = "$clear-n-bytes-loop";
    const EXIT: &str = "$clear-n-bytes-exit";

    let mut code = Fragment::void();
    cells(&mut code, &[RETURN, COUNT, CURSOR]);
    code.emit(Label(CLEAR_N_BYTES.into()));
    code.store_i(RETURN);
    code.store_i(COUNT);
    code.store_i(CURSOR);

    code.emit(Label(LOOP.into()));
    code.load_i(COUNT);
    code.emit(JumpFalse(EXIT.into()));
    code.load_i(CURSOR);
    code.extend([PushI(0), StoreC]);
    code.increment_i(CURSOR);
    code.decrement_i(COUNT);
    code.emit(Jump(LOOP.into()));

    code.emit(Label(EXIT.into()));
    code.load_i(RETURN);
    code.emit(PopPC);
    code
}

fn clone_array() -> Fragment {
    const RETURN: &str = "$clone-array-return";
    const COUNT: &str = "$clone-array-count";
    const SOURCE: &str = "$clone-array-source";
    const DESTINATION: &str = "$clone-array-destination";
    const LOOP: &str = "$clone-array-loop";
    const EXIT: &str = "$clone-array-exit";

    let mut code = Fragment::void();
    cells(&mut code, &[RETURN, COUNT, SOURCE, DESTINATION]);
    code.emit(Label(CLONE_ARRAY.into()));
    code.store_i(RETURN);
    code.store_i(COUNT);
    code.store_i(SOURCE);
    code.store_i(DESTINATION);

    code.emit(Label(LOOP.into()));
    code.load_i(COUNT);
    code.emit(JumpFalse(EXIT.into()));
    code.load_i(DESTINATION);
    code.load_i(SOURCE);
    code.extend([LoadC, StoreC]);
    code.increment_i(DESTINATION);
    code.increment_i(SOURCE);
    code.decrement_i(COUNT);
    code.emit(Jump(LOOP.into()));

    code.emit(Label(EXIT.into()));
    code.load_i(RETURN);
    code.emit(PopPC);
    code
}

/// Forces the denominator positive, then divides both terms by their GCD
/// (Euclid's algorithm on absolute values). Zero over anything is `0/1`; a
/// zero denominator faults.
fn lowest_terms() -> Fragment {
    const RETURN: &str = "$lowest-terms-return";
    const NUMERATOR: &str = "$lowest-terms-numerator";
    const DENOMINATOR: &str = "$lowest-terms-denominator";
    const A: &str = "$lowest-terms-a";
    const B: &str = "$lowest-terms-b";
    const NONZERO: &str = "$lowest-terms-nonzero";
    const POSITIVE: &str = "$lowest-terms-positive";
    const GCD: &str = "$lowest-terms-gcd";
    const LOOP: &str = "$lowest-terms-loop";
    const REDUCE: &str = "$lowest-terms-reduce";
    const EXIT: &str = "$lowest-terms-exit";

    let mut code = Fragment::void();
    cells(&mut code, &[RETURN, NUMERATOR, DENOMINATOR, A, B]);
    code.emit(Label(LOWEST_TERMS.into()));
    code.store_i(RETURN);
    code.store_i(DENOMINATOR);
    code.store_i(NUMERATOR);

    code.load_i(DENOMINATOR);
    code.emit(JumpFalse(Fault::RationalZeroDenominator.label().into()));
    code.load_i(NUMERATOR);
    code.emit(JumpTrue(NONZERO.into()));
    code.extend([PushI(0), PushI(1), Jump(EXIT.into())]);

    code.emit(Label(NONZERO.into()));
    code.load_i(DENOMINATOR);
    code.emit(JumpPos(POSITIVE.into()));
    code.load_i(DENOMINATOR);
    code.emit(Negate);
    code.store_i(DENOMINATOR);
    code.load_i(NUMERATOR);
    code.emit(Negate);
    code.store_i(NUMERATOR);

    code.emit(Label(POSITIVE.into()));
    code.load_i(NUMERATOR);
    code.store_i(A);
    code.load_i(NUMERATOR);
    code.emit(JumpPos(GCD.into()));
    code.load_i(NUMERATOR);
    code.emit(Negate);
    code.store_i(A);

    code.emit(Label(GCD.into()));
    code.load_i(DENOMINATOR);
    code.store_i(B);
    code.emit(Label(LOOP.into()));
    code.load_i(B);
    code.emit(JumpFalse(REDUCE.into()));
    code.load_i(A);
    code.load_i(B);
    code.emit(Remainder);
    code.load_i(B);
    code.store_i(A);
    code.store_i(B);
    code.emit(Jump(LOOP.into()));

    code.emit(Label(REDUCE.into()));
    code.load_i(NUMERATOR);
    code.load_i(A);
    code.emit(Divide);
    code.load_i(DENOMINATOR);
    code.load_i(A);
    code.emit(Divide);

    code.emit(Label(EXIT.into()));
    code.load_i(RETURN);
    code.emit(PopPC);
    code
}

/// Recursive, idempotent free of a record.
///
/// Null pointers and records marked permanent or deleted are skipped. Arrays
/// of arrays discard their elements first, depth first and left to right.
/// The record is then marked deleted and handed to the deallocator.
fn discard_record() -> Fragment {
    const SKIP: &str = "$discard-record-skip";
    const RELEASE: &str = "$discard-record-release";
    const LOOP: &str = "$discard-record-loop";
    const LOOP_END: &str = "$discard-record-loop-end";

    let bracket = ScratchContext::new(&[DISCARD_CURSOR, DISCARD_REMAINING]);
    let mut code = Fragment::void();

    // [record return]
    code.emit(Label(DISCARD_RECORD.into()));
    code.extend([Exchange, Duplicate, JumpFalse(SKIP.into())]);
    code.emit(Duplicate);
    code.read_i(STATUS_OFFSET);
    code.extend([PushI(SKIP_DISCARD_MASK), BTAnd, JumpTrue(SKIP.into())]);
    code.emit(Duplicate);
    code.read_i(STATUS_OFFSET);
    code.extend([PushI(STATUS_REFERENCE), BTAnd, JumpFalse(RELEASE.into())]);

    // [return record]: discard every element.
    code.store_i(DISCARD_POINTER);
    code.append(bracket.save());
    code.load_i(DISCARD_POINTER);
    code.emit(Duplicate);
    code.add_offset(ARRAY_HEADER_SIZE);
    code.store_i(DISCARD_CURSOR);
    code.emit(Duplicate);
    code.read_i(ARRAY_LENGTH_OFFSET);
    code.store_i(DISCARD_REMAINING);

    code.emit(Label(LOOP.into()));
    code.load_i(DISCARD_REMAINING);
    code.emit(JumpFalse(LOOP_END.into()));
    code.load_i(DISCARD_CURSOR);
    code.extend([LoadI, Call(DISCARD_RECORD.into())]);
    code.load_i(DISCARD_CURSOR);
    code.add_offset(4);
    code.store_i(DISCARD_CURSOR);
    code.decrement_i(DISCARD_REMAINING);
    code.emit(Jump(LOOP.into()));

    code.emit(Label(LOOP_END.into()));
    code.store_i(DISCARD_POINTER);
    code.append(bracket.restore());
    code.load_i(DISCARD_POINTER);

    // [return record]
    code.emit(Label(RELEASE.into()));
    code.emit(Duplicate);
    code.add_offset(STATUS_OFFSET);
    code.extend([
        Duplicate,
        LoadI,
        PushI(STATUS_DELETED),
        BTOr,
        StoreI,
        Call(DEALLOCATE.into()),
        PopPC,
    ]);

    code.emit(Label(SKIP.into()));
    code.extend([Pop, PopPC]);
    code
}

#[cfg(test)]
#[path = "runtime_test.rs"]
mod runtime_test;

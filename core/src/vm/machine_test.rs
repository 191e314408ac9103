use pretty_assertions::assert_eq;

use super::*;
use crate::asm::Instruction::{self, *};
use crate::test_utils::init_test_logging;

fn options() -> MachineOptions {
    MachineOptions {
        memory_size: 4096,
        max_steps: Some(100_000),
    }
}

fn run(instructions: &[Instruction]) -> (Vec<Word>, String) {
    init_test_logging();
    let image = Image::assemble(instructions).unwrap();
    let mut output = Vec::new();
    let mut machine = Machine::new(&image, &options(), &mut output).unwrap();
    machine.run().unwrap();
    let stack = machine.stack().to_vec();
    drop(machine);
    (stack, String::from_utf8(output).unwrap())
}

fn run_err(instructions: &[Instruction]) -> MachineError {
    let image = Image::assemble(instructions).unwrap();
    let mut machine = Machine::new(&image, &options(), std::io::sink()).unwrap();
    machine.run().unwrap_err()
}

#[test]
fn test_integer_arithmetic_wraps() {
    let (stack, _) = run(&[
        PushI(i32::MAX),
        PushI(1),
        Add,
        PushI(-7),
        PushI(2),
        Divide,
        PushI(-7),
        PushI(2),
        Remainder,
    ]);
    assert_eq!(stack, vec![Word::Int(i32::MIN), Word::Int(-3), Word::Int(-1)]);
}

#[test]
fn test_logical_and_bitwise() {
    let (stack, _) = run(&[
        PushI(6),
        PushI(3),
        And,
        PushI(0),
        BNegate,
        PushI(6),
        PushI(3),
        BTAnd,
        PushI(200),
        PushI(127),
        BTAnd,
    ]);
    assert_eq!(
        stack,
        vec![Word::Int(1), Word::Int(1), Word::Int(2), Word::Int(72)]
    );
}

#[test]
fn test_conversions_truncate() {
    let (stack, _) = run(&[PushF(-2.75), ConvertI, PushI(3), ConvertF]);
    assert_eq!(stack, vec![Word::Int(-2), Word::Float(3.0)]);
}

#[test]
fn test_memory_is_little_endian() {
    let (stack, _) = run(&[
        DLabel("cell".into()),
        DataZ(8),
        PushD("cell".into()),
        PushI(0x0102_0304),
        StoreI,
        PushD("cell".into()),
        LoadC,
        PushD("cell".into()),
        PushI(3),
        Add,
        LoadC,
    ]);
    assert_eq!(stack, vec![Word::Int(4), Word::Int(1)]);
}

#[test]
fn test_load_char_is_unsigned() {
    let (stack, _) = run(&[DLabel("b".into()), DataC(0xff), PushD("b".into()), LoadC]);
    assert_eq!(stack, vec![Word::Int(255)]);
}

#[test]
fn test_memtop_is_memory_size() {
    let (stack, _) = run(&[Memtop]);
    assert_eq!(stack, vec![Word::Int(4096)]);
}

#[test]
fn test_conditional_jumps_pop_their_operand() {
    let (stack, _) = run(&[
        PushI(0),
        JumpTrue("skip".into()),
        PushI(1),
        Label("skip".into()),
        PushI(-1),
        JumpNeg("negative".into()),
        PushI(99),
        Label("negative".into()),
        PushF(0.0),
        JumpFZero("done".into()),
        PushI(98),
        Label("done".into()),
    ]);
    assert_eq!(stack, vec![Word::Int(1)]);
}

#[test]
fn test_call_and_return() {
    let (stack, _) = run(&[
        Call("double".into()),
        PushD("double".into()),
        CallV,
        Halt,
        Label("double".into()),
        PushI(2),
        Exchange,
        PopPC,
    ]);
    assert_eq!(stack, vec![Word::Int(2), Word::Int(2)]);
}

#[test]
fn test_halt_stops_execution() {
    let (stack, _) = run(&[PushI(1), Halt, PushI(2)]);
    assert_eq!(stack, vec![Word::Int(1)]);
}

#[test]
fn test_printf_first_specifier_takes_deepest_argument() {
    let (stack, output) = run(&[
        DLabel("fmt".into()),
        DataS("%d and %g, %c%s\n".into()),
        DLabel("name".into()),
        DataS("ok".into()),
        PushI(7),
        PushF(0.5),
        PushI(i32::from(b'x')),
        PushD("name".into()),
        PushD("fmt".into()),
        Printf,
    ]);
    assert_eq!(output, "7 and 0.5, xok\n");
    assert!(stack.is_empty());
}

#[test]
fn test_pstack() {
    let (_, output) = run(&[PushI(1), PushF(2.5), PStack]);
    assert_eq!(output, "Stack: [1, 2.5]\n");
}

#[test]
fn test_stack_underflow() {
    assert!(matches!(
        run_err(&[Nop, Pop]),
        MachineError::StackUnderflow { pc: 1 }
    ));
}

#[test]
fn test_type_mismatch() {
    assert!(matches!(
        run_err(&[PushF(1.0), PushI(1), Add]),
        MachineError::TypeMismatch {
            pc: 2,
            expected: "an integer"
        }
    ));
}

#[test]
fn test_division_by_zero() {
    assert!(matches!(
        run_err(&[PushI(1), PushI(0), Divide]),
        MachineError::DivisionByZero { pc: 2 }
    ));
}

#[test]
fn test_memory_out_of_bounds() {
    assert!(matches!(
        run_err(&[Memtop, PushI(2), Subtract, LoadI]),
        MachineError::MemoryOutOfBounds { width: 4, .. }
    ));
    assert!(matches!(
        run_err(&[PushI(-1), LoadC]),
        MachineError::MemoryOutOfBounds { address: -1, .. }
    ));
}

#[test]
fn test_bad_jump_target() {
    assert!(matches!(
        run_err(&[PushI(100), CallV]),
        MachineError::BadJumpTarget { target: 100, .. }
    ));
}

#[test]
fn test_step_limit() {
    assert!(matches!(
        run_err(&[Label("spin".into()), Jump("spin".into())]),
        MachineError::StepLimitExceeded { limit: 100_000 }
    ));
}

#[test]
fn test_image_too_large() {
    let image = Image::assemble(&[DLabel("big".into()), DataZ(8192)]).unwrap();
    assert!(matches!(
        Machine::new(&image, &options(), std::io::sink()),
        Err(MachineError::ImageTooLarge {
            data: 8192,
            memory: 4096
        })
    ));
}

use hashbrown::HashSet;
use pretty_assertions::assert_eq;

use super::*;
use crate::asm::Instruction;

fn labels(code: &Fragment) -> Vec<&str> {
    code.instructions()
        .iter()
        .filter_map(|instruction| match instruction {
            Label(label) | DLabel(label) => Some(label.as_str()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_environment_starts_by_eating_location_zero() {
    let code = environment(true);
    assert_eq!(
        &code.instructions()[..2],
        &[DLabel(EAT_LOCATION_ZERO.into()), DataZ(8)]
    );
}

#[test]
fn test_environment_initializes_pointers_then_jumps_to_main() {
    let code = environment(true);
    let first_jump = code
        .instructions()
        .iter()
        .position(|instruction| matches!(instruction, Jump(_)))
        .unwrap();
    assert_eq!(code.instructions()[first_jump], Jump(MAIN_PROGRAM.into()));
    let executable: Vec<&Instruction> = code.instructions()[..first_jump]
        .iter()
        .filter(|instruction| !instruction.is_directive())
        .collect();
    assert_eq!(executable[0], &Memtop);
    assert_eq!(executable[1], &Duplicate);
}

#[test]
fn test_environment_labels_are_unique() {
    let code = environment(true);
    let labels = labels(&code);
    let unique: HashSet<&str> = labels.iter().copied().collect();
    assert_eq!(labels.len(), unique.len());
}

#[test]
fn test_every_fault_has_a_handler() {
    let code = environment(true);
    let labels = labels(&code);
    for fault in Fault::ALL {
        assert!(labels.contains(&fault.label()), "missing {:?}", fault);
    }
}

#[test]
fn test_fault_messages_are_distinct() {
    let messages: HashSet<&str> = Fault::ALL.iter().map(|fault| fault.message()).collect();
    assert_eq!(messages.len(), Fault::ALL.len());
}

#[test]
fn test_subroutines_are_declared() {
    let code = environment(true);
    let labels = labels(&code);
    for subroutine in [CLEAR_N_BYTES, CLONE_ARRAY, LOWEST_TERMS, DISCARD_RECORD] {
        assert!(labels.contains(&subroutine), "missing {}", subroutine);
    }
}

#[test]
fn test_discard_omitted_without_memory_manager() {
    let code = environment(false);
    assert!(!labels(&code).contains(&DISCARD_RECORD));
    assert!(
        !code
            .instructions()
            .iter()
            .any(|instruction| *instruction == Call(DEALLOCATE.into()))
    );
}

#[test]
fn test_operator_cells_hold_a_rational() {
    let code = environment(true);
    let instructions = code.instructions();
    for cell in [OPERATOR_TRANSFER, OPERATOR_RETURN] {
        let at = instructions
            .iter()
            .position(|instruction| *instruction == DLabel(cell.into()))
            .unwrap();
        assert_eq!(instructions[at + 1], DataZ(8));
    }
}

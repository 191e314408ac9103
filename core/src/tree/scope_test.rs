use pretty_assertions::assert_eq;

use super::*;

#[test]
fn test_program_scope_grows_upward() {
    let mut scope = ScopeAllocator::program();
    assert_eq!(scope.allocate(&Type::Integer), MemoryLocation::Global(0));
    assert_eq!(scope.allocate(&Type::Boolean), MemoryLocation::Global(4));
    assert_eq!(scope.allocate(&Type::Rational), MemoryLocation::Global(5));
    assert_eq!(scope.allocated_size(), 13);
}

#[test]
fn test_procedure_scope_starts_below_frame_overhead() {
    let mut scope = ScopeAllocator::procedure();
    assert_eq!(scope.allocate(&Type::Integer), MemoryLocation::Local(-12));
    assert_eq!(scope.allocate(&Type::Floating), MemoryLocation::Local(-20));
    assert_eq!(scope.allocated_size(), 12);
}

#[test]
fn test_subscopes_reuse_space_and_keep_maximum() {
    let mut scope = ScopeAllocator::program();
    scope.allocate(&Type::Integer);

    scope.enter();
    assert_eq!(scope.allocate(&Type::Floating), MemoryLocation::Global(4));
    scope.leave();

    scope.enter();
    assert_eq!(scope.allocate(&Type::Character), MemoryLocation::Global(4));
    scope.leave();

    assert_eq!(scope.allocated_size(), 12);
    assert_eq!(scope.allocate(&Type::Integer), MemoryLocation::Global(4));
}

#[test]
fn test_static_allocation_reserves_companion_byte() {
    let mut scope = ScopeAllocator::program();
    assert_eq!(scope.allocate_static(&Type::Integer), MemoryLocation::Global(0));
    assert_eq!(scope.allocate(&Type::Integer), MemoryLocation::Global(5));
}

#[test]
fn test_parameters_last_at_frame_pointer() {
    let mut parameters = ParameterAllocator::new();
    parameters.push(&Type::Integer);
    parameters.push(&Type::Rational);
    parameters.push(&Type::Character);

    assert_eq!(
        parameters.locations(),
        vec![
            MemoryLocation::Parameter(9),
            MemoryLocation::Parameter(1),
            MemoryLocation::Parameter(0),
        ]
    );
    assert_eq!(parameters.allocated_size(), 13);
}

#[test]
fn test_no_parameters() {
    let parameters = ParameterAllocator::new();
    assert!(parameters.locations().is_empty());
    assert_eq!(parameters.allocated_size(), 0);
}

#[test]
#[should_panic(expected = "without matching enter")]
fn test_unbalanced_leave_panics() {
    let mut scope = ScopeAllocator::procedure();
    scope.leave();
}

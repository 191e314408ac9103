use pretty_assertions::assert_eq;

use super::*;
use crate::api::MachineOptions;
use crate::asm::Instruction;
use crate::codegen::runtime::STACK_POINTER;
use crate::test_utils::init_test_logging;
use crate::tree::build::*;
use crate::tree::{ComparisonOp, MemoryLocation, Program};
use crate::vm::{Image, Machine, Word};

struct Run {
    output: String,
    stack: Vec<Word>,
    stack_pointer: i32,
}

fn run(program: &Program) -> Run {
    init_test_logging();
    let code = generate(program, &CompileOptions::default());
    let image = Image::assemble(code.instructions()).unwrap();
    let options = MachineOptions {
        max_steps: Some(5_000_000),
        ..MachineOptions::default()
    };
    let mut output = Vec::new();
    let mut machine = Machine::new(&image, &options, &mut output).unwrap();
    machine.run().unwrap();

    let at = data_address(code.instructions(), STACK_POINTER);
    let stack_pointer = i32::from_le_bytes(machine.memory()[at..at + 4].try_into().unwrap());
    let stack = machine.stack().to_vec();
    drop(machine);
    Run {
        output: String::from_utf8(output).unwrap(),
        stack,
        stack_pointer,
    }
}

fn output(program: &Program) -> String {
    run(program).output
}

/// Where the assembler puts `label`: data directives are laid out in order
/// from address 0.
fn data_address(instructions: &[Instruction], label: &str) -> usize {
    let mut address = 0;
    for instruction in instructions {
        match instruction {
            Instruction::DLabel(name) if name == label => return address,
            Instruction::DataC(_) => address += 1,
            Instruction::DataI(_) | Instruction::DataD(_) => address += 4,
            Instruction::DataF(_) => address += 8,
            Instruction::DataS(text) => address += text.len() + 1,
            Instruction::DataZ(size) => address += *size as usize,
            _ => {}
        }
    }
    panic!("no data label {}", label)
}

fn global(name: &str, ty: Type, offset: i32) -> Binding {
    binding(name, ty, MemoryLocation::Global(offset))
}

fn int_array(values: &[i32]) -> Expr {
    array(Type::Integer, values.iter().map(|value| int(*value)).collect())
}

fn less(lhs: Expr, rhs: Expr) -> Expr {
    compare(ComparisonOp::Less, lhs, rhs)
}

fn equal(lhs: Expr, rhs: Expr) -> Expr {
    compare(ComparisonOp::Equal, lhs, rhs)
}

// === Layout ===

#[test]
fn test_program_layout() {
    let code = generate(&program(12, vec![]), &CompileOptions::default());
    let instructions = code.instructions();
    let position = |target: &Instruction| {
        instructions
            .iter()
            .position(|instruction| instruction == target)
            .unwrap()
    };
    let block = position(&DLabel(GLOBAL_MEMORY_BLOCK.into()));
    assert_eq!(instructions[block + 1], DataZ(12));
    assert_eq!(instructions[block + 2], Label(MAIN_PROGRAM.into()));
    assert_eq!(instructions[block + 3], Halt);
    assert!(position(&DLabel(memory_manager::HEAP_MEMORY.into())) > block);
}

#[test]
fn test_without_memory_manager() {
    let options = CompileOptions {
        memory_manager: false,
    };
    let code = generate(
        &program(0, vec![print(vec![item(int(7)), newline()])]),
        &options,
    );
    assert!(
        !code
            .instructions()
            .iter()
            .any(|instruction| instruction.label().map(|label| label.as_str())
                == Some(memory_manager::ALLOCATE))
    );

    let image = Image::assemble(code.instructions()).unwrap();
    let mut output = Vec::new();
    Machine::new(&image, &MachineOptions::default(), &mut output)
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(String::from_utf8(output).unwrap(), "7\n");
}

// === Printing ===

#[test]
fn test_print_scalars() {
    let program = program(
        0,
        vec![print(vec![
            item(int(-42)),
            space(),
            item(float(2.5)),
            space(),
            item(character('x')),
            space(),
            item(boolean(true)),
            space(),
            item(boolean(false)),
            space(),
            item(string("hello")),
            newline(),
        ])],
    );
    assert_eq!(output(&program), "-42 2.5 x true false hello\n");
}

#[test]
fn test_print_arrays() {
    let nested = array(
        Type::array(Type::Integer),
        vec![int_array(&[1, 2]), int_array(&[]), int_array(&[3])],
    );
    let program = program(
        0,
        vec![print(vec![
            item(int_array(&[1, 2, 3])),
            space(),
            item(nested),
            space(),
            item(array(Type::Boolean, vec![boolean(true), boolean(false)])),
            newline(),
        ])],
    );
    assert_eq!(output(&program), "[1, 2, 3] [[1, 2], [], [3]] [true, false]\n");
}

#[test]
fn test_print_lambda() {
    let noop = lambda(&[], Type::Void, 0, |_| vec![]);
    let program = program(0, vec![print(vec![item(noop)])]);
    assert_eq!(output(&program), "<lambda>");
}

#[test]
fn test_print_leaves_both_stacks_balanced() {
    let program = program(
        0,
        vec![print(vec![
            item(int_array(&[1, 2])),
            item(rational(1, 2)),
            item(string("x")),
        ])],
    );
    let run = run(&program);
    assert_eq!(run.output, "[1, 2]1/2x");
    assert_eq!(run.stack, Vec::<Word>::new());
    assert_eq!(run.stack_pointer, MachineOptions::DEFAULT_MEMORY_SIZE as i32);
}

// === Control flow ===

#[test]
fn test_if_else() {
    let x = global("x", Type::Integer, 0);
    let program = program(
        4,
        vec![
            declare(&x, int(5)),
            if_else(
                less(ident(&x), int(3)),
                vec![print(vec![item(string("small"))])],
                Some(vec![print(vec![item(string("large"))])]),
            ),
            if_else(
                equal(ident(&x), int(5)),
                vec![print(vec![item(string(" five"))])],
                None,
            ),
        ],
    );
    assert_eq!(output(&program), "large five");
}

#[test]
fn test_while_loop() {
    let i = global("i", Type::Integer, 0);
    let program = program(
        4,
        vec![
            declare(&i, int(0)),
            while_loop(
                less(ident(&i), int(5)),
                vec![
                    assign(ident(&i), add(ident(&i), int(1))),
                    if_else(equal(ident(&i), int(2)), vec![Statement::Continue], None),
                    if_else(equal(ident(&i), int(4)), vec![Statement::Break], None),
                    print(vec![item(ident(&i))]),
                ],
            ),
        ],
    );
    assert_eq!(output(&program), "13");
}

#[test]
fn test_for_element_with_break_and_continue() {
    let e = global("e", Type::Integer, 0);
    let program = program(
        4,
        vec![
            for_loop(
                ForKind::Element,
                &e,
                int_array(&[1, 2, 3, 4, 5]),
                vec![
                    if_else(equal(ident(&e), int(2)), vec![Statement::Continue], None),
                    if_else(equal(ident(&e), int(4)), vec![Statement::Break], None),
                    print(vec![item(ident(&e)), space()]),
                ],
            ),
            print(vec![item(string("done"))]),
        ],
    );
    let run = run(&program);
    assert_eq!(run.output, "1 3 done");
    assert_eq!(run.stack, Vec::<Word>::new());
}

#[test]
fn test_for_index_over_string() {
    let i = global("i", Type::Integer, 0);
    let program = program(
        4,
        vec![for_loop(
            ForKind::Index,
            &i,
            string("abc"),
            vec![print(vec![item(ident(&i))])],
        )],
    );
    assert_eq!(output(&program), "012");
}

#[test]
fn test_for_element_over_string() {
    let c = global("c", Type::Character, 0);
    let program = program(
        1,
        vec![for_loop(
            ForKind::Element,
            &c,
            string("abc"),
            vec![print(vec![item(ident(&c)), item(character('.'))])],
        )],
    );
    assert_eq!(output(&program), "a.b.c.");
}

#[test]
fn test_nested_for_loops() {
    let a = global("a", Type::Integer, 0);
    let b = global("b", Type::Integer, 4);
    let program = program(
        8,
        vec![for_loop(
            ForKind::Element,
            &a,
            int_array(&[1, 2]),
            vec![
                for_loop(
                    ForKind::Element,
                    &b,
                    int_array(&[10, 20]),
                    vec![print(vec![item(add(ident(&a), ident(&b))), space()])],
                ),
                print(vec![item(string("| "))]),
            ],
        )],
    );
    assert_eq!(output(&program), "11 21 | 12 22 | ");
}

#[test]
fn test_empty_for_loop_body_never_runs() {
    let e = global("e", Type::Integer, 0);
    let program = program(
        4,
        vec![
            for_loop(
                ForKind::Element,
                &e,
                int_array(&[]),
                vec![print(vec![item(string("never"))])],
            ),
            print(vec![item(string("after"))]),
        ],
    );
    assert_eq!(output(&program), "after");
}

#[test]
fn test_for_over_null_array_faults() {
    let e = global("e", Type::Integer, 0);
    let a = global("a", Type::array(Type::Integer), 4);
    let program = program(
        8,
        vec![for_loop(ForKind::Element, &e, ident(&a), vec![])],
    );
    assert_eq!(output(&program), "Runtime error: Null array indexed\n");
}

// === Declarations ===

#[test]
fn test_static_declaration_runs_once() {
    // counter at 0, its companion flag at 4, the function at 8.
    let counter = global("counter", Type::Integer, 0);
    let tick = global("tick", Type::lambda(vec![], Type::Void), 8);
    let body = {
        let counter = counter.clone();
        move |_: &[Binding]| {
            vec![
                declare_static(&counter, int(100)),
                assign(ident(&counter), add(ident(&counter), int(1))),
                print(vec![item(ident(&counter)), space()]),
            ]
        }
    };
    let program = program(
        12,
        vec![
            declare(&tick, lambda(&[], Type::Void, 0, body)),
            call(invoke(ident(&tick), vec![])),
            call(invoke(ident(&tick), vec![])),
            call(invoke(ident(&tick), vec![])),
        ],
    );
    assert_eq!(output(&program), "101 102 103 ");
}

#[test]
fn test_rational_and_float_variables() {
    let r = global("r", Type::Rational, 0);
    let f = global("f", Type::Floating, 8);
    let program = program(
        16,
        vec![
            declare(&r, rational(6, 8)),
            declare(&f, float(0.125)),
            assign(ident(&r), add(ident(&r), rational(1, 4))),
            print(vec![item(ident(&r)), space(), item(ident(&f))]),
        ],
    );
    assert_eq!(output(&program), "1 0.125");
}

// === Functions ===

#[test]
fn test_parameters_bind_in_order() {
    let subtract_fn = lambda(
        &[("a", Type::Integer), ("b", Type::Integer)],
        Type::Integer,
        0,
        |params| vec![return_value(subtract(ident(&params[0]), ident(&params[1])))],
    );
    let program = program(
        0,
        vec![print(vec![item(invoke(subtract_fn, vec![int(10), int(3)]))])],
    );
    assert_eq!(output(&program), "7");
}

#[test]
fn test_mixed_width_parameters_and_result() {
    // (c: char, x: float, r: rat) -> rat, returning r + 1 after printing c and x.
    let function = lambda(
        &[
            ("c", Type::Character),
            ("x", Type::Floating),
            ("r", Type::Rational),
        ],
        Type::Rational,
        0,
        |params| {
            vec![
                print(vec![item(ident(&params[0])), item(ident(&params[1])), space()]),
                return_value(add(ident(&params[2]), rational(1, 1))),
            ]
        },
    );
    let program = program(
        0,
        vec![print(vec![item(invoke(
            function,
            vec![character('q'), float(1.5), rational(1, 3)],
        ))])],
    );
    let run = run(&program);
    assert_eq!(run.output, "q1.5 1_1/3");
    assert_eq!(run.stack_pointer, MachineOptions::DEFAULT_MEMORY_SIZE as i32);
}

#[test]
fn test_recursion() {
    let fact_type = Type::lambda(vec![Type::Integer], Type::Integer);
    let fact = global("fact", fact_type, 0);
    let body = {
        let fact = fact.clone();
        move |params: &[Binding]| {
            let n = &params[0];
            vec![
                if_else(
                    less(ident(n), int(2)),
                    vec![return_value(int(1))],
                    None,
                ),
                return_value(multiply(
                    ident(n),
                    invoke(ident(&fact), vec![subtract(ident(n), int(1))]),
                )),
            ]
        }
    };
    let program = program(
        4,
        vec![
            declare(&fact, lambda(&[("n", Type::Integer)], Type::Integer, 0, body)),
            print(vec![item(invoke(ident(&fact), vec![int(10)]))]),
        ],
    );
    let run = run(&program);
    assert_eq!(run.output, "3628800");
    assert_eq!(run.stack, Vec::<Word>::new());
    assert_eq!(run.stack_pointer, MachineOptions::DEFAULT_MEMORY_SIZE as i32);
}

#[test]
fn test_locals() {
    // Two locals: the first at -12, the second at -16.
    let function = lambda(&[("n", Type::Integer)], Type::Integer, 8, |params| {
        let a = binding("a", Type::Integer, MemoryLocation::Local(-12));
        let b = binding("b", Type::Integer, MemoryLocation::Local(-16));
        vec![
            declare(&a, multiply(ident(&params[0]), int(2))),
            declare(&b, add(ident(&a), int(1))),
            return_value(add(ident(&a), ident(&b))),
        ]
    });
    let program = program(0, vec![print(vec![item(invoke(function, vec![int(5)]))])]);
    assert_eq!(output(&program), "21");
}

#[test]
fn test_nested_calls_in_arguments() {
    let add_type = Type::lambda(vec![Type::Integer, Type::Integer], Type::Integer);
    let plus = global("plus", add_type, 0);
    let program = program(
        4,
        vec![
            declare(
                &plus,
                lambda(
                    &[("a", Type::Integer), ("b", Type::Integer)],
                    Type::Integer,
                    0,
                    |params| vec![return_value(add(ident(&params[0]), ident(&params[1])))],
                ),
            ),
            print(vec![item(invoke(
                ident(&plus),
                vec![
                    invoke(ident(&plus), vec![int(1), int(2)]),
                    invoke(ident(&plus), vec![int(30), int(40)]),
                ],
            ))]),
        ],
    );
    assert_eq!(output(&program), "73");
}

#[test]
fn test_return_from_inside_for_loops() {
    // Finds the first element above 2, returning from two loops deep, while
    // the caller is itself inside a for loop.
    let find = global("find", Type::lambda(vec![Type::array(Type::Integer)], Type::Integer), 0);
    let x = global("x", Type::Integer, 4);
    let function = lambda(
        &[("values", Type::array(Type::Integer))],
        Type::Integer,
        8,
        |params| {
            let outer = binding("outer", Type::Integer, MemoryLocation::Local(-12));
            let inner = binding("inner", Type::Integer, MemoryLocation::Local(-16));
            vec![
                for_loop(
                    ForKind::Element,
                    &outer,
                    int_array(&[0]),
                    vec![for_loop(
                        ForKind::Element,
                        &inner,
                        ident(&params[0]),
                        vec![if_else(
                            less(int(2), ident(&inner)),
                            vec![return_value(ident(&inner))],
                            None,
                        )],
                    )],
                ),
                return_value(int(-1)),
            ]
        },
    );
    let program = program(
        8,
        vec![
            declare(&find, function),
            for_loop(
                ForKind::Element,
                &x,
                int_array(&[100, 200]),
                vec![print(vec![
                    item(add(
                        ident(&x),
                        invoke(ident(&find), vec![int_array(&[1, 5, 7])]),
                    )),
                    space(),
                    item(invoke(ident(&find), vec![int_array(&[1, 2])])),
                    space(),
                ])],
            ),
        ],
    );
    let run = run(&program);
    assert_eq!(run.output, "105 -1 205 -1 ");
    assert_eq!(run.stack, Vec::<Word>::new());
    assert_eq!(run.stack_pointer, MachineOptions::DEFAULT_MEMORY_SIZE as i32);
}

#[test]
fn test_void_function_falls_off_the_end() {
    let greet = lambda(&[], Type::Void, 0, |_| {
        vec![print(vec![item(string("hi"))])]
    });
    let program = program(0, vec![call(invoke(greet, vec![])), print(vec![item(int(1))])]);
    assert_eq!(output(&program), "hi1");
}

#[test]
fn test_void_return_statement() {
    let early = lambda(&[("n", Type::Integer)], Type::Void, 0, |params| {
        vec![
            if_else(
                less(ident(&params[0]), int(0)),
                vec![Statement::Return(None)],
                None,
            ),
            print(vec![item(ident(&params[0]))]),
        ]
    });
    let f = global("f", Type::lambda(vec![Type::Integer], Type::Void), 0);
    let program = program(
        4,
        vec![
            declare(&f, early),
            call(invoke(ident(&f), vec![int(-1)])),
            call(invoke(ident(&f), vec![int(9)])),
        ],
    );
    assert_eq!(output(&program), "9");
}

#[test]
fn test_call_statement_discards_result() {
    let half = lambda(&[], Type::Rational, 0, |_| vec![return_value(rational(1, 2))]);
    let program = program(0, vec![call(invoke(half, vec![]))]);
    let run = run(&program);
    assert_eq!(run.stack, Vec::<Word>::new());
    assert_eq!(run.stack_pointer, MachineOptions::DEFAULT_MEMORY_SIZE as i32);
}

#[test]
fn test_missing_return_faults() {
    let broken = lambda(&[], Type::Integer, 0, |_| vec![]);
    let program = program(0, vec![print(vec![item(invoke(broken, vec![]))])]);
    assert_eq!(
        output(&program),
        "Runtime error: Reached end of function without return statement\n"
    );
}

// === Expressions ===

#[test]
fn test_short_circuit_skips_right_operand() {
    let faulting = equal(divide(int(1), int(0)), int(0));
    let program = program(
        0,
        vec![print(vec![
            item(and(boolean(false), faulting.clone())),
            space(),
            item(or(boolean(true), faulting)),
            space(),
            item(and(boolean(true), boolean(false))),
            space(),
            item(or(boolean(false), boolean(true))),
        ])],
    );
    assert_eq!(output(&program), "false true false true");
}

#[test]
fn test_array_element_assignment() {
    let a = global("a", Type::array(Type::Integer), 0);
    let program = program(
        4,
        vec![
            declare(&a, int_array(&[1, 2, 3])),
            assign(index(ident(&a), int(1)), int(20)),
            print(vec![item(ident(&a))]),
        ],
    );
    assert_eq!(output(&program), "[1, 20, 3]");
}

// === Release ===

#[test]
fn test_release_twice_is_harmless() {
    let a = global("a", Type::array(Type::array(Type::Integer)), 0);
    let program = program(
        4,
        vec![
            declare(
                &a,
                array(
                    Type::array(Type::Integer),
                    vec![int_array(&[1]), int_array(&[2, 3])],
                ),
            ),
            release(ident(&a)),
            release(ident(&a)),
            print(vec![item(string("ok"))]),
        ],
    );
    let run = run(&program);
    assert_eq!(run.output, "ok");
    assert_eq!(run.stack, Vec::<Word>::new());
}

#[test]
fn test_release_skips_string_literals() {
    let s = global("s", Type::String, 0);
    let program = program(
        4,
        vec![
            declare(&s, string("kept")),
            release(ident(&s)),
            print(vec![item(ident(&s))]),
        ],
    );
    assert_eq!(output(&program), "kept");
}

#[test]
fn test_release_null_is_a_no_op() {
    let a = global("a", Type::array(Type::Integer), 0);
    let program = program(
        4,
        vec![release(ident(&a)), print(vec![item(string("fine"))])],
    );
    assert_eq!(output(&program), "fine");
}

//! Programs driven through the public facade: tree in, text or output out.

use pika::api::{self, CompileOptions, MachineOptions};
use pika::tree::build::*;
use pika::tree::{MemoryLocation, Program, Type};
use pika::{CharSet, RenderConfig, render_error_to};
use pretty_assertions::assert_eq;

fn doubled_and_averaged() -> Program {
    let numbers = binding("numbers", Type::array(Type::Integer), MemoryLocation::Global(0));
    let double = lambda(&[("x", Type::Integer)], Type::Integer, 0, |params| {
        vec![return_value(multiply(ident(&params[0]), int(2)))]
    });
    program(
        4,
        vec![
            declare(&numbers, array(Type::Integer, vec![int(1), int(2), int(3)])),
            print(vec![item(map(ident(&numbers), double)), newline()]),
            print(vec![
                item(add(rational(1, 2), rational(1, 3))),
                space(),
                item(divide(rational(3, 4), rational(3, 4))),
                newline(),
            ]),
        ],
    )
}

#[test]
fn test_run_program() {
    let execution = api::run_program(
        &doubled_and_averaged(),
        &CompileOptions::default(),
        &MachineOptions::default(),
    )
    .unwrap();
    assert_eq!(execution.output, "[2, 4, 6]\n5/6 1\n");
    assert!(execution.steps > 0);
}

#[test]
fn test_tree_survives_json() {
    let program = doubled_and_averaged();
    let json = serde_json::to_string(&program).unwrap();
    let decoded: Program = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, program);
}

#[test]
fn test_assembly_text_runs_like_the_tree() {
    let code = api::compile(&doubled_and_averaged(), &CompileOptions::default());
    let mut out = Vec::new();
    api::run_text(&code.to_string(), &MachineOptions::default(), &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "[2, 4, 6]\n5/6 1\n");
}

#[test]
fn test_runtime_fault_halts_cleanly() {
    let program = program(
        0,
        vec![
            print(vec![item(string("before")), newline()]),
            print(vec![item(divide(int(1), int(0))), newline()]),
            print(vec![item(string("after")), newline()]),
        ],
    );
    let execution =
        api::run_program(&program, &CompileOptions::default(), &MachineOptions::default())
            .unwrap();
    assert_eq!(
        execution.output,
        "before\nRuntime error: integer divide by zero\n"
    );
}

#[test]
fn test_machine_limits_are_errors() {
    let options = MachineOptions {
        memory_size: 64,
        max_steps: None,
    };
    let error =
        api::run_program(&doubled_and_averaged(), &CompileOptions::default(), &options)
            .unwrap_err();
    let mut buf = Vec::new();
    let config = RenderConfig {
        color: false,
        filename: None,
        charset: CharSet::Ascii,
    };
    render_error_to(&error, &mut buf, &config).unwrap();
    let rendered = String::from_utf8(buf).unwrap();
    assert!(
        rendered.starts_with("Error: machine error: program data"),
        "{rendered}"
    );
}

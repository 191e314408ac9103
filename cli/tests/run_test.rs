//! Integration tests for the `run` command.

mod common;

use common::{asm_file, check_stderr, check_stdout, pika_command, tree_file};
use expect_test::expect;
use pika::tree::build::*;
use pika::tree::{ComparisonOp, MemoryLocation, Program, Type};
use predicates::prelude::*;

fn hello() -> Program {
    program(
        0,
        vec![print(vec![
            item(string("hello")),
            space(),
            item(array(Type::Integer, vec![int(1), int(2)])),
            newline(),
        ])],
    )
}

fn countdown() -> Program {
    let n = binding("n", Type::Integer, MemoryLocation::Global(0));
    program(
        4,
        vec![
            declare(&n, int(3)),
            while_loop(
                compare(ComparisonOp::Greater, ident(&n), int(0)),
                vec![
                    print(vec![item(ident(&n)), space()]),
                    assign(ident(&n), subtract(ident(&n), int(1))),
                ],
            ),
            print(vec![item(string("liftoff")), newline()]),
        ],
    )
}

// ============================================================================
// Typed program trees
// ============================================================================

#[test]
fn run_tree() {
    let file = tree_file(&hello());
    check_stdout(
        &["run", file.path().to_str().unwrap()],
        None,
        expect!["hello [1, 2]\n"],
    );
}

#[test]
fn run_tree_with_loop() {
    let file = tree_file(&countdown());
    check_stdout(
        &["run", file.path().to_str().unwrap()],
        None,
        expect!["3 2 1 liftoff\n"],
    );
}

#[test]
fn run_tree_without_memory_manager() {
    let file = tree_file(&countdown());
    check_stdout(
        &["run", "--no-memory-manager", file.path().to_str().unwrap()],
        None,
        expect!["3 2 1 liftoff\n"],
    );
}

#[test]
fn run_tree_runtime_fault() {
    let program = program(
        0,
        vec![print(vec![item(divide(int(1), int(0))), newline()])],
    );
    let file = tree_file(&program);
    pika_command()
        .args(["run", file.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout("Runtime error: integer divide by zero\n");
}

#[test]
fn run_tree_from_stdin() {
    let json = serde_json::to_string(&hello()).unwrap();
    check_stdout(&["run", "--tree", "-"], Some(json.as_str()), expect!["hello [1, 2]\n"]);
}

#[test]
fn run_stdin_defaults_to_assembly() {
    let json = serde_json::to_string(&hello()).unwrap();
    pika_command()
        .args(["run", "-"])
        .write_stdin(json)
        .assert()
        .failure()
        .stderr(predicate::str::contains("<stdin>"));
}

#[test]
fn run_invalid_tree() {
    let file = common::temp_file("{\"body\": []}", ".json");
    pika_command()
        .args(["run", file.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("global_scope_size"));
}

// ============================================================================
// Assembly text
// ============================================================================

#[test]
fn run_assembly() {
    let file = asm_file(
        "        DLabel       $fmt
        DataS        \"%d\\n\"
        PushI        40
        PushI        2
        Add
        PushD        $fmt
        Printf
        Halt
",
    );
    check_stdout(
        &["run", file.path().to_str().unwrap()],
        None,
        expect!["42\n"],
    );
}

#[test]
fn run_assembly_from_stdin() {
    check_stdout(
        &["run", "-"],
        Some("PushI 1\nPushF 2.5\nPStack\nHalt\n"),
        expect!["Stack: [1, 2.5]\n"],
    );
}

#[test]
fn run_step_limit() {
    let file = asm_file("Label $spin\nJump $spin\n");
    check_stderr(
        &["run", "--max-steps", "100", file.path().to_str().unwrap()],
        None,
        expect!["Error: machine error: step limit of 100 exceeded\n"],
    );
}

#[test]
fn run_memory_size_too_small() {
    let file = tree_file(&hello());
    pika_command()
        .args(["run", "--memory-size", "16", file.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not fit in 16 bytes of memory"));
}

// ============================================================================
// Error reporting
// ============================================================================

#[test]
fn run_parse_error_shows_filename() {
    let file = asm_file("PushI\n");
    let path = file.path().to_str().unwrap();
    pika_command()
        .args(["--no-color", "run", path])
        .assert()
        .failure()
        .stderr(predicate::str::contains("`PushI` expects an integer operand"))
        .stderr(predicate::str::contains(path))
        .stderr(predicate::str::contains("\x1b[").not());
}

#[test]
fn run_parse_error_shows_stdin_label() {
    pika_command()
        .args(["run", "-"])
        .write_stdin("Frobnicate\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("<stdin>"));
}

#[test]
fn run_undefined_label() {
    let file = asm_file("Jump $nowhere\n");
    check_stderr(
        &["run", file.path().to_str().unwrap()],
        None,
        expect!["Error: assembly failed: label `$nowhere` is never defined\n"],
    );
}

#[test]
fn run_nonexistent_file() {
    pika_command()
        .args(["run", "/nonexistent/program.asm"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No such file"));
}

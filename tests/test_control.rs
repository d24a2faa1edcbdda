//! Integration tests for `if`/`while`/`repeat` control forms.

mod common;

use common::stdout;

#[test]
fn if_without_else_runs_body_only_on_success() {
    assert_eq!(stdout("if (true) echo yes\n"), "yes\n");
    assert_eq!(stdout("if (false) echo yes\n"), "");
}

#[test]
fn if_negation_flips_the_branch() {
    assert_eq!(stdout("if (- false) echo yes\n"), "yes\n");
    assert_eq!(stdout("if (-- false) echo yes\n"), "");
}

#[test]
fn nested_if_binds_greedy_else_to_the_innermost_gap() {
    let out = stdout("if (true) if (false) echo a else echo b\n");
    assert_eq!(out, "b\n");
}

#[test]
fn while_loop_counts_up_with_mutable_state() {
    let script = "let N=(0)\nwhile (chk $N lt 4) let N=($N+1)\necho $N\n";
    assert_eq!(stdout(script), "4\n");
}

#[test]
fn while_loop_body_runs_once_per_condition_pass() {
    let script = "let N=(0)\nwhile (chk $N lt 3) echo x ; let N=($N+1)\n";
    assert_eq!(stdout(script), "x\nx\nx\n");
}

#[test]
fn repeat_with_literal_count() {
    assert_eq!(stdout("repeat (4) echo hi\n"), "hi\nhi\nhi\nhi\n");
}

#[test]
fn repeat_with_variable_count() {
    let script = "let N=(2)\nrepeat (N) echo tock\n";
    assert_eq!(stdout(script), "tock\ntock\n");
}

#[test]
fn repeat_body_changes_do_not_affect_iteration_count() {
    // The repeat count is read once, before the loop starts, not on
    // every pass.
    let script = "let N=(2)\nrepeat (N) let N=(0)\necho $N\n";
    assert_eq!(stdout(script), "0\n");
}

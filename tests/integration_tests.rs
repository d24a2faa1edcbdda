//! End-to-end tests for the `alsh` binary, exercised as a subprocess
//! reading a script from stdin (§8 testable scenarios).

mod common;

use common::stdout;

#[test]
fn sequence_runs_both_regardless_of_status() {
    let out = stdout("false ; echo after\n");
    assert_eq!(out, "after\n");
}

#[test]
fn and_short_circuits_on_failure() {
    let out = stdout("false && echo nope\n");
    assert_eq!(out, "");
}

#[test]
fn or_short_circuits_on_success() {
    let out = stdout("true || echo nope\n");
    assert_eq!(out, "");
}

#[test]
fn pipeline_connects_stdout_to_stdin() {
    let out = stdout("echo hello | tr a-z A-Z\n");
    assert_eq!(out, "HELLO\n");
}

#[test]
fn redirection_round_trips_through_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roundtrip.txt");
    let script = format!(
        "echo hello > {0}\ncat {0}\n",
        path.to_str().unwrap()
    );
    let out = stdout(&script);
    assert_eq!(out, "hello\n");
}

#[test]
fn repeat_runs_body_n_times() {
    let out = stdout("repeat (3) echo tick\n");
    assert_eq!(out, "tick\ntick\ntick\n");
}

#[test]
fn if_else_picks_the_right_branch() {
    let out = stdout("if (true) echo yes else echo no\n");
    assert_eq!(out, "yes\n");

    let out = stdout("if (false) echo yes else echo no\n");
    assert_eq!(out, "no\n");
}

#[test]
fn while_loop_runs_until_condition_fails() {
    let script = "let N=(0)\nwhile (chk $N lt 3) echo tick ; let N=($N+1)\n";
    let out = stdout(script);
    assert_eq!(out, "tick\ntick\ntick\n");
}

#[test]
fn alias_replacement_matches_direct_invocation() {
    let out = stdout("alias ll=\"ls -a\"\nll /\n");
    let direct = stdout("ls -a /\n");
    assert_eq!(out, direct);
}

#[test]
fn export_and_let_are_disjoint() {
    // A name lives in at most one namespace: `let`-ing a previously
    // exported name moves it out of the environment entirely.
    let script = "export GREETING=hi\nlet GREETING=(1)\nexport\nlet\n";
    let out = stdout(script);
    assert!(!out.contains("GREETING='hi'"));
    assert!(out.contains("let GREETING=\"1\""));
}

#[test]
fn chk_reports_equality_within_epsilon() {
    let out = stdout("chk 1.000001 eq 1 && echo matched\n");
    assert_eq!(out, "matched\n");
}

#[test]
fn background_command_reports_a_job_number() {
    let out = common::run("true &\n");
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains("[1]"), "stderr was: {stderr}");
}

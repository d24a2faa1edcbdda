//! Builtin command dispatch (§4.6).
//!
//! Builtins run in the shell's own process rather than being forked, so
//! they can mutate `ShellContext` directly — `cd`, `export`, and `let`
//! would be no-ops if they ran in a child.

use crate::arith;
use crate::context::ShellContext;
use crate::error;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuiltinError {
    #[error("{0}: missing argument")]
    MissingArgument(String),
    #[error("{0}: {1}")]
    InvalidArgument(String, String),
    #[error("cd: {0}")]
    ChangeDir(std::io::Error),
    #[error("unknown flag {0}")]
    UnknownFlag(String),
    #[error("unknown comparator '{0}'")]
    UnknownComparator(String),
}

/// The fixed table of names the interpreter handles itself instead of
/// forking an external process for.
pub const NAMES: &[&str] =
    &["true", "false", "cd", "export", "let", "alias", "exec", "history", "chk", "exit"];

pub fn is_builtin(name: &str) -> bool {
    NAMES.contains(&name)
}

/// Runs a builtin, returning the exit status it should leave behind.
/// `words[0]` is the builtin's own name.
pub fn run(ctx: &mut ShellContext, words: &[String]) -> i32 {
    match words[0].as_str() {
        "true" => 0,
        "false" => 1,
        "cd" => run_cd(words),
        "export" => run_export(ctx, words),
        "let" => run_let(ctx, words),
        "alias" => run_alias(ctx, words),
        "exec" => run_exec(words),
        "history" => run_history(ctx, words),
        "chk" => run_chk(words),
        "exit" => run_exit(ctx, words),
        other => {
            error::report("builtin", format!("{other}: not a builtin"));
            1
        }
    }
}

fn run_cd(words: &[String]) -> i32 {
    let target = match words.get(1).map(String::as_str) {
        None => match std::env::var("HOME") {
            Ok(home) => home,
            Err(_) => {
                error::report("cd", "HOME not set");
                return 1;
            }
        },
        Some("..") => match std::env::current_dir() {
            Ok(cwd) => match cwd.parent() {
                Some(parent) => parent.to_string_lossy().into_owned(),
                None => return 0,
            },
            Err(e) => {
                error::report("cd", BuiltinError::ChangeDir(e));
                return 1;
            }
        },
        Some(dir) => dir.to_string(),
    };

    match std::env::set_current_dir(&target) {
        Ok(()) => 0,
        Err(e) => {
            error::report("cd", BuiltinError::ChangeDir(e));
            1
        }
    }
}

/// No args → print environment as `export NAME='VALUE'`; `NAME=VALUE`
/// → set env and remove from locals; bare `NAME` → promote local to env.
fn run_export(ctx: &mut ShellContext, words: &[String]) -> i32 {
    let Some(arg) = words.get(1) else {
        for (name, value) in ctx.vars.exported() {
            println!("export {name}='{value}'");
        }
        return 0;
    };

    match arg.split_once('=') {
        Some((name, value)) => {
            ctx.vars.set_exported(name, value);
            0
        }
        None => {
            ctx.vars.promote_to_exported(arg);
            0
        }
    }
}

/// No args → print locals as `let NAME="VALUE"`; `NAME=VALUE` evaluates
/// `VALUE` arithmetically and stores it locally, removing it from env.
fn run_let(ctx: &mut ShellContext, words: &[String]) -> i32 {
    let Some(arg) = words.get(1) else {
        for (name, value) in ctx.vars.locals() {
            println!("let {name}=\"{value}\"");
        }
        return 0;
    };

    let Some((name, expr)) = arg.split_once('=') else {
        error::report("let", BuiltinError::InvalidArgument(arg.clone(), "missing '='".to_string()));
        return 1;
    };

    let expr = expr.trim().trim_start_matches('(').trim_end_matches(')');
    match arith::eval(expr) {
        Ok(value) => {
            ctx.vars.set_local(name, &arith::format_number(value));
            0
        }
        Err(e) => {
            error::report("let", e);
            1
        }
    }
}

/// No args → list aliases; `NAME=VALUE` → define; bare `NAME` → print
/// that one alias, or error if unknown.
fn run_alias(ctx: &mut ShellContext, words: &[String]) -> i32 {
    let Some(arg) = words.get(1) else {
        for (name, value) in ctx.aliases.iter() {
            println!("alias {name}={value}");
        }
        return 0;
    };

    match arg.split_once('=') {
        Some((name, value)) => {
            ctx.aliases.define(name, value);
            0
        }
        None => match ctx.aliases.get(arg) {
            Some(value) => {
                println!("alias {arg}={value}");
                0
            }
            None => {
                error::report("alias", format!("{arg}: unknown alias"));
                1
            }
        },
    }
}

/// `exec CMD ARGS...` replaces the shell process image entirely; with
/// no argument, re-execs this shell's own executable.
fn run_exec(words: &[String]) -> i32 {
    use nix::unistd::execvp;
    use std::ffi::CString;

    let fallback;
    let (program, args): (&str, &[String]) = match words.get(1) {
        Some(_) => (&words[1], &words[1..]),
        None => {
            fallback = std::env::current_exe()
                .ok()
                .and_then(|p| p.to_str().map(str::to_string))
                .unwrap_or_else(|| "alsh".to_string());
            (&fallback, std::slice::from_ref(&fallback))
        }
    };

    let Ok(cprogram) = CString::new(program) else {
        error::report("exec", format!("{program}: invalid program name"));
        return 1;
    };
    let cargs: Vec<CString> = args.iter().filter_map(|w| CString::new(w.as_str()).ok()).collect();

    match execvp(&cprogram, &cargs) {
        Ok(_) => unreachable!("execvp only returns on error"),
        Err(e) => {
            error::report("exec", format!("{program}: {e}"));
            127
        }
    }
}

/// No flag → numbered listing; `-c` clears history; `-w` writes it to
/// the history file immediately.
fn run_history(ctx: &mut ShellContext, words: &[String]) -> i32 {
    match words.get(1).map(String::as_str) {
        None => {
            if !ctx.history.is_empty() {
                println!("{}", ctx.history.render());
            }
            0
        }
        Some("-c") => {
            ctx.history.clear();
            0
        }
        Some("-w") => match ctx.history.write_to_disk() {
            Ok(()) => 0,
            Err(e) => {
                error::report("history", e);
                1
            }
        },
        Some(other) => {
            error::report("history", BuiltinError::UnknownFlag(other.to_string()));
            1
        }
    }
}

const CHK_EPSILON: f64 = 1e-5;

/// `chk A op B`, op ∈ {eq,ne,lt,le,gt,ge}, optionally `-`-prefixed.
fn run_chk(words: &[String]) -> i32 {
    if words.len() != 4 {
        error::report("chk", BuiltinError::MissingArgument("chk A op B".to_string()));
        return 1;
    }

    let a: f64 = match words[1].parse() {
        Ok(v) => v,
        Err(_) => {
            error::report("chk", BuiltinError::InvalidArgument(words[1].clone(), "not a number".to_string()));
            return 1;
        }
    };
    let b: f64 = match words[3].parse() {
        Ok(v) => v,
        Err(_) => {
            error::report("chk", BuiltinError::InvalidArgument(words[3].clone(), "not a number".to_string()));
            return 1;
        }
    };

    let op = words[2].trim_start_matches('-');
    let truth = match op {
        "eq" => (a - b).abs() < CHK_EPSILON,
        "ne" => (a - b).abs() >= CHK_EPSILON,
        "lt" => a < b,
        "le" => a <= b,
        "gt" => a > b,
        "ge" => a >= b,
        other => {
            error::report("chk", BuiltinError::UnknownComparator(other.to_string()));
            return 1;
        }
    };

    if truth {
        0
    } else {
        1
    }
}

fn run_exit(ctx: &mut ShellContext, words: &[String]) -> i32 {
    let code = match words.get(1) {
        Some(arg) => match arg.parse::<i32>() {
            Ok(n) => n,
            Err(_) => {
                error::report("exit", BuiltinError::InvalidArgument(arg.clone(), "not a number".to_string()));
                2
            }
        },
        None => ctx.last_status,
    };
    ctx.request_exit(code);
    code
}

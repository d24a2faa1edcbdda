//! Tree interpreter (§4.7, §4.8, §4.9).
//!
//! Executes a parsed `Cmd` against a `ShellContext`. `run_line` parses
//! once; variable substitution happens later, per word, each time a
//! `Simple` command actually runs, so a loop body that mutates a
//! variable is read fresh on every pass rather than once up front.
//! Diagnostics for any stage that fails are reported the same way
//! (`alsh: CONTEXT: MESSAGE`).

use crate::alias::AliasOutcome;
use crate::ast::{Cmd, Simple};
use crate::builtins;
use crate::context::ShellContext;
use crate::error;
use crate::exec;
use crate::parser::{self, ParseError};
use crate::redirect::RedirectGuard;
use crate::signals;
use crate::vars;
use nix::unistd::{close, dup, dup2, fork, pipe, ForkResult, Pid};
use std::os::unix::io::RawFd;

/// A parse or substitution failure aborts only the current line; the
/// caller is expected to keep the read loop going.
pub const NEGATIVE_STATUS: i32 = -1;

/// Runs one full input line: parse, execute. Variable substitution is
/// deliberately NOT done here over the whole line — it happens per word,
/// inside `exec_simple`, at the moment a command actually runs. That
/// way a `while`/`repeat` body that mutates a variable is read fresh on
/// every pass instead of having its variables baked in once up front.
pub fn run_line(ctx: &mut ShellContext, line: &str) -> i32 {
    let stripped = parser::strip_comment(line).trim();
    if stripped.is_empty() {
        return ctx.last_status;
    }

    let cmd = match parser::parse(stripped) {
        Ok(cmd) => cmd,
        Err(ParseError::EmptyCommand) => return ctx.last_status,
        Err(e) => {
            error::report("parse", e);
            return NEGATIVE_STATUS;
        }
    };

    let status = exec_cmd(ctx, &cmd);
    ctx.last_status = status;
    status
}

/// Substitutes `$NAME` references in a single word against current
/// variable state. Called at the point of use, not at parse time.
fn substitute_word(ctx: &ShellContext, word: &str) -> Result<String, vars::SubstError> {
    match vars::substitute(word, &ctx.vars)? {
        Some(owned) => Ok(owned),
        None => Ok(word.to_string()),
    }
}

fn exec_cmd(ctx: &mut ShellContext, cmd: &Cmd) -> i32 {
    match cmd {
        Cmd::Seq(a, b) => {
            exec_cmd(ctx, a);
            exec_cmd(ctx, b)
        }
        Cmd::And(a, b) => {
            let sa = exec_cmd(ctx, a);
            if sa != 0 {
                sa
            } else {
                exec_cmd(ctx, b)
            }
        }
        Cmd::Or(a, b) => {
            let sa = exec_cmd(ctx, a);
            if sa == 0 || signals::is_interrupted() {
                sa
            } else {
                exec_cmd(ctx, b)
            }
        }
        Cmd::Pipe(_, _) => {
            let mut stages = Vec::new();
            collect_pipeline(cmd, &mut stages);
            exec_pipeline(ctx, &stages)
        }
        Cmd::Simple(simple) => exec_simple(ctx, simple),
        Cmd::If { negate, cond, body, else_branch } => {
            let cond_status = exec_cmd(ctx, cond);
            let truthy = (cond_status == 0) != *negate;
            if truthy {
                exec_cmd(ctx, body);
            } else if let Some(eb) = else_branch {
                exec_cmd(ctx, eb);
            }
            0
        }
        Cmd::While { negate, cond, body } => {
            loop {
                let cond_status = exec_cmd(ctx, cond);
                if cond_status < 0 {
                    break;
                }
                let truthy = (cond_status == 0) != *negate;
                if !truthy || signals::is_interrupted() {
                    break;
                }
                exec_cmd(ctx, body);
                if signals::is_interrupted() {
                    break;
                }
            }
            0
        }
        Cmd::Repeat { count_expr, body } => {
            let count = match eval_repeat_count(ctx, count_expr) {
                Ok(n) => n,
                Err(e) => {
                    error::report("repeat", e);
                    return NEGATIVE_STATUS;
                }
            };
            for _ in 0..count {
                if signals::is_interrupted() {
                    break;
                }
                exec_cmd(ctx, body);
            }
            0
        }
        Cmd::Background(inner) => exec_background(ctx, inner),
    }
}

/// `repeat (N)`: `N` may be a bare variable name, or an arithmetic
/// expression possibly referencing variables.
fn eval_repeat_count(ctx: &ShellContext, expr: &str) -> Result<i64, crate::arith::ArithError> {
    let trimmed = expr.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        if let Some(value) = ctx.vars.get(trimmed) {
            if let Ok(n) = value.parse::<f64>() {
                return Ok(n as i64);
            }
        }
    }

    let substituted = vars::substitute(trimmed, &ctx.vars)
        .ok()
        .flatten()
        .unwrap_or_else(|| trimmed.to_string());
    let value = crate::arith::eval(&substituted)?;
    Ok(value as i64)
}

fn exec_simple(ctx: &mut ShellContext, simple: &Simple) -> i32 {
    if simple.words.is_empty() {
        return 0;
    }

    let mut words = Vec::with_capacity(simple.words.len());
    for w in &simple.words {
        match substitute_word(ctx, w) {
            Ok(s) => words.push(s),
            Err(e) => {
                error::report("substitution", e);
                return NEGATIVE_STATUS;
            }
        }
    }

    match ctx.aliases.expand(&mut words) {
        AliasOutcome::NoOp => return 1,
        AliasOutcome::Expanded | AliasOutcome::Unchanged => {}
    }

    let mut substituted_redirects = Vec::with_capacity(simple.redirects.len());
    for r in &simple.redirects {
        match substitute_word(ctx, &r.path) {
            Ok(path) => substituted_redirects.push(crate::redirect::RedirectSpec { kind: r.kind.clone(), path }),
            Err(e) => {
                error::report("substitution", e);
                return NEGATIVE_STATUS;
            }
        }
    }

    let guards: Result<Vec<RedirectGuard>, _> =
        substituted_redirects.iter().map(RedirectGuard::apply).collect();
    let guards = match guards {
        Ok(g) => g,
        Err(e) => {
            error::report("redirect", e);
            return 1;
        }
    };

    let status = if builtins::is_builtin(&words[0]) {
        builtins::run(ctx, &words)
    } else {
        match exec::spawn(&words, || {}) {
            Ok(pid) => exec::wait_foreground(pid, !ctx.jobs.is_empty()),
            Err(e) => {
                error::report("exec", e);
                1
            }
        }
    };

    drop(guards);
    status
}

fn exec_background(ctx: &mut ShellContext, inner: &Cmd) -> i32 {
    match unsafe { fork() } {
        Ok(ForkResult::Child) => {
            let status = exec_cmd(ctx, inner);
            std::process::exit(status);
        }
        Ok(ForkResult::Parent { child }) => {
            let description = describe(inner);
            let id = ctx.jobs.spawn(child, description);
            eprintln!("[{id}] {child}");
            0
        }
        Err(e) => {
            error::report("background", e);
            1
        }
    }
}

fn describe(cmd: &Cmd) -> String {
    match cmd {
        Cmd::Simple(s) => s.words.join(" "),
        _ => "job".to_string(),
    }
}

fn collect_pipeline<'a>(cmd: &'a Cmd, out: &mut Vec<&'a Cmd>) {
    if let Cmd::Pipe(lhs, rhs) = cmd {
        collect_pipeline(lhs, out);
        out.push(rhs);
    } else {
        out.push(cmd);
    }
}

/// Runs a flattened pipeline. Every non-final stage is forked with its
/// stdout wired to the next stage's stdin; the final stage runs in the
/// foreground with stdin wired to the previous stage's output, and its
/// status is the pipeline's status. Terminal stdin/stdout are saved and
/// restored around the whole operation (§4.8 item 4, §5).
fn exec_pipeline(ctx: &mut ShellContext, stages: &[&Cmd]) -> i32 {
    if stages.len() == 1 {
        return exec_cmd(ctx, stages[0]);
    }

    let saved_stdin = dup(libc::STDIN_FILENO).ok();
    let saved_stdout = dup(libc::STDOUT_FILENO).ok();

    let mut prev_read: Option<RawFd> = None;
    let mut children: Vec<Pid> = Vec::new();
    let mut last_status = 0;
    let n = stages.len();

    for (i, stage) in stages.iter().enumerate() {
        let is_last = i == n - 1;

        if !is_last {
            let (read_fd, write_fd) = match pipe() {
                Ok(fds) => fds,
                Err(e) => {
                    error::report("pipe", e);
                    break;
                }
            };

            match unsafe { fork() } {
                Ok(ForkResult::Child) => {
                    if let Some(rfd) = prev_read {
                        let _ = dup2(rfd, libc::STDIN_FILENO);
                        let _ = close(rfd);
                    }
                    let _ = dup2(write_fd, libc::STDOUT_FILENO);
                    let _ = close(write_fd);
                    let _ = close(read_fd);
                    let status = exec_cmd(ctx, stage);
                    std::process::exit(status);
                }
                Ok(ForkResult::Parent { child }) => {
                    let _ = close(write_fd);
                    if let Some(rfd) = prev_read {
                        let _ = close(rfd);
                    }
                    prev_read = Some(read_fd);
                    children.push(child);
                }
                Err(e) => {
                    error::report("pipe", e);
                    break;
                }
            }
        } else {
            let saved_in = prev_read.and(dup(libc::STDIN_FILENO).ok());
            if let Some(rfd) = prev_read {
                let _ = dup2(rfd, libc::STDIN_FILENO);
                let _ = close(rfd);
            }
            last_status = exec_cmd(ctx, stage);
            if let Some(saved) = saved_in {
                let _ = dup2(saved, libc::STDIN_FILENO);
                let _ = close(saved);
            }
        }
    }

    for pid in children {
        exec::wait_foreground(pid, !ctx.jobs.is_empty());
    }

    if let Some(saved) = saved_stdin {
        let _ = dup2(saved, libc::STDIN_FILENO);
        let _ = close(saved);
    }
    if let Some(saved) = saved_stdout {
        let _ = dup2(saved, libc::STDOUT_FILENO);
        let _ = close(saved);
    }

    last_status
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn true_and_false_compose() {
        let mut ctx = ShellContext::new(false);
        assert_eq!(run_line(&mut ctx, "true"), 0);
        assert_eq!(run_line(&mut ctx, "false"), 1);
    }

    #[test]
    fn and_short_circuits_on_failure() {
        let mut ctx = ShellContext::new(false);
        assert_eq!(run_line(&mut ctx, "false && true"), 1);
    }

    #[test]
    fn or_short_circuits_on_success() {
        let mut ctx = ShellContext::new(false);
        assert_eq!(run_line(&mut ctx, "true || false"), 0);
    }

    #[test]
    fn seq_runs_both_regardless_of_status() {
        let mut ctx = ShellContext::new(false);
        assert_eq!(run_line(&mut ctx, "false ; true"), 0);
    }

    #[test]
    fn if_true_runs_body() {
        let mut ctx = ShellContext::new(false);
        assert_eq!(run_line(&mut ctx, "if (true) true else false"), 0);
    }

    #[test]
    fn repeat_runs_body_n_times_via_let() {
        let mut ctx = ShellContext::new(false);
        run_line(&mut ctx, "let N=( 2 + 3 )");
        assert_eq!(ctx.vars.get_local("N"), Some("5"));
        // Exit status is ignored for bodies, so this only checks the
        // line parses and runs without a negative (error) status.
        assert_eq!(run_line(&mut ctx, "repeat (N) true"), 0);
    }

    #[test]
    fn empty_line_preserves_last_status() {
        let mut ctx = ShellContext::new(false);
        run_line(&mut ctx, "false");
        assert_eq!(run_line(&mut ctx, ""), 1);
    }

    #[test]
    fn syntax_error_yields_negative_status() {
        let mut ctx = ShellContext::new(false);
        assert_eq!(run_line(&mut ctx, "if (true)"), NEGATIVE_STATUS);
    }

    #[test]
    fn while_condition_sees_variable_mutated_by_its_own_body() {
        let mut ctx = ShellContext::new(false);
        run_line(&mut ctx, "let N=(0)");
        run_line(&mut ctx, "while (chk $N lt 3) let N=($N+1)");
        assert_eq!(ctx.vars.get_local("N"), Some("3"));
    }
}

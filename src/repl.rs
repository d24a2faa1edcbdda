//! Main read/execute loop (§5, §6).
//!
//! Reads with `std::io::BufRead` directly rather than a line-editing
//! library — tab completion and history recall via arrow keys are
//! explicitly out of scope (§1); only the history *store* and bang
//! expansion are part of the core.

use crate::context::ShellContext;
use crate::interp;
use crate::prompt;
use crate::signals;
use std::io::{self, BufRead, Write};

pub const SHELL_NAME: &str = "alsh";

/// Drives the loop for either an interactive terminal or a script. In
/// interactive mode a prompt is printed before each read, every line is
/// recorded to history (after bang-expansion), and background-job
/// completion notices are drained between prompts.
pub fn run(ctx: &mut ShellContext, input: impl BufRead) {
    let mut lines = input.lines();

    loop {
        if ctx.interactive() {
            drain_pending_messages(ctx);
            print!("{}", prompt::render(SHELL_NAME));
            let _ = io::stdout().flush();
        }

        let raw = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(_)) | None => break,
        };

        if signals::take_child_exited() {
            ctx.reap_finished_jobs();
        }

        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let expanded = if ctx.interactive() {
            match ctx.history.expand_line(line) {
                Ok(expanded) => {
                    if expanded != line {
                        println!("{expanded}");
                    }
                    expanded
                }
                Err(e) => {
                    crate::error::report("history", e);
                    continue;
                }
            }
        } else {
            line.to_string()
        };

        if ctx.interactive() {
            ctx.history.push(&expanded);
        }

        interp::run_line(ctx, &expanded);

        if signals::take_interrupted() {
            println!();
        }

        if ctx.should_exit {
            break;
        }
    }
}

fn drain_pending_messages(ctx: &mut ShellContext) {
    for message in ctx.take_pending_messages() {
        eprintln!("{message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn runs_script_lines_in_order() {
        let mut ctx = ShellContext::new(false);
        let input = Cursor::new(b"let N=1\nlet M=2\n".to_vec());
        run(&mut ctx, input);
        assert_eq!(ctx.vars.get_local("N"), Some("1"));
        assert_eq!(ctx.vars.get_local("M"), Some("2"));
    }

    #[test]
    fn exit_builtin_stops_the_loop() {
        let mut ctx = ShellContext::new(false);
        let input = Cursor::new(b"exit 5\nlet N=1\n".to_vec());
        run(&mut ctx, input);
        assert_eq!(ctx.exit_code, 5);
        assert_eq!(ctx.vars.get_local("N"), None);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let mut ctx = ShellContext::new(false);
        let input = Cursor::new(b"\n\nlet N=1\n".to_vec());
        run(&mut ctx, input);
        assert_eq!(ctx.vars.get_local("N"), Some("1"));
    }
}

//! Entry point (§6).
//!
//! `alsh` with no arguments is interactive when stdin is a tty;
//! `alsh SCRIPT` reads commands from `SCRIPT` with no prompt and no
//! history file. Exit status is 0 on clean exit, 1 on startup failure.

use alsh::context::{self, ShellContext};
use alsh::{rcfile, repl, signals};
use std::fs::File;
use std::io::{self, BufReader};
use std::os::unix::io::AsRawFd;

fn main() {
    signals::install();

    let args: Vec<String> = std::env::args().collect();
    let exit_code = match args.get(1) {
        Some(script_path) => run_script(script_path),
        None => run_interactive(),
    };

    std::process::exit(exit_code);
}

fn run_interactive() -> i32 {
    let interactive = is_tty(io::stdin().as_raw_fd());
    let mut ctx = ShellContext::new(interactive);

    if interactive {
        rcfile::load(&mut ctx, &context::rcfile_path());
    }

    repl::run(&mut ctx, BufReader::new(io::stdin()));
    ctx.exit_code
}

fn run_script(path: &str) -> i32 {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            alsh::error::report("alsh", format!("{path}: {e}"));
            return 1;
        }
    };

    let mut ctx = ShellContext::new(false);
    repl::run(&mut ctx, BufReader::new(file));
    0
}

fn is_tty(fd: i32) -> bool {
    unsafe { libc::isatty(fd) != 0 }
}

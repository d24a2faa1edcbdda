//! Process execution and wait (§4.9).
//!
//! A foreground simple command forks, execs in the child, and waits in
//! the parent — for the specific child pid if background jobs are
//! outstanding, for any child otherwise, per §4.9's literal wording. A
//! background command forks and returns immediately, leaving the pid in
//! the job table for the signal router to reap later.

use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{execvp, fork, ForkResult, Pid};
use std::ffi::CString;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("{0}: command not found")]
    NotFound(String),
    #[error("{0}: is a directory")]
    IsDirectory(String),
    #[error("{0}: permission denied")]
    PermissionDenied(String),
    #[error("{0}: {1}")]
    Other(String, nix::errno::Errno),
    #[error("fork failed: {0}")]
    ForkFailed(nix::errno::Errno),
}

fn categorize(program: &str, errno: nix::errno::Errno) -> ExecError {
    match errno {
        nix::errno::Errno::ENOENT => ExecError::NotFound(program.to_string()),
        nix::errno::Errno::EISDIR => ExecError::IsDirectory(program.to_string()),
        nix::errno::Errno::EACCES => ExecError::PermissionDenied(program.to_string()),
        other => ExecError::Other(program.to_string(), other),
    }
}

/// Execs `words[0]` with `words` as argv, searching `PATH`. Only
/// returns on failure — the caller is expected to be running inside a
/// freshly forked child about to exit.
fn exec_argv(words: &[String]) -> ExecError {
    let program = &words[0];
    let Ok(cprogram) = CString::new(program.as_str()) else {
        return ExecError::NotFound(program.clone());
    };
    let cargs: Vec<CString> = words.iter().filter_map(|w| CString::new(w.as_str()).ok()).collect();

    match execvp(&cprogram, &cargs) {
        Ok(_) => unreachable!("execvp only returns on error"),
        Err(e) => categorize(program, e),
    }
}

/// Forks and execs `words` in the child. Applies `setup` (redirect
/// wiring, pipe fd plumbing) in the child before the exec call. Returns
/// the child's pid to the parent.
pub fn spawn(words: &[String], setup: impl FnOnce()) -> Result<Pid, ExecError> {
    match unsafe { fork() } {
        Ok(ForkResult::Child) => {
            setup();
            let err = exec_argv(words);
            crate::error::report("exec", &err);
            std::process::exit(1);
        }
        Ok(ForkResult::Parent { child }) => Ok(child),
        Err(e) => Err(ExecError::ForkFailed(e)),
    }
}

/// Converts a completed child's wait status into a shell exit code. A
/// signaled child reports status 1, matching §4.9.
fn status_from_wait(status: WaitStatus) -> i32 {
    match status {
        WaitStatus::Exited(_, code) => code,
        WaitStatus::Signaled(..) => 1,
        _ => 1,
    }
}

/// Waits for a foreground child. When background jobs are outstanding,
/// waits for exactly `pid`; otherwise waits for any child, since the
/// only child that can exist is this one.
pub fn wait_foreground(pid: Pid, has_background_jobs: bool) -> i32 {
    let target = if has_background_jobs { pid } else { Pid::from_raw(-1) };
    loop {
        match waitpid(target, None) {
            Ok(status) if status.pid() == Some(pid) => return status_from_wait(status),
            Ok(_) => continue,
            Err(nix::errno::Errno::EINTR) => continue,
            Err(_) => return 1,
        }
    }
}

/// Non-blocking reap used by the signal router; returns `(pid, status)`
/// for at most one finished child.
pub fn try_reap_one() -> Option<(Pid, i32)> {
    match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
        Ok(status @ (WaitStatus::Exited(pid, _) | WaitStatus::Signaled(pid, _, _))) => {
            Some((pid, status_from_wait(status)))
        }
        _ => None,
    }
}

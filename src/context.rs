//! Shared interpreter state (§4.5, §5).
//!
//! One `ShellContext` is threaded through parsing-adjacent expansion
//! and through execution for the lifetime of the process. It owns every
//! piece of mutable shell state apart from the signal flags, which are
//! process-global statics (`crate::signals`) because a signal handler
//! cannot reach a borrowed struct.

use crate::alias::AliasStore;
use crate::history::HistoryStore;
use crate::jobs::JobTable;
use crate::vars::VarStore;
use std::path::PathBuf;

pub struct ShellContext {
    pub vars: VarStore,
    pub aliases: AliasStore,
    pub history: HistoryStore,
    pub jobs: JobTable,
    /// Exit status of the most recently completed command.
    pub last_status: i32,
    /// Messages queued by background-job completions, drained before
    /// the next prompt is printed.
    pub pending_messages: Vec<String>,
    /// True once a script-ending `exit` has been requested.
    pub should_exit: bool,
    pub exit_code: i32,
    interactive: bool,
}

impl ShellContext {
    pub fn new(interactive: bool) -> Self {
        let history = if interactive {
            HistoryStore::load(history_path())
        } else {
            HistoryStore::new()
        };

        ShellContext {
            vars: VarStore::new(),
            aliases: AliasStore::new(),
            history,
            jobs: JobTable::new(),
            last_status: 0,
            pending_messages: Vec::new(),
            should_exit: false,
            exit_code: 0,
            interactive,
        }
    }

    pub fn interactive(&self) -> bool {
        self.interactive
    }

    pub fn request_exit(&mut self, code: i32) {
        self.should_exit = true;
        self.exit_code = code;
    }

    /// Drains and returns queued background-completion notices.
    pub fn take_pending_messages(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending_messages)
    }

    /// Reaps finished background jobs and queues their "Done" notices.
    /// Called whenever `crate::signals::take_child_exited()` is true.
    pub fn reap_finished_jobs(&mut self) {
        use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
        use nix::unistd::Pid;

        loop {
            match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::Exited(pid, _)) | Ok(WaitStatus::Signaled(pid, _, _)) => {
                    if let Some(job) = self.jobs.remove_by_pid(pid) {
                        self.pending_messages.push(format!("[{}]+  Done  {}", job.id, job.command));
                    }
                }
                _ => break,
            }
        }
    }
}

fn history_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".alsh_history")
}

pub fn rcfile_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".alshrc")
}

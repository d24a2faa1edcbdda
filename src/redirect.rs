//! Parsed redirections and RAII fd restoration (§4.7, Design Notes §9).
//!
//! Rather than a trio of raw fd sentinels a caller has to remember to
//! restore by hand, a `RedirectGuard` owns the saved fd and restores it
//! from `Drop`, so a bail-out via `?` can never leak a child's stdout
//! into the interactive shell.

use nix::fcntl::{open, OFlag};
use nix::sys::stat::Mode;
use nix::unistd::{close, dup, dup2};
use std::os::unix::io::RawFd;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RedirectError {
    #[error("{path}: {source}")]
    Open { path: String, source: nix::errno::Errno },
    #[error("{0}")]
    Dup(#[from] nix::errno::Errno),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectKind {
    /// `< file`
    Input,
    /// `> file` (truncate)
    Output,
    /// `>> file` (append)
    Append,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectSpec {
    pub kind: RedirectKind,
    pub path: String,
}

impl RedirectSpec {
    pub fn target_fd(&self) -> RawFd {
        match self.kind {
            RedirectKind::Input => libc::STDIN_FILENO,
            RedirectKind::Output | RedirectKind::Append => libc::STDOUT_FILENO,
        }
    }

    fn open_flags(&self) -> OFlag {
        match self.kind {
            RedirectKind::Input => OFlag::O_RDONLY,
            RedirectKind::Output => OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
            RedirectKind::Append => OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_APPEND,
        }
    }
}

/// Applies a redirection to `target_fd`, saving the previous fd so it
/// can be restored when this guard drops.
pub struct RedirectGuard {
    target_fd: RawFd,
    saved_fd: Option<RawFd>,
}

impl RedirectGuard {
    /// Opens `spec.path` and duplicates it onto `spec.target_fd()`.
    pub fn apply(spec: &RedirectSpec) -> Result<Self, RedirectError> {
        let mode = Mode::from_bits_truncate(0o644);
        let file_fd = open(spec.path.as_str(), spec.open_flags(), mode)
            .map_err(|e| RedirectError::Open { path: spec.path.clone(), source: e })?;

        let target_fd = spec.target_fd();
        let saved_fd = dup(target_fd).ok();
        let result = dup2(file_fd, target_fd);
        let _ = close(file_fd);

        if let Err(e) = result {
            if let Some(saved) = saved_fd {
                let _ = close(saved);
            }
            return Err(RedirectError::Dup(e));
        }

        Ok(RedirectGuard { target_fd, saved_fd })
    }
}

impl Drop for RedirectGuard {
    fn drop(&mut self) {
        if let Some(saved) = self.saved_fd {
            let _ = dup2(saved, self.target_fd);
            let _ = close(saved);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::sync::Mutex;

    // stdout/stdin fds are process-global; serialize tests that touch them.
    static FD_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn output_redirect_writes_to_file_and_restores_stdout() {
        let _g = FD_LOCK.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");

        let saved_stdout = dup(libc::STDOUT_FILENO).unwrap();
        {
            let spec = RedirectSpec {
                kind: RedirectKind::Output,
                path: path.to_str().unwrap().to_string(),
            };
            let _guard = RedirectGuard::apply(&spec).unwrap();
            println!("hello redirect");
            std::io::stdout().flush().unwrap();
        }

        let mut contents = String::new();
        std::fs::File::open(&path).unwrap().read_to_string(&mut contents).unwrap();
        assert_eq!(contents.trim(), "hello redirect");

        let _ = dup2(saved_stdout, libc::STDOUT_FILENO);
        let _ = close(saved_stdout);
    }

    #[test]
    fn append_redirect_preserves_prior_contents() {
        let _g = FD_LOCK.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "first\n").unwrap();

        let saved_stdout = dup(libc::STDOUT_FILENO).unwrap();
        {
            let spec = RedirectSpec {
                kind: RedirectKind::Append,
                path: path.to_str().unwrap().to_string(),
            };
            let _guard = RedirectGuard::apply(&spec).unwrap();
            println!("second");
            std::io::stdout().flush().unwrap();
        }

        let mut contents = String::new();
        std::fs::File::open(&path).unwrap().read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "first\nsecond\n");

        let _ = dup2(saved_stdout, libc::STDOUT_FILENO);
        let _ = close(saved_stdout);
    }

    #[test]
    fn missing_input_file_is_error() {
        let spec = RedirectSpec {
            kind: RedirectKind::Input,
            path: "/nonexistent/path/for/alsh/tests".to_string(),
        };
        assert!(RedirectGuard::apply(&spec).is_err());
    }
}

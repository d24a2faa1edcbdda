//! Startup file loading (§6).
//!
//! `$HOME/.alshrc` is read once, before the first prompt, in
//! interactive mode only. A failure on one line is a warning, not an
//! abort — a typo in the rc file should not lock the user out of their
//! own shell.

use crate::context::ShellContext;
use crate::interp;
use std::fs;
use std::path::Path;

pub fn load(ctx: &mut ShellContext, path: &Path) {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return,
    };

    for line in contents.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let status = interp::run_line(ctx, trimmed);
        if status == interp::NEGATIVE_STATUS {
            crate::error::report("alshrc", format!("{trimmed}: failed to parse, skipping"));
        }
    }
}

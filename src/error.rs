//! Shared diagnostic plumbing (§7).
//!
//! The shell writes diagnostics straight to stderr with `eprintln!`
//! rather than pulling in `log`/`tracing` — there is no long-running
//! service here to warrant structured logging. Every subsystem defines
//! its own `thiserror`-derived error enum; this module only centralizes
//! how those get rendered, so the `NAME: CONTEXT: MESSAGE` shape is
//! produced in exactly one place.

use std::fmt;

/// The shell's own name, as it appears in diagnostics.
pub const SHELL_NAME: &str = "alsh";

/// Writes `alsh: CONTEXT: MESSAGE` to stderr.
pub fn report(context: &str, message: impl fmt::Display) {
    eprintln!("{SHELL_NAME}: {context}: {message}");
}

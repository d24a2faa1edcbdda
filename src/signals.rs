//! Signal handling (§5).
//!
//! Only two signals matter for a shell with no job control beyond
//! background-start: SIGINT, which should interrupt the foreground
//! command rather than kill the shell, and SIGCHLD, which tells the
//! main loop a background job may have finished. Both handlers only
//! flip an atomic flag — all the actual work happens back on the main
//! thread, where it's safe to allocate and print.

use std::sync::atomic::{AtomicBool, Ordering};

/// Set by the SIGINT handler; cleared by whoever acts on it.
pub static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Set by the SIGCHLD handler; cleared once the main loop has reaped.
pub static CHILD_EXITED: AtomicBool = AtomicBool::new(false);

#[cfg(unix)]
pub fn install() {
    use signal_hook::low_level;

    unsafe {
        let _ = low_level::register(signal_hook::consts::SIGINT, || {
            INTERRUPTED.store(true, Ordering::SeqCst);
        });
        let _ = low_level::register(signal_hook::consts::SIGCHLD, || {
            CHILD_EXITED.store(true, Ordering::SeqCst);
        });
    }
}

#[cfg(not(unix))]
pub fn install() {}

/// Checks and clears the interrupt flag.
pub fn take_interrupted() -> bool {
    INTERRUPTED.swap(false, Ordering::SeqCst)
}

/// Checks the interrupt flag without clearing it — used by loop bodies
/// and `||` chains that need to see the flag without consuming the
/// single consumption the main loop does after each command.
pub fn is_interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// Checks and clears the child-exited flag.
pub fn take_child_exited() -> bool {
    CHILD_EXITED.swap(false, Ordering::SeqCst)
}

//! Operator interrupts.
//!
//! Ctrl-C reaches the running tool as well as the harness. The harness only
//! records it, lets the tool die, cleans up the active directory and then exits.

use std::sync::atomic::{AtomicBool, Ordering};

/// Exit status used after an operator interrupt.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Installs the SIGINT handler. Without it, Ctrl-C terminates immediately.
#[cfg(unix)]
pub fn install_handler() {
    extern "C" fn on_sigint(_signal: libc::c_int) {
        INTERRUPTED.store(true, Ordering::SeqCst);
    }
    // SAFETY: the handler only stores to an atomic, which is async-signal-safe.
    unsafe {
        libc::signal(
            libc::SIGINT,
            on_sigint as extern "C" fn(libc::c_int) as libc::sighandler_t,
        );
    }
}

#[cfg(not(unix))]
pub fn install_handler() {}

/// True once the operator has interrupted the run.
pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

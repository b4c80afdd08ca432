//! Graceful shutdown: first SIGINT/SIGTERM asks the runner to stop between
//! entities, a second one exits immediately.
//!
//! The flag is the default for [`BatchRunner`](crate::BatchRunner); tests
//! and embedders hand the runner their own with `with_shutdown`.

use std::sync::atomic::{AtomicBool, Ordering};

/// Process shutdown flag, set by the signal handlers.
pub fn shutdown_flag() -> &'static AtomicBool {
    static FLAG: AtomicBool = AtomicBool::new(false);
    &FLAG
}

/// Register SIGINT/SIGTERM handlers.
pub fn install_signal_handlers() -> std::io::Result<()> {
    for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        // SAFETY: AtomicBool::swap and process::exit are async-signal-safe
        unsafe {
            signal_hook::low_level::register(signal, || {
                if shutdown_flag().swap(true, Ordering::Relaxed) {
                    std::process::exit(130);
                }
            })?;
        }
    }
    Ok(())
}

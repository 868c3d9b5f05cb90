//! Process-wide interrupt flag.
//! Set by the ctrlc handler; workflows poll it between files and before
//! destructive steps so an interrupted run stops with the current file either
//! completed or rolled back.
//!
//! Relaxed atomics are enough for a one-way "stop" flag, and `request()` is
//! safe to call from a signal handler.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::errors::DotsyncError;

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Request a cooperative stop (idempotent).
#[inline]
pub fn request() {
    SHUTDOWN.store(true, Ordering::Relaxed);
}

#[inline]
pub fn is_requested() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

/// `Err(Interrupted)` once a stop was requested.
pub fn check() -> Result<(), DotsyncError> {
    if is_requested() {
        Err(DotsyncError::Interrupted)
    } else {
        Ok(())
    }
}

/// Clear the flag. Only tests need this.
#[doc(hidden)]
#[inline]
pub fn reset() {
    SHUTDOWN.store(false, Ordering::Relaxed);
}

//! Liveness - "should the host keep running" signal
//!
//! Polled once per lookup iteration. Passed in explicitly so a lookup has no
//! dependency on process-wide state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

/// Poll-able liveness signal.
pub trait Liveness: Send + Sync {
    /// `false` once the host has begun shutting down.
    fn is_running(&self) -> bool;
}

/// Signal that never reports shutdown.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRunning;

impl Liveness for AlwaysRunning {
    #[inline]
    fn is_running(&self) -> bool {
        true
    }
}

impl Liveness for AtomicBool {
    #[inline]
    fn is_running(&self) -> bool {
        self.load(Ordering::Acquire)
    }
}

/// A closed channel counts as shut down.
impl Liveness for watch::Receiver<bool> {
    fn is_running(&self) -> bool {
        self.has_changed().is_ok() && *self.borrow()
    }
}

/// Cloneable shutdown flag shared between a signal handler and lookups.
#[derive(Debug, Clone)]
pub struct ShutdownFlag {
    running: Arc<AtomicBool>,
}

impl ShutdownFlag {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Mark the host as shutting down. Idempotent.
    pub fn trigger(&self) {
        self.running.store(false, Ordering::Release);
    }

    #[inline]
    pub fn is_triggered(&self) -> bool {
        !self.running.load(Ordering::Acquire)
    }
}

impl Default for ShutdownFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl Liveness for ShutdownFlag {
    #[inline]
    fn is_running(&self) -> bool {
        !self.is_triggered()
    }
}

impl<L: Liveness + ?Sized> Liveness for &L {
    #[inline]
    fn is_running(&self) -> bool {
        (**self).is_running()
    }
}

impl<L: Liveness + ?Sized> Liveness for Arc<L> {
    #[inline]
    fn is_running(&self) -> bool {
        (**self).is_running()
    }
}

//! Ownership-gated result delivery.
//!
//! A loader owns a [`Liveness`] flag and hands a [`DeliveryToken`] to every
//! operation it spawns. When the loader is dropped the flag is revoked, and
//! any result that arrives afterwards is discarded instead of reaching the
//! caller's callback. The I/O itself is never cancelled.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Single-shot completion callback.
pub type Completion<T> = Box<dyn FnOnce(T) + Send + 'static>;

/// Liveness flag owned by a loader. Revoked on drop.
#[derive(Debug)]
pub struct Liveness {
    alive: Arc<AtomicBool>,
}

impl Liveness {
    pub fn new() -> Self {
        Self { alive: Arc::new(AtomicBool::new(true)) }
    }

    /// Token for one in-flight operation.
    pub fn token(&self) -> DeliveryToken {
        DeliveryToken { alive: Arc::clone(&self.alive) }
    }

    /// Stop delivering results for every token handed out so far.
    pub fn revoke(&self) {
        self.alive.store(false, Ordering::Release);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Liveness {
    fn drop(&mut self) {
        self.revoke();
    }
}

/// Checked before a spawned operation invokes its callback.
#[derive(Debug, Clone)]
pub struct DeliveryToken {
    alive: Arc<AtomicBool>,
}

impl DeliveryToken {
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Invoke `on_complete` with `value` if the owner is still alive.
    ///
    /// Returns whether the callback ran.
    pub fn deliver<T>(&self, on_complete: impl FnOnce(T), value: T) -> bool {
        if !self.is_alive() {
            tracing::debug!("owner released before completion; dropping result");
            return false;
        }
        on_complete(value);
        true
    }
}

//! Screen lifetime and single-flight guards.
//!
//! Backend calls are never cancelled: once a load or save is sent it runs
//! to completion or failure. What a screen controls is whether the result
//! is still applied. [`ScreenLifetime`] is triggered when the screen is
//! torn down, after which completed results are dropped. [`InFlight`]
//! keeps a second press of the same button from issuing a second request.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

/// Mounted state of one screen.
#[derive(Debug, Clone, Default)]
pub struct ScreenLifetime {
    unmounted: CancellationToken,
}

impl ScreenLifetime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the screen as torn down. Idempotent.
    pub fn unmount(&self) {
        self.unmounted.cancel();
    }

    pub fn is_mounted(&self) -> bool {
        !self.unmounted.is_cancelled()
    }

    /// Run `fut` to completion and return its output only if the screen is
    /// still mounted afterwards.
    pub async fn settle<F: Future>(&self, what: &str, fut: F) -> Option<F::Output> {
        let output = fut.await;
        if self.is_mounted() {
            Some(output)
        } else {
            tracing::debug!(what, "Screen torn down, discarding result");
            None
        }
    }
}

/// At-most-one-in-flight flag for a screen action.
#[derive(Debug, Default)]
pub struct InFlight {
    busy: AtomicBool,
}

/// Clears its [`InFlight`] flag when dropped.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    flag: &'a InFlight,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the flag, or `None` when an action is already running.
    pub fn try_begin(&self) -> Option<InFlightGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard { flag: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.busy.store(false, Ordering::Release);
    }
}

use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

/// One-way stop flag an idle worker can wait on.
///
/// Only a stop request wakes the wait early; task arrivals do not.
#[derive(Debug, Default)]
pub(crate) struct StopSignal {
    requested: Mutex<bool>,
    changed: Condvar,
}

impl StopSignal {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn request(&self) {
        let mut requested = self.requested.lock().unwrap_or_else(PoisonError::into_inner);
        *requested = true;
        self.changed.notify_all();
    }

    pub(crate) fn is_requested(&self) -> bool {
        *self.requested.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep for up to `timeout`; returns whether stop has been requested.
    pub(crate) fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = self.requested.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = self
            .changed
            .wait_timeout_while(guard, timeout, |requested| !*requested)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

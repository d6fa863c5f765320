//! Change notification for long-poll subscribers.
//!
//! [`ChangeNotifier`] is a transient broadcast pulse: [`ChangeNotifier::signal`]
//! wakes every task currently suspended in [`ChangeNotifier::wait`] and then
//! immediately rearms.  A wait that begins strictly after a signal has
//! completed blocks until the next signal; there is no latched "something
//! happened" flag.
//!
//! Built on [`tokio::sync::Notify::notify_waiters`], which has exactly these
//! semantics.  Dropping a wait future (e.g. when a long-poll client
//! disconnects) deregisters the waiter, so abandoned subscribers do not leak.

use std::time::Duration;

use tokio::sync::Notify;

/// Default long-poll timeout.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(20);

/// How a [`ChangeNotifier::wait`] call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// A signal arrived while waiting.
    Fired,
    /// The timeout elapsed with no signal.
    TimedOut,
}

/// Broadcast wakeup for tasks waiting on "anything changed".
#[derive(Debug, Default)]
pub struct ChangeNotifier {
    inner: Notify,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self {
            inner: Notify::new(),
        }
    }

    /// Wake every task currently suspended in [`wait`](Self::wait).
    ///
    /// Waiters that register after this call returns are not affected.
    pub fn signal(&self) {
        self.inner.notify_waiters();
    }

    /// Suspend until the next [`signal`](Self::signal) or until `timeout`
    /// elapses, whichever comes first.
    ///
    /// The waiter is registered before the first suspension point, so a
    /// signal racing with the start of the wait is not missed once this
    /// future has been polled.
    pub async fn wait(&self, timeout: Duration) -> WaitOutcome {
        match tokio::time::timeout(timeout, self.inner.notified()).await {
            Ok(()) => WaitOutcome::Fired,
            Err(_) => WaitOutcome::TimedOut,
        }
    }
}

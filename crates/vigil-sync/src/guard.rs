//! Mutual exclusion over the remote sync channel.
//!
//! The input worker, the sensor worker and the status poller all talk to the
//! same remote store through one [`SyncGuard`]. The guard holds the channel
//! behind a `tokio::sync::Mutex`, so at most one remote operation is in flight
//! at any instant, and consults the [`ConnectivityProbe`] first so nothing
//! ever waits on the lock while the link is down.
//!
//! ```text
//!  input worker ──┐
//! sensor worker ──┼──> SyncGuard ──(one at a time)──> RemoteSyncChannel
//!   status poll ──┘        │
//!                          └── link down? -> Skipped
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};
use vigil_core::FeatureFlag;
use vigil_core::SyncValue;
use vigil_core::constants::{STATUS_COLUMN, VALUE_COLUMN};

use crate::channel::{RemoteSyncChannel, StatusCode, is_success};
use crate::connectivity::ConnectivityProbe;
use crate::error::{Result, SyncError};

/// Result of an operation submitted to the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum SyncOutcome<T> {
    /// The operation ran and produced a value.
    Completed(T),
    /// The link was down and the operation was not attempted.
    Skipped,
}

impl<T> SyncOutcome<T> {
    pub fn is_skipped(&self) -> bool {
        matches!(self, SyncOutcome::Skipped)
    }

    /// The operation's value, if it ran.
    pub fn completed(self) -> Option<T> {
        match self {
            SyncOutcome::Completed(value) => Some(value),
            SyncOutcome::Skipped => None,
        }
    }
}

/// Counters describing the guard's traffic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Operations that ran. For `write` and `read_status` only successes count.
    pub completed: u64,
    /// Operations not attempted because the link was down.
    pub skipped: u64,
    /// `write` and `read_status` calls that ran and returned an error.
    pub failed: u64,
}

/// Serializes access to a [`RemoteSyncChannel`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use vigil_core::FeatureFlag;
/// use vigil_sync::{LinkState, MockRemoteStore, SyncGuard, SyncOutcome};
///
/// # #[tokio::main]
/// # async fn main() {
/// let (store, handle) = MockRemoteStore::new();
/// let link = LinkState::new(true);
/// let guard = SyncGuard::new(store, Arc::new(link.clone()));
///
/// let outcome = guard.write(FeatureFlag::Motion, true).await;
/// assert_eq!(outcome, SyncOutcome::Completed(Ok(204)));
///
/// link.set_up(false);
/// assert!(guard.write(FeatureFlag::Motion, false).await.is_skipped());
/// assert_eq!(handle.writes().len(), 1);
/// # }
/// ```
pub struct SyncGuard<C> {
    channel: Mutex<C>,
    probe: Arc<dyn ConnectivityProbe>,
    runs: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
}

impl<C: RemoteSyncChannel> SyncGuard<C> {
    pub fn new(channel: C, probe: Arc<dyn ConnectivityProbe>) -> Self {
        Self {
            channel: Mutex::new(channel),
            probe,
            runs: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    /// Current link state as reported by the probe.
    pub fn is_connected(&self) -> bool {
        self.probe.is_up()
    }

    /// Run exactly one operation against the channel.
    ///
    /// Returns [`SyncOutcome::Skipped`] without touching the lock when the
    /// link is down. Otherwise waits for the lock, checks the link again, runs
    /// `op`, and releases the lock when `op` finishes, including when it panics.
    ///
    /// `op` receives the channel for the lifetime of the returned future, so
    /// any values it needs must be moved in:
    ///
    /// ```
    /// # use std::sync::Arc;
    /// # use futures::FutureExt;
    /// # use vigil_core::FeatureFlag;
    /// # use vigil_sync::{LinkState, MockRemoteStore, RemoteSyncChannel, SyncGuard};
    /// # #[tokio::main]
    /// # async fn main() {
    /// # let (store, _handle) = MockRemoteStore::new();
    /// # let guard = SyncGuard::new(store, Arc::new(LinkState::new(true)));
    /// let signal = FeatureFlag::Keypad;
    /// let outcome = guard
    ///     .with_sync(move |channel| {
    ///         async move { channel.read(signal, "status").await }.boxed()
    ///     })
    ///     .await;
    /// # assert!(!outcome.is_skipped());
    /// # }
    /// ```
    pub async fn with_sync<F, T>(&self, op: F) -> SyncOutcome<T>
    where
        F: for<'a> FnOnce(&'a mut C) -> BoxFuture<'a, T> + Send,
        T: Send,
    {
        if !self.probe.is_up() {
            self.skipped.fetch_add(1, Ordering::Relaxed);
            debug!("Remote sync skipped: link down");
            return SyncOutcome::Skipped;
        }

        let mut channel = self.channel.lock().await;
        // The link may have dropped while this call queued behind another.
        if !self.probe.is_up() {
            drop(channel);
            self.skipped.fetch_add(1, Ordering::Relaxed);
            debug!("Remote sync skipped: link went down while waiting");
            return SyncOutcome::Skipped;
        }
        trace!("Remote sync lock acquired");
        let value = op(&mut *channel).await;
        drop(channel);

        self.runs.fetch_add(1, Ordering::Relaxed);
        SyncOutcome::Completed(value)
    }

    /// Write a reading into the signal's `value` column.
    ///
    /// A non-2xx status is reported as [`SyncError::Remote`].
    pub async fn write(
        &self,
        signal: FeatureFlag,
        value: impl Into<SyncValue>,
    ) -> SyncOutcome<Result<StatusCode>> {
        let value = value.into();
        debug!(%signal, %value, "Sending reading");

        let outcome: SyncOutcome<Result<StatusCode>> = self
            .with_sync(move |channel| {
                async move {
                    let status = channel.write(signal, VALUE_COLUMN, value).await?;
                    if is_success(status) {
                        Ok(status)
                    } else {
                        Err(SyncError::Remote { status })
                    }
                }
                .boxed()
            })
            .await;

        if let SyncOutcome::Completed(result) = &outcome {
            match result {
                Ok(status) => trace!(%signal, status, "Reading stored"),
                Err(e) => {
                    self.failed.fetch_add(1, Ordering::Relaxed);
                    warn!(%signal, "Failed to send reading: {}", e);
                }
            }
        }
        outcome
    }

    /// Read the signal's `status` column.
    pub async fn read_status(&self, signal: FeatureFlag) -> SyncOutcome<Result<String>> {
        let outcome: SyncOutcome<Result<String>> = self
            .with_sync(move |channel| {
                async move { channel.read(signal, STATUS_COLUMN).await }.boxed()
            })
            .await;

        if let SyncOutcome::Completed(Err(e)) = &outcome {
            self.failed.fetch_add(1, Ordering::Relaxed);
            warn!(%signal, "Failed to read status: {}", e);
        }
        outcome
    }

    /// Snapshot of the traffic counters.
    pub fn stats(&self) -> SyncStats {
        let runs = self.runs.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        SyncStats {
            completed: runs.saturating_sub(failed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed,
        }
    }
}

impl<C> std::fmt::Debug for SyncGuard<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncGuard")
            .field("connected", &self.probe.is_up())
            .field("runs", &self.runs.load(Ordering::Relaxed))
            .field("skipped", &self.skipped.load(Ordering::Relaxed))
            .field("failed", &self.failed.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::LinkState;
    use crate::mock::MockRemoteStore;

    fn guard(up: bool) -> (SyncGuard<MockRemoteStore>, crate::mock::MockRemoteStoreHandle, LinkState) {
        let (store, handle) = MockRemoteStore::new();
        let link = LinkState::new(up);
        (SyncGuard::new(store, Arc::new(link.clone())), handle, link)
    }

    #[tokio::test]
    async fn test_write_uses_value_column() {
        let (guard, handle, _link) = guard(true);

        let outcome = guard.write(FeatureFlag::Vibration, true).await;
        assert_eq!(outcome, SyncOutcome::Completed(Ok(204)));

        let writes = handle.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].signal, FeatureFlag::Vibration);
        assert_eq!(writes[0].column, "value");
        assert_eq!(writes[0].value, SyncValue::Int(1));
        assert_eq!(guard.stats().completed, 1);
    }

    #[tokio::test]
    async fn test_read_status_uses_status_column() {
        let (guard, handle, _link) = guard(true);
        handle.set_status(FeatureFlag::Keypad, "off");

        let outcome = guard.read_status(FeatureFlag::Keypad).await;
        assert_eq!(outcome, SyncOutcome::Completed(Ok("off".to_string())));
        assert_eq!(handle.reads(), vec![(FeatureFlag::Keypad, "status")]);
    }

    #[tokio::test]
    async fn test_link_down_skips_without_traffic() {
        let (guard, handle, _link) = guard(false);

        assert!(guard.write(FeatureFlag::Motion, true).await.is_skipped());
        assert!(guard.read_status(FeatureFlag::Motion).await.is_skipped());

        assert!(handle.writes().is_empty());
        assert!(handle.reads().is_empty());
        assert_eq!(
            guard.stats(),
            SyncStats {
                completed: 0,
                skipped: 2,
                failed: 0
            }
        );
    }

    #[tokio::test]
    async fn test_remote_failure_is_a_value() {
        let (guard, handle, _link) = guard(true);
        handle.fail_with(Some(SyncError::Timeout(5000)));

        let outcome = guard.write(FeatureFlag::Magnetic, false).await;
        assert_eq!(outcome, SyncOutcome::Completed(Err(SyncError::Timeout(5000))));
        assert_eq!(guard.stats().failed, 1);
        assert_eq!(guard.stats().completed, 0);

        handle.fail_with(None);
        assert_eq!(
            guard.write(FeatureFlag::Magnetic, false).await,
            SyncOutcome::Completed(Ok(204))
        );
    }

    #[tokio::test]
    async fn test_non_success_status_reported_as_remote_error() {
        let (guard, handle, _link) = guard(true);
        handle.set_write_status(500);

        let outcome = guard.write(FeatureFlag::Rfid, false).await;
        assert_eq!(
            outcome,
            SyncOutcome::Completed(Err(SyncError::Remote { status: 500 }))
        );
    }

    #[tokio::test]
    async fn test_connectivity_checked_on_every_call() {
        let (guard, handle, link) = guard(true);

        let _ = guard.write(FeatureFlag::Motion, true).await;
        link.set_up(false);
        let _ = guard.write(FeatureFlag::Motion, false).await;
        link.set_up(true);
        let _ = guard.write(FeatureFlag::Motion, true).await;

        assert_eq!(handle.writes().len(), 2);
        assert_eq!(guard.stats().skipped, 1);
    }
}

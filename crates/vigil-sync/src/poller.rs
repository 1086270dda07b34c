//! Staggered status polling.
//!
//! Reading all seven feature statuses in one go would hold the remote channel
//! for seven round trips in a row and starve the workers that report sensor
//! readings. The [`StatusPoller`] instead checks one feature per interval and
//! walks the features in a fixed cycle:
//!
//! ```text
//! connectivity -> rfid -> siren -> keypad -> vibration -> magnetic -> motion
//!      ^                                                                |
//!      +----------------------------------------------------------------+
//! ```
//!
//! A flag is therefore at most `7 x interval` stale.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};
use vigil_core::{FeatureFlag, parse_status};

use crate::channel::RemoteSyncChannel;
use crate::flags::FeatureFlags;
use crate::guard::{SyncGuard, SyncOutcome};

/// What a call to [`StatusPoller::poll`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStep {
    /// The interval has not elapsed yet. Nothing was checked.
    Waiting,
    /// One feature was checked.
    Checked {
        feature: FeatureFlag,
        /// The observed value, or `None` if the check gave no usable answer
        /// and the flag kept its previous value.
        observed: Option<bool>,
    },
}

/// Round-robin status reader feeding [`FeatureFlags`].
#[derive(Debug)]
pub struct StatusPoller<C> {
    guard: Arc<SyncGuard<C>>,
    flags: Arc<FeatureFlags>,
    interval: Duration,
    cursor: FeatureFlag,
    last_check: Option<Instant>,
}

impl<C: RemoteSyncChannel> StatusPoller<C> {
    /// Create a poller that starts at `connectivity` and checks on its first poll.
    pub fn new(guard: Arc<SyncGuard<C>>, flags: Arc<FeatureFlags>, interval: Duration) -> Self {
        Self {
            guard,
            flags,
            interval,
            cursor: FeatureFlag::Connectivity,
            last_check: None,
        }
    }

    /// The feature the next check will look at.
    pub fn cursor(&self) -> FeatureFlag {
        self.cursor
    }

    /// Time of the most recent check.
    pub fn last_check(&self) -> Option<Instant> {
        self.last_check
    }

    /// Advance the cycle by at most one check.
    ///
    /// Returns immediately with [`PollStep::Waiting`] if less than the
    /// interval has passed since the previous check. Otherwise performs the
    /// check for the current feature, records `now` and moves the cursor on,
    /// whether or not the check produced a value.
    pub async fn poll(&mut self, now: Instant) -> PollStep {
        if let Some(last) = self.last_check
            && now.saturating_duration_since(last) < self.interval
        {
            return PollStep::Waiting;
        }

        let feature = self.cursor;
        let observed = self.check(feature).await;

        if let Some(enabled) = observed {
            let previous = self.flags.set(feature, enabled);
            if previous != enabled {
                info!(
                    %feature,
                    "Feature {}",
                    if enabled { "enabled" } else { "disabled" }
                );
            }
        }

        self.last_check = Some(now);
        self.cursor = feature.next();
        PollStep::Checked { feature, observed }
    }

    async fn check(&self, feature: FeatureFlag) -> Option<bool> {
        if !feature.is_remote() {
            let up = self.guard.is_connected();
            debug!(up, "Checked link state");
            return Some(up);
        }

        match self.guard.read_status(feature).await {
            SyncOutcome::Completed(Ok(raw)) => {
                let parsed = parse_status(&raw);
                match parsed {
                    Some(enabled) => debug!(%feature, enabled, "Checked remote status"),
                    None => warn!(%feature, "Empty status response, keeping last value"),
                }
                parsed
            }
            // Already logged by the guard.
            SyncOutcome::Completed(Err(_)) | SyncOutcome::Skipped => None,
        }
    }
}

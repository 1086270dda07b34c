//! Remote synchronization layer for Vigil.
//!
//! Every reading the controller produces is mirrored to a remote store, and
//! every feature can be switched on or off from that store. This crate owns
//! both directions:
//!
//! - [`RemoteSyncChannel`]: the store interface (write a value, read a status).
//! - [`SyncGuard`]: one lock over the channel, skipped entirely while the
//!   [`ConnectivityProbe`] reports the link down.
//! - [`StatusPoller`]: reads one feature status per interval into the shared
//!   [`FeatureFlags`].
//! - [`MockRemoteStore`]: in-memory store for tests and the operator console.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio::time::Instant;
//! use vigil_core::FeatureFlag;
//! use vigil_sync::{FeatureFlags, LinkState, MockRemoteStore, StatusPoller, SyncGuard};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let (store, remote) = MockRemoteStore::new();
//! let guard = Arc::new(SyncGuard::new(store, Arc::new(LinkState::new(true))));
//! let flags = Arc::new(FeatureFlags::new());
//! let mut poller = StatusPoller::new(guard.clone(), flags.clone(), Duration::from_secs(1));
//!
//! remote.set_enabled(FeatureFlag::Rfid, false);
//!
//! let start = Instant::now();
//! poller.poll(start).await; // connectivity
//! poller.poll(start + Duration::from_secs(1)).await; // rfid
//! assert!(!flags.is_enabled(FeatureFlag::Rfid));
//! # }
//! ```

pub mod channel;
pub mod connectivity;
pub mod error;
pub mod flags;
pub mod guard;
pub mod mock;
pub mod poller;

pub use channel::{RemoteSyncChannel, StatusCode, is_success};
pub use connectivity::{ConnectivityProbe, LinkState};
pub use error::{Result, SyncError};
pub use flags::FeatureFlags;
pub use guard::{SyncGuard, SyncOutcome, SyncStats};
pub use mock::{MockRemoteStore, MockRemoteStoreHandle, WriteRecord};
pub use poller::{PollStep, StatusPoller};

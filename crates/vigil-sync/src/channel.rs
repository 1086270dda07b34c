//! The remote store interface.
//!
//! The remote store is a table with one row per signal. Writes update the
//! row's `value` column, status reads fetch its `status` column. How the
//! request travels (HTTP, auth headers, retries inside the transport) is the
//! implementor's business.

use std::future::Future;

use vigil_core::{FeatureFlag, SyncValue};

use crate::error::Result;

/// Status code reported by the remote store for a write.
pub type StatusCode = u16;

/// Returns `true` for 2xx status codes.
#[inline]
#[must_use]
pub fn is_success(status: StatusCode) -> bool {
    (200..300).contains(&status)
}

/// A connection to the remote store.
///
/// Implementations are not required to be safe for concurrent use; the
/// [`SyncGuard`](crate::SyncGuard) serializes every call. Futures must be
/// `Send` so the workers that report through the guard can be spawned.
///
/// Implementors may write the methods as `async fn`.
pub trait RemoteSyncChannel: Send + 'static {
    /// Write `value` into `column` of the row named after `signal`.
    fn write(
        &mut self,
        signal: FeatureFlag,
        column: &'static str,
        value: SyncValue,
    ) -> impl Future<Output = Result<StatusCode>> + Send;

    /// Read `column` of the row named after `signal`.
    ///
    /// An empty string means the row exists but the column holds nothing.
    fn read(
        &mut self,
        signal: FeatureFlag,
        column: &'static str,
    ) -> impl Future<Output = Result<String>> + Send;
}

//! In-memory remote store for testing and development.
//!
//! [`MockRemoteStore`] keeps one row per remote signal, records every request
//! and can be told to fail or to respond slowly. It also counts how many
//! requests are in flight at once, which lets tests observe whether callers
//! really serialize their access.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::trace;
use vigil_core::constants::{
    DEFAULT_REMOTE_TABLE, STATUS_COLUMN, STATUS_OFF, STATUS_ON, VALUE_COLUMN,
};
use vigil_core::{FeatureFlag, SyncValue};

use crate::channel::{RemoteSyncChannel, StatusCode};
use crate::error::{Result, SyncError};

/// Status code returned for a successful update.
pub const NO_CONTENT: StatusCode = 204;

/// A recorded write request.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRecord {
    pub signal: FeatureFlag,
    pub column: &'static str,
    pub value: SyncValue,
    /// Request body as it would be sent to the store.
    pub payload: serde_json::Value,
}

#[derive(Debug)]
struct Row {
    value: Option<SyncValue>,
    status: String,
}

#[derive(Debug)]
struct StoreState {
    table: String,
    rows: HashMap<FeatureFlag, Row>,
    writes: Vec<WriteRecord>,
    reads: Vec<(FeatureFlag, &'static str)>,
    failure: Option<SyncError>,
    write_status: StatusCode,
    latency: Duration,
}

#[derive(Debug, Default)]
struct InFlight {
    current: AtomicUsize,
    max: AtomicUsize,
}

impl InFlight {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-memory [`RemoteSyncChannel`].
///
/// Every remote row starts with status `"on"`.
#[derive(Debug)]
pub struct MockRemoteStore {
    state: Arc<Mutex<StoreState>>,
    in_flight: Arc<InFlight>,
}

impl MockRemoteStore {
    /// Create a store for the default table.
    pub fn new() -> (Self, MockRemoteStoreHandle) {
        Self::with_table(DEFAULT_REMOTE_TABLE)
    }

    /// Create a store for a named table.
    pub fn with_table(table: impl Into<String>) -> (Self, MockRemoteStoreHandle) {
        let rows = FeatureFlag::ALL
            .into_iter()
            .filter(|flag| flag.is_remote())
            .map(|flag| {
                (
                    flag,
                    Row {
                        value: None,
                        status: STATUS_ON.to_string(),
                    },
                )
            })
            .collect();

        let state = Arc::new(Mutex::new(StoreState {
            table: table.into(),
            rows,
            writes: Vec::new(),
            reads: Vec::new(),
            failure: None,
            write_status: NO_CONTENT,
            latency: Duration::ZERO,
        }));
        let in_flight = Arc::new(InFlight::default());

        let store = Self {
            state: Arc::clone(&state),
            in_flight: Arc::clone(&in_flight),
        };
        let handle = MockRemoteStoreHandle { state, in_flight };
        (store, handle)
    }

    /// Simulated round trip, outside of any lock.
    async fn round_trip(&self) {
        let latency = self.state.lock().latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

impl RemoteSyncChannel for MockRemoteStore {
    async fn write(
        &mut self,
        signal: FeatureFlag,
        column: &'static str,
        value: SyncValue,
    ) -> Result<StatusCode> {
        self.in_flight.enter();
        self.round_trip().await;
        self.in_flight.exit();

        let mut state = self.state.lock();
        if let Some(err) = state.failure.clone() {
            return Err(err);
        }
        if column != VALUE_COLUMN {
            return Err(SyncError::malformed(format!("unknown column '{column}'")));
        }

        let payload = value.payload(column);
        trace!(table = %state.table, %signal, %payload, "PATCH");

        let status = state.write_status;
        let row = state
            .rows
            .get_mut(&signal)
            .ok_or(SyncError::UnknownSignal(signal))?;
        row.value = Some(value.clone());
        state.writes.push(WriteRecord {
            signal,
            column,
            value,
            payload,
        });
        Ok(status)
    }

    async fn read(&mut self, signal: FeatureFlag, column: &'static str) -> Result<String> {
        self.in_flight.enter();
        self.round_trip().await;
        self.in_flight.exit();

        let mut state = self.state.lock();
        if let Some(err) = state.failure.clone() {
            return Err(err);
        }
        state.reads.push((signal, column));

        let row = state
            .rows
            .get(&signal)
            .ok_or(SyncError::UnknownSignal(signal))?;
        match column {
            STATUS_COLUMN => Ok(row.status.clone()),
            VALUE_COLUMN => Ok(row.value.as_ref().map(ToString::to_string).unwrap_or_default()),
            other => Err(SyncError::malformed(format!("unknown column '{other}'"))),
        }
    }
}

/// Handle for steering and inspecting a [`MockRemoteStore`].
#[derive(Debug, Clone)]
pub struct MockRemoteStoreHandle {
    state: Arc<Mutex<StoreState>>,
    in_flight: Arc<InFlight>,
}

impl MockRemoteStoreHandle {
    /// Set the `status` column of a row, e.g. `"on"` or `"off"`.
    ///
    /// Ignored for signals without a remote row.
    pub fn set_status(&self, signal: FeatureFlag, status: impl Into<String>) {
        if let Some(row) = self.state.lock().rows.get_mut(&signal) {
            row.status = status.into();
        }
    }

    /// Enable or disable a feature remotely.
    pub fn set_enabled(&self, signal: FeatureFlag, enabled: bool) {
        self.set_status(signal, if enabled { STATUS_ON } else { STATUS_OFF });
    }

    /// Last value written for a signal.
    pub fn value(&self, signal: FeatureFlag) -> Option<SyncValue> {
        self.state
            .lock()
            .rows
            .get(&signal)
            .and_then(|row| row.value.clone())
    }

    /// Make every subsequent request fail with `failure`, or succeed again with `None`.
    pub fn fail_with(&self, failure: Option<SyncError>) {
        self.state.lock().failure = failure;
    }

    /// Status code returned by subsequent writes.
    pub fn set_write_status(&self, status: StatusCode) {
        self.state.lock().write_status = status;
    }

    /// Delay every subsequent request by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.state.lock().latency = latency;
    }

    /// All recorded writes, oldest first.
    pub fn writes(&self) -> Vec<WriteRecord> {
        self.state.lock().writes.clone()
    }

    /// Values written for one signal, oldest first.
    pub fn writes_for(&self, signal: FeatureFlag) -> Vec<SyncValue> {
        self.state
            .lock()
            .writes
            .iter()
            .filter(|w| w.signal == signal)
            .map(|w| w.value.clone())
            .collect()
    }

    /// All recorded reads, oldest first.
    pub fn reads(&self) -> Vec<(FeatureFlag, &'static str)> {
        self.state.lock().reads.clone()
    }

    /// Forget recorded requests.
    pub fn clear_log(&self) {
        let mut state = self.state.lock();
        state.writes.clear();
        state.reads.clear();
    }

    /// Highest number of requests that were in flight at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.in_flight.max.load(Ordering::SeqCst)
    }

    /// Name of the table this store stands in for.
    pub fn table(&self) -> String {
        self.state.lock().table.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_rows_start_enabled() {
        let (mut store, _handle) = MockRemoteStore::new();
        for flag in FeatureFlag::ALL.into_iter().filter(|f| f.is_remote()) {
            assert_eq!(store.read(flag, STATUS_COLUMN).await.unwrap(), "on");
        }
    }

    #[tokio::test]
    async fn test_connectivity_has_no_row() {
        let (mut store, _handle) = MockRemoteStore::new();
        let err = store
            .write(FeatureFlag::Connectivity, VALUE_COLUMN, SyncValue::Int(1))
            .await
            .unwrap_err();
        assert_eq!(err, SyncError::UnknownSignal(FeatureFlag::Connectivity));
    }

    #[tokio::test]
    async fn test_write_records_payload_and_value() {
        let (mut store, handle) = MockRemoteStore::with_table("enclosure");
        assert_eq!(handle.table(), "enclosure");

        let status = store
            .write(FeatureFlag::Alarm, VALUE_COLUMN, SyncValue::from("armed"))
            .await
            .unwrap();
        assert_eq!(status, NO_CONTENT);

        let writes = handle.writes();
        assert_eq!(writes[0].payload, json!({ "value": "armed" }));
        assert_eq!(handle.value(FeatureFlag::Alarm), Some(SyncValue::from("armed")));
        assert_eq!(
            store.read(FeatureFlag::Alarm, VALUE_COLUMN).await.unwrap(),
            "armed"
        );
    }

    #[tokio::test]
    async fn test_unknown_column_is_malformed() {
        let (mut store, _handle) = MockRemoteStore::new();
        let err = store.read(FeatureFlag::Rfid, "colour").await.unwrap_err();
        assert!(matches!(err, SyncError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let (mut store, handle) = MockRemoteStore::new();
        handle.fail_with(Some(SyncError::NotConnected));

        assert_eq!(
            store.read(FeatureFlag::Rfid, STATUS_COLUMN).await,
            Err(SyncError::NotConnected)
        );
        assert!(handle.reads().is_empty());
    }

    #[tokio::test]
    async fn test_set_enabled_and_clear_log() {
        let (mut store, handle) = MockRemoteStore::new();
        handle.set_enabled(FeatureFlag::Motion, false);

        assert_eq!(store.read(FeatureFlag::Motion, STATUS_COLUMN).await.unwrap(), "off");
        assert_eq!(handle.reads().len(), 1);

        handle.clear_log();
        assert!(handle.reads().is_empty());
        assert_eq!(handle.max_in_flight(), 1);
    }
}

//! Core constants for the Vigil enclosure controller.
//!
//! This module defines the fixed timing, sizing, and wire-vocabulary values
//! shared by every crate in the workspace. The defaults in
//! [`ControllerConfig`](crate::config::ControllerConfig) are derived from these
//! constants, so changing a value here changes the reference behavior.
//!
//! # Usage
//!
//! ```
//! use std::time::Duration;
//! use vigil_core::constants::*;
//!
//! let timeout = Duration::from_millis(GRANT_TIMEOUT_MS);
//! assert_eq!(timeout, Duration::from_secs(5));
//!
//! assert!(ALARM_ARMING_OFFSET < VIBRATION_THRESHOLD);
//! ```

// ============================================================================
// Access Control
// ============================================================================

/// How long an access grant stays active (milliseconds).
///
/// A grant created at `T` is active for every `now < T + GRANT_TIMEOUT_MS`
/// and expires at exactly `T + GRANT_TIMEOUT_MS`.
pub const GRANT_TIMEOUT_MS: u64 = 5_000;

/// How long the rejection message stays on screen (milliseconds).
pub const REJECTION_DWELL_MS: u64 = 2_000;

/// Maximum number of keys held in the keypad buffer.
///
/// Further keys are dropped silently until the buffer is submitted or cleared.
pub const KEYPAD_MAX_LENGTH: usize = 8;

/// Default keypad access code.
pub const DEFAULT_KEYPAD_CODE: &str = "123456";

/// Card UIDs authorized out of the box, in normalized form.
pub const DEFAULT_AUTHORIZED_CARDS: [&str; 2] = ["7A 77 C7 B2", "43 10 73 0E"];

// ============================================================================
// Status Polling
// ============================================================================

/// Minimum time between two status-poller steps (milliseconds).
///
/// The poller performs one feature check per elapsed interval, so a full
/// cycle over all seven features takes at least `7 * POLL_INTERVAL_MS`.
pub const POLL_INTERVAL_MS: u64 = 1_000;

/// Default period at which the runtime invokes the status poller (milliseconds).
///
/// The poller self-paces, so this only needs to be at or below
/// [`POLL_INTERVAL_MS`] for the staleness bound to hold.
pub const POLL_DRIVER_PERIOD_MS: u64 = 250;

// ============================================================================
// Sensor Sampling
// ============================================================================

/// Vibration amplitude at or above which a hit is reported.
///
/// The analog input is a 12-bit reading (0-4095).
pub const VIBRATION_THRESHOLD: u16 = 4_000;

/// Distance below [`VIBRATION_THRESHOLD`] at which the buzzer is armed.
///
/// The arming threshold is lower than the reporting threshold, producing
/// a hysteresis band of this width.
pub const ALARM_ARMING_OFFSET: u16 = 500;

/// Minimum time between two motion samples (milliseconds).
///
/// PIR motion sensors need roughly 250-300 ms between reads.
pub const MOTION_SAMPLE_INTERVAL_MS: u64 = 250;

/// Period of the input and sensor worker loops (milliseconds).
pub const WORKER_PERIOD_MS: u64 = 50;

// ============================================================================
// Remote Store Vocabulary
// ============================================================================

/// Default name of the remote table holding one row per signal.
pub const DEFAULT_REMOTE_TABLE: &str = "sensor_data";

/// Column receiving live readings.
pub const VALUE_COLUMN: &str = "value";

/// Column holding the remote enable/disable status of a feature.
pub const STATUS_COLUMN: &str = "status";

/// Status string meaning "feature enabled".
pub const STATUS_ON: &str = "on";

/// Status string meaning "feature disabled".
pub const STATUS_OFF: &str = "off";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arming_threshold_below_report_threshold() {
        assert!(ALARM_ARMING_OFFSET > 0);
        assert!(ALARM_ARMING_OFFSET < VIBRATION_THRESHOLD);
    }

    #[test]
    fn test_default_code_fits_keypad_buffer() {
        assert!(DEFAULT_KEYPAD_CODE.len() <= KEYPAD_MAX_LENGTH);
    }

    #[test]
    fn test_poll_driver_not_slower_than_interval() {
        assert!(POLL_DRIVER_PERIOD_MS <= POLL_INTERVAL_MS);
    }
}

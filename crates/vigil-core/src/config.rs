//! Controller configuration.
//!
//! All tunables of the controller live in [`ControllerConfig`], which can be
//! built in code with the builder-style setters or loaded from a TOML file.
//! Every field has a default matching the reference behavior in
//! [`constants`](crate::constants), so a config file only needs to name the
//! values it changes.
//!
//! # Example
//!
//! ```
//! use vigil_core::config::ControllerConfig;
//!
//! let config = ControllerConfig::from_toml_str(r#"
//!     [credentials]
//!     keypad_code = "2580"
//!
//!     [credentials.cards]
//!     "7A 77 C7 B2" = true
//!     "DE AD BE EF" = false
//! "#).unwrap();
//!
//! assert!(config.credentials.keypad_code.matches("2580"));
//! assert_eq!(config.timing.grant_timeout().as_secs(), 5);
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::constants::*;
use crate::error::Error;
use crate::types::{CardUid, KeypadCode};
use crate::Result;

/// Complete controller configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Keypad code and card allow-list.
    pub credentials: CredentialsConfig,

    /// Timeouts, intervals and loop periods.
    pub timing: TimingConfig,

    /// Sensor thresholds.
    pub sensors: SensorConfig,

    /// Remote store settings.
    pub remote: RemoteConfig,
}

impl ControllerConfig {
    /// Load and validate a configuration file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// fails [`validate`](Self::validate).
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Parse and validate a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ControllerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        self.timing.validate()?;
        self.sensors.validate()?;

        if self.remote.table.trim().is_empty() {
            return Err(Error::Config("remote.table must not be empty".to_string()));
        }
        Ok(())
    }

    /// Replace the keypad code.
    pub fn keypad_code(mut self, code: KeypadCode) -> Self {
        self.credentials.keypad_code = code;
        self
    }

    /// Add or overwrite a card in the allow-list.
    pub fn card(mut self, uid: CardUid, authorized: bool) -> Self {
        self.credentials.cards.insert(uid, authorized);
        self
    }

    /// Set the grant timeout.
    pub fn grant_timeout(mut self, timeout: Duration) -> Self {
        self.timing.grant_timeout_ms = duration_ms(timeout);
        self
    }

    /// Set the status-poll interval.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.timing.poll_interval_ms = duration_ms(interval);
        self
    }
}

/// Credentials accepted by the access controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Code that grants access when submitted with `#`.
    pub keypad_code: KeypadCode,

    /// Card UID to authorization bit. Unknown cards are not authorized.
    pub cards: BTreeMap<CardUid, bool>,
}

impl CredentialsConfig {
    /// Look up a card in the allow-list.
    #[must_use]
    pub fn is_card_authorized(&self, uid: &CardUid) -> bool {
        self.cards.get(uid).copied().unwrap_or(false)
    }
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        let cards = DEFAULT_AUTHORIZED_CARDS
            .iter()
            .filter_map(|raw| raw.parse::<CardUid>().ok())
            .map(|uid| (uid, true))
            .collect();

        Self {
            keypad_code: KeypadCode::new(DEFAULT_KEYPAD_CODE)
                .unwrap_or_else(|_| unreachable!("default keypad code is valid")),
            cards,
        }
    }
}

/// Timing configuration, all values in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub grant_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub rejection_dwell_ms: u64,
    pub motion_sample_interval_ms: u64,
    pub worker_period_ms: u64,
    pub poll_driver_period_ms: u64,
}

impl TimingConfig {
    pub fn grant_timeout(&self) -> Duration {
        Duration::from_millis(self.grant_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn rejection_dwell(&self) -> Duration {
        Duration::from_millis(self.rejection_dwell_ms)
    }

    pub fn motion_sample_interval(&self) -> Duration {
        Duration::from_millis(self.motion_sample_interval_ms)
    }

    pub fn worker_period(&self) -> Duration {
        Duration::from_millis(self.worker_period_ms)
    }

    pub fn poll_driver_period(&self) -> Duration {
        Duration::from_millis(self.poll_driver_period_ms)
    }

    fn validate(&self) -> Result<()> {
        let fields = [
            ("grant_timeout_ms", self.grant_timeout_ms),
            ("poll_interval_ms", self.poll_interval_ms),
            ("worker_period_ms", self.worker_period_ms),
            ("poll_driver_period_ms", self.poll_driver_period_ms),
        ];

        for (name, value) in fields {
            if value == 0 {
                return Err(Error::Config(format!("timing.{name} must be greater than 0")));
            }
        }
        Ok(())
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            grant_timeout_ms: GRANT_TIMEOUT_MS,
            poll_interval_ms: POLL_INTERVAL_MS,
            rejection_dwell_ms: REJECTION_DWELL_MS,
            motion_sample_interval_ms: MOTION_SAMPLE_INTERVAL_MS,
            worker_period_ms: WORKER_PERIOD_MS,
            poll_driver_period_ms: POLL_DRIVER_PERIOD_MS,
        }
    }
}

/// Sensor thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Amplitude at or above which a vibration hit is reported.
    pub vibration_threshold: u16,

    /// How far below the report threshold the buzzer arms.
    pub alarm_arming_offset: u16,
}

impl SensorConfig {
    /// Amplitude at or above which the buzzer sounds for vibration.
    #[must_use]
    pub fn arming_threshold(&self) -> u16 {
        self.vibration_threshold.saturating_sub(self.alarm_arming_offset)
    }

    fn validate(&self) -> Result<()> {
        if self.alarm_arming_offset >= self.vibration_threshold {
            return Err(Error::Config(format!(
                "sensors.alarm_arming_offset ({}) must be below vibration_threshold ({})",
                self.alarm_arming_offset, self.vibration_threshold
            )));
        }
        Ok(())
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            vibration_threshold: VIBRATION_THRESHOLD,
            alarm_arming_offset: ALARM_ARMING_OFFSET,
        }
    }
}

/// Remote store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Table holding one row per signal.
    pub table: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            table: DEFAULT_REMOTE_TABLE.to_string(),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

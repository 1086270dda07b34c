//! Controller core for the Vigil enclosure.
//!
//! This crate holds the logic that runs on the enclosure: keypad and card
//! access decisions with timed grants, sensor sampling with the local alarm,
//! and the worker tasks that tie them to the remote store.
//!
//! # Architecture
//!
//! ```text
//!   keypad, RFID ──> input worker ──> AccessController ──┐
//!                                         │              │
//!                                    GrantBoard          │ writes
//!                                         │              v
//!   sensors ─────> sensor worker ──> SensorMonitor ──> SyncGuard ──> remote store
//!                                                        ^   │
//!                    poll driver ──> StatusPoller ───────┘   │ reads
//!                                         │                  │
//!                                         v                  │
//!                                    FeatureFlags <──────────┘
//! ```

pub mod access;
pub mod display;
pub mod grant;
pub mod keypad;
pub mod runtime;
pub mod sensors;

pub use access::{AccessController, CardOutcome, KeyOutcome};
pub use display::{LcdDisplay, LcdView};
pub use grant::{AccessGrant, GrantBoard};
pub use keypad::KeypadBuffer;
pub use runtime::{Controller, ControllerHandle, InputDevices};
pub use sensors::{SensorInputs, SensorMonitor, SensorReport};

//! Mock GPIO and ADC pins.
//!
//! Each pin is split into a device half, handed to the worker that samples
//! it, and a handle half used by tests or the operator console to drive it.
//! Both halves share a single atomic.

use crate::traits::{ADC_MAX, AlarmOutput, AnalogInput, DigitalInput};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};

/// Mock digital input pin.
#[derive(Debug)]
pub struct MockDigitalInput {
    level: Arc<AtomicBool>,
}

impl MockDigitalInput {
    /// Create a pin starting at the given level.
    pub fn new(initial_high: bool) -> (Self, MockDigitalInputHandle) {
        let level = Arc::new(AtomicBool::new(initial_high));
        (
            Self {
                level: Arc::clone(&level),
            },
            MockDigitalInputHandle { level },
        )
    }
}

impl DigitalInput for MockDigitalInput {
    fn is_high(&self) -> bool {
        self.level.load(Ordering::SeqCst)
    }
}

/// Handle for driving a [`MockDigitalInput`].
#[derive(Debug, Clone)]
pub struct MockDigitalInputHandle {
    level: Arc<AtomicBool>,
}

impl MockDigitalInputHandle {
    pub fn set_high(&self, high: bool) {
        self.level.store(high, Ordering::SeqCst);
    }

    pub fn is_high(&self) -> bool {
        self.level.load(Ordering::SeqCst)
    }
}

/// Mock 12-bit analog input.
#[derive(Debug)]
pub struct MockAnalogInput {
    value: Arc<AtomicU16>,
}

impl MockAnalogInput {
    /// Create an ADC pin starting at the given raw value.
    pub fn new(initial: u16) -> (Self, MockAnalogInputHandle) {
        let value = Arc::new(AtomicU16::new(initial.min(ADC_MAX)));
        (
            Self {
                value: Arc::clone(&value),
            },
            MockAnalogInputHandle { value },
        )
    }
}

impl AnalogInput for MockAnalogInput {
    fn read(&mut self) -> u16 {
        self.value.load(Ordering::SeqCst)
    }
}

/// Handle for driving a [`MockAnalogInput`].
#[derive(Debug, Clone)]
pub struct MockAnalogInputHandle {
    value: Arc<AtomicU16>,
}

impl MockAnalogInputHandle {
    /// Set the raw reading. Values above the 12-bit range are clamped.
    pub fn set(&self, value: u16) {
        self.value.store(value.min(ADC_MAX), Ordering::SeqCst);
    }

    pub fn get(&self) -> u16 {
        self.value.load(Ordering::SeqCst)
    }
}

/// Mock buzzer output.
#[derive(Debug)]
pub struct MockAlarm {
    on: Arc<AtomicBool>,
}

impl MockAlarm {
    /// Create a buzzer that starts low.
    pub fn new() -> (Self, MockAlarmHandle) {
        let on = Arc::new(AtomicBool::new(false));
        (
            Self {
                on: Arc::clone(&on),
            },
            MockAlarmHandle { on },
        )
    }
}

impl AlarmOutput for MockAlarm {
    fn set(&mut self, on: bool) {
        self.on.store(on, Ordering::SeqCst);
    }

    fn is_on(&self) -> bool {
        self.on.load(Ordering::SeqCst)
    }
}

/// Read-only view of a [`MockAlarm`].
#[derive(Debug, Clone)]
pub struct MockAlarmHandle {
    on: Arc<AtomicBool>,
}

impl MockAlarmHandle {
    pub fn is_on(&self) -> bool {
        self.on.load(Ordering::SeqCst)
    }
}

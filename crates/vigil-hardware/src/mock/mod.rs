//! Mock device implementations for testing and development.
//!
//! Every mock comes as a `(device, handle)` pair. The device half implements
//! the trait from [`crate::traits`] and is moved into a worker. The handle
//! half stays with the test or console and drives or inspects the device.

pub mod display;
pub mod gpio;
pub mod keypad;
pub mod rfid;

pub use display::{DisplayEvent, MockChime, MockChimeHandle, MockDisplay, MockDisplayHandle};
pub use gpio::{
    MockAlarm, MockAlarmHandle, MockAnalogInput, MockAnalogInputHandle, MockDigitalInput,
    MockDigitalInputHandle,
};
pub use keypad::{MockKeypad, MockKeypadHandle};
pub use rfid::{MockRfid, MockRfidHandle};

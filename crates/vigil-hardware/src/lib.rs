//! Peripheral abstraction layer for the Vigil enclosure controller.
//!
//! This crate defines the traits the controller core uses to talk to the
//! enclosure hardware and ships mock implementations of each one, so the
//! whole controller can run and be tested without a board attached.
//!
//! # Design
//!
//! - **Non-blocking**: every input trait is a poll. A keypad or reader with
//!   nothing to report returns `Ok(None)` immediately.
//! - **Owned by one worker**: traits require `Send` only. A device is moved
//!   into the tokio task that polls it and is never shared.
//! - **Error-aware**: fallible reads return [`Result<T>`] with a
//!   [`HardwareError`].
//!
//! # Devices
//!
//! | Trait | Hardware |
//! |-------|----------|
//! | [`KeypadDevice`] | 4x4 matrix keypad behind an I2C expander |
//! | [`RfidDevice`] | MFRC522 card reader |
//! | [`DisplayDevice`] | 16x2 character LCD |
//! | [`AlarmOutput`] | buzzer pin |
//! | [`Chime`] | welcome tone on the buzzer |
//! | [`DigitalInput`] | motion sensor, reed switch |
//! | [`AnalogInput`] | vibration sensor |
//!
//! ```
//! use vigil_hardware::mock::MockKeypad;
//! use vigil_hardware::traits::{KeypadDevice, KeypadInput};
//!
//! # #[tokio::main]
//! # async fn main() -> vigil_hardware::Result<()> {
//! let (mut keypad, handle) = MockKeypad::new();
//! handle.send_input(KeypadInput::Digit(4)).await?;
//!
//! while let Some(input) = keypad.try_read_input()? {
//!     println!("pressed {}", input.to_char());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [`KeypadDevice`]: traits::KeypadDevice
//! [`RfidDevice`]: traits::RfidDevice
//! [`DisplayDevice`]: traits::DisplayDevice
//! [`AlarmOutput`]: traits::AlarmOutput
//! [`Chime`]: traits::Chime
//! [`DigitalInput`]: traits::DigitalInput
//! [`AnalogInput`]: traits::AnalogInput

pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

pub use error::{HardwareError, Result};
pub use traits::{
    ADC_MAX, AlarmOutput, AnalogInput, CardData, Chime, DigitalInput, DisplayDevice,
    KeypadDevice, KeypadInput, RfidDevice,
};
pub use types::DeviceInfo;

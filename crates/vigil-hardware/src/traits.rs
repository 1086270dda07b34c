//! Hardware device trait definitions.
//!
//! This module defines the contract between the controller core and the
//! enclosure peripherals: keypad, RFID reader, character display, buzzer and
//! the raw sensor inputs. Every method is non-blocking. Input devices are
//! polled once per worker tick and report `Ok(None)` when nothing is pending,
//! so a slow or idle device never stalls the loop that polls it.
//!
//! All traits require `Send` so a device can be moved into the tokio task
//! that owns it.

use crate::error::{HardwareError, Result};
use crate::types::DeviceInfo;

/// A key pressed on the 4x4 matrix keypad.
///
/// ```text
/// 1 2 3 A
/// 4 5 6 B
/// 7 8 9 C
/// * 0 # D
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeypadInput {
    /// Numeric digit (0-9).
    Digit(u8),

    /// Letter key (A-D).
    Letter(char),

    /// Star key (*), clears the entry.
    Star,

    /// Hash key (#), submits the entry.
    Hash,
}

impl KeypadInput {
    /// Map a keymap character to an input.
    ///
    /// Letters are accepted in either case.
    ///
    /// # Errors
    ///
    /// Returns an error for characters that are not on the keypad.
    ///
    /// # Examples
    ///
    /// ```
    /// use vigil_hardware::traits::KeypadInput;
    ///
    /// assert_eq!(KeypadInput::from_char('7').unwrap(), KeypadInput::Digit(7));
    /// assert_eq!(KeypadInput::from_char('b').unwrap(), KeypadInput::Letter('B'));
    /// assert_eq!(KeypadInput::from_char('#').unwrap(), KeypadInput::Hash);
    /// assert!(KeypadInput::from_char('E').is_err());
    /// ```
    pub fn from_char(c: char) -> Result<Self> {
        match c.to_ascii_uppercase() {
            '*' => Ok(Self::Star),
            '#' => Ok(Self::Hash),
            d @ '0'..='9' => Ok(Self::Digit(d as u8 - b'0')),
            l @ 'A'..='D' => Ok(Self::Letter(l)),
            other => Err(HardwareError::invalid_data(format!(
                "Key '{}' is not on the keypad",
                other
            ))),
        }
    }

    /// The keymap character for this input.
    pub fn to_char(self) -> char {
        match self {
            Self::Digit(d) => char::from(b'0' + d),
            Self::Letter(l) => l,
            Self::Star => '*',
            Self::Hash => '#',
        }
    }
}

/// Keypad device abstraction.
///
/// # Examples
///
/// ```
/// use vigil_hardware::traits::{KeypadDevice, KeypadInput};
/// use vigil_hardware::error::Result;
///
/// fn drain<K: KeypadDevice>(keypad: &mut K) -> Result<String> {
///     let mut keys = String::new();
///     while let Some(input) = keypad.try_read_input()? {
///         keys.push(input.to_char());
///     }
///     Ok(keys)
/// }
/// ```
pub trait KeypadDevice: Send {
    /// Return the next pending key press, if any.
    ///
    /// Never waits for a key. Returns `Ok(None)` when no key is pending.
    ///
    /// # Errors
    ///
    /// Returns an error if the device is disconnected or the bus read fails.
    fn try_read_input(&mut self) -> Result<Option<KeypadInput>>;

    /// Get device information.
    fn info(&self) -> DeviceInfo;
}

/// Card presented to the RFID reader.
///
/// The UID is kept exactly as the reader returned it. Length validation and
/// normalization happen in the access controller, where a malformed UID is
/// treated as an unauthorized card.
#[derive(Debug, Clone)]
pub struct CardData {
    /// Card unique identifier bytes.
    pub uid: Vec<u8>,

    /// Timestamp when the card was read.
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl CardData {
    /// Create new card data with the current timestamp.
    pub fn new(uid: Vec<u8>) -> Self {
        Self {
            uid,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Get the UID as a compact hexadecimal string.
    pub fn uid_hex(&self) -> String {
        self.uid.iter().map(|b| format!("{:02X}", b)).collect()
    }
}

/// RFID reader device abstraction.
pub trait RfidDevice: Send {
    /// Return the card currently presented to the reader, if a new one is present.
    ///
    /// Never waits for a card. Returns `Ok(None)` when no new card is present.
    ///
    /// # Errors
    ///
    /// Returns an error if the card serial cannot be read or the reader is
    /// disconnected.
    fn try_read_card(&mut self) -> Result<Option<CardData>>;

    /// Get reader information.
    fn info(&self) -> DeviceInfo;
}

/// Character display used for entry feedback.
///
/// Calls are fire-and-forget: the controller never inspects a result.
pub trait DisplayDevice: Send {
    /// Show the code prompt with one mask character per buffered key.
    fn show_idle_prompt(&mut self, masked_len: usize);

    /// Show the access-granted screen.
    fn show_granted(&mut self);

    /// Show the wrong-code screen.
    fn show_rejected(&mut self);
}

/// Buzzer output driven by the alarm logic.
pub trait AlarmOutput: Send {
    /// Drive the buzzer high (`true`) or low (`false`).
    fn set(&mut self, on: bool);

    /// Current output level.
    fn is_on(&self) -> bool;
}

/// Audible feedback played when access is granted.
///
/// Tone sequencing belongs to the implementation.
pub trait Chime: Send {
    fn play_welcome(&mut self);
}

/// Digital input pin.
pub trait DigitalInput: Send {
    /// Read the logic level. Returns `true` if the pin is high.
    fn is_high(&self) -> bool;
}

/// Analog input pin.
pub trait AnalogInput: Send {
    /// Read the raw ADC value (12-bit, 0-4095).
    fn read(&mut self) -> u16;
}

/// Maximum value returned by a 12-bit [`AnalogInput`].
pub const ADC_MAX: u16 = 4095;

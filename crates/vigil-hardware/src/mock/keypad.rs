//! Mock keypad implementation for testing and development.
//!
//! Key presses are queued through a [`MockKeypadHandle`] and drained by the
//! input worker one per poll, the same way the I2C expander is scanned.

use crate::{
    HardwareError, Result,
    traits::{KeypadDevice, KeypadInput},
    types::DeviceInfo,
};
use tokio::sync::mpsc::{self, error::TryRecvError};

/// Mock keypad device.
///
/// # Examples
///
/// ```
/// use vigil_hardware::mock::MockKeypad;
/// use vigil_hardware::traits::{KeypadDevice, KeypadInput};
///
/// #[tokio::main]
/// async fn main() -> vigil_hardware::Result<()> {
///     let (mut keypad, handle) = MockKeypad::new();
///
///     assert_eq!(keypad.try_read_input()?, None);
///
///     handle.send_keys("12#").await?;
///     assert_eq!(keypad.try_read_input()?, Some(KeypadInput::Digit(1)));
///     assert_eq!(keypad.try_read_input()?, Some(KeypadInput::Digit(2)));
///     assert_eq!(keypad.try_read_input()?, Some(KeypadInput::Hash));
///     assert_eq!(keypad.try_read_input()?, None);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockKeypad {
    input_rx: mpsc::Receiver<KeypadInput>,
    name: String,
}

impl MockKeypad {
    /// Create a new mock keypad with the default name.
    pub fn new() -> (Self, MockKeypadHandle) {
        Self::with_name("Mock Keypad".to_string())
    }

    /// Create a new mock keypad with a custom name.
    pub fn with_name(name: String) -> (Self, MockKeypadHandle) {
        let (input_tx, input_rx) = mpsc::channel(32);

        let keypad = Self {
            input_rx,
            name: name.clone(),
        };
        let handle = MockKeypadHandle { input_tx, name };

        (keypad, handle)
    }
}

impl KeypadDevice for MockKeypad {
    fn try_read_input(&mut self) -> Result<Option<KeypadInput>> {
        match self.input_rx.try_recv() {
            Ok(input) => Ok(Some(input)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                Err(HardwareError::disconnected(self.name.clone()))
            }
        }
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo::new(self.name.clone(), "Mock 4x4 Keypad")
    }
}

/// Handle for feeding key presses into a [`MockKeypad`].
///
/// Cloneable and shareable across tasks.
#[derive(Debug, Clone)]
pub struct MockKeypadHandle {
    input_tx: mpsc::Sender<KeypadInput>,
    name: String,
}

impl MockKeypadHandle {
    /// Queue a single key press.
    ///
    /// # Errors
    ///
    /// Returns an error if the keypad has been dropped.
    pub async fn send_input(&self, input: KeypadInput) -> Result<()> {
        self.input_tx
            .send(input)
            .await
            .map_err(|_| HardwareError::disconnected(self.name.clone()))
    }

    /// Queue a key press without waiting for channel capacity.
    ///
    /// # Errors
    ///
    /// Returns an error if the keypad has been dropped or the queue is full.
    pub fn try_send_input(&self, input: KeypadInput) -> Result<()> {
        self.input_tx.try_send(input).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => HardwareError::queue_full(self.name.clone()),
            mpsc::error::TrySendError::Closed(_) => {
                HardwareError::disconnected(self.name.clone())
            }
        })
    }

    /// Queue every key in a keymap string, e.g. `"123456#"`.
    ///
    /// # Errors
    ///
    /// Returns an error on the first character that is not on the keypad, or
    /// if the keypad has been dropped. Keys before the bad character are sent.
    pub async fn send_keys(&self, keys: &str) -> Result<()> {
        for c in keys.chars() {
            self.send_input(KeypadInput::from_char(c)?).await?;
        }
        Ok(())
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

//! Mock RFID reader implementation for testing and development.

use crate::{
    HardwareError, Result,
    traits::{CardData, RfidDevice},
    types::DeviceInfo,
};
use tokio::sync::mpsc::{self, error::TryRecvError};

/// Internal event type for the mock reader.
#[derive(Debug, Clone)]
enum CardEvent {
    CardPresented(CardData),
    ReadFailure(String),
}

/// Mock RFID reader.
///
/// Each card presented through the [`MockRfidHandle`] is reported exactly
/// once, which mirrors the "new card present" latch of an MFRC522.
///
/// # Examples
///
/// ```
/// use vigil_hardware::mock::MockRfid;
/// use vigil_hardware::traits::RfidDevice;
///
/// #[tokio::main]
/// async fn main() -> vigil_hardware::Result<()> {
///     let (mut reader, handle) = MockRfid::new();
///
///     handle.present_card(vec![0x7A, 0x77, 0xC7, 0xB2]).await?;
///
///     let card = reader.try_read_card()?.expect("card pending");
///     assert_eq!(card.uid_hex(), "7A77C7B2");
///     assert!(reader.try_read_card()?.is_none());
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockRfid {
    event_rx: mpsc::Receiver<CardEvent>,
    name: String,
}

impl MockRfid {
    /// Create a new mock reader with the default name.
    pub fn new() -> (Self, MockRfidHandle) {
        Self::with_name("Mock RFID Reader".to_string())
    }

    /// Create a new mock reader with a custom name.
    pub fn with_name(name: String) -> (Self, MockRfidHandle) {
        let (event_tx, event_rx) = mpsc::channel(32);

        let reader = Self {
            event_rx,
            name: name.clone(),
        };
        let handle = MockRfidHandle { event_tx, name };

        (reader, handle)
    }
}

impl RfidDevice for MockRfid {
    fn try_read_card(&mut self) -> Result<Option<CardData>> {
        match self.event_rx.try_recv() {
            Ok(CardEvent::CardPresented(card)) => Ok(Some(card)),
            Ok(CardEvent::ReadFailure(message)) => Err(HardwareError::card_read(message)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                Err(HardwareError::disconnected(self.name.clone()))
            }
        }
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo::new(self.name.clone(), "Mock MFRC522")
    }
}

/// Handle for presenting cards to a [`MockRfid`].
#[derive(Debug, Clone)]
pub struct MockRfidHandle {
    event_tx: mpsc::Sender<CardEvent>,
    name: String,
}

impl MockRfidHandle {
    /// Present a card with the given UID bytes.
    ///
    /// No length validation happens here so malformed UIDs can be exercised.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn present_card(&self, uid: Vec<u8>) -> Result<()> {
        self.send(CardEvent::CardPresented(CardData::new(uid))).await
    }

    /// Make the next poll fail with a card read error.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn inject_read_failure(&self, message: impl Into<String>) -> Result<()> {
        self.send(CardEvent::ReadFailure(message.into())).await
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, event: CardEvent) -> Result<()> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| HardwareError::disconnected(self.name.clone()))
    }
}

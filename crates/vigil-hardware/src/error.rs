//! Peripheral errors.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// The device is gone; every further poll will fail the same way.
    #[error("{device} disconnected")]
    Disconnected { device: String },

    /// A transfer on the I2C or SPI bus failed. Usually transient.
    #[error("Bus fault: {0}")]
    Bus(String),

    /// The device answered with something that is not a valid reading.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The reader saw a card but could not complete the UID exchange.
    #[error("Card read failed: {0}")]
    CardRead(String),

    /// A simulated device's input queue is full.
    #[error("{device} input queue full")]
    QueueFull { device: String },
}

impl HardwareError {
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    pub fn bus(message: impl Into<String>) -> Self {
        Self::Bus(message.into())
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData(message.into())
    }

    pub fn card_read(message: impl Into<String>) -> Self {
        Self::CardRead(message.into())
    }

    pub fn queue_full(device: impl Into<String>) -> Self {
        Self::QueueFull {
            device: device.into(),
        }
    }

    /// Returns `true` if the device is gone and further polls will keep failing.
    pub fn is_disconnected(&self) -> bool {
        matches!(self, Self::Disconnected { .. })
    }
}

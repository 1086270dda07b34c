use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Credential errors
    #[error("Invalid card UID: {0}")]
    InvalidCardUid(String),

    #[error("Invalid keypad code: {0}")]
    InvalidKeypadCode(String),

    #[error("Unknown feature flag: {0}")]
    UnknownFeature(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

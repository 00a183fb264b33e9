use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Client-correctable input problem. The message is shown to the caller as-is.
    #[error("{0}")]
    Validation(String),

    #[error("Item not found")]
    NotFound(String),

    #[error("Item has already been claimed")]
    AlreadyClaimed,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

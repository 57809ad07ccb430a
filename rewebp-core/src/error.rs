use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already converted: {0}")]
    AlreadyConverted(String),

    #[error("Conversion failed: {0}")]
    ConversionFailed(String),

    #[error("Reference rewrite failed: {0}")]
    ReferenceRewriteFailed(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// Benign skip conditions: the item needs no work, but by the batch
    /// convention it still counts toward the error tally.
    pub fn is_benign(&self) -> bool {
        matches!(self, ConvertError::AlreadyConverted(_))
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BoardwalkError>;

#[derive(Debug, Error)]
pub enum BoardwalkError {
    #[error("Board not found: {0}")]
    BoardNotFound(String),

    #[error("Invalid list ID format: {0}")]
    InvalidListId(String),

    #[error("Invalid card ID format: {0}")]
    InvalidCardId(String),

    #[error("Invalid board ID format: {0}")]
    InvalidBoardId(String),

    #[error("Board name must not be empty")]
    InvalidBoardName,

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Sync worker for the board has shut down")]
    SyncClosed,
}

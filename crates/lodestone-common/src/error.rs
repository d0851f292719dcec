//! Error types for Lodestone.

use thiserror::Error;

/// Result type alias using LodestoneError.
pub type Result<T> = std::result::Result<T, LodestoneError>;

/// Errors that can occur in Lodestone operations.
#[derive(Debug, Error)]
pub enum LodestoneError {
    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error: {0}")]
    IoError(String),

    // Buffer pool errors
    #[error("Buffer pool exhausted, all frames pinned")]
    PoolExhausted,

    #[error("Page not found: {page_id}")]
    PageNotFound { page_id: i32 },

    #[error("Page {page_id} still pinned ({pin_count} pins)")]
    PinViolation { page_id: i32, pin_count: u32 },

    // Index errors
    #[error("Duplicate key")]
    DuplicateKey,

    #[error("Key not found")]
    KeyNotFound,

    #[error("B+ tree corrupted: {0}")]
    TreeCorrupted(String),

    #[error("Header page full, unable to register index")]
    HeaderFull,

    // WAL errors
    #[error("WAL write failed: {0}")]
    WalWriteFailed(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

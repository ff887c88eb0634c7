use std::fmt;
use thiserror::Error;

/// Which of the two mandatory uploads a failure belongs to. Both the badge
/// image and the metadata document must be pinned before any ledger work
/// can start, so the caller needs to know which one went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Image,
    Metadata,
}

impl fmt::Display for UploadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadKind::Image => write!(f, "image"),
            UploadKind::Metadata => write!(f, "metadata"),
        }
    }
}

/// Error types shared across the badge pipeline
#[derive(Error, Debug)]
pub enum BadgeError {
    /// Missing or malformed request fields
    #[error("Validation error: {0}")]
    Validation(String),

    /// The background image bytes could not be decoded
    #[error("Image decode error: {0}")]
    Decode(String),

    /// The badge image could not be produced or encoded
    #[error("Render error: {0}")]
    Render(String),

    /// The pinning service rejected an upload or was unreachable
    #[error("Upload error ({kind}): {reason}")]
    Upload { kind: UploadKind, reason: String },

    /// A ledger transaction failed to reach a successful receipt
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Shared result type
pub type BadgeResult<T> = Result<T, BadgeError>;

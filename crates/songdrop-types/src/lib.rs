//! Shared data model and error types for the SongDrop badge service.

pub mod badge;
pub mod error;
pub mod metadata;
pub mod token;

pub use badge::{BadgeRequest, ImageBlob, RenderedBadge};
pub use error::{BadgeError, BadgeResult, UploadKind};
pub use metadata::{Attribute, Provenance, TokenMetadata};
pub use token::{BatchOutcome, BatchStatus, SerialNumber, TokenHandle, UploadReceipt};

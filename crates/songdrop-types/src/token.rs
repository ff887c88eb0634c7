use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one minted unit under a token
pub type SerialNumber = u64;

/// Receipt for one pinned blob. The pipeline never reuses a receipt, and
/// never assumes that pinning the same bytes twice yields the same CID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub cid: String,
}

/// Ledger-side identifier of a created non-fungible token definition
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenHandle {
    pub token_id: String,
}

impl TokenHandle {
    pub fn new(token_id: impl Into<String>) -> Self {
        Self {
            token_id: token_id.into(),
        }
    }
}

impl fmt::Display for TokenHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token_id)
    }
}

/// Settlement result of one burn batch. Failures are recorded here instead
/// of aborting the batch loop, so the caller always gets one entry per
/// attempted batch and must inspect each of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchStatus {
    Success { status: String },
    Failed { reason: String },
}

impl BatchStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, BatchStatus::Success { .. })
    }
}

/// One attempted burn batch with its settlement status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub serials: Vec<SerialNumber>,
    pub status: BatchStatus,
}

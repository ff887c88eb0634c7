//! Token lifecycle against the ledger: creation, minting, single and
//! batched burns, plus the ownership query used to discover what exists
//! to burn.

pub mod client;
pub mod lifecycle;
pub mod mirror;
pub mod pipeline;

pub use client::{
    HttpLedgerClient, InMemoryLedgerClient, LedgerClient, OperatorIdentity, TokenCreateSpec,
};
pub use lifecycle::{TokenLifecycle, DEFAULT_BURN_BATCH_SIZE};
pub use mirror::{MirrorClient, OwnershipQuery};
pub use pipeline::{MintError, MintPipeline, MintedBadge, PipelineStage};

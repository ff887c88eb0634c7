use std::path::PathBuf;

use songdrop_ledger::{MintPipeline, TokenLifecycle};
use songdrop_render::BadgeAssets;

/// Shared application state across all routes
pub struct AppState {
    /// Optional overlay assets loaded once at startup
    pub assets: BadgeAssets,

    /// Where generated badge files are written
    pub output_dir: PathBuf,

    /// Mint orchestration over the pinning and ledger clients
    pub pipeline: MintPipeline,

    /// Burn operations over the ledger and ownership index
    pub lifecycle: TokenLifecycle,
}

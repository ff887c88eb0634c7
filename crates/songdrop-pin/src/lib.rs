//! Content-addressed storage: upload an opaque blob to a pinning service
//! and get back its content identifier.

mod memory;
mod pinata;

use async_trait::async_trait;

use songdrop_types::{BadgeResult, UploadKind, UploadReceipt};

pub use memory::{MemoryStore, PinnedBlob};
pub use pinata::PinataClient;

/// Interface to a pinning/storage service.
///
/// Calling upload twice with identical bytes may or may not return the same
/// CID depending on the service's own deduplication, so callers must treat
/// every receipt as distinct and must not retry a failed upload
/// automatically (a retry can produce a second pin).
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        mime_type: &str,
        kind: UploadKind,
    ) -> BadgeResult<UploadReceipt>;
}

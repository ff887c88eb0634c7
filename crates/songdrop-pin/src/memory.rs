use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use songdrop_types::{BadgeError, BadgeResult, UploadKind, UploadReceipt};

use crate::ContentStore;

/// One blob recorded by the in-memory store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinnedBlob {
    pub cid: String,
    pub file_name: String,
    pub mime_type: String,
    pub kind: UploadKind,
}

/// In-memory content store for testing. CIDs are derived from the blob
/// bytes, so repeated pins of the same content are observable as the
/// deduplicating case of the pinning contract.
#[derive(Default)]
pub struct MemoryStore {
    pins: Mutex<Vec<PinnedBlob>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything pinned so far, in upload order
    pub async fn pinned(&self) -> Vec<PinnedBlob> {
        self.pins.lock().await.clone()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        mime_type: &str,
        kind: UploadKind,
    ) -> BadgeResult<UploadReceipt> {
        if bytes.is_empty() {
            return Err(BadgeError::Upload {
                kind,
                reason: "refusing to pin an empty blob".to_string(),
            });
        }

        let digest = Sha256::digest(&bytes);
        let cid = format!("bafktest{}", hex::encode(&digest[..16]));

        self.pins.lock().await.push(PinnedBlob {
            cid: cid.clone(),
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            kind,
        });

        Ok(UploadReceipt { cid })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cids_are_content_derived() {
        let store = MemoryStore::new();
        let a = store
            .upload(vec![1, 2, 3], "a.png", "image/png", UploadKind::Image)
            .await
            .unwrap();
        let b = store
            .upload(vec![1, 2, 3], "b.png", "image/png", UploadKind::Image)
            .await
            .unwrap();
        let c = store
            .upload(vec![9, 9, 9], "c.png", "image/png", UploadKind::Image)
            .await
            .unwrap();

        assert_eq!(a.cid, b.cid);
        assert_ne!(a.cid, c.cid);
        assert_eq!(store.pinned().await.len(), 3);
    }
}

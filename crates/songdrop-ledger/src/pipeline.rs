use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use songdrop_pin::ContentStore;
use songdrop_types::{
    metadata::token_uri, BadgeError, BadgeRequest, RenderedBadge, SerialNumber, TokenMetadata,
    UploadKind,
};

use crate::client::{LedgerClient, TokenCreateSpec};

/// Progress marker for one badge's mint run. Each transition is triggered
/// by the successful settlement of the corresponding external call; there
/// is no rollback, so on failure the side effects of completed stages
/// (pinned blobs, a created but unminted token) persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Start,
    ImageUploaded,
    MetadataUploaded,
    TokenCreated,
    Minted,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Start => "start",
            PipelineStage::ImageUploaded => "image_uploaded",
            PipelineStage::MetadataUploaded => "metadata_uploaded",
            PipelineStage::TokenCreated => "token_created",
            PipelineStage::Minted => "minted",
        };
        write!(f, "{}", name)
    }
}

/// A pipeline failure, tagged with the last stage that completed
#[derive(Error, Debug)]
#[error("mint pipeline stalled at {stage}: {source}")]
pub struct MintError {
    pub stage: PipelineStage,
    #[source]
    pub source: BadgeError,
}

/// The result of a fully settled mint run
#[derive(Debug, Clone)]
pub struct MintedBadge {
    pub token_id: String,
    pub token_uri: String,
    pub serial: SerialNumber,
}

/// Drives one badge from rendered bytes to a minted unit: pin the image,
/// build and pin the metadata document referencing it, create the token,
/// mint the single unit carrying the metadata pointer. Strictly ordered;
/// no stage starts before its dependency's output exists.
pub struct MintPipeline {
    store: Arc<dyn ContentStore>,
    ledger: Arc<dyn LedgerClient>,
    token_symbol: String,
}

impl MintPipeline {
    pub fn new(
        store: Arc<dyn ContentStore>,
        ledger: Arc<dyn LedgerClient>,
        token_symbol: &str,
    ) -> Self {
        Self {
            store,
            ledger,
            token_symbol: token_symbol.to_string(),
        }
    }

    pub async fn mint_badge(
        &self,
        request: &BadgeRequest,
        badge: &RenderedBadge,
    ) -> Result<MintedBadge, MintError> {
        let at = |stage: PipelineStage| move |source: BadgeError| MintError { stage, source };

        request.validate().map_err(at(PipelineStage::Start))?;

        let image_receipt = self
            .store
            .upload(
                badge.image_bytes.clone(),
                &badge.suggested_file_name,
                "image/png",
                UploadKind::Image,
            )
            .await
            .map_err(at(PipelineStage::Start))?;
        info!("Badge image pinned as {}", image_receipt.cid);

        let metadata = TokenMetadata::for_badge(
            &request.artist,
            &request.track,
            &request.date,
            &image_receipt.cid,
            "image/png",
        )
        .map_err(at(PipelineStage::ImageUploaded))?;
        let metadata_bytes = metadata
            .to_json_bytes()
            .map_err(at(PipelineStage::ImageUploaded))?;

        let metadata_receipt = self
            .store
            .upload(
                metadata_bytes,
                &format!("{}_metadata.json", file_slug(&request.track)),
                "application/json",
                UploadKind::Metadata,
            )
            .await
            .map_err(at(PipelineStage::ImageUploaded))?;
        info!("Badge metadata pinned as {}", metadata_receipt.cid);

        let spec = TokenCreateSpec {
            name: format!("{} - {}", request.artist, request.track),
            symbol: self.token_symbol.clone(),
            memo: format!("SongDrop badge for {}", request.track),
        };
        let handle = self
            .ledger
            .create_nft_token(&spec)
            .await
            .map_err(at(PipelineStage::MetadataUploaded))?;

        let uri = token_uri(&metadata_receipt.cid);
        let serial = self
            .ledger
            .mint_unit(&handle, uri.as_bytes())
            .await
            .map_err(at(PipelineStage::TokenCreated))?;

        info!("Minted {} serial {} with metadata {}", handle, serial, uri);
        Ok(MintedBadge {
            token_id: handle.token_id,
            token_uri: uri,
            serial,
        })
    }
}

fn file_slug(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use songdrop_pin::MemoryStore;
    use songdrop_types::{BadgeResult, ImageBlob, TokenHandle, UploadReceipt};

    use crate::client::InMemoryLedgerClient;

    fn request() -> BadgeRequest {
        BadgeRequest {
            artist: "65daysofstatic".to_string(),
            track: "Radio Protector".to_string(),
            date: "2024-01-01".to_string(),
            background: ImageBlob::new(vec![1, 2, 3, 4], "image/png"),
        }
    }

    fn badge() -> RenderedBadge {
        RenderedBadge {
            image_bytes: vec![137, 80, 78, 71],
            suggested_file_name: "badge-1700000000000.png".to_string(),
        }
    }

    struct FailingStore;

    #[async_trait]
    impl ContentStore for FailingStore {
        async fn upload(
            &self,
            _bytes: Vec<u8>,
            _file_name: &str,
            _mime_type: &str,
            kind: UploadKind,
        ) -> BadgeResult<UploadReceipt> {
            Err(BadgeError::Upload {
                kind,
                reason: "service down".to_string(),
            })
        }
    }

    struct RefusingLedger;

    #[async_trait]
    impl LedgerClient for RefusingLedger {
        async fn create_nft_token(&self, _spec: &TokenCreateSpec) -> BadgeResult<TokenHandle> {
            Err(BadgeError::Ledger("consensus unavailable".to_string()))
        }

        async fn mint_unit(
            &self,
            _token: &TokenHandle,
            _metadata: &[u8],
        ) -> BadgeResult<SerialNumber> {
            Err(BadgeError::Ledger("consensus unavailable".to_string()))
        }

        async fn burn_serials(
            &self,
            _token: &TokenHandle,
            _serials: &[SerialNumber],
        ) -> BadgeResult<String> {
            Err(BadgeError::Ledger("consensus unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn full_run_mints_one_serial() {
        let store = Arc::new(MemoryStore::new());
        let ledger = Arc::new(InMemoryLedgerClient::new());
        let pipeline = MintPipeline::new(store.clone(), ledger.clone(), "DROP");

        let minted = pipeline.mint_badge(&request(), &badge()).await.unwrap();

        assert!(minted.token_uri.starts_with("ipfs://"));
        assert!(!minted.token_id.is_empty());
        assert_eq!(minted.serial, 1);

        // The image pin must precede the metadata pin, and the metadata
        // document must reference the image CID it was built from.
        let pins = store.pinned().await;
        assert_eq!(pins.len(), 2);
        assert_eq!(pins[0].kind, UploadKind::Image);
        assert_eq!(pins[1].kind, UploadKind::Metadata);
        assert_eq!(pins[1].file_name, "Radio_Protector_metadata.json");
        assert_eq!(minted.token_uri, format!("ipfs://{}", pins[1].cid));
    }

    #[tokio::test]
    async fn image_upload_failure_stalls_at_start() {
        let pipeline = MintPipeline::new(
            Arc::new(FailingStore),
            Arc::new(InMemoryLedgerClient::new()),
            "DROP",
        );

        let err = pipeline.mint_badge(&request(), &badge()).await.unwrap_err();
        assert_eq!(err.stage, PipelineStage::Start);
        assert!(matches!(
            err.source,
            BadgeError::Upload {
                kind: UploadKind::Image,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn create_failure_stalls_after_metadata_upload() {
        let store = Arc::new(MemoryStore::new());
        let pipeline = MintPipeline::new(store.clone(), Arc::new(RefusingLedger), "DROP");

        let err = pipeline.mint_badge(&request(), &badge()).await.unwrap_err();
        assert_eq!(err.stage, PipelineStage::MetadataUploaded);

        // No rollback: both pins persist even though no token exists
        assert_eq!(store.pinned().await.len(), 2);
    }

    #[tokio::test]
    async fn invalid_request_never_reaches_the_store() {
        let store = Arc::new(MemoryStore::new());
        let pipeline =
            MintPipeline::new(store.clone(), Arc::new(InMemoryLedgerClient::new()), "DROP");

        let mut bad = request();
        bad.artist = String::new();
        let err = pipeline.mint_badge(&bad, &badge()).await.unwrap_err();

        assert_eq!(err.stage, PipelineStage::Start);
        assert!(matches!(err.source, BadgeError::Validation(_)));
        assert!(store.pinned().await.is_empty());
    }
}

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use tracing::{debug, info};

use songdrop_types::{BadgeError, BadgeResult, UploadKind, UploadReceipt};

use crate::ContentStore;

/// Client for a Pinata-compatible pinning service
pub struct PinataClient {
    base_url: String,
    api_key: String,
    api_secret: String,
    http: HttpClient,
}

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

impl PinataClient {
    pub fn new(base_url: &str, api_key: &str, api_secret: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
            http: HttpClient::new(),
        }
    }
}

#[async_trait]
impl ContentStore for PinataClient {
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

        debug!("Pinning {} blob {} ({} bytes)", kind, file_name, bytes.len());

        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_type)
            .map_err(|e| BadgeError::Upload {
                kind,
                reason: format!("invalid mime type {:?}: {}", mime_type, e),
            })?;
        let form = Form::new().part("file", part);

        let url = format!("{}/pinning/pinFileToIPFS", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("pinata_api_key", &self.api_key)
            .header("pinata_secret_api_key", &self.api_secret)
            .multipart(form)
            .send()
            .await
            .map_err(|e| BadgeError::Upload {
                kind,
                reason: format!("pinning service unreachable: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BadgeError::Upload {
                kind,
                reason: format!("pinning service returned {}: {}", status, body),
            });
        }

        let pin = response
            .json::<PinResponse>()
            .await
            .map_err(|e| BadgeError::Upload {
                kind,
                reason: format!("failed to parse pinning response: {}", e),
            })?;

        info!("Pinned {} blob as {}", kind, pin.ipfs_hash);
        Ok(UploadReceipt { cid: pin.ipfs_hash })
    }
}

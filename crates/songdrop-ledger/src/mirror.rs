use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use tracing::debug;

use songdrop_types::{BadgeError, BadgeResult, SerialNumber, TokenHandle};

/// Read-only view of which serials an account currently holds under a
/// token. Backed by an external index, so the answer can already be stale
/// by the time a burn built from it settles.
#[async_trait]
pub trait OwnershipQuery: Send + Sync {
    async fn held_serials(
        &self,
        account_id: &str,
        token: &TokenHandle,
    ) -> BadgeResult<Vec<SerialNumber>>;
}

/// Client for the mirror/index REST service
pub struct MirrorClient {
    base_url: String,
    http: HttpClient,
}

#[derive(Debug, Deserialize)]
struct NftsPage {
    #[serde(default)]
    nfts: Vec<NftEntry>,
}

#[derive(Debug, Deserialize)]
struct NftEntry {
    serial_number: SerialNumber,
}

impl MirrorClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: HttpClient::new(),
        }
    }
}

#[async_trait]
impl OwnershipQuery for MirrorClient {
    async fn held_serials(
        &self,
        account_id: &str,
        token: &TokenHandle,
    ) -> BadgeResult<Vec<SerialNumber>> {
        let url = format!(
            "{}/api/v1/accounts/{}/nfts?token.id={}",
            self.base_url, account_id, token.token_id
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| BadgeError::Ledger(format!("mirror node unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BadgeError::Ledger(format!(
                "mirror node returned {} for {}",
                status, token
            )));
        }

        let page = response
            .json::<NftsPage>()
            .await
            .map_err(|e| BadgeError::Ledger(format!("unreadable mirror response: {}", e)))?;

        // Order as reported by the index, no deduplication
        let serials = page.nfts.into_iter().map(|n| n.serial_number).collect();
        debug!("Mirror reports {:?} held under {}", serials, token);
        Ok(serials)
    }
}

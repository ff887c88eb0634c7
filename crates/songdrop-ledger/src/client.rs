use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use ed25519_dalek::{Signer, SigningKey};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use songdrop_types::{BadgeError, BadgeResult, SerialNumber, TokenHandle};

use crate::mirror::OwnershipQuery;

/// How often and how long to wait for a submitted transaction to settle
const RECEIPT_POLL_ATTEMPTS: usize = 20;
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// The operator account and its signing key. Injected into every ledger
/// client rather than read from ambient process state, so tests can
/// substitute a fake client without touching globals.
pub struct OperatorIdentity {
    pub account_id: String,
    signing_key: SigningKey,
}

impl OperatorIdentity {
    /// Build an identity from a hex-encoded 32-byte ed25519 seed
    pub fn from_hex_key(account_id: &str, hex_seed: &str) -> BadgeResult<Self> {
        let bytes = hex::decode(hex_seed.trim())
            .map_err(|e| BadgeError::Validation(format!("operator key is not valid hex: {}", e)))?;
        let seed: [u8; 32] = bytes.try_into().map_err(|_| {
            BadgeError::Validation("operator key must be a 32-byte ed25519 seed".to_string())
        })?;

        Ok(Self {
            account_id: account_id.to_string(),
            signing_key: SigningKey::from_bytes(&seed),
        })
    }

    /// Sign a transaction body, returning the hex-encoded signature
    pub fn sign(&self, message: &[u8]) -> String {
        hex::encode(self.signing_key.sign(message).to_bytes())
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.signing_key.verifying_key().to_bytes())
    }
}

/// Parameters for a non-fungible token definition. Supply invariants are
/// not parameters: every badge token is created finite with max supply 1,
/// so at most one mint can ever succeed per handle.
#[derive(Debug, Clone)]
pub struct TokenCreateSpec {
    pub name: String,
    pub symbol: String,
    pub memo: String,
}

/// Interface to the ledger's token transaction types
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Create a non-fungible token definition held by the operator's
    /// treasury. A handle exists only if this returns successfully.
    async fn create_nft_token(&self, spec: &TokenCreateSpec) -> BadgeResult<TokenHandle>;

    /// Mint one unit under the handle, embedding the given bytes as its
    /// on-chain metadata. A failure leaves the handle with nothing minted.
    async fn mint_unit(&self, token: &TokenHandle, metadata: &[u8]) -> BadgeResult<SerialNumber>;

    /// Burn the given serials in one transaction and return the settlement
    /// status. Either the whole transaction commits or none of it does.
    async fn burn_serials(
        &self,
        token: &TokenHandle,
        serials: &[SerialNumber],
    ) -> BadgeResult<String>;
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum TransactionBody<'a> {
    TokenCreate {
        name: &'a str,
        symbol: &'a str,
        memo: &'a str,
        token_type: &'a str,
        decimals: u32,
        initial_supply: u64,
        supply_type: &'a str,
        max_supply: u64,
        treasury_account_id: &'a str,
    },
    TokenMint {
        token_id: &'a str,
        /// Base64 of the on-chain metadata bytes
        metadata: String,
    },
    TokenBurn {
        token_id: &'a str,
        serials: &'a [SerialNumber],
    },
}

#[derive(Debug, Serialize)]
struct TransactionEnvelope<'a> {
    transaction_id: String,
    operator_account_id: &'a str,
    body: TransactionBody<'a>,
    signature: String,
    public_key: String,
}

#[derive(Debug, Deserialize)]
struct TransactionReceipt {
    status: String,
    token_id: Option<String>,
    serials: Option<Vec<SerialNumber>>,
}

/// Ledger client speaking to a node gateway over JSON. Each call freezes a
/// transaction body, signs it with the operator key, submits it, and waits
/// for the settlement receipt. There is no automatic resubmission.
pub struct HttpLedgerClient {
    base_url: String,
    http: HttpClient,
    operator: OperatorIdentity,
}

impl HttpLedgerClient {
    pub fn new(base_url: &str, operator: OperatorIdentity) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: HttpClient::new(),
            operator,
        }
    }

    fn next_transaction_id(&self) -> String {
        let now = Utc::now();
        format!(
            "{}-{}-{}",
            self.operator.account_id,
            now.timestamp(),
            now.timestamp_subsec_nanos()
        )
    }

    async fn execute(&self, body: TransactionBody<'_>) -> BadgeResult<TransactionReceipt> {
        let transaction_id = self.next_transaction_id();
        let body_bytes = serde_json::to_vec(&body)
            .map_err(|e| BadgeError::Serialization(format!("transaction body: {}", e)))?;

        let envelope = TransactionEnvelope {
            signature: self.operator.sign(&body_bytes),
            public_key: self.operator.public_key_hex(),
            transaction_id: transaction_id.clone(),
            operator_account_id: &self.operator.account_id,
            body,
        };

        let submit_url = format!("{}/api/v1/transactions", self.base_url);
        let response = self
            .http
            .post(&submit_url)
            .json(&envelope)
            .send()
            .await
            .map_err(|e| BadgeError::Ledger(format!("node unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BadgeError::Ledger(format!(
                "transaction {} rejected with {}: {}",
                transaction_id, status, text
            )));
        }

        debug!("Submitted transaction {}", transaction_id);
        self.wait_for_receipt(&transaction_id).await
    }

    async fn wait_for_receipt(&self, transaction_id: &str) -> BadgeResult<TransactionReceipt> {
        let receipt_url = format!(
            "{}/api/v1/transactions/{}/receipt",
            self.base_url, transaction_id
        );

        for _ in 0..RECEIPT_POLL_ATTEMPTS {
            let response = self
                .http
                .get(&receipt_url)
                .send()
                .await
                .map_err(|e| BadgeError::Ledger(format!("receipt fetch failed: {}", e)))?;

            if response.status().is_success() {
                let receipt = response
                    .json::<TransactionReceipt>()
                    .await
                    .map_err(|e| BadgeError::Ledger(format!("unreadable receipt: {}", e)))?;
                if receipt.status != "PENDING" {
                    return Ok(receipt);
                }
            }

            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }

        Err(BadgeError::Ledger(format!(
            "transaction {} produced no settlement receipt",
            transaction_id
        )))
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn create_nft_token(&self, spec: &TokenCreateSpec) -> BadgeResult<TokenHandle> {
        let receipt = self
            .execute(TransactionBody::TokenCreate {
                name: &spec.name,
                symbol: &spec.symbol,
                memo: &spec.memo,
                token_type: "NON_FUNGIBLE_UNIQUE",
                decimals: 0,
                initial_supply: 0,
                supply_type: "FINITE",
                max_supply: 1,
                treasury_account_id: &self.operator.account_id,
            })
            .await?;

        if receipt.status != "SUCCESS" {
            return Err(BadgeError::Ledger(format!(
                "token create settled with {}",
                receipt.status
            )));
        }
        let token_id = receipt
            .token_id
            .ok_or_else(|| BadgeError::Ledger("create receipt carried no token id".to_string()))?;

        info!("Created token {}", token_id);
        Ok(TokenHandle::new(token_id))
    }

    async fn mint_unit(&self, token: &TokenHandle, metadata: &[u8]) -> BadgeResult<SerialNumber> {
        let receipt = self
            .execute(TransactionBody::TokenMint {
                token_id: &token.token_id,
                metadata: STANDARD.encode(metadata),
            })
            .await?;

        if receipt.status != "SUCCESS" {
            return Err(BadgeError::Ledger(format!(
                "mint on {} settled with {}",
                token, receipt.status
            )));
        }
        let serial = receipt
            .serials
            .as_deref()
            .and_then(|s| s.first().copied())
            .ok_or_else(|| BadgeError::Ledger("mint receipt carried no serial".to_string()))?;

        info!("Minted serial {} under {}", serial, token);
        Ok(serial)
    }

    async fn burn_serials(
        &self,
        token: &TokenHandle,
        serials: &[SerialNumber],
    ) -> BadgeResult<String> {
        let receipt = self
            .execute(TransactionBody::TokenBurn {
                token_id: &token.token_id,
                serials,
            })
            .await?;

        if receipt.status != "SUCCESS" {
            return Err(BadgeError::Ledger(format!(
                "burn on {} settled with {}",
                token, receipt.status
            )));
        }
        Ok(receipt.status)
    }
}

#[derive(Debug, Default)]
struct TokenRecord {
    max_supply: u64,
    minted: u64,
    next_serial: SerialNumber,
    held: Vec<SerialNumber>,
}

#[derive(Default)]
struct LedgerState {
    created: u64,
    tokens: HashMap<String, TokenRecord>,
}

/// In-memory ledger for testing. Enforces the same invariants the real
/// ledger settles on: finite supply with max 1 per created token, and burns
/// only of serials currently held.
#[derive(Default)]
pub struct InMemoryLedgerClient {
    state: Mutex<LedgerState>,
}

impl InMemoryLedgerClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a token that already holds the given serials, for burn
    /// scenarios that start mid-lifecycle.
    pub async fn preload_token(&self, token_id: &str, serials: Vec<SerialNumber>) {
        let mut state = self.state.lock().await;
        let record = TokenRecord {
            max_supply: serials.len() as u64,
            minted: serials.len() as u64,
            next_serial: serials.iter().copied().max().unwrap_or(0),
            held: serials,
        };
        state.tokens.insert(token_id.to_string(), record);
    }

    /// Serials currently held under a token, in mint order
    pub async fn held(&self, token: &TokenHandle) -> Vec<SerialNumber> {
        let state = self.state.lock().await;
        state
            .tokens
            .get(&token.token_id)
            .map(|r| r.held.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedgerClient {
    async fn create_nft_token(&self, _spec: &TokenCreateSpec) -> BadgeResult<TokenHandle> {
        let mut state = self.state.lock().await;
        state.created += 1;
        let token_id = format!("0.0.{}", 1000 + state.created);
        state.tokens.insert(
            token_id.clone(),
            TokenRecord {
                max_supply: 1,
                ..TokenRecord::default()
            },
        );
        Ok(TokenHandle::new(token_id))
    }

    async fn mint_unit(&self, token: &TokenHandle, _metadata: &[u8]) -> BadgeResult<SerialNumber> {
        let mut state = self.state.lock().await;
        let record = state
            .tokens
            .get_mut(&token.token_id)
            .ok_or_else(|| BadgeError::Ledger(format!("INVALID_TOKEN_ID: {}", token)))?;

        if record.minted >= record.max_supply {
            return Err(BadgeError::Ledger(format!(
                "TOKEN_MAX_SUPPLY_REACHED on {}",
                token
            )));
        }

        record.next_serial += 1;
        record.minted += 1;
        let serial = record.next_serial;
        record.held.push(serial);
        Ok(serial)
    }

    async fn burn_serials(
        &self,
        token: &TokenHandle,
        serials: &[SerialNumber],
    ) -> BadgeResult<String> {
        let mut state = self.state.lock().await;
        let record = state
            .tokens
            .get_mut(&token.token_id)
            .ok_or_else(|| BadgeError::Ledger(format!("INVALID_TOKEN_ID: {}", token)))?;

        for serial in serials {
            if !record.held.contains(serial) {
                return Err(BadgeError::Ledger(format!(
                    "INVALID_NFT_ID: serial {} not held under {}",
                    serial, token
                )));
            }
        }
        record.held.retain(|s| !serials.contains(s));
        Ok("SUCCESS".to_string())
    }
}

#[async_trait]
impl OwnershipQuery for InMemoryLedgerClient {
    async fn held_serials(
        &self,
        _account_id: &str,
        token: &TokenHandle,
    ) -> BadgeResult<Vec<SerialNumber>> {
        Ok(self.held(token).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> TokenCreateSpec {
        TokenCreateSpec {
            name: "Artist - Track".to_string(),
            symbol: "DROP".to_string(),
            memo: "SongDrop badge for Track".to_string(),
        }
    }

    #[tokio::test]
    async fn second_mint_on_a_handle_fails() {
        let ledger = InMemoryLedgerClient::new();
        let token = ledger.create_nft_token(&spec()).await.unwrap();

        let serial = ledger.mint_unit(&token, b"ipfs://QmMeta").await.unwrap();
        assert_eq!(serial, 1);

        let second = ledger.mint_unit(&token, b"ipfs://QmMeta").await;
        match second {
            Err(BadgeError::Ledger(reason)) => assert!(reason.contains("MAX_SUPPLY")),
            other => panic!("expected ledger error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn burning_an_unminted_serial_fails() {
        let ledger = InMemoryLedgerClient::new();
        let token = ledger.create_nft_token(&spec()).await.unwrap();

        let result = ledger.burn_serials(&token, &[1]).await;
        assert!(matches!(result, Err(BadgeError::Ledger(_))));

        ledger.mint_unit(&token, b"ipfs://QmMeta").await.unwrap();
        let status = ledger.burn_serials(&token, &[1]).await.unwrap();
        assert_eq!(status, "SUCCESS");
        assert!(ledger.held(&token).await.is_empty());
    }

    #[tokio::test]
    async fn burned_serials_leave_the_holding_set() {
        let ledger = InMemoryLedgerClient::new();
        ledger.preload_token("0.0.7777", vec![1, 2, 3]).await;
        let token = TokenHandle::new("0.0.7777");

        ledger.burn_serials(&token, &[2]).await.unwrap();
        assert_eq!(ledger.held(&token).await, vec![1, 3]);

        // A burn is terminal for the serials it targets
        let again = ledger.burn_serials(&token, &[2]).await;
        assert!(matches!(again, Err(BadgeError::Ledger(_))));
    }

    #[test]
    fn operator_identity_signs_deterministically() {
        let seed = "11".repeat(32);
        let operator = OperatorIdentity::from_hex_key("0.0.1234", &seed).unwrap();

        let a = operator.sign(b"payload");
        let b = operator.sign(b"payload");
        assert_eq!(a, b);
        assert_eq!(a.len(), 128);
        assert_eq!(operator.public_key_hex().len(), 64);
    }

    #[test]
    fn malformed_operator_key_is_rejected() {
        assert!(OperatorIdentity::from_hex_key("0.0.1234", "not hex").is_err());
        assert!(OperatorIdentity::from_hex_key("0.0.1234", "aabb").is_err());
    }
}

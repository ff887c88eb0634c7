use std::sync::Arc;

use tracing::{info, warn};

use songdrop_types::{BadgeResult, BatchOutcome, BatchStatus, SerialNumber, TokenHandle};

use crate::client::LedgerClient;
use crate::mirror::OwnershipQuery;

/// Per-transaction serial limit imposed by the ledger, not a throughput
/// choice. Overridable through configuration.
pub const DEFAULT_BURN_BATCH_SIZE: usize = 10;

/// Burn operations over an existing token: one serial, or everything the
/// treasury currently holds.
pub struct TokenLifecycle {
    ledger: Arc<dyn LedgerClient>,
    ownership: Arc<dyn OwnershipQuery>,
    treasury_account: String,
    max_batch_size: usize,
}

impl TokenLifecycle {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        ownership: Arc<dyn OwnershipQuery>,
        treasury_account: &str,
        max_batch_size: usize,
    ) -> Self {
        Self {
            ledger,
            ownership,
            treasury_account: treasury_account.to_string(),
            max_batch_size: max_batch_size.max(1),
        }
    }

    /// Burn exactly one serial. Single-serial transactions have no partial
    /// effect: either the serial is burned or nothing committed.
    pub async fn burn_one(
        &self,
        token: &TokenHandle,
        serial: SerialNumber,
    ) -> BadgeResult<String> {
        let status = self.ledger.burn_serials(token, &[serial]).await?;
        info!("Burned serial {} of {} ({})", serial, token, status);
        Ok(status)
    }

    /// Burn every serial the treasury holds under the token, in as few
    /// transactions as the batch limit allows.
    ///
    /// Batches are submitted strictly sequentially in the order the index
    /// reported the serials, without deduplication. A failed batch is
    /// recorded and does not stop later batches, so the returned list has
    /// exactly one entry per attempted batch and the caller must inspect
    /// each entry. An empty holding set is a valid terminal state, not an
    /// error.
    pub async fn burn_all(&self, token: &TokenHandle) -> BadgeResult<Vec<BatchOutcome>> {
        let serials = self
            .ownership
            .held_serials(&self.treasury_account, token)
            .await?;
        if serials.is_empty() {
            info!("Nothing to burn under {}", token);
            return Ok(Vec::new());
        }

        let mut outcomes = Vec::with_capacity(serials.len().div_ceil(self.max_batch_size));
        for batch in serials.chunks(self.max_batch_size) {
            let status = match self.ledger.burn_serials(token, batch).await {
                Ok(status) => {
                    info!("Burned batch {:?} of {} ({})", batch, token, status);
                    BatchStatus::Success { status }
                }
                Err(e) => {
                    // Record and keep going; later batches may still settle
                    warn!("Burn batch {:?} of {} failed: {}", batch, token, e);
                    BatchStatus::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            outcomes.push(BatchOutcome {
                serials: batch.to_vec(),
                status,
            });
        }

        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use songdrop_types::BadgeError;

    use crate::client::{InMemoryLedgerClient, TokenCreateSpec};

    fn lifecycle_over(
        ledger: Arc<InMemoryLedgerClient>,
        batch_size: usize,
    ) -> TokenLifecycle {
        TokenLifecycle::new(ledger.clone(), ledger, "0.0.1234", batch_size)
    }

    #[tokio::test]
    async fn empty_holdings_burn_to_an_empty_result() {
        let ledger = Arc::new(InMemoryLedgerClient::new());
        ledger.preload_token("0.0.5005", Vec::new()).await;

        let lifecycle = lifecycle_over(ledger, DEFAULT_BURN_BATCH_SIZE);
        let outcomes = lifecycle
            .burn_all(&TokenHandle::new("0.0.5005"))
            .await
            .unwrap();
        assert!(outcomes.is_empty());
    }

    #[tokio::test]
    async fn holdings_partition_into_ordered_batches() {
        let ledger = Arc::new(InMemoryLedgerClient::new());
        ledger
            .preload_token("0.0.5005", (1..=25).collect())
            .await;
        let token = TokenHandle::new("0.0.5005");

        let lifecycle = lifecycle_over(ledger.clone(), DEFAULT_BURN_BATCH_SIZE);
        let outcomes = lifecycle.burn_all(&token).await.unwrap();

        let sizes: Vec<usize> = outcomes.iter().map(|o| o.serials.len()).collect();
        assert_eq!(sizes, vec![10, 10, 5]);
        assert!(outcomes.iter().all(|o| o.status.is_success()));

        // Batches cover exactly the held set, in query order
        let covered: Vec<SerialNumber> = outcomes
            .iter()
            .flat_map(|o| o.serials.iter().copied())
            .collect();
        assert_eq!(covered, (1..=25).collect::<Vec<_>>());
        assert!(ledger.held(&token).await.is_empty());
    }

    /// Delegates to a real in-memory ledger but refuses any burn batch
    /// containing the poisoned serial.
    struct PoisonedLedger {
        inner: Arc<InMemoryLedgerClient>,
        poison: SerialNumber,
    }

    #[async_trait]
    impl LedgerClient for PoisonedLedger {
        async fn create_nft_token(&self, spec: &TokenCreateSpec) -> BadgeResult<TokenHandle> {
            self.inner.create_nft_token(spec).await
        }

        async fn mint_unit(
            &self,
            token: &TokenHandle,
            metadata: &[u8],
        ) -> BadgeResult<SerialNumber> {
            self.inner.mint_unit(token, metadata).await
        }

        async fn burn_serials(
            &self,
            token: &TokenHandle,
            serials: &[SerialNumber],
        ) -> BadgeResult<String> {
            if serials.contains(&self.poison) {
                return Err(BadgeError::Ledger("SIMULATED_SETTLEMENT_FAILURE".to_string()));
            }
            self.inner.burn_serials(token, serials).await
        }
    }

    #[tokio::test]
    async fn a_failed_batch_does_not_halt_the_loop() {
        let inner = Arc::new(InMemoryLedgerClient::new());
        inner.preload_token("0.0.5005", (1..=25).collect()).await;
        let token = TokenHandle::new("0.0.5005");

        // Serial 15 sits in the second of three batches
        let lifecycle = TokenLifecycle::new(
            Arc::new(PoisonedLedger {
                inner: inner.clone(),
                poison: 15,
            }),
            inner.clone(),
            "0.0.1234",
            DEFAULT_BURN_BATCH_SIZE,
        );

        let outcomes = lifecycle.burn_all(&token).await.unwrap();
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].status.is_success());
        assert!(matches!(
            &outcomes[1].status,
            BatchStatus::Failed { reason } if reason.contains("SIMULATED")
        ));
        assert!(outcomes[2].status.is_success());

        // Only the failed batch's serials survive
        assert_eq!(inner.held(&token).await, (11..=20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn burn_one_of_a_missing_serial_is_a_ledger_error() {
        let ledger = Arc::new(InMemoryLedgerClient::new());
        ledger.preload_token("0.0.5005", vec![1]).await;

        let lifecycle = lifecycle_over(ledger, DEFAULT_BURN_BATCH_SIZE);
        let token = TokenHandle::new("0.0.5005");

        assert!(lifecycle.burn_one(&token, 1).await.is_ok());
        assert!(matches!(
            lifecycle.burn_one(&token, 2).await,
            Err(BadgeError::Ledger(_))
        ));
    }
}

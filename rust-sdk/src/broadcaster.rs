use tracing::{debug, info, warn};

use crate::{error::EnhancerError, rpc::LedgerClient, signing::SignedPayload};

/// Rounds to wait for a submitted group before giving up.
pub const DEFAULT_CONFIRMATION_ROUNDS: u64 = 3;

/// Submits signed groups and waits for them to be confirmed.
///
/// Nothing is retried here; a failed submission is reported to the caller
/// as is.
pub struct Broadcaster<'a> {
    ledger: &'a dyn LedgerClient,
    rounds: u64,
}

impl<'a> Broadcaster<'a> {
    pub fn new(ledger: &'a dyn LedgerClient) -> Self {
        Self::with_rounds(ledger, DEFAULT_CONFIRMATION_ROUNDS)
    }

    /// At least one round is always awaited.
    pub fn with_rounds(ledger: &'a dyn LedgerClient, rounds: u64) -> Self {
        Self {
            ledger,
            rounds: rounds.max(1),
        }
    }

    /// Sends all `payloads` of one group in a single call and returns the
    /// confirmed id of its first transaction.
    pub async fn submit(&self, payloads: &[SignedPayload]) -> Result<String, EnhancerError> {
        if payloads.is_empty() || payloads.iter().any(Vec::is_empty) {
            return Err(EnhancerError::Encoding("nothing to submit".to_string()));
        }

        let tx_id = match self.ledger.send_raw_transaction(&payloads.concat()).await {
            Ok(tx_id) => tx_id,
            Err(e) => {
                warn!(error = %e, "submission failed");
                return Err(e);
            },
        };
        debug!(%tx_id, members = payloads.len(), "group submitted");

        let round = self.wait_for_confirmation(&tx_id).await?;
        info!(%tx_id, round, "group confirmed");
        Ok(tx_id)
    }

    /// Polls the pool until `tx_id` is confirmed, rejected or the round
    /// budget runs out. Returns the confirmed round.
    pub async fn wait_for_confirmation(&self, tx_id: &str) -> Result<u64, EnhancerError> {
        let start = self.ledger.status().await?.last_round + 1;
        let mut round = start;

        while round < start + self.rounds {
            let pending = self.ledger.pending_transaction(tx_id).await?;
            if pending.is_confirmed() {
                return Ok(pending.confirmed_round.unwrap_or(round));
            }
            if !pending.pool_error.is_empty() {
                warn!(%tx_id, pool_error = %pending.pool_error, "transaction rejected by pool");
                return Err(EnhancerError::NodeRejected(pending.pool_error));
            }
            self.ledger.status_after_block(round).await?;
            round += 1;
        }

        warn!(%tx_id, rounds = self.rounds, "transaction not confirmed");
        Err(EnhancerError::ConfirmationTimeout {
            rounds: self.rounds,
        })
    }
}

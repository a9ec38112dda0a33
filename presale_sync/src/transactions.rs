use std::sync::Arc;

use alloy::primitives::{Address, TxHash};
use presale_util::{claim_available, parse_positive, parse_token_amount, TOKEN_DECIMALS};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::{
    eth_client::{PresaleWriter, TransactionIntent},
    notifier::{Notifier, TX_NOTIFICATION_ID},
    state::Symbols,
    sync::PresaleSync,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TxOutcome {
    /// Refused before anything was sent.
    Rejected { message: String },
    Confirmed { tx_hash: TxHash },
    Failed { tx_hash: Option<TxHash>, message: String },
}

/// Purchases and claims. Every action reports through the shared `"tx"`
/// notification and re-reads the presale once it has settled.
pub struct TransactionHandler {
    sync: Arc<PresaleSync>,
    writer: Option<Arc<dyn PresaleWriter>>,
    notifier: Arc<Notifier>,
    presale: Address,
    symbols: Symbols,
}

impl TransactionHandler {
    pub fn new(
        sync: Arc<PresaleSync>,
        writer: Option<Arc<dyn PresaleWriter>>,
        notifier: Arc<Notifier>,
        presale: Address,
        symbols: Symbols,
    ) -> Self {
        Self {
            sync,
            writer,
            notifier,
            presale,
            symbols,
        }
    }

    pub async fn buy_with_native(&self, amount: &str) -> TxOutcome {
        if parse_positive(amount).is_none() {
            return self.reject(format!("Enter {} amount", self.symbols.native));
        }
        let Some(writer) = self.writer.clone() else {
            return self.reject("Connect a wallet first".to_string());
        };
        let value = match parse_token_amount(amount, TOKEN_DECIMALS) {
            Ok(value) => value,
            Err(err) => return self.reject(err.to_string()),
        };

        let outcome = self
            .send_and_settle(
                writer.as_ref(),
                TransactionIntent::BuyWithNative { value },
                "Failed to send transaction",
                "Transaction failed",
            )
            .await;
        self.settled(outcome).await
    }

    /// Approves the presale to spend `amount` stable tokens, then buys with
    /// them. The purchase is only sent once the approval has been mined
    /// successfully.
    pub async fn buy_with_stable(&self, amount: &str) -> TxOutcome {
        if parse_positive(amount).is_none() {
            return self.reject(format!("Enter {} amount", self.symbols.stable));
        }
        let Some(writer) = self.writer.clone() else {
            return self.reject("Connect a wallet first".to_string());
        };

        let stable = match self.sync.snapshot().await.stable {
            Some(stable) => stable,
            None => match self.sync.fetch_stable_meta().await {
                Some(stable) => stable,
                None => {
                    return self.reject(format!("{} address unavailable", self.symbols.stable))
                }
            },
        };
        let amount = match parse_token_amount(amount, stable.decimals) {
            Ok(amount) => amount,
            Err(err) => return self.reject(err.to_string()),
        };

        let failure = format!("{} purchase failed", self.symbols.stable);
        let approval = self
            .send_and_settle(
                writer.as_ref(),
                TransactionIntent::ApproveStable {
                    token: stable.address,
                    spender: self.presale,
                    amount,
                },
                &failure,
                &failure,
            )
            .await;
        if !matches!(approval, TxOutcome::Confirmed { .. }) {
            return self.settled(approval).await;
        }

        let outcome = self
            .send_and_settle(
                writer.as_ref(),
                TransactionIntent::BuyWithStable { amount },
                &failure,
                &failure,
            )
            .await;
        self.settled(outcome).await
    }

    /// Only offered once the presale window has closed at `now`. Anything
    /// beyond that is left to the contract.
    pub async fn claim_tokens(&self, now: i64) -> TxOutcome {
        let end = self.sync.snapshot().await.window.map_or(0, |w| w.end);
        if !claim_available(now, end) {
            return self.reject("Claim opens after the presale ends".to_string());
        }
        let Some(writer) = self.writer.clone() else {
            return self.reject("Connect a wallet first".to_string());
        };
        let outcome = self
            .send_and_settle(
                writer.as_ref(),
                TransactionIntent::ClaimTokens,
                "Claim failed",
                "Transaction failed",
            )
            .await;
        self.settled(outcome).await
    }

    fn reject(&self, message: String) -> TxOutcome {
        self.notifier.error(None, &message);
        TxOutcome::Rejected { message }
    }

    async fn send_and_settle(
        &self,
        writer: &dyn PresaleWriter,
        intent: TransactionIntent,
        send_failure: &str,
        tx_failure: &str,
    ) -> TxOutcome {
        let tx_hash = match writer.submit(&intent).await {
            Ok(tx_hash) => tx_hash,
            Err(err) => {
                error!("Failed to send {}: {:#}", intent.name(), err);
                self.notifier.error(Some(TX_NOTIFICATION_ID), send_failure);
                return TxOutcome::Failed {
                    tx_hash: None,
                    message: send_failure.to_string(),
                };
            }
        };

        self.notifier
            .loading(Some(TX_NOTIFICATION_ID), "Transaction pending...");

        let succeeded = match writer.wait_for_receipt(tx_hash).await {
            Ok(succeeded) => succeeded,
            Err(err) => {
                warn!("Failed to get the receipt of {}: {:#}", tx_hash, err);
                false
            }
        };

        if succeeded {
            info!("{} transaction confirmed: {}", intent.name(), tx_hash);
            self.notifier
                .success(Some(TX_NOTIFICATION_ID), "Transaction confirmed!");
            TxOutcome::Confirmed { tx_hash }
        } else {
            warn!("{} transaction failed: {}", intent.name(), tx_hash);
            self.notifier.error(Some(TX_NOTIFICATION_ID), tx_failure);
            TxOutcome::Failed {
                tx_hash: Some(tx_hash),
                message: tx_failure.to_string(),
            }
        }
    }

    async fn settled(&self, outcome: TxOutcome) -> TxOutcome {
        // Nothing reached the chain when sending failed
        if !matches!(outcome, TxOutcome::Failed { tx_hash: None, .. }) {
            self.sync.refresh(false).await;
        }
        outcome
    }
}

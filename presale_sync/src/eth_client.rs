use std::time::Duration;

use alloy::{
    network::ReceiptResponse,
    primitives::{Address, TxHash, U256},
    providers::{DynProvider, Provider},
};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tokio::time::sleep;
use tracing::info;

use crate::{
    contracts::{IPresale, IERC20},
    state::{Phase, PresaleWindow},
};

/// Read side of the presale and its stable payment token.
#[async_trait]
pub trait PresaleReader: Send + Sync {
    async fn presale_window(&self) -> Result<PresaleWindow>;
    async fn current_phase(&self) -> Result<u64>;
    async fn phase(&self, index: u64) -> Result<Phase>;
    /// USD per native coin, scaled by 10^8.
    async fn native_usd_price(&self) -> Result<U256>;
    async fn purchased(&self, buyer: Address) -> Result<U256>;
    async fn stable_token(&self) -> Result<Address>;
    async fn token_decimals(&self, token: Address) -> Result<u8>;
    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256>;
    async fn native_balance(&self, owner: Address) -> Result<U256>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionIntent {
    BuyWithNative { value: U256 },
    ApproveStable { token: Address, spender: Address, amount: U256 },
    BuyWithStable { amount: U256 },
    ClaimTokens,
}

impl TransactionIntent {
    pub fn name(&self) -> &'static str {
        match self {
            TransactionIntent::BuyWithNative { .. } => "buyWithBNB",
            TransactionIntent::ApproveStable { .. } => "approve",
            TransactionIntent::BuyWithStable { .. } => "buyWithUSDT",
            TransactionIntent::ClaimTokens => "claimTokens",
        }
    }
}

/// Write side. Submission and settlement are separate so callers can
/// report the pending state in between.
#[async_trait]
pub trait PresaleWriter: Send + Sync {
    async fn submit(&self, intent: &TransactionIntent) -> Result<TxHash>;
    /// Waits until the transaction is mined. `true` when it succeeded.
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<bool>;
}

pub struct EthClient {
    pub provider: DynProvider,
    pub presale: Address,
    pub receipt_poll: Duration,
}

impl EthClient {
    pub fn new(provider: DynProvider, presale: Address, receipt_poll: Duration) -> Self {
        Self {
            provider,
            presale,
            receipt_poll,
        }
    }

    fn presale_contract(&self) -> IPresale::IPresaleInstance<DynProvider> {
        IPresale::new(self.presale, self.provider.clone())
    }

    fn erc20(&self, token: Address) -> IERC20::IERC20Instance<DynProvider> {
        IERC20::new(token, self.provider.clone())
    }
}

fn to_u64(value: U256, what: &str) -> Result<u64> {
    u64::try_from(value).map_err(|e| anyhow!("{} does not fit into u64: {}", what, e))
}

fn to_timestamp(value: U256, what: &str) -> Result<i64> {
    let seconds = to_u64(value, what)?;
    i64::try_from(seconds).with_context(|| format!("{} is not a valid timestamp", what))
}

#[async_trait]
impl PresaleReader for EthClient {
    async fn presale_window(&self) -> Result<PresaleWindow> {
        let presale = self.presale_contract();
        let start = presale
            .presaleStart()
            .call()
            .await
            .context("reading presaleStart")?;
        let end = presale
            .presaleEnd()
            .call()
            .await
            .context("reading presaleEnd")?;
        Ok(PresaleWindow {
            start: to_timestamp(start, "presaleStart")?,
            end: to_timestamp(end, "presaleEnd")?,
        })
    }

    async fn current_phase(&self) -> Result<u64> {
        let phase = self
            .presale_contract()
            .currentPhase()
            .call()
            .await
            .context("reading currentPhase")?;
        to_u64(phase, "currentPhase")
    }

    async fn phase(&self, index: u64) -> Result<Phase> {
        let phase = self
            .presale_contract()
            .phases(U256::from(index))
            .call()
            .await
            .with_context(|| format!("reading phases({})", index))?;
        Ok(Phase {
            index,
            price_raw: phase.priceUSD,
            allocation: phase.allocation,
            sold: phase.sold,
        })
    }

    async fn native_usd_price(&self) -> Result<U256> {
        self.presale_contract()
            .getLatestBNBPrice()
            .call()
            .await
            .context("reading getLatestBNBPrice")
    }

    async fn purchased(&self, buyer: Address) -> Result<U256> {
        self.presale_contract()
            .purchased(buyer)
            .call()
            .await
            .context("reading purchased")
    }

    async fn stable_token(&self) -> Result<Address> {
        self.presale_contract()
            .usdt()
            .call()
            .await
            .context("reading usdt")
    }

    async fn token_decimals(&self, token: Address) -> Result<u8> {
        self.erc20(token)
            .decimals()
            .call()
            .await
            .context("reading decimals")
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256> {
        self.erc20(token)
            .balanceOf(owner)
            .call()
            .await
            .context("reading balanceOf")
    }

    async fn native_balance(&self, owner: Address) -> Result<U256> {
        self.provider
            .get_balance(owner)
            .await
            .context("reading native balance")
    }
}

#[async_trait]
impl PresaleWriter for EthClient {
    async fn submit(&self, intent: &TransactionIntent) -> Result<TxHash> {
        let presale = self.presale_contract();
        let pending = match intent {
            TransactionIntent::BuyWithNative { value } => {
                presale.buyWithBNB().value(*value).send().await
            }
            TransactionIntent::ApproveStable {
                token,
                spender,
                amount,
            } => self.erc20(*token).approve(*spender, *amount).send().await,
            TransactionIntent::BuyWithStable { amount } => {
                presale.buyWithUSDT(*amount).send().await
            }
            TransactionIntent::ClaimTokens => presale.claimTokens().send().await,
        }
        .with_context(|| format!("sending {}", intent.name()))?;

        let tx_hash = *pending.tx_hash();
        info!("Submitted {} transaction: {}", intent.name(), tx_hash);
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<bool> {
        loop {
            let receipt = self
                .provider
                .get_transaction_receipt(tx_hash)
                .await
                .context("getting transaction receipt")?;
            if let Some(receipt) = receipt {
                return Ok(receipt.status());
            }
            sleep(self.receipt_poll).await;
        }
    }
}

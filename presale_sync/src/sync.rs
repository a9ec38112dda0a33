use std::{sync::Arc, time::Duration};

use alloy::primitives::{Address, U256};
use anyhow::Result;
use chrono::Utc;
use tokio::{sync::RwLock, time::sleep};
use tracing::{info, warn};

use crate::{
    eth_client::PresaleReader,
    notifier::Notifier,
    state::{Phase, PresaleState, PresaleWindow, StableTokenMeta},
};

/// Outcome of the phase read: the index is known even when its data is not.
struct PhaseRead {
    index: u64,
    phase: Option<Phase>,
}

/// Keeps [`PresaleState`] in line with the contracts.
pub struct PresaleSync {
    reader: Arc<dyn PresaleReader>,
    notifier: Arc<Notifier>,
    state: RwLock<PresaleState>,
}

impl PresaleSync {
    pub fn new(
        reader: Arc<dyn PresaleReader>,
        notifier: Arc<Notifier>,
        wallet: Option<Address>,
    ) -> Self {
        let state = PresaleState {
            wallet,
            ..Default::default()
        };
        Self {
            reader,
            notifier,
            state: RwLock::new(state),
        }
    }

    pub async fn snapshot(&self) -> PresaleState {
        self.state.read().await.clone()
    }

    pub async fn wallet(&self) -> Option<Address> {
        self.state.read().await.wallet
    }

    /// Switches the wallet context and re-reads everything for it.
    pub async fn set_wallet(&self, wallet: Option<Address>) {
        {
            let mut state = self.state.write().await;
            if state.wallet == wallet {
                return;
            }
            state.switch_wallet(wallet);
        }
        info!("Wallet context changed to {:?}", wallet);
        self.refresh(false).await;
    }

    /// Re-reads all presale values at once. A failing read is logged and
    /// leaves its field untouched; it never affects the other reads.
    pub async fn refresh(&self, notify: bool) {
        let wallet = self.wallet().await;

        let (window, phase, quote, purchased, stable, native_balance) = tokio::join!(
            self.read_window(),
            self.read_phase(),
            self.read_native_quote(),
            self.read_purchased(wallet),
            self.read_stable_meta(wallet),
            self.read_native_balance(wallet),
        );

        {
            let mut state = self.state.write().await;
            // The wallet may have changed while reading
            let same_wallet = state.wallet == wallet;

            if let Some(window) = window {
                state.window = Some(window);
            }
            if let Some(read) = phase {
                state.current_phase = Some(read.index);
                state.set_phase(read.phase);
            }
            if let Some(quote) = quote {
                state.set_native_quote(quote);
            }
            if let Some(stable) = stable {
                if same_wallet {
                    state.set_stable(stable);
                } else {
                    state.stable = Some(StableTokenMeta {
                        caller_balance: None,
                        ..stable
                    });
                }
            }
            if same_wallet {
                if let Some(purchased) = purchased {
                    state.purchased = Some(purchased);
                }
                if let Some(balance) = native_balance {
                    state.native_balance = Some(balance);
                }
            }
            state.last_refresh = Some(Utc::now().timestamp());
        }

        if notify {
            self.notifier.success(None, "Data refreshed");
        }
    }

    /// Reads the stable-token metadata on its own and stores it. Used when a
    /// stable purchase finds no metadata from earlier refreshes.
    pub async fn fetch_stable_meta(&self) -> Option<StableTokenMeta> {
        let wallet = self.wallet().await;
        let stable = self.read_stable_meta(wallet).await?;
        let mut state = self.state.write().await;
        if state.wallet == wallet {
            state.set_stable(stable);
        } else {
            state.stable = Some(StableTokenMeta {
                caller_balance: None,
                ..stable
            });
        }
        state.stable
    }

    async fn read_window(&self) -> Option<PresaleWindow> {
        log_failure("presale window", self.reader.presale_window().await)
    }

    async fn read_phase(&self) -> Option<PhaseRead> {
        let index = log_failure("current phase", self.reader.current_phase().await)?;

        let phase = match self.reader.phase(index).await {
            Ok(phase) => Some(phase),
            // The contract may report a phase before its data is populated
            Err(err) if index > 0 => {
                warn!("Phase {} not readable, trying {}: {:#}", index, index - 1, err);
                log_failure("previous phase", self.reader.phase(index - 1).await)
            }
            Err(err) => {
                warn!("Phase {} not readable: {:#}", index, err);
                None
            }
        };

        Some(PhaseRead { index, phase })
    }

    async fn read_native_quote(&self) -> Option<U256> {
        log_failure("native quote", self.reader.native_usd_price().await)
    }

    async fn read_purchased(&self, wallet: Option<Address>) -> Option<U256> {
        let wallet = wallet?;
        log_failure("purchased", self.reader.purchased(wallet).await)
    }

    async fn read_native_balance(&self, wallet: Option<Address>) -> Option<U256> {
        let wallet = wallet?;
        log_failure("native balance", self.reader.native_balance(wallet).await)
    }

    async fn read_stable_meta(&self, wallet: Option<Address>) -> Option<StableTokenMeta> {
        let address = log_failure("stable token", self.reader.stable_token().await)?;
        let decimals = log_failure(
            "stable token decimals",
            self.reader.token_decimals(address).await,
        )?;
        let caller_balance = match wallet {
            Some(owner) => log_failure(
                "stable token balance",
                self.reader.token_balance(address, owner).await,
            ),
            None => None,
        };
        Some(StableTokenMeta {
            address,
            decimals,
            caller_balance,
        })
    }
}

fn log_failure<T>(what: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("Failed to read {}: {:#}", what, err);
            None
        }
    }
}

/// Refreshes the state every `poll_interval` without notifying.
pub async fn poll_loop(sync: Arc<PresaleSync>, poll_interval: Duration) {
    info!("presale poll loop started, interval: {:?}", poll_interval);
    loop {
        sleep(poll_interval).await;
        sync.refresh(false).await;
    }
}

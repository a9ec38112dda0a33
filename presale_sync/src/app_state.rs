use std::sync::Arc;

use alloy::primitives::Address;

use crate::{
    clock::Clock, notifier::Notifier, profile_store::ProfileStore, state::Symbols,
    sync::PresaleSync, transactions::TransactionHandler,
};

pub struct AppState {
    pub sync: Arc<PresaleSync>,
    pub transactions: TransactionHandler,
    pub notifier: Arc<Notifier>,
    pub clock: Clock,
    /// `None` when no profile store is configured.
    pub profiles: Option<Arc<dyn ProfileStore>>,
    /// Address of the configured signer; the wallet context cannot move away from it.
    pub signer: Option<Address>,
    pub symbols: Symbols,
    pub referral_base_url: String,
}

use std::sync::Arc;

use alloy::primitives::Address;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use presale_util::{expected_tokens_for_native, expected_tokens_for_stable};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{
    app_state::AppState,
    notifier::Notification,
    profile_store::referral_link,
    site::{site_content, SiteContent},
    state::PresaleView,
    transactions::TxOutcome,
};

type Rejection = (StatusCode, String);

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuoteParams {
    pub native: Option<String>,
    pub stable: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub native_tokens: String,
    pub stable_tokens: String,
    pub price_per_token_usd: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct WalletRequest {
    pub address: Option<String>,
    pub referrer: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AmountRequest {
    #[serde(default)]
    pub amount: String,
}

#[derive(Debug, Serialize)]
pub struct ReferralResponse {
    pub wallet: Address,
    pub link: String,
    pub code: Option<String>,
}

pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn handle_get_state(State(state): State<Arc<AppState>>) -> Json<PresaleView> {
    Json(current_view(&state).await)
}

pub async fn handle_refresh(State(state): State<Arc<AppState>>) -> Json<PresaleView> {
    state.sync.refresh(true).await;
    Json(current_view(&state).await)
}

pub async fn handle_get_quote(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QuoteParams>,
) -> Json<QuoteResponse> {
    let snapshot = state.sync.snapshot().await;
    let price = snapshot.price_per_token_usd();
    let native = params.native.unwrap_or_default();
    let stable = params.stable.unwrap_or_default();

    Json(QuoteResponse {
        native_tokens: expected_tokens_for_native(&native, snapshot.native_usd_quote, price),
        stable_tokens: expected_tokens_for_stable(&stable, price),
        price_per_token_usd: price,
    })
}

/// Switches the wallet context. A connected wallet is saved to the profile
/// store and, with a referrer, recorded as referred.
pub async fn handle_set_wallet(
    State(state): State<Arc<AppState>>,
    Json(request): Json<WalletRequest>,
) -> Result<Json<PresaleView>, Rejection> {
    let wallet = match request.address.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(address) => Some(address.parse::<Address>().map_err(|err| {
            info!("Rejected wallet address {}: {}", address, err);
            (StatusCode::BAD_REQUEST, "Invalid wallet address".to_string())
        })?),
    };
    if let Some(signer) = state.signer {
        if wallet != Some(signer) {
            return Err((
                StatusCode::BAD_REQUEST,
                "Wallet is bound to the configured signer".to_string(),
            ));
        }
    }

    state.sync.set_wallet(wallet).await;

    if let (Some(wallet), Some(profiles)) = (wallet, state.profiles.as_ref()) {
        let wallet = wallet.to_string();
        profiles.save_user(&wallet).await;

        let referrer = request.referrer.as_deref().map(str::trim).unwrap_or_default();
        if !referrer.is_empty() && !referrer.eq_ignore_ascii_case(&wallet) {
            profiles.record_referral(referrer, &wallet).await;
        }
    }

    Ok(Json(current_view(&state).await))
}

pub async fn handle_buy_native(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AmountRequest>,
) -> (StatusCode, Json<TxOutcome>) {
    let outcome = state.transactions.buy_with_native(&request.amount).await;
    respond(outcome)
}

pub async fn handle_buy_stable(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AmountRequest>,
) -> (StatusCode, Json<TxOutcome>) {
    let outcome = state.transactions.buy_with_stable(&request.amount).await;
    respond(outcome)
}

pub async fn handle_claim(State(state): State<Arc<AppState>>) -> (StatusCode, Json<TxOutcome>) {
    let outcome = state.transactions.claim_tokens(state.clock.now()).await;
    respond(outcome)
}

pub async fn handle_get_notifications(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<Notification>> {
    Json(state.notifier.active())
}

pub async fn handle_get_referral(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReferralResponse>, Rejection> {
    let Some(wallet) = state.sync.wallet().await else {
        return Err((StatusCode::BAD_REQUEST, "Connect a wallet first".to_string()));
    };

    let link = referral_link(&state.referral_base_url, &wallet.to_string()).map_err(|err| {
        error!("Failed to build referral link: {:#}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "Referral link unavailable".to_string())
    })?;
    let code = match state.profiles.as_ref() {
        Some(profiles) => profiles.referral_code(&wallet.to_string()).await,
        None => None,
    };

    Ok(Json(ReferralResponse { wallet, link, code }))
}

pub async fn handle_get_site() -> Json<SiteContent> {
    Json(site_content())
}

async fn current_view(state: &AppState) -> PresaleView {
    state
        .sync
        .snapshot()
        .await
        .view(state.clock.now(), &state.symbols)
}

fn respond(outcome: TxOutcome) -> (StatusCode, Json<TxOutcome>) {
    let status = match &outcome {
        TxOutcome::Rejected { .. } => StatusCode::BAD_REQUEST,
        TxOutcome::Confirmed { .. } => StatusCode::OK,
        TxOutcome::Failed { .. } => StatusCode::BAD_GATEWAY,
    };
    (status, Json(outcome))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::{
        clock::Clock,
        eth_client::{PresaleWriter, TransactionIntent},
        notifier::{NotificationKind, Notifier},
        profile_store::{ProfileStore, Referral, UserProfile},
        state::{PresaleWindow, Symbols},
        sync::{
            tests::{FakeChain, FakeData, WALLET},
            PresaleSync,
        },
        transactions::{tests::FakeWriter, TransactionHandler},
    };

    const REFERRER: &str = "0x2222222222222222222222222222222222222222";

    #[derive(Default)]
    struct MemoryProfiles {
        users: Mutex<Vec<String>>,
        referrals: Mutex<Vec<Referral>>,
    }

    #[async_trait]
    impl ProfileStore for MemoryProfiles {
        async fn save_user(&self, wallet: &str) -> Option<UserProfile> {
            self.users.lock().unwrap().push(wallet.to_string());
            Some(UserProfile {
                wallet_address: wallet.to_string(),
                referral_code: Some("CRPX-1".to_string()),
            })
        }

        async fn record_referral(&self, referrer: &str, referred: &str) -> Option<Referral> {
            let referral = Referral {
                referrer_wallet: referrer.to_string(),
                referred_wallet: referred.to_string(),
            };
            self.referrals.lock().unwrap().push(referral.clone());
            Some(referral)
        }

        async fn referral_code(&self, wallet: &str) -> Option<String> {
            self.users
                .lock()
                .unwrap()
                .iter()
                .any(|w| w == wallet)
                .then(|| "CRPX-1".to_string())
        }
    }

    fn app(
        wallet: Option<Address>,
        signer: Option<Address>,
        profiles: Arc<MemoryProfiles>,
    ) -> Arc<AppState> {
        app_with(FakeData::default(), None, wallet, signer, profiles)
    }

    fn app_with(
        data: FakeData,
        writer: Option<Arc<FakeWriter>>,
        wallet: Option<Address>,
        signer: Option<Address>,
        profiles: Arc<MemoryProfiles>,
    ) -> Arc<AppState> {
        let chain = FakeChain::new(data);
        let notifier = Arc::new(Notifier::new());
        let sync = Arc::new(PresaleSync::new(chain, notifier.clone(), wallet));
        let symbols = Symbols {
            native: "BNB".to_string(),
            stable: "USDT".to_string(),
            token: "CRPX".to_string(),
            token_address: Address::ZERO,
        };
        let transactions = TransactionHandler::new(
            sync.clone(),
            writer.map(|w| w as Arc<dyn PresaleWriter>),
            notifier.clone(),
            Address::ZERO,
            symbols.clone(),
        );
        Arc::new(AppState {
            sync,
            transactions,
            notifier,
            clock: Clock::start(),
            profiles: Some(profiles as Arc<dyn ProfileStore>),
            signer,
            symbols,
            referral_base_url: "https://cryptix.io/".to_string(),
        })
    }

    #[tokio::test]
    async fn test_refresh_populates_state_and_notifies() {
        let state = app(Some(WALLET), None, Arc::default());

        let Json(view) = handle_get_state(State(state.clone())).await;
        assert!(view.phase.is_none());
        assert_eq!(view.status_text, "Loading...");

        let Json(view) = handle_refresh(State(state.clone())).await;
        assert_eq!(view.phase.unwrap().progress_percent, 25.0);
        assert_eq!(view.purchased, "2");
        assert!(view.stable_available);

        let Json(notifications) = handle_get_notifications(State(state)).await;
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::Success);
        assert_eq!(notifications[0].message, "Data refreshed");
    }

    #[tokio::test]
    async fn test_quote_previews_tokens() {
        let state = app(None, None, Arc::default());
        state.sync.refresh(false).await;

        let params = QuoteParams {
            native: Some("1".to_string()),
            stable: Some("10".to_string()),
        };
        let Json(quote) = handle_get_quote(State(state.clone()), Query(params)).await;
        assert_eq!(quote.native_tokens, "60000.00");
        assert_eq!(quote.stable_tokens, "1000.00");

        let Json(quote) = handle_get_quote(State(state), Query(QuoteParams::default())).await;
        assert_eq!(quote.native_tokens, "0");
        assert_eq!(quote.stable_tokens, "0");
    }

    #[tokio::test]
    async fn test_set_wallet_saves_user_and_records_referral() {
        let profiles = Arc::new(MemoryProfiles::default());
        let state = app(None, None, profiles.clone());

        let request = WalletRequest {
            address: Some(WALLET.to_string()),
            referrer: Some(REFERRER.to_string()),
        };
        let Json(view) = handle_set_wallet(State(state.clone()), Json(request))
            .await
            .unwrap();
        assert_eq!(view.wallet, Some(WALLET));
        assert_eq!(view.purchased, "2");

        assert_eq!(profiles.users.lock().unwrap().clone(), vec![WALLET.to_string()]);
        let referrals = profiles.referrals.lock().unwrap().clone();
        assert_eq!(referrals.len(), 1);
        assert_eq!(referrals[0].referrer_wallet, REFERRER);
        assert_eq!(referrals[0].referred_wallet, WALLET.to_string());

        let Json(referral) = handle_get_referral(State(state)).await.unwrap();
        assert_eq!(referral.wallet, WALLET);
        assert_eq!(referral.link, format!("https://cryptix.io/?ref={}", WALLET));
        assert_eq!(referral.code.as_deref(), Some("CRPX-1"));
    }

    #[tokio::test]
    async fn test_self_referral_is_ignored() {
        let profiles = Arc::new(MemoryProfiles::default());
        let state = app(None, None, profiles.clone());

        let request = WalletRequest {
            address: Some(WALLET.to_string()),
            referrer: Some(WALLET.to_string().to_lowercase()),
        };
        handle_set_wallet(State(state), Json(request)).await.unwrap();
        assert!(profiles.referrals.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_wallet_rejects_bad_input() {
        let state = app(None, None, Arc::default());
        let request = WalletRequest {
            address: Some("0x1234".to_string()),
            referrer: None,
        };
        let (status, _) = handle_set_wallet(State(state), Json(request))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let state = app(Some(WALLET), Some(WALLET), Arc::default());
        let request = WalletRequest {
            address: Some(REFERRER.to_string()),
            referrer: None,
        };
        let (status, _) = handle_set_wallet(State(state.clone()), Json(request))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(state.sync.wallet().await, Some(WALLET));
    }

    #[tokio::test]
    async fn test_disconnect_clears_wallet() {
        let profiles = Arc::new(MemoryProfiles::default());
        let state = app(Some(WALLET), None, profiles.clone());
        state.sync.refresh(false).await;

        let Json(view) = handle_set_wallet(State(state.clone()), Json(WalletRequest::default()))
            .await
            .unwrap();
        assert!(view.wallet.is_none());
        assert_eq!(view.purchased, "0");
        assert!(profiles.users.lock().unwrap().is_empty());

        let (status, _) = handle_get_referral(State(state)).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_writes_without_signer_are_rejected() {
        let state = app(Some(WALLET), None, Arc::default());

        let request = AmountRequest {
            amount: "1".to_string(),
        };
        let (status, Json(outcome)) = handle_buy_native(State(state.clone()), Json(request)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            outcome,
            TxOutcome::Rejected {
                message: "Connect a wallet first".to_string()
            }
        );

        let (status, Json(outcome)) =
            handle_buy_stable(State(state), Json(AmountRequest::default())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            outcome,
            TxOutcome::Rejected {
                message: "Enter USDT amount".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_claim_waits_for_presale_end() {
        let data = FakeData {
            window: Some(PresaleWindow {
                start: 200,
                end: i64::MAX / 2,
            }),
            ..Default::default()
        };
        let writer = Arc::new(FakeWriter::default());
        let state = app_with(
            data,
            Some(writer.clone()),
            Some(WALLET),
            Some(WALLET),
            Arc::default(),
        );
        state.sync.refresh(false).await;

        let Json(view) = handle_get_state(State(state.clone())).await;
        assert!(!view.claim_available);
        let (status, Json(outcome)) = handle_claim(State(state)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            outcome,
            TxOutcome::Rejected {
                message: "Claim opens after the presale ends".to_string()
            }
        );
        assert!(writer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_claim_sent_after_presale_end() {
        let writer = Arc::new(FakeWriter::default());
        let state = app_with(
            FakeData::default(),
            Some(writer.clone()),
            Some(WALLET),
            Some(WALLET),
            Arc::default(),
        );
        state.sync.refresh(false).await;

        let Json(view) = handle_get_state(State(state.clone())).await;
        assert!(view.claim_available);
        let (status, Json(outcome)) = handle_claim(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(matches!(outcome, TxOutcome::Confirmed { .. }));
        assert_eq!(writer.sent(), vec![TransactionIntent::ClaimTokens]);
    }

    #[test]
    fn test_outcome_status_codes() {
        let (status, _) = respond(TxOutcome::Failed {
            tx_hash: None,
            message: "Claim failed".to_string(),
        });
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
}

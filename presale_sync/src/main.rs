use std::{net::SocketAddr, sync::Arc, time::Duration};

use alloy::{
    network::EthereumWallet,
    primitives::Address,
    providers::{Provider, ProviderBuilder},
};
use anyhow::{anyhow, Context, Result};
use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        Method,
    },
    routing::{get, post},
    Router,
};
use clap::Parser;
use reqwest::Url;
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    app_state::AppState,
    cfg::Cfg,
    clock::Clock,
    eth_client::{EthClient, PresaleWriter},
    notifier::Notifier,
    profile_store::{referral_link, ProfileStore, RestProfileStore},
    state::Symbols,
    sync::{poll_loop, PresaleSync},
    transactions::TransactionHandler,
};

mod app_state;
mod cfg;
mod clock;
mod contracts;
mod eth_client;
mod http_handler;
mod notifier;
mod profile_store;
mod site;
mod state;
mod sync;
mod transactions;

fn parse_address(value: &str, what: &str) -> Result<Address> {
    value
        .parse()
        .map_err(|e| anyhow!("Error parsing {} address: {}", what, e))
}

fn profile_store(cfg: &Cfg) -> Result<Option<Arc<dyn ProfileStore>>> {
    match (&cfg.profile_store_url, &cfg.profile_store_key) {
        (Some(url), Some(key)) => {
            let store = RestProfileStore::new(url, key)?;
            Ok(Some(Arc::new(store)))
        }
        (None, None) => {
            info!("no profile store configured, referrals are disabled");
            Ok(None)
        }
        _ => Err(anyhow!(
            "PROFILE_STORE_URL and PROFILE_STORE_KEY must be set together"
        )),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logging: controlled via RUST_LOG, e.g. RUST_LOG=info,presale_sync=debug
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = Cfg::parse();

    let presale = parse_address(&cfg.presale_contract_address, "presale contract")?;
    let token = parse_address(&cfg.token_contract_address, "token contract")?;
    // Fail early on a base url that cannot carry the ref parameter
    referral_link(&cfg.referral_base_url, &Address::ZERO.to_string())?;

    let rpc_url = Url::parse(&cfg.eth_rpc_url).context("parsing rpc url")?;
    let (provider, signer) = match cfg.ethereum_private_key.clone() {
        Some(signer) => {
            let address = signer.address();
            let provider = ProviderBuilder::new()
                .wallet(EthereumWallet::from(signer))
                .connect_http(rpc_url)
                .erased();
            (provider, Some(address))
        }
        None => (ProviderBuilder::new().connect_http(rpc_url).erased(), None),
    };
    let chain_id = provider
        .get_chain_id()
        .await
        .context("failed to reach the rpc endpoint")?;
    info!("connected to chain {}", chain_id);

    let wallet = match (signer, &cfg.wallet_address) {
        (Some(signer), Some(configured)) => {
            if parse_address(configured, "wallet")? != signer {
                warn!("WALLET_ADDRESS differs from the signer, using {}", signer);
            }
            Some(signer)
        }
        (Some(signer), None) => Some(signer),
        (None, Some(configured)) => Some(parse_address(configured, "wallet")?),
        (None, None) => None,
    };
    match (signer, wallet) {
        (Some(signer), _) => info!("signing as {}", signer),
        (None, Some(wallet)) => info!("read-only wallet {}", wallet),
        (None, None) => info!("no wallet connected"),
    }

    let eth = Arc::new(EthClient::new(
        provider,
        presale,
        Duration::from_millis(cfg.receipt_poll_millis),
    ));
    let writer: Option<Arc<dyn PresaleWriter>> = match signer {
        Some(_) => Some(eth.clone()),
        None => None,
    };

    let symbols = Symbols {
        native: cfg.native_symbol.clone(),
        stable: cfg.stable_symbol.clone(),
        token: cfg.token_symbol.clone(),
        token_address: token,
    };

    let notifier = Arc::new(Notifier::new());
    let sync = Arc::new(PresaleSync::new(eth, notifier.clone(), wallet));
    sync.refresh(false).await;

    if cfg.poll_secs > 0 {
        tokio::spawn(poll_loop(sync.clone(), Duration::from_secs(cfg.poll_secs)));
    }

    let transactions = TransactionHandler::new(
        sync.clone(),
        writer,
        notifier.clone(),
        presale,
        symbols.clone(),
    );

    let state = Arc::new(AppState {
        sync,
        transactions,
        notifier,
        clock: Clock::start(),
        profiles: profile_store(&cfg)?,
        signer,
        symbols,
        referral_base_url: cfg.referral_base_url.clone(),
    });

    // HTTP server
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(Any)
        .allow_headers([ACCEPT, CONTENT_TYPE]);

    let app = Router::new()
        .route("/health", get(http_handler::handle_health))
        .route("/state", get(http_handler::handle_get_state))
        .route("/refresh", post(http_handler::handle_refresh))
        .route("/quote", get(http_handler::handle_get_quote))
        .route("/wallet", post(http_handler::handle_set_wallet))
        .route("/buy/native", post(http_handler::handle_buy_native))
        .route("/buy/stable", post(http_handler::handle_buy_stable))
        .route("/claim", post(http_handler::handle_claim))
        .route("/notifications", get(http_handler::handle_get_notifications))
        .route("/referral", get(http_handler::handle_get_referral))
        .route("/site", get(http_handler::handle_get_site))
        .layer(cors)
        .with_state(state.clone());

    let addr: SocketAddr = format!("0.0.0.0:{}", cfg.port)
        .parse()
        .context("invalid listen addr")?;
    info!("listening on {}", addr);

    let listener = TcpListener::bind(addr).await.context("bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    state.clock.stop();
    info!("shutdown complete");

    Ok(())
}

// Graceful shutdown on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}

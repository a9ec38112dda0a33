use alloy::signers::local::PrivateKeySigner;
use clap::Parser;

#[derive(Parser, Debug)]
pub struct Cfg {
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    #[arg(long, env = "ETH_RPC_URL", default_value = "https://bsc-dataseed.binance.org")]
    pub eth_rpc_url: String,

    #[arg(long, env = "PRESALE_CONTRACT_ADDRESS")]
    pub presale_contract_address: String,

    #[arg(long, env = "TOKEN_CONTRACT_ADDRESS")]
    pub token_contract_address: String,

    // Signs purchases and claims; the wallet address is derived from it
    #[arg(long, env = "ETHEREUM_PRIVATE_KEY")]
    pub ethereum_private_key: Option<PrivateKeySigner>,

    // Read-only wallet used when no private key is configured
    #[arg(long, env = "WALLET_ADDRESS")]
    pub wallet_address: Option<String>,

    // 0 disables the periodic refresh
    #[arg(long, env = "POLL_SECS", default_value_t = 30)]
    pub poll_secs: u64,

    #[arg(long, env = "RECEIPT_POLL_MILLIS", default_value_t = 1000)]
    pub receipt_poll_millis: u64,

    // Profile store (PostgREST) params
    #[arg(long, env = "PROFILE_STORE_URL")]
    pub profile_store_url: Option<String>,

    #[arg(long, env = "PROFILE_STORE_KEY")]
    pub profile_store_key: Option<String>,

    #[arg(long, env = "REFERRAL_BASE_URL", default_value = "https://cryptix.io/")]
    pub referral_base_url: String,

    // Display symbols
    #[arg(long, env = "NATIVE_SYMBOL", default_value = "BNB")]
    pub native_symbol: String,

    #[arg(long, env = "STABLE_SYMBOL", default_value = "USDT")]
    pub stable_symbol: String,

    #[arg(long, env = "TOKEN_SYMBOL", default_value = "CRPX")]
    pub token_symbol: String,
}

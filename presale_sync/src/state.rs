use alloy::primitives::{Address, U256};
use presale_util::{
    claim_available, format_token_amount, infer_price_scale, presale_status, progress_percent,
    to_decimal_f64, PresaleStatus, PriceScale, QUOTE_DECIMALS, TOKEN_DECIMALS,
};
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PresaleWindow {
    pub start: i64,
    pub end: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Phase {
    pub index: u64,
    pub price_raw: U256,
    pub allocation: U256,
    pub sold: U256,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StableTokenMeta {
    pub address: Address,
    pub decimals: u8,
    /// Absent without a connected wallet.
    pub caller_balance: Option<U256>,
}

/// Raw values of the last refresh cycles. Every field is overwritten on
/// its own; a failed read leaves the previous value in place.
#[derive(Clone, Debug, Default)]
pub struct PresaleState {
    pub wallet: Option<Address>,
    pub window: Option<PresaleWindow>,
    pub current_phase: Option<u64>,
    pub phase: Option<Phase>,
    pub price_scale: Option<PriceScale>,
    pub native_usd_quote: Option<f64>,
    pub purchased: Option<U256>,
    pub stable: Option<StableTokenMeta>,
    pub native_balance: Option<U256>,
    pub last_refresh: Option<i64>,
}

impl PresaleState {
    pub fn set_phase(&mut self, phase: Option<Phase>) {
        self.price_scale = phase.map(|p| infer_price_scale(p.price_raw));
        self.phase = phase;
    }

    pub fn set_native_quote(&mut self, raw: U256) {
        self.native_usd_quote = Some(to_decimal_f64(raw, QUOTE_DECIMALS));
    }

    /// Stores fresh stable-token metadata. A failed balance read keeps the
    /// balance already known for the same token.
    pub fn set_stable(&mut self, mut stable: StableTokenMeta) {
        if stable.caller_balance.is_none() {
            stable.caller_balance = self
                .stable
                .filter(|s| s.address == stable.address)
                .and_then(|s| s.caller_balance);
        }
        self.stable = Some(stable);
    }

    /// Drops everything bound to the previous wallet.
    pub fn switch_wallet(&mut self, wallet: Option<Address>) {
        self.wallet = wallet;
        self.purchased = None;
        self.native_balance = None;
        if let Some(stable) = self.stable.as_mut() {
            stable.caller_balance = None;
        }
    }

    pub fn price_per_token_usd(&self) -> f64 {
        self.price_scale.map(|s| s.price_usd).unwrap_or(0.0)
    }

    pub fn view(&self, now: i64, symbols: &Symbols) -> PresaleView {
        let window = self.window.unwrap_or_default();
        let status = presale_status(now, window.start, window.end);

        PresaleView {
            wallet: self.wallet,
            now,
            presale_start: window.start,
            presale_end: window.end,
            status,
            status_text: status.text(),
            current_phase: self.current_phase,
            phase: self.phase.map(|p| PhaseView {
                index: p.index,
                price_raw: p.price_raw.to_string(),
                allocation: format_token_amount(p.allocation, TOKEN_DECIMALS),
                sold: format_token_amount(p.sold, TOKEN_DECIMALS),
                progress_percent: progress_percent(p.sold, p.allocation),
            }),
            price_per_token_usd: self.price_per_token_usd(),
            price_scale_decimals: self.price_scale.map(|s| s.decimals),
            native_usd_quote: self.native_usd_quote,
            purchased: self
                .purchased
                .map(|p| format_token_amount(p, TOKEN_DECIMALS))
                .unwrap_or_else(|| "0".to_string()),
            native_balance: self
                .native_balance
                .map(|b| format_token_amount(b, TOKEN_DECIMALS)),
            stable_token: self.stable.map(|s| s.address),
            stable_balance: self.stable.and_then(|s| {
                s.caller_balance
                    .map(|b| format_token_amount(b, s.decimals))
            }),
            stable_available: self.stable.is_some(),
            claim_available: claim_available(now, window.end),
            symbols: symbols.clone(),
            last_refresh: self.last_refresh,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Symbols {
    pub native: String,
    pub stable: String,
    pub token: String,
    pub token_address: Address,
}

#[derive(Clone, Debug, Serialize)]
pub struct PhaseView {
    pub index: u64,
    pub price_raw: String,
    pub allocation: String,
    pub sold: String,
    pub progress_percent: f64,
}

/// Display-ready state served to clients.
#[derive(Clone, Debug, Serialize)]
pub struct PresaleView {
    pub wallet: Option<Address>,
    pub now: i64,
    pub presale_start: i64,
    pub presale_end: i64,
    pub status: PresaleStatus,
    pub status_text: &'static str,
    pub current_phase: Option<u64>,
    pub phase: Option<PhaseView>,
    pub price_per_token_usd: f64,
    pub price_scale_decimals: Option<u8>,
    pub native_usd_quote: Option<f64>,
    pub purchased: String,
    pub native_balance: Option<String>,
    pub stable_token: Option<Address>,
    pub stable_balance: Option<String>,
    pub stable_available: bool,
    pub claim_available: bool,
    pub symbols: Symbols,
    pub last_refresh: Option<i64>,
}

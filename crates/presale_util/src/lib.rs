//! Pure helpers behind the presale view: unit conversion, price-scale
//! inference and the derived display values.

pub mod derived;
pub mod price_scale;
pub mod units;

pub use derived::{
    claim_available, expected_tokens_for_native, expected_tokens_for_stable, presale_status,
    progress_percent, PresaleStatus,
};
pub use price_scale::{infer_price_scale, PriceScale};
pub use units::{
    format_token_amount, parse_positive, parse_token_amount, to_decimal_f64, QUOTE_DECIMALS,
    TOKEN_DECIMALS,
};

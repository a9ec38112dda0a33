use alloy_primitives::U256;
use serde::Serialize;

use crate::units::{to_decimal_f64, TOKEN_DECIMALS};

/// Prices the presale is known to run at, in USD per token.
pub const ALLOWED_PRICES: [f64; 5] = [0.001, 0.005, 0.01, 0.05, 0.1];

/// Decimal exponents tried when interpreting a raw phase price, most precise first.
pub const DECIMAL_CANDIDATES: [u8; 5] = [18, 8, 6, 3, 0];

/// Token price is assumed to stay below this many USD.
pub const MAX_PLAUSIBLE_PRICE: f64 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PriceScale {
    pub decimals: u8,
    pub price_usd: f64,
    /// False when no candidate was plausible and the 18-decimal reading was used as is.
    pub matched: bool,
}

/// Guesses the decimal scale of a raw on-chain phase price.
///
/// The presale contract does not report the scale of `priceUSD`, and it
/// differs between deployments. Every candidate exponent is tried; the
/// plausible reading (in `(0, 2]`) closest to one of [`ALLOWED_PRICES`]
/// wins, earlier candidates winning ties. Without any plausible reading
/// the 18-decimal value is returned.
///
/// A real price far away from every allowed price will be mis-scaled.
pub fn infer_price_scale(raw: U256) -> PriceScale {
    let mut best: Option<(PriceScale, f64)> = None;

    for decimals in DECIMAL_CANDIDATES {
        let price_usd = to_decimal_f64(raw, decimals);
        if price_usd <= 0.0 || price_usd > MAX_PLAUSIBLE_PRICE {
            continue;
        }
        let distance = nearest_allowed_distance(price_usd);
        let better = match &best {
            Some((_, best_distance)) => distance < *best_distance,
            None => true,
        };
        if better {
            best = Some((
                PriceScale {
                    decimals,
                    price_usd,
                    matched: true,
                },
                distance,
            ));
        }
    }

    match best {
        Some((scale, _)) => scale,
        None => PriceScale {
            decimals: TOKEN_DECIMALS,
            price_usd: to_decimal_f64(raw, TOKEN_DECIMALS),
            matched: false,
        },
    }
}

fn nearest_allowed_distance(price: f64) -> f64 {
    ALLOWED_PRICES
        .iter()
        .map(|allowed| (allowed - price).abs())
        .fold(f64::INFINITY, f64::min)
}

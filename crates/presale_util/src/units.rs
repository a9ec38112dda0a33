use alloy_primitives::{
    utils::{format_units, parse_units},
    U256,
};
use anyhow::{anyhow, bail, Result};

/// Decimals of the presale token and of the native coin.
pub const TOKEN_DECIMALS: u8 = 18;

/// The native-coin oracle reports USD with 8 decimals.
pub const QUOTE_DECIMALS: u8 = 8;

/// Renders base units as a decimal string without trailing zeros,
/// e.g. `1500000000000000000` with 18 decimals -> `"1.5"`.
pub fn format_token_amount(raw: U256, decimals: u8) -> String {
    if decimals == 0 {
        return raw.to_string();
    }
    match format_units(raw, decimals) {
        Ok(formatted) => trim_decimal(&formatted),
        Err(_) => raw.to_string(),
    }
}

fn trim_decimal(value: &str) -> String {
    if !value.contains('.') {
        return value.to_string();
    }
    let trimmed = value.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Interprets `raw` as a fixed-point number with `decimals` places.
pub fn to_decimal_f64(raw: U256, decimals: u8) -> f64 {
    format_token_amount(raw, decimals).parse::<f64>().unwrap_or(0.0)
}

/// Parses user input such as `"0.25"`. Returns `None` for empty,
/// non-numeric or non-positive input.
pub fn parse_positive(input: &str) -> Option<f64> {
    let value = input.trim().parse::<f64>().ok()?;
    if value.is_finite() && value > 0.0 {
        Some(value)
    } else {
        None
    }
}

/// Converts a user-entered amount into base units of a token with
/// `decimals` places. Rejects anything that is not strictly positive or
/// carries more fractional digits than the token can hold.
pub fn parse_token_amount(input: &str, decimals: u8) -> Result<U256> {
    let input = input.trim();
    if parse_positive(input).is_none() {
        bail!("amount must be a positive number, got {:?}", input);
    }
    if let Some((_, fraction)) = input.split_once('.') {
        if fraction.trim_end_matches('0').len() > decimals as usize {
            bail!("amount {:?} has more than {} decimals", input, decimals);
        }
    }
    let amount = parse_units(input, decimals)
        .map_err(|e| anyhow!("invalid amount {:?}: {}", input, e))?
        .get_absolute();
    if amount.is_zero() {
        bail!("amount {:?} is below the token precision", input);
    }
    Ok(amount)
}

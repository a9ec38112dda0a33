use std::fmt;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::units::parse_positive;

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresaleStatus {
    #[default]
    Loading,
    NotStarted,
    Live,
    Ended,
}

impl PresaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresaleStatus::Loading => "loading",
            PresaleStatus::NotStarted => "not started",
            PresaleStatus::Live => "live",
            PresaleStatus::Ended => "ended",
        }
    }

    /// Banner text shown next to the countdown.
    pub fn text(&self) -> &'static str {
        match self {
            PresaleStatus::Loading => "Loading...",
            PresaleStatus::NotStarted => "Presale not started yet",
            PresaleStatus::Live => "Presale live",
            PresaleStatus::Ended => "Presale ended",
        }
    }
}

impl fmt::Display for PresaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies `now` against the presale window. A zero bound means the
/// window has not been read yet.
pub fn presale_status(now: i64, start: i64, end: i64) -> PresaleStatus {
    if start == 0 || end == 0 {
        return PresaleStatus::Loading;
    }
    if now < start {
        PresaleStatus::NotStarted
    } else if now > end {
        PresaleStatus::Ended
    } else {
        PresaleStatus::Live
    }
}

pub fn claim_available(now: i64, end: i64) -> bool {
    end > 0 && now > end
}

/// Share of the phase allocation already sold, in percent.
pub fn progress_percent(sold: U256, allocation: U256) -> f64 {
    if allocation.is_zero() {
        return 0.0;
    }
    let sold = u256_as_f64(sold);
    let allocation = u256_as_f64(allocation);
    (sold / allocation * 100.0).clamp(0.0, 100.0)
}

fn u256_as_f64(value: U256) -> f64 {
    value.to_string().parse::<f64>().unwrap_or(0.0)
}

/// Tokens received for `native_amount` coins at the given quote and token price.
pub fn expected_tokens_for_native(
    native_amount: &str,
    native_usd_quote: Option<f64>,
    price_per_token_usd: f64,
) -> String {
    let (Some(amount), Some(quote)) = (parse_positive(native_amount), native_usd_quote) else {
        return "0".to_string();
    };
    if quote <= 0.0 || price_per_token_usd <= 0.0 {
        return "0".to_string();
    }
    format!("{:.2}", amount * quote / price_per_token_usd)
}

/// Tokens received for `stable_amount` units of the stable token.
pub fn expected_tokens_for_stable(stable_amount: &str, price_per_token_usd: f64) -> String {
    let Some(amount) = parse_positive(stable_amount) else {
        return "0".to_string();
    };
    if price_per_token_usd <= 0.0 {
        return "0".to_string();
    }
    format!("{:.2}", amount / price_per_token_usd)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presale_status() {
        assert_eq!(presale_status(100, 200, 300), PresaleStatus::NotStarted);
        assert_eq!(presale_status(350, 200, 300), PresaleStatus::Ended);
        assert_eq!(presale_status(250, 200, 300), PresaleStatus::Live);
        assert_eq!(presale_status(250, 200, 300).to_string(), "live");
        assert_eq!(presale_status(100, 200, 300).to_string(), "not started");
        assert_eq!(presale_status(350, 200, 300).to_string(), "ended");
    }

    #[test]
    fn test_presale_status_bounds_are_live() {
        assert_eq!(presale_status(200, 200, 300), PresaleStatus::Live);
        assert_eq!(presale_status(300, 200, 300), PresaleStatus::Live);
    }

    #[test]
    fn test_presale_status_loading() {
        assert_eq!(presale_status(250, 0, 300), PresaleStatus::Loading);
        assert_eq!(presale_status(250, 200, 0), PresaleStatus::Loading);
        assert_eq!(PresaleStatus::Loading.text(), "Loading...");
    }

    #[test]
    fn test_claim_available() {
        assert!(claim_available(301, 300));
        assert!(!claim_available(300, 300));
        assert!(!claim_available(250, 300));
        assert!(!claim_available(1_000, 0));
    }

    #[test]
    fn test_progress_percent_zero_allocation() {
        assert_eq!(progress_percent(U256::ZERO, U256::ZERO), 0.0);
        assert_eq!(progress_percent(U256::from(500u64), U256::ZERO), 0.0);
    }

    #[test]
    fn test_progress_percent_range_and_monotonic() {
        let allocation = U256::from(1_000u64);
        assert_eq!(progress_percent(U256::ZERO, allocation), 0.0);

        let mut previous = 0.0;
        for sold in (0..=1_200u64).step_by(50) {
            let pct = progress_percent(U256::from(sold), allocation);
            assert!((0.0..=100.0).contains(&pct));
            assert!(pct >= previous);
            previous = pct;
        }
        assert_eq!(progress_percent(U256::from(250u64), allocation), 25.0);
        assert_eq!(progress_percent(U256::from(5_000u64), allocation), 100.0);
    }

    #[test]
    fn test_progress_percent_large_values() {
        let allocation = U256::from(10u64).pow(U256::from(27u64));
        let sold = allocation / U256::from(4u64);
        assert!((progress_percent(sold, allocation) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_expected_tokens_for_native() {
        assert_eq!(expected_tokens_for_native("1", Some(600.0), 0.01), "60000.00");
        assert_eq!(expected_tokens_for_native("0.5", Some(600.0), 0.05), "6000.00");
    }

    #[test]
    fn test_expected_tokens_for_native_zero_guard() {
        assert_eq!(expected_tokens_for_native("", Some(600.0), 0.01), "0");
        assert_eq!(expected_tokens_for_native("0", Some(600.0), 0.01), "0");
        assert_eq!(expected_tokens_for_native("1", Some(600.0), 0.0), "0");
        assert_eq!(expected_tokens_for_native("1", None, 0.01), "0");
        assert_eq!(expected_tokens_for_native("1", Some(0.0), 0.01), "0");
    }

    #[test]
    fn test_expected_tokens_for_stable() {
        assert_eq!(expected_tokens_for_stable("100", 0.01), "10000.00");
        assert_eq!(expected_tokens_for_stable("", 0.01), "0");
        assert_eq!(expected_tokens_for_stable("100", 0.0), "0");
        assert_eq!(expected_tokens_for_stable("-5", 0.01), "0");
    }
}

//! Decimal amount parsing and formatting
//!
//! All balance/amount comparisons happen in smallest-unit integer space
//! after decimal scaling. Decimal strings and floats are never compared
//! directly; precision loss at token-decimal boundaries is not acceptable.

use alloy::primitives::utils::{format_units, parse_units};
use alloy::primitives::U256;

use crate::error::BridgeError;
use crate::registry::Token;

/// Native amount kept back when spending "max", so the wallet can still pay
/// gas on its own chain.
pub const NATIVE_GAS_RESERVE: &str = "0.01";

/// Parse a user-entered decimal amount into smallest units.
///
/// Rejects empty, unparseable, negative, and zero amounts with a
/// `Validation` error; the chain never sees these.
pub fn parse_amount(input: &str, decimals: u8) -> Result<U256, BridgeError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(BridgeError::validation("amount is required"));
    }

    let parsed = parse_units(trimmed, decimals)
        .map_err(|e| BridgeError::Validation(format!("invalid amount {trimmed:?}: {e}")))?;
    if parsed.is_negative() {
        return Err(BridgeError::validation("amount must be greater than zero"));
    }

    let value = parsed.get_absolute();
    if value.is_zero() {
        return Err(BridgeError::validation("amount must be greater than zero"));
    }
    Ok(value)
}

/// Format a smallest-unit value back into a decimal string.
pub fn format_amount(value: U256, decimals: u8) -> String {
    format_units(value, decimals).unwrap_or_else(|_| value.to_string())
}

/// The largest amount of `token` a wallet holding `balance` can sensibly
/// spend. Native tokens keep a fixed gas reserve; ERC-20 balances are
/// spendable in full.
pub fn max_spendable(balance: U256, token: &Token) -> U256 {
    if !token.is_native() {
        return balance;
    }
    match parse_units(NATIVE_GAS_RESERVE, token.decimals) {
        Ok(reserve) => balance.saturating_sub(reserve.get_absolute()),
        Err(_) => balance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Token, TokenKind};
    use std::collections::HashMap;

    fn native_token(decimals: u8) -> Token {
        Token {
            symbol: "ETH".to_string(),
            name: "Ethereum".to_string(),
            decimals,
            kind: TokenKind::Native,
            addresses: HashMap::new(),
        }
    }

    #[test]
    fn test_parse_scales_to_smallest_units() {
        let wei = parse_amount("1.5", 18).unwrap();
        assert_eq!(wei, U256::from(1_500_000_000_000_000_000u128));

        let units = parse_amount("100", 6).unwrap();
        assert_eq!(units, U256::from(100_000_000u64));
    }

    #[test]
    fn test_parse_decimals_zero_is_valid() {
        // Decimals of 0 means whole units, not "missing".
        assert_eq!(parse_amount("5", 0).unwrap(), U256::from(5u64));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse_amount("", 18).is_err());
        assert!(parse_amount("   ", 18).is_err());
        assert!(parse_amount("abc", 18).is_err());
        assert!(parse_amount("0", 18).is_err());
        assert!(parse_amount("-1", 18).is_err());
    }

    #[test]
    fn test_parse_rejects_excess_precision() {
        // More fractional digits than the token carries cannot round-trip.
        assert!(parse_amount("0.0000001", 6).is_err());
    }

    #[test]
    fn test_format_round_trip() {
        let value = parse_amount("2.25", 18).unwrap();
        assert_eq!(format_amount(value, 18), "2.250000000000000000");
    }

    #[test]
    fn test_max_spendable_reserves_gas_for_native() {
        let token = native_token(18);
        let balance = parse_amount("1", 18).unwrap();
        let reserve = parse_amount(NATIVE_GAS_RESERVE, 18).unwrap();
        assert_eq!(max_spendable(balance, &token), balance - reserve);

        // Balance below the reserve clamps to zero instead of underflowing.
        let dust = U256::from(1u64);
        assert_eq!(max_spendable(dust, &token), U256::ZERO);
    }

    #[test]
    fn test_max_spendable_full_balance_for_erc20() {
        let token = Token {
            symbol: "USDT".to_string(),
            name: "Tether USD".to_string(),
            decimals: 6,
            kind: TokenKind::Erc20,
            addresses: HashMap::new(),
        };
        let balance = U256::from(123_456u64);
        assert_eq!(max_spendable(balance, &token), balance);
    }
}

//! Fee estimation
//!
//! Flat-plus-percentage display model: a fixed base fee in native units
//! plus a basis-point share of the transferred amount. Estimates are shown
//! to the user; actual fees settle in the contracts.

use alloy::primitives::U256;

use crate::amount::parse_amount;
use crate::config::FeeConfig;
use crate::error::BridgeError;

/// Fee parameters for one bridge instance.
#[derive(Debug, Clone)]
pub struct FeeSchedule {
    /// Flat component in native smallest units.
    base_fee: U256,
    /// Percentage component in basis points (1 bp = 0.01%).
    fee_bps: u32,
}

impl FeeSchedule {
    pub fn from_config(config: &FeeConfig, native_decimals: u8) -> Result<Self, BridgeError> {
        let base_fee = parse_amount(&config.base_fee, native_decimals)
            .map_err(|e| BridgeError::Configuration(format!("bad base fee: {e}")))?;
        Ok(FeeSchedule {
            base_fee,
            fee_bps: config.fee_bps,
        })
    }

    /// Estimated fee for transferring `amount` (smallest units).
    pub fn estimate(&self, amount: U256) -> U256 {
        self.base_fee + amount * U256::from(self.fee_bps) / U256::from(10_000u64)
    }

    pub fn fee_bps(&self) -> u32 {
        self.fee_bps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> FeeSchedule {
        FeeSchedule::from_config(
            &FeeConfig {
                base_fee: "0.001".to_string(),
                fee_bps: 10,
            },
            18,
        )
        .unwrap()
    }

    #[test]
    fn test_estimate_adds_base_and_percentage() {
        let fees = schedule();
        // 1 token at 10 bps = 0.001, plus 0.001 base.
        let amount = U256::from(10u64).pow(U256::from(18u64));
        let expected = U256::from(2_000_000_000_000_000u128);
        assert_eq!(fees.estimate(amount), expected);
    }

    #[test]
    fn test_zero_amount_still_pays_base() {
        let fees = schedule();
        assert_eq!(fees.estimate(U256::ZERO), U256::from(1_000_000_000_000_000u128));
    }

    #[test]
    fn test_bad_base_fee_is_configuration_error() {
        let result = FeeSchedule::from_config(
            &FeeConfig {
                base_fee: "abc".to_string(),
                fee_bps: 10,
            },
            18,
        );
        assert!(matches!(result, Err(BridgeError::Configuration(_))));
    }
}

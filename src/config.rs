//! Bridge configuration
//!
//! One immutable configuration struct, constructed once at process start
//! from environment variables and validated fully before any component is
//! built. Components never read the environment themselves.

use eyre::{eyre, Result, WrapErr};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::Path;

/// Main configuration for a bridge instance.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    pub l1: ChainConfig,
    pub l2: ChainConfig,
    pub tokens: TokenConfig,
    pub indexer: IndexerConfig,
    pub wallet: WalletConfig,
    pub polling: PollingConfig,
    pub fees: FeeConfig,
}

/// Per-chain configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub name: String,
    /// Native currency symbol (gas-paying asset).
    pub coin_symbol: String,
    pub rpc_url: String,
    pub explorer_url: String,
    /// Bridge contract address on this chain.
    pub bridge_address: String,
}

/// Cross-chain token pairing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    /// ERC-20 on L1 standing in for the L2 native coin.
    pub bridged_native_l1_address: String,
    /// Display symbol for that L1 representation. Defaults to the L2 coin
    /// symbol when unset.
    #[serde(default)]
    pub bridged_native_symbol: Option<String>,
    /// ERC-20 on L2 wrapping the L1 native coin. When unset, the address is
    /// resolved once at startup from the L2 bridge contract.
    #[serde(default)]
    pub wrapped_native_l2_address: Option<String>,
    /// Display symbol for the L2 wrapper. Defaults to "w" + the L1 coin
    /// symbol when unset.
    #[serde(default)]
    pub wrapped_native_symbol: Option<String>,
}

/// Pending-withdrawal indexer configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexerConfig {
    /// Base URL of the backend serving pending withdrawals per address.
    pub base_url: String,
}

/// Signing wallet configuration.
#[derive(Clone, Deserialize)]
pub struct WalletConfig {
    /// Private key for the headless session wallet. Optional: read-only
    /// commands work without it, write flows require it.
    #[serde(default)]
    pub private_key: Option<String>,
}

/// Custom Debug that redacts the private key to prevent accidental log leakage.
impl fmt::Debug for WalletConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletConfig")
            .field(
                "private_key",
                &self.private_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Polling intervals for refresh loops.
#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_balance_interval")]
    pub balance_interval_ms: u64,
    #[serde(default = "default_claim_interval")]
    pub claim_interval_ms: u64,
}

/// Flat-plus-percentage fee display model.
#[derive(Debug, Clone, Deserialize)]
pub struct FeeConfig {
    /// Flat component in native units, as a decimal string.
    #[serde(default = "default_base_fee")]
    pub base_fee: String,
    /// Percentage component in basis points (1 bp = 0.01%).
    #[serde(default = "default_fee_bps")]
    pub fee_bps: u32,
}

/// Default functions
fn default_balance_interval() -> u64 {
    15_000
}

fn default_claim_interval() -> u64 {
    30_000
}

fn default_base_fee() -> String {
    "0.001".to_string()
}

fn default_fee_bps() -> u32 {
    10
}

fn require(key: &str) -> Result<String> {
    env::var(key).map_err(|_| eyre!("{} environment variable is required", key))
}

fn load_chain(prefix: &str) -> Result<ChainConfig> {
    Ok(ChainConfig {
        chain_id: require(&format!("{prefix}_CHAIN_ID"))?
            .parse()
            .wrap_err_with(|| format!("{prefix}_CHAIN_ID must be a valid u64"))?,
        name: require(&format!("{prefix}_NAME"))?,
        coin_symbol: require(&format!("{prefix}_COIN_SYMBOL"))?,
        rpc_url: require(&format!("{prefix}_RPC_URL"))?,
        explorer_url: require(&format!("{prefix}_EXPLORER_URL"))?,
        bridge_address: require(&format!("{prefix}_BRIDGE_ADDRESS"))?,
    })
}

fn is_hex_address(s: &str) -> bool {
    s.len() == 42 && s.starts_with("0x") && s[2..].chars().all(|c| c.is_ascii_hexdigit())
}

fn is_http_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

impl BridgeConfig {
    /// Load configuration from environment variables, reading a `.env` file
    /// first when present.
    pub fn load() -> Result<Self> {
        Self::load_from_file(".env")
    }

    /// Load from a specific .env file path.
    pub fn load_from_file(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            dotenvy::from_filename(path)
                .wrap_err_with(|| format!("Failed to load .env file from {}", path))?;
        }
        Self::load_from_env()
    }

    /// Load configuration from environment variables.
    pub fn load_from_env() -> Result<Self> {
        let l1 = load_chain("L1")?;
        let l2 = load_chain("L2")?;

        let tokens = TokenConfig {
            bridged_native_l1_address: require("L1_BRIDGED_TOKEN_ADDRESS")?,
            bridged_native_symbol: env::var("L1_BRIDGED_TOKEN_SYMBOL").ok(),
            wrapped_native_l2_address: env::var("L2_WRAPPED_TOKEN_ADDRESS").ok(),
            wrapped_native_symbol: env::var("L2_WRAPPED_TOKEN_SYMBOL").ok(),
        };

        let indexer = IndexerConfig {
            base_url: require("WITHDRAWALS_API_URL")?,
        };

        let wallet = WalletConfig {
            private_key: env::var("WALLET_PRIVATE_KEY").ok(),
        };

        let polling = PollingConfig {
            balance_interval_ms: env::var("BALANCE_POLL_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_balance_interval),
            claim_interval_ms: env::var("CLAIM_POLL_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_claim_interval),
        };

        let fees = FeeConfig {
            base_fee: env::var("BASE_FEE").unwrap_or_else(|_| default_base_fee()),
            fee_bps: env::var("FEE_BPS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_fee_bps),
        };

        let config = BridgeConfig {
            l1,
            l2,
            tokens,
            indexer,
            wallet,
            polling,
            fees,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration. Everything is checked here, at
    /// construction time; a missing value is never discovered mid-flow.
    pub fn validate(&self) -> Result<()> {
        for (side, chain) in [("l1", &self.l1), ("l2", &self.l2)] {
            if chain.chain_id == 0 {
                return Err(eyre!("{side}.chain_id must be non-zero"));
            }
            if chain.name.is_empty() {
                return Err(eyre!("{side}.name cannot be empty"));
            }
            if chain.coin_symbol.is_empty() {
                return Err(eyre!("{side}.coin_symbol cannot be empty"));
            }
            if !is_http_url(&chain.rpc_url) {
                return Err(eyre!("{side}.rpc_url must be an http(s) URL"));
            }
            if !is_http_url(&chain.explorer_url) {
                return Err(eyre!("{side}.explorer_url must be an http(s) URL"));
            }
            // A missing bridge address must block submission here rather
            // than produce a call to an empty address later.
            if !is_hex_address(&chain.bridge_address) {
                return Err(eyre!(
                    "{side}.bridge_address must be a valid hex address (42 chars with 0x prefix)"
                ));
            }
        }

        if self.l1.chain_id == self.l2.chain_id {
            return Err(eyre!(
                "l1 and l2 chain ids must differ (both are {})",
                self.l1.chain_id
            ));
        }

        if !is_hex_address(&self.tokens.bridged_native_l1_address) {
            return Err(eyre!(
                "tokens.bridged_native_l1_address must be a valid hex address"
            ));
        }
        if let Some(ref addr) = self.tokens.wrapped_native_l2_address {
            if !is_hex_address(addr) {
                return Err(eyre!(
                    "tokens.wrapped_native_l2_address must be a valid hex address"
                ));
            }
        }

        if !is_http_url(&self.indexer.base_url) {
            return Err(eyre!("indexer.base_url must be an http(s) URL"));
        }

        if let Some(ref key) = self.wallet.private_key {
            if key.len() != 66 || !key.starts_with("0x") {
                return Err(eyre!(
                    "wallet.private_key must be 66 chars (0x + 64 hex chars)"
                ));
            }
        }

        if self.fees.fee_bps > 1_000 {
            return Err(eyre!("fees.fee_bps cannot exceed 1000"));
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn test_config() -> BridgeConfig {
        BridgeConfig {
            l1: ChainConfig {
                chain_id: 11155111,
                name: "Ethereum Sepolia".to_string(),
                coin_symbol: "ETH".to_string(),
                rpc_url: "http://localhost:8545".to_string(),
                explorer_url: "https://sepolia.etherscan.io".to_string(),
                bridge_address: "0x0000000000000000000000000000000000000001".to_string(),
            },
            l2: ChainConfig {
                chain_id: 98765432103,
                name: "Goodnet Testnet".to_string(),
                coin_symbol: "TGN".to_string(),
                rpc_url: "http://localhost:8546".to_string(),
                explorer_url: "https://testnet-scan.example.com".to_string(),
                bridge_address: "0x0000000000000000000000000000000000000002".to_string(),
            },
            tokens: TokenConfig {
                bridged_native_l1_address: "0x0000000000000000000000000000000000000003"
                    .to_string(),
                bridged_native_symbol: None,
                wrapped_native_l2_address: Some(
                    "0x0000000000000000000000000000000000000004".to_string(),
                ),
                wrapped_native_symbol: None,
            },
            indexer: IndexerConfig {
                base_url: "http://localhost:3000".to_string(),
            },
            wallet: WalletConfig {
                private_key: Some(
                    "0x0000000000000000000000000000000000000000000000000000000000000001"
                        .to_string(),
                ),
            },
            polling: PollingConfig {
                balance_interval_ms: default_balance_interval(),
                claim_interval_ms: default_claim_interval(),
            },
            fees: FeeConfig {
                base_fee: default_base_fee(),
                fee_bps: default_fee_bps(),
            },
        }
    }

    #[test]
    fn test_defaults() {
        assert_eq!(default_balance_interval(), 15_000);
        assert_eq!(default_claim_interval(), 30_000);
        assert_eq!(default_base_fee(), "0.001");
        assert_eq!(default_fee_bps(), 10);
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_identical_chain_ids_rejected() {
        let mut config = test_config();
        config.l2.chain_id = config.l1.chain_id;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("differ"));
    }

    #[test]
    fn test_missing_bridge_address_rejected() {
        let mut config = test_config();
        config.l1.bridge_address = String::new();
        assert!(config.validate().is_err());

        config.l1.bridge_address = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_urls_rejected() {
        let mut config = test_config();
        config.l2.rpc_url = "not-a-url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_private_key_rejected() {
        let mut config = test_config();
        config.wallet.private_key = Some("0x123".to_string());
        assert!(config.validate().is_err());

        // Absent key is fine: read-only sessions are allowed.
        config.wallet.private_key = None;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_fee_bps_cap() {
        let mut config = test_config();
        config.fees.fee_bps = 1_001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_wallet_config_debug_redacts_key() {
        let config = test_config();
        let rendered = format!("{:?}", config.wallet);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("00000001"));
    }
}

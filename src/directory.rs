//! Chain directory
//!
//! Resolves the two participating chains and their RPC/explorer metadata
//! from configuration. Exactly two chains take part in a bridge instance.

use alloy::primitives::Address;
use eyre::{Result, WrapErr};
use std::str::FromStr;

use crate::config::{BridgeConfig, ChainConfig};
use crate::error::BridgeError;
use crate::types::{ChainSide, TxRef};

/// One participating chain.
#[derive(Debug, Clone)]
pub struct Chain {
    pub id: u64,
    pub name: String,
    pub coin_symbol: String,
    pub rpc_url: String,
    pub explorer_url: String,
    pub bridge_address: Address,
}

impl Chain {
    fn from_config(config: &ChainConfig) -> Result<Self> {
        let bridge_address = Address::from_str(&config.bridge_address)
            .wrap_err_with(|| format!("Invalid bridge address for chain {}", config.name))?;
        Ok(Chain {
            id: config.chain_id,
            name: config.name.clone(),
            coin_symbol: config.coin_symbol.clone(),
            rpc_url: config.rpc_url.clone(),
            explorer_url: config.explorer_url.clone(),
            bridge_address,
        })
    }

    /// Explorer link for a submitted transaction.
    pub fn tx_url(&self, tx: &TxRef) -> String {
        format!("{}/tx/{}", self.explorer_url.trim_end_matches('/'), tx)
    }
}

/// The two chains of this bridge instance.
#[derive(Debug, Clone)]
pub struct ChainDirectory {
    l1: Chain,
    l2: Chain,
}

impl ChainDirectory {
    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        let l1 = Chain::from_config(&config.l1)?;
        let l2 = Chain::from_config(&config.l2)?;
        Ok(ChainDirectory { l1, l2 })
    }

    pub fn chain(&self, side: ChainSide) -> &Chain {
        match side {
            ChainSide::L1 => &self.l1,
            ChainSide::L2 => &self.l2,
        }
    }

    pub fn l1(&self) -> &Chain {
        &self.l1
    }

    pub fn l2(&self) -> &Chain {
        &self.l2
    }

    /// Look up a chain by its id.
    pub fn by_id(&self, chain_id: u64) -> Result<&Chain, BridgeError> {
        if chain_id == self.l1.id {
            Ok(&self.l1)
        } else if chain_id == self.l2.id {
            Ok(&self.l2)
        } else {
            Err(BridgeError::Configuration(format!(
                "chain {chain_id} is not part of this bridge"
            )))
        }
    }

    /// Which side a chain id belongs to.
    pub fn side_of(&self, chain_id: u64) -> Result<ChainSide, BridgeError> {
        if chain_id == self.l1.id {
            Ok(ChainSide::L1)
        } else if chain_id == self.l2.id {
            Ok(ChainSide::L2)
        } else {
            Err(BridgeError::Configuration(format!(
                "chain {chain_id} is not part of this bridge"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;
    use alloy::primitives::B256;

    #[test]
    fn test_directory_resolves_both_sides() {
        let dir = ChainDirectory::from_config(&test_config()).unwrap();
        assert_eq!(dir.chain(ChainSide::L1).id, 11155111);
        assert_eq!(dir.chain(ChainSide::L2).id, 98765432103);
        assert_eq!(dir.side_of(11155111).unwrap(), ChainSide::L1);
        assert_eq!(dir.side_of(98765432103).unwrap(), ChainSide::L2);
        assert!(dir.by_id(1).is_err());
    }

    #[test]
    fn test_tx_url() {
        let dir = ChainDirectory::from_config(&test_config()).unwrap();
        let tx = TxRef(B256::from([0xabu8; 32]));
        let url = dir.l1().tx_url(&tx);
        assert!(url.starts_with("https://sepolia.etherscan.io/tx/0xab"));
    }
}

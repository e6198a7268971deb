//! Balance and allowance reads
//!
//! Reads are idempotent and safely retryable. A failed balance read
//! degrades to [`BalanceReading::Unknown`] rather than zero: callers must
//! be able to tell "no funds" from "could not determine", or transient RPC
//! failures turn into false insufficient-balance errors.

use alloy::primitives::{Address, U256};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

use crate::client::{ChainClient, ClientError};
use crate::poll::Poller;
use crate::registry::Token;

/// A balance observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BalanceReading {
    /// The read succeeded; zero is a real zero.
    Known(U256),
    /// The read failed or has not happened yet.
    #[default]
    Unknown,
}

impl BalanceReading {
    pub fn known(&self) -> Option<U256> {
        match self {
            BalanceReading::Known(value) => Some(*value),
            BalanceReading::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, BalanceReading::Unknown)
    }
}

/// Reads balances and allowances on one chain.
pub struct BalanceReader {
    client: Arc<dyn ChainClient>,
}

impl BalanceReader {
    pub fn new(client: Arc<dyn ChainClient>) -> Self {
        BalanceReader { client }
    }

    /// A wallet's balance of `token`, in smallest units. Native tokens read
    /// the account balance, others the token contract.
    pub async fn balance_of(&self, token: &Token, owner: Address) -> BalanceReading {
        let result = if token.is_native() {
            self.client.native_balance(owner).await
        } else {
            match token.address_on(self.client.chain_id()) {
                Some(address) => self.client.erc20_balance(address, owner).await,
                None => {
                    debug!(token = %token.symbol, "no address on this chain, balance unknown");
                    return BalanceReading::Unknown;
                }
            }
        };

        match result {
            Ok(value) => BalanceReading::Known(value),
            Err(e) => {
                warn!(token = %token.symbol, error = %e, "balance read failed");
                BalanceReading::Unknown
            }
        }
    }

    /// The bridge contract's spending allowance for `token`.
    ///
    /// Defined only for non-native tokens; asking for a native token is a
    /// bug in the caller, not a runtime condition.
    pub async fn allowance_of(
        &self,
        token: &Token,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ClientError> {
        assert!(
            !token.is_native(),
            "allowance queried for native token {}",
            token.symbol
        );
        let address = token.address_on(self.client.chain_id()).ok_or_else(|| {
            ClientError::Rpc(format!(
                "token {} has no address on chain {}",
                token.symbol,
                self.client.chain_id()
            ))
        })?;
        self.client.erc20_allowance(address, owner, spender).await
    }
}

/// Periodically re-read a balance into a shared slot.
///
/// The returned [`Poller`] owns the refresh loop: dropping it stops the
/// reads, and the slot simply stops updating. No other side effects occur.
pub fn watch_balance(
    reader: Arc<BalanceReader>,
    token: Token,
    owner: Address,
    interval: Duration,
) -> (Arc<Mutex<BalanceReading>>, Poller) {
    let slot = Arc::new(Mutex::new(BalanceReading::Unknown));
    let shared = slot.clone();
    let poller = Poller::spawn(interval, move || {
        let reader = reader.clone();
        let token = token.clone();
        let slot = shared.clone();
        async move {
            let reading = reader.balance_of(&token, owner).await;
            *slot.lock().expect("balance slot lock") = reading;
        }
    });
    (slot, poller)
}

//! Chain read/write boundary
//!
//! The orchestrator talks to each chain through the [`ChainClient`] trait:
//! balance/allowance/metadata reads, a handful of bridge views, and
//! submission of the bridge calls selected by the transfer submitter. The
//! EVM implementation lives in [`evm`]; tests substitute in-process mocks.

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::types::TxRef;

pub mod evm;

pub use evm::EvmChainClient;

/// How often a pending transaction is re-checked while awaiting inclusion.
pub const CONFIRMATION_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// How long to wait for inclusion before giving up on an attempt.
pub const CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(180);

/// Failures at the chain boundary.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// Transport or node failure. Reads degrade to "unknown"; writes fail
    /// the attempt.
    #[error("rpc error: {0}")]
    Rpc(String),

    /// The signer refused to sign or the node refused the transaction.
    #[error("submission rejected: {0}")]
    Rejected(String),

    /// The transaction was included but reverted.
    #[error("transaction reverted: {0}")]
    Reverted(String),

    /// No receipt appeared within the confirmation window.
    #[error("confirmation timed out after {0:?}")]
    ConfirmationTimeout(Duration),
}

/// ERC-20 metadata read for custom token resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Erc20Metadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// A concrete contract call selected by the transfer submitter.
///
/// Selection happens over (direction, token classification); by the time a
/// `BridgeCall` exists, all validation and gating is done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCall {
    /// ERC-20 `approve(spender, amount)` for exactly the requested amount.
    Approve {
        token: Address,
        spender: Address,
        amount: U256,
    },
    /// Value-bearing native deposit.
    DepositNative { amount: U256 },
    /// Generic ERC-20 deposit. The chain's designated bridged asset goes
    /// through this same path; the contract handles any special casing.
    DepositErc20 { token: Address, amount: U256 },
    /// Dedicated native withdrawal, payable with the amount attached as
    /// value (burn-by-payment).
    WithdrawNative { amount: U256 },
    /// Dedicated wrapped-representation withdrawal, amount only.
    WithdrawWrapped { amount: U256 },
    /// Generic ERC-20 withdrawal.
    WithdrawErc20 { token: Address, amount: U256 },
    /// Release of a timelocked withdrawal. `token` of `None` releases the
    /// native asset. `origin_ref` is the derived reference, not the raw
    /// origin-chain hash (see [`crate::hash::claim_reference`]).
    Release {
        withdrawal_id: u64,
        recipient: Address,
        token: Option<Address>,
        amount: U256,
        origin_ref: [u8; 32],
    },
}

/// One confirmation check for a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOutcome {
    /// No receipt yet.
    Pending,
    /// Included and succeeded.
    Confirmed,
    /// Included and reverted.
    Reverted(String),
}

/// Read/write access to one chain.
#[async_trait]
pub trait ChainClient: Send + Sync {
    fn chain_id(&self) -> u64;

    /// Bridge contract address on this chain (approval spender and call
    /// target).
    fn bridge_address(&self) -> Address;

    async fn native_balance(&self, owner: Address) -> Result<U256, ClientError>;

    async fn erc20_balance(&self, token: Address, owner: Address) -> Result<U256, ClientError>;

    async fn erc20_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ClientError>;

    async fn erc20_metadata(&self, token: Address) -> Result<Erc20Metadata, ClientError>;

    /// Challenge-period duration in seconds, read from the bridge contract.
    async fn timelock_duration(&self) -> Result<u64, ClientError>;

    /// Address of the wrapped-native representation managed by this chain's
    /// bridge contract.
    async fn wrapped_native_address(&self) -> Result<Address, ClientError>;

    /// Sign and submit a bridge call, returning the transaction reference
    /// once the network accepts it.
    async fn submit(&self, call: &BridgeCall) -> Result<TxRef, ClientError>;

    /// Check the current confirmation status of a submitted transaction.
    async fn confirmation(&self, tx: &TxRef) -> Result<TxOutcome, ClientError>;
}

/// Poll a submitted transaction to a terminal outcome.
///
/// Once submitted, a transaction is tracked to completion or failure; the
/// caller may abandon the *task* but never cancels the transaction itself.
pub async fn wait_mined(client: &dyn ChainClient, tx: &TxRef) -> Result<(), ClientError> {
    let started = tokio::time::Instant::now();
    loop {
        match client.confirmation(tx).await? {
            TxOutcome::Confirmed => return Ok(()),
            TxOutcome::Reverted(reason) => return Err(ClientError::Reverted(reason)),
            TxOutcome::Pending => {
                if started.elapsed() >= CONFIRMATION_TIMEOUT {
                    return Err(ClientError::ConfirmationTimeout(CONFIRMATION_TIMEOUT));
                }
                tokio::time::sleep(CONFIRMATION_POLL_INTERVAL).await;
            }
        }
    }
}

//! Wallet session and network gate
//!
//! The wallet is an external collaborator: it owns the connected address
//! and the active chain, and it may refuse or ignore a switch request.
//! Refusal is ordinary control flow, not an exception, so callers are
//! forced to handle "the user said no" distinctly from a defect.

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use std::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::BridgeError;

/// Result of a chain-switch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The wallet was already on the requested chain; no prompt occurred.
    AlreadyActive,
    /// The wallet switched to the requested chain.
    Switched,
    /// The user declined the switch prompt.
    Rejected,
    /// The prompt expired without an answer.
    TimedOut,
}

/// Connected wallet session.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// The connected account.
    fn address(&self) -> Address;

    /// The chain the wallet is currently on. Can change at any time outside
    /// this system's control.
    async fn active_chain_id(&self) -> u64;

    /// Ask the wallet to switch to `chain_id`. May suspend indefinitely
    /// while the user decides.
    async fn request_switch(&self, chain_id: u64) -> SwitchOutcome;
}

/// Ensures the wallet is on the required chain before a write operation.
///
/// Invoked immediately before every write, not once per session: the active
/// chain can drift between operations.
pub struct NetworkGate;

impl NetworkGate {
    pub async fn ensure_chain(
        wallet: &dyn WalletProvider,
        required_chain_id: u64,
    ) -> Result<(), BridgeError> {
        let active = wallet.active_chain_id().await;
        if active == required_chain_id {
            debug!(chain_id = required_chain_id, "wallet already on required chain");
            return Ok(());
        }

        info!(
            from = active,
            to = required_chain_id,
            "requesting wallet network switch"
        );
        match wallet.request_switch(required_chain_id).await {
            SwitchOutcome::AlreadyActive | SwitchOutcome::Switched => Ok(()),
            SwitchOutcome::Rejected => {
                warn!(chain_id = required_chain_id, "network switch rejected by user");
                Err(BridgeError::SwitchRejected)
            }
            SwitchOutcome::TimedOut => {
                warn!(chain_id = required_chain_id, "network switch prompt timed out");
                Err(BridgeError::SwitchRejected)
            }
        }
    }
}

/// Headless wallet backed by a local signing key.
///
/// A local signer has no user to ask, so switch requests always succeed;
/// interactive rejection only ever arrives through other [`WalletProvider`]
/// implementations.
pub struct LocalWallet {
    address: Address,
    active_chain: Mutex<u64>,
}

impl LocalWallet {
    pub fn new(signer: &PrivateKeySigner, initial_chain_id: u64) -> Self {
        LocalWallet {
            address: signer.address(),
            active_chain: Mutex::new(initial_chain_id),
        }
    }
}

#[async_trait]
impl WalletProvider for LocalWallet {
    fn address(&self) -> Address {
        self.address
    }

    async fn active_chain_id(&self) -> u64 {
        *self.active_chain.lock().expect("wallet chain lock")
    }

    async fn request_switch(&self, chain_id: u64) -> SwitchOutcome {
        let mut active = self.active_chain.lock().expect("wallet chain lock");
        if *active == chain_id {
            SwitchOutcome::AlreadyActive
        } else {
            *active = chain_id;
            SwitchOutcome::Switched
        }
    }
}

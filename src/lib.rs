//! Bridge Orchestrator
//!
//! Transaction orchestration for a two-chain token bridge: lock/mint on
//! deposit, burn/release on withdrawal, and a challenge-period gated claim
//! step for L2→L1 transfers.
//!
//! - **Registry / Directory** - per-chain token catalog and the two
//!   participating chains
//! - **Reader** - balance and allowance reads that degrade to "unknown"
//! - **Wallet / Gate** - wallet session boundary and pre-write chain check
//! - **Approval** - exact-amount allowance coordination
//! - **Submitter** - the per-intent state machine from validation to
//!   confirmation
//! - **Claims** - timelocked withdrawal eligibility and release
//! - **Session** - the composed per-wallet orchestrator
//!
//! External collaborators (wallet, chain RPC, withdrawal indexer) sit
//! behind async traits; the built-in implementations use alloy and the
//! indexer HTTP API.

pub mod amount;
pub mod approval;
pub mod claims;
pub mod client;
pub mod config;
pub mod contracts;
pub mod directory;
pub mod error;
pub mod fees;
pub mod hash;
pub mod poll;
pub mod reader;
pub mod registry;
pub mod session;
pub mod submitter;
pub mod types;
pub mod wallet;

// Re-export commonly used items at the crate root
pub use amount::{format_amount, max_spendable, parse_amount};
pub use claims::{
    format_time_remaining, is_claimable, time_remaining, ClaimTracker, HttpWithdrawalSource,
    PendingWithdrawal, WithdrawalSource,
};
pub use client::{BridgeCall, ChainClient, ClientError, Erc20Metadata, EvmChainClient, TxOutcome};
pub use config::BridgeConfig;
pub use directory::{Chain, ChainDirectory};
pub use error::BridgeError;
pub use fees::FeeSchedule;
pub use poll::Poller;
pub use reader::{BalanceReader, BalanceReading};
pub use registry::{Token, TokenKind, TokenRegistry};
pub use session::BridgeSession;
pub use submitter::{FlowStatus, TransferState, TransferSubmitter};
pub use types::{ChainSide, Direction, TransferIntent, TxRef};
pub use wallet::{LocalWallet, NetworkGate, SwitchOutcome, WalletProvider};

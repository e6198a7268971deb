//! Common types for bridge orchestration
//!
//! Direction/side enums, the per-action transfer intent, and the
//! transaction reference used to track a submitted call.

use alloy::primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::registry::Token;

/// Which of the two participating chains is meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainSide {
    L1,
    L2,
}

impl ChainSide {
    /// The opposite side.
    pub fn other(&self) -> ChainSide {
        match self {
            ChainSide::L1 => ChainSide::L2,
            ChainSide::L2 => ChainSide::L1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChainSide::L1 => "l1",
            ChainSide::L2 => "l2",
        }
    }
}

impl fmt::Display for ChainSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Direction of a bridge operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Lock/mint: L1 source, L2 destination.
    Deposit,
    /// Burn/release: L2 source, L1 destination.
    Withdraw,
    /// Release a timelocked withdrawal on L1.
    Claim,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Deposit => "deposit",
            Direction::Withdraw => "withdraw",
            Direction::Claim => "claim",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reference to a submitted transaction (the tx hash on the source chain).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxRef(pub B256);

impl TxRef {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0 .0
    }
}

impl fmt::Display for TxRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Ephemeral description of one user-requested transfer.
///
/// Created per user action and discarded once the resulting transaction
/// reaches a terminal state or the attempt is abandoned. The amount is the
/// raw user-entered decimal string; scaling to smallest units happens at
/// validation time, never by comparing decimal strings.
#[derive(Debug, Clone)]
pub struct TransferIntent {
    pub direction: Direction,
    pub token: Token,
    /// User-entered decimal amount (e.g. "1.5").
    pub amount: String,
    pub source_chain: u64,
    pub dest_chain: u64,
    pub recipient: Address,
}

impl TransferIntent {
    /// Key used for the per-intent re-entrancy guard: one in-flight
    /// submission per (direction, source chain, token).
    pub fn key(&self) -> IntentKey {
        IntentKey::Transfer {
            direction: self.direction,
            chain_id: self.source_chain,
            symbol: self.token.symbol.clone(),
        }
    }
}

/// Re-entrancy guard scope. Transfers are guarded per flow/token; claim
/// attempts are guarded per withdrawal id so independent withdrawals can be
/// claimed concurrently.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IntentKey {
    Transfer {
        direction: Direction,
        chain_id: u64,
        symbol: String,
    },
    Claim {
        withdrawal_id: u64,
    },
}

//! Error taxonomy for the bridge orchestrator
//!
//! Validation and configuration errors are raised before any chain write;
//! chain-level failures are converted into the corresponding variant at the
//! approval/transfer boundary and never propagate as raw client errors to
//! the presentation layer.

use thiserror::Error;

/// Fallback message for chain failures that carry no usable message.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Errors surfaced by the orchestration core.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Fatal misconfiguration (missing bridge address, identical chain ids,
    /// malformed URLs). Detected at startup, blocks all flows.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Local, recoverable input problem. Never submitted to the chain.
    #[error("{0}")]
    Validation(String),

    /// Custom token resolution failed (bad address, non-ERC-20 contract,
    /// read timeout). The input remains editable.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The wallet declined or ignored the network-switch prompt. The flow
    /// halts with no transaction submitted; the user may retry.
    #[error("network switch rejected by wallet")]
    SwitchRejected,

    /// Approval submission rejected or reverted. Terminal for this attempt.
    #[error("approval failed: {0}")]
    ApprovalFailed(String),

    /// Transfer submission rejected or reverted. Terminal for this attempt.
    #[error("transfer failed: {0}")]
    TransferFailed(String),

    /// Withdrawal requested for a token with no resolved address on the
    /// source chain. Blocked before submission.
    #[error("token {symbol} has no address on chain {chain_id}")]
    UnbridgedToken { symbol: String, chain_id: u64 },
}

impl BridgeError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        BridgeError::Configuration(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        BridgeError::Validation(msg.into())
    }
}

/// Normalize an underlying failure into a user-facing message, falling back
/// to a generic string when the source carries nothing useful.
pub fn surface_message(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        UNKNOWN_ERROR.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_message_passthrough() {
        assert_eq!(surface_message("execution reverted"), "execution reverted");
    }

    #[test]
    fn test_surface_message_fallback() {
        assert_eq!(surface_message(""), UNKNOWN_ERROR);
        assert_eq!(surface_message("   "), UNKNOWN_ERROR);
    }

    #[test]
    fn test_unbridged_token_display() {
        let err = BridgeError::UnbridgedToken {
            symbol: "USDT".to_string(),
            chain_id: 98765432103,
        };
        assert!(err.to_string().contains("USDT"));
        assert!(err.to_string().contains("98765432103"));
    }
}

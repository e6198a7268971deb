//! Approval coordinator
//!
//! For non-native tokens, decides whether the bridge contract's allowance
//! covers the requested amount and, when it does not, submits an approval
//! for exactly that amount and waits for it to land. Approval sufficiency
//! is re-derived from live state on every evaluation; it is never sticky
//! across token or amount changes.

use alloy::primitives::{Address, U256};
use std::sync::Arc;
use tracing::{debug, info};

use crate::client::{wait_mined, BridgeCall, ChainClient};
use crate::error::{surface_message, BridgeError};
use crate::registry::Token;

/// Approval progression for one (token, amount) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalState {
    /// Native token; approvals do not apply.
    NotNeeded,
    /// Allowance below the requested amount.
    NeedsApproval,
    /// Approval transaction submitted, awaiting confirmation.
    Approving,
    /// Allowance covers the requested amount.
    Approved,
    /// The approval attempt was rejected or reverted.
    Failed,
}

/// Drives allowance evaluation and approval submission on one chain.
pub struct ApprovalCoordinator {
    client: Arc<dyn ChainClient>,
    /// The bridge contract the allowance is granted to.
    spender: Address,
}

impl ApprovalCoordinator {
    pub fn new(client: Arc<dyn ChainClient>) -> Self {
        let spender = client.bridge_address();
        ApprovalCoordinator { client, spender }
    }

    /// Evaluate the current state from live allowance. Reads only.
    pub async fn evaluate(
        &self,
        token: &Token,
        owner: Address,
        amount: U256,
    ) -> Result<ApprovalState, BridgeError> {
        if token.is_native() {
            return Ok(ApprovalState::NotNeeded);
        }

        let address = self.token_address(token)?;
        let allowance = self
            .client
            .erc20_allowance(address, owner, self.spender)
            .await
            .map_err(|e| BridgeError::ApprovalFailed(surface_message(&e.to_string())))?;

        debug!(
            token = %token.symbol,
            %allowance,
            requested = %amount,
            "evaluated allowance"
        );
        if allowance >= amount {
            Ok(ApprovalState::Approved)
        } else {
            Ok(ApprovalState::NeedsApproval)
        }
    }

    /// Bring the allowance up to `amount`, submitting at most one approval.
    ///
    /// No approval transaction is ever submitted from `Approved` or
    /// `NotNeeded`. The approval is for exactly the requested amount, not
    /// unlimited: a compromised spender is then bounded to the current
    /// transfer. After confirmation the allowance is re-read rather than
    /// trusted, since a non-standard token may apply a different amount.
    pub async fn ensure_approved(
        &self,
        token: &Token,
        owner: Address,
        amount: U256,
    ) -> Result<ApprovalState, BridgeError> {
        match self.evaluate(token, owner, amount).await? {
            ApprovalState::NotNeeded => return Ok(ApprovalState::NotNeeded),
            ApprovalState::Approved => return Ok(ApprovalState::Approved),
            _ => {}
        }

        let address = self.token_address(token)?;
        info!(
            token = %token.symbol,
            spender = %self.spender,
            %amount,
            "submitting approval"
        );

        let call = BridgeCall::Approve {
            token: address,
            spender: self.spender,
            amount,
        };
        let tx = self
            .client
            .submit(&call)
            .await
            .map_err(|e| BridgeError::ApprovalFailed(surface_message(&e.to_string())))?;

        debug!(tx = %tx, "approval submitted, awaiting confirmation");
        wait_mined(self.client.as_ref(), &tx)
            .await
            .map_err(|e| BridgeError::ApprovalFailed(surface_message(&e.to_string())))?;

        // Re-read instead of assuming the requested amount took effect.
        match self.evaluate(token, owner, amount).await? {
            ApprovalState::Approved => {
                info!(token = %token.symbol, tx = %tx, "approval confirmed");
                Ok(ApprovalState::Approved)
            }
            _ => Err(BridgeError::ApprovalFailed(
                "allowance still insufficient after approval confirmation".to_string(),
            )),
        }
    }

    fn token_address(&self, token: &Token) -> Result<Address, BridgeError> {
        token
            .address_on(self.client.chain_id())
            .ok_or_else(|| BridgeError::UnbridgedToken {
                symbol: token.symbol.clone(),
                chain_id: self.client.chain_id(),
            })
    }
}

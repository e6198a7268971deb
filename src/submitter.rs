//! Transfer submitter
//!
//! Drives a transfer intent through the fixed gate sequence: amount
//! validation, network gate, approval, call selection, submission, and
//! confirmation tracking. Each step is a required gate for the next; a
//! repeated execute for an in-flight intent is a no-op, which is what makes
//! UI-level button disablement safe rather than load-bearing.

use alloy::primitives::U256;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::amount::parse_amount;
use crate::approval::ApprovalCoordinator;
use crate::claims::PendingWithdrawal;
use crate::client::{wait_mined, BridgeCall, ChainClient};
use crate::error::{surface_message, BridgeError};
use crate::hash::claim_reference;
use crate::reader::BalanceReading;
use crate::registry::TokenKind;
use crate::types::{Direction, IntentKey, TransferIntent, TxRef};
use crate::wallet::{NetworkGate, WalletProvider};

/// How long the confirmed state stays visible before transient input is
/// cleared.
pub const CONFIRMED_RESET_DELAY: Duration = Duration::from_secs(3);

/// Per-flow progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferState {
    #[default]
    Idle,
    AwaitingNetworkSwitch,
    AwaitingApproval,
    Submitting,
    AwaitingConfirmation,
    Confirmed,
    Failed,
}

impl TransferState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferState::Idle => "idle",
            TransferState::AwaitingNetworkSwitch => "awaiting network switch",
            TransferState::AwaitingApproval => "awaiting approval",
            TransferState::Submitting => "submitting",
            TransferState::AwaitingConfirmation => "awaiting confirmation",
            TransferState::Confirmed => "confirmed",
            TransferState::Failed => "failed",
        }
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// State exposed to presentation layers for one flow.
#[derive(Debug, Clone, Default)]
pub struct FlowStatus {
    pub state: TransferState,
    pub error_message: Option<String>,
    pub tx_ref: Option<TxRef>,
}

impl FlowStatus {
    pub fn idle() -> Self {
        FlowStatus::default()
    }
}

/// Shared handle to one flow's status.
pub type SharedStatus = Arc<Mutex<FlowStatus>>;

fn set_state(status: &SharedStatus, state: TransferState) {
    let mut slot = status.lock().expect("flow status lock");
    slot.state = state;
    slot.error_message = None;
}

fn set_tx(status: &SharedStatus, tx: TxRef) {
    status.lock().expect("flow status lock").tx_ref = Some(tx);
}

fn set_failed(status: &SharedStatus, message: String) {
    let mut slot = status.lock().expect("flow status lock");
    slot.state = TransferState::Failed;
    slot.error_message = Some(message);
}

fn set_rejected_input(status: &SharedStatus, message: String) {
    // Validation problems leave the flow idle and editable.
    let mut slot = status.lock().expect("flow status lock");
    slot.state = TransferState::Idle;
    slot.error_message = Some(message);
}

/// Submits transfers for one wallet session.
pub struct TransferSubmitter {
    wallet: Arc<dyn WalletProvider>,
    clients: HashMap<u64, Arc<dyn ChainClient>>,
    in_flight: Mutex<HashSet<IntentKey>>,
}

/// Removes the intent key from the in-flight set when the attempt ends,
/// whatever way it ends.
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<IntentKey>>,
    key: IntentKey,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .expect("in-flight lock")
            .remove(&self.key);
    }
}

impl TransferSubmitter {
    pub fn new(
        wallet: Arc<dyn WalletProvider>,
        clients: HashMap<u64, Arc<dyn ChainClient>>,
    ) -> Self {
        TransferSubmitter {
            wallet,
            clients,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    fn try_begin(&self, key: IntentKey) -> Option<InFlightGuard<'_>> {
        let mut set = self.in_flight.lock().expect("in-flight lock");
        if set.insert(key.clone()) {
            Some(InFlightGuard {
                set: &self.in_flight,
                key,
            })
        } else {
            None
        }
    }

    fn client_for(&self, chain_id: u64) -> Result<&Arc<dyn ChainClient>, BridgeError> {
        self.clients.get(&chain_id).ok_or_else(|| {
            BridgeError::Configuration(format!("no client configured for chain {chain_id}"))
        })
    }

    /// Execute a deposit or withdrawal intent.
    ///
    /// Returns `Ok(None)` when the same intent is already in flight (the
    /// idempotent no-op), `Ok(Some(tx))` once confirmed.
    pub async fn execute(
        &self,
        intent: &TransferIntent,
        balance: BalanceReading,
        status: &SharedStatus,
    ) -> Result<Option<TxRef>, BridgeError> {
        let guard = match self.try_begin(intent.key()) {
            Some(guard) => guard,
            None => {
                debug!(
                    direction = %intent.direction,
                    token = %intent.token.symbol,
                    "execute ignored: intent already in flight"
                );
                return Ok(None);
            }
        };

        let result = self.run_transfer(intent, balance, status).await;
        drop(guard);

        match result {
            Ok(tx) => Ok(Some(tx)),
            Err(e) => {
                self.record_failure(status, &e);
                Err(e)
            }
        }
    }

    fn record_failure(&self, status: &SharedStatus, error: &BridgeError) {
        match error {
            BridgeError::Validation(msg) => set_rejected_input(status, msg.clone()),
            other => set_failed(status, surface_message(&other.to_string())),
        }
    }

    async fn run_transfer(
        &self,
        intent: &TransferIntent,
        balance: BalanceReading,
        status: &SharedStatus,
    ) -> Result<TxRef, BridgeError> {
        // 1. Validate the amount in smallest-unit integer space. An unknown
        //    balance skips the ceiling check; the chain enforces it anyway.
        let amount = parse_amount(&intent.amount, intent.token.decimals)?;
        if let Some(available) = balance.known() {
            if amount > available {
                return Err(BridgeError::validation("amount exceeds available balance"));
            }
        }

        // 2. Wallet must be on the source chain before anything is signed.
        set_state(status, TransferState::AwaitingNetworkSwitch);
        NetworkGate::ensure_chain(self.wallet.as_ref(), intent.source_chain).await?;

        let client = self.client_for(intent.source_chain)?;

        // 3. Allowance gate for non-native tokens.
        if !intent.token.is_native() {
            set_state(status, TransferState::AwaitingApproval);
            let coordinator = ApprovalCoordinator::new(client.clone());
            coordinator
                .ensure_approved(&intent.token, self.wallet.address(), amount)
                .await?;
        }

        // 4. Select the contract call from (direction, classification).
        let call = select_call(intent, amount)?;

        // 5. Submit.
        set_state(status, TransferState::Submitting);
        info!(
            direction = %intent.direction,
            token = %intent.token.symbol,
            chain_id = intent.source_chain,
            "submitting transfer"
        );
        let tx = client
            .submit(&call)
            .await
            .map_err(|e| BridgeError::TransferFailed(surface_message(&e.to_string())))?;

        // 6. Track to a terminal state.
        set_state(status, TransferState::AwaitingConfirmation);
        set_tx(status, tx);
        wait_mined(client.as_ref(), &tx)
            .await
            .map_err(|e| BridgeError::TransferFailed(surface_message(&e.to_string())))?;

        set_state(status, TransferState::Confirmed);
        set_tx(status, tx);
        info!(tx = %tx, "transfer confirmed");
        schedule_reset(status.clone());
        Ok(tx)
    }

    /// Execute a claim for a timelocked withdrawal.
    ///
    /// The origin-chain transaction reference is required and the
    /// withdrawal must be claimable and unprocessed; all three are checked
    /// locally before any chain read or write.
    pub async fn execute_claim(
        &self,
        l1_chain_id: u64,
        withdrawal: &PendingWithdrawal,
        origin_tx: &str,
        status: &SharedStatus,
    ) -> Result<Option<TxRef>, BridgeError> {
        if origin_tx.trim().is_empty() {
            let err = BridgeError::validation("origin transaction hash is required");
            self.record_failure(status, &err);
            return Err(err);
        }
        if withdrawal.processed {
            let err = BridgeError::validation("withdrawal has already been claimed");
            self.record_failure(status, &err);
            return Err(err);
        }
        if !withdrawal.claimable {
            let err = BridgeError::validation("withdrawal is still in its challenge period");
            self.record_failure(status, &err);
            return Err(err);
        }

        let key = IntentKey::Claim {
            withdrawal_id: withdrawal.withdrawal_id,
        };
        let guard = match self.try_begin(key) {
            Some(guard) => guard,
            None => {
                debug!(
                    withdrawal_id = withdrawal.withdrawal_id,
                    "claim ignored: already in flight"
                );
                return Ok(None);
            }
        };

        let result = self
            .run_claim(l1_chain_id, withdrawal, origin_tx, status)
            .await;
        drop(guard);

        match result {
            Ok(tx) => Ok(Some(tx)),
            Err(e) => {
                warn!(
                    withdrawal_id = withdrawal.withdrawal_id,
                    error = %e,
                    "claim attempt failed"
                );
                self.record_failure(status, &e);
                Err(e)
            }
        }
    }

    async fn run_claim(
        &self,
        l1_chain_id: u64,
        withdrawal: &PendingWithdrawal,
        origin_tx: &str,
        status: &SharedStatus,
    ) -> Result<TxRef, BridgeError> {
        set_state(status, TransferState::AwaitingNetworkSwitch);
        NetworkGate::ensure_chain(self.wallet.as_ref(), l1_chain_id).await?;

        let client = self.client_for(l1_chain_id)?;

        let call = BridgeCall::Release {
            withdrawal_id: withdrawal.withdrawal_id,
            recipient: withdrawal.owner,
            token: if withdrawal.is_native() {
                None
            } else {
                Some(withdrawal.token)
            },
            amount: withdrawal.amount,
            origin_ref: claim_reference(origin_tx.trim()),
        };

        set_state(status, TransferState::Submitting);
        info!(
            withdrawal_id = withdrawal.withdrawal_id,
            "submitting claim release"
        );
        let tx = client
            .submit(&call)
            .await
            .map_err(|e| BridgeError::TransferFailed(surface_message(&e.to_string())))?;

        set_state(status, TransferState::AwaitingConfirmation);
        set_tx(status, tx);
        wait_mined(client.as_ref(), &tx)
            .await
            .map_err(|e| BridgeError::TransferFailed(surface_message(&e.to_string())))?;

        set_state(status, TransferState::Confirmed);
        set_tx(status, tx);
        info!(withdrawal_id = withdrawal.withdrawal_id, tx = %tx, "claim confirmed");
        schedule_reset(status.clone());
        Ok(tx)
    }
}

/// Select the contract call for an intent. Dispatch is over the token's
/// classification, never its symbol.
fn select_call(intent: &TransferIntent, amount: U256) -> Result<BridgeCall, BridgeError> {
    let token = &intent.token;
    match (intent.direction, token.kind) {
        (Direction::Deposit, TokenKind::Native) => Ok(BridgeCall::DepositNative { amount }),
        // The designated bridged asset is not special-cased here: it takes
        // the same generic path and the contract sorts it out.
        (Direction::Deposit, _) => {
            let address = token.address_on(intent.source_chain).ok_or_else(|| {
                BridgeError::UnbridgedToken {
                    symbol: token.symbol.clone(),
                    chain_id: intent.source_chain,
                }
            })?;
            Ok(BridgeCall::DepositErc20 {
                token: address,
                amount,
            })
        }
        (Direction::Withdraw, TokenKind::Native) => Ok(BridgeCall::WithdrawNative { amount }),
        (Direction::Withdraw, TokenKind::WrappedNative) => {
            Ok(BridgeCall::WithdrawWrapped { amount })
        }
        (Direction::Withdraw, TokenKind::Erc20) => {
            let address = token.address_on(intent.source_chain).ok_or_else(|| {
                BridgeError::UnbridgedToken {
                    symbol: token.symbol.clone(),
                    chain_id: intent.source_chain,
                }
            })?;
            Ok(BridgeCall::WithdrawErc20 {
                token: address,
                amount,
            })
        }
        (Direction::Claim, _) => Err(BridgeError::validation(
            "claims are driven from the pending-withdrawal list",
        )),
    }
}

/// Clear transient state a moment after confirmation so the success state
/// is visible before the form resets.
fn schedule_reset(status: SharedStatus) {
    tokio::spawn(async move {
        tokio::time::sleep(CONFIRMED_RESET_DELAY).await;
        let mut slot = status.lock().expect("flow status lock");
        if slot.state == TransferState::Confirmed {
            *slot = FlowStatus::idle();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Token;
    use alloy::primitives::Address;
    use std::collections::HashMap as Map;

    fn intent(direction: Direction, token: Token, source: u64) -> TransferIntent {
        TransferIntent {
            direction,
            token,
            amount: "1".to_string(),
            source_chain: source,
            dest_chain: 2,
            recipient: Address::ZERO,
        }
    }

    #[test]
    fn test_select_call_native_deposit() {
        let token = Token::native("ETH", "Ethereum", 1);
        let call = select_call(&intent(Direction::Deposit, token, 1), U256::from(5u64)).unwrap();
        assert_eq!(
            call,
            BridgeCall::DepositNative {
                amount: U256::from(5u64)
            }
        );
    }

    #[test]
    fn test_select_call_bridged_asset_uses_generic_deposit() {
        let addr = Address::from([7u8; 20]);
        let token = Token::wrapped_native("GN", "Bridged GN", 1, addr);
        let call = select_call(&intent(Direction::Deposit, token, 1), U256::from(5u64)).unwrap();
        assert_eq!(
            call,
            BridgeCall::DepositErc20 {
                token: addr,
                amount: U256::from(5u64)
            }
        );
    }

    #[test]
    fn test_select_call_withdraw_variants() {
        let native = Token::native("TGN", "Goodnet", 2);
        assert_eq!(
            select_call(&intent(Direction::Withdraw, native, 2), U256::from(3u64)).unwrap(),
            BridgeCall::WithdrawNative {
                amount: U256::from(3u64)
            }
        );

        let addr = Address::from([9u8; 20]);
        let wrapped = Token::wrapped_native("wETH", "Wrapped ETH", 2, addr);
        assert_eq!(
            select_call(&intent(Direction::Withdraw, wrapped, 2), U256::from(3u64)).unwrap(),
            BridgeCall::WithdrawWrapped {
                amount: U256::from(3u64)
            }
        );

        let erc20 = Token::erc20("USDT", "Tether", 6, Map::from([(2u64, addr)]));
        assert_eq!(
            select_call(&intent(Direction::Withdraw, erc20, 2), U256::from(3u64)).unwrap(),
            BridgeCall::WithdrawErc20 {
                token: addr,
                amount: U256::from(3u64)
            }
        );
    }

    #[test]
    fn test_select_call_unbridged_withdrawal_fails_fast() {
        // An ERC-20 with no address on the source chain cannot be withdrawn.
        let erc20 = Token::erc20("USDT", "Tether", 6, Map::new());
        let err =
            select_call(&intent(Direction::Withdraw, erc20, 2), U256::from(3u64)).unwrap_err();
        assert!(matches!(err, BridgeError::UnbridgedToken { .. }));
    }

    #[test]
    fn test_flow_status_defaults_idle() {
        let status = FlowStatus::idle();
        assert_eq!(status.state, TransferState::Idle);
        assert!(status.error_message.is_none());
        assert!(status.tx_ref.is_none());
    }
}

//! In-process mock collaborators for orchestrator tests.

use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use bridge_orchestrator::claims::{PendingWithdrawal, WithdrawalSource};
use bridge_orchestrator::client::{BridgeCall, ChainClient, ClientError, Erc20Metadata, TxOutcome};
use bridge_orchestrator::config::{
    BridgeConfig, ChainConfig, FeeConfig, IndexerConfig, PollingConfig, TokenConfig, WalletConfig,
};
use bridge_orchestrator::types::TxRef;
use bridge_orchestrator::wallet::{SwitchOutcome, WalletProvider};

pub const L1_CHAIN: u64 = 11155111;
pub const L2_CHAIN: u64 = 98765432103;

pub fn wallet_address() -> Address {
    Address::from([0xAAu8; 20])
}

pub fn bridge_address(chain_id: u64) -> Address {
    if chain_id == L1_CHAIN {
        Address::from([0xB1u8; 20])
    } else {
        Address::from([0xB2u8; 20])
    }
}

pub fn wrapped_native_address() -> Address {
    Address::from([0xCCu8; 20])
}

pub fn bridged_native_address() -> Address {
    Address::from([0xDDu8; 20])
}

/// USDT from the builtin Sepolia catalog.
pub fn usdt_address() -> Address {
    "0x7169D38820dfd117C3FA1f22a697dba58d90BA06"
        .parse()
        .unwrap()
}

pub fn test_config(wrapped_configured: bool) -> BridgeConfig {
    BridgeConfig {
        l1: ChainConfig {
            chain_id: L1_CHAIN,
            name: "Ethereum Sepolia".to_string(),
            coin_symbol: "ETH".to_string(),
            rpc_url: "http://localhost:8545".to_string(),
            explorer_url: "https://sepolia.etherscan.io".to_string(),
            bridge_address: format!("{:#x}", bridge_address(L1_CHAIN)),
        },
        l2: ChainConfig {
            chain_id: L2_CHAIN,
            name: "Goodnet Testnet".to_string(),
            coin_symbol: "TGN".to_string(),
            rpc_url: "http://localhost:8546".to_string(),
            explorer_url: "https://testnet-scan.example.com".to_string(),
            bridge_address: format!("{:#x}", bridge_address(L2_CHAIN)),
        },
        tokens: TokenConfig {
            bridged_native_l1_address: format!("{:#x}", bridged_native_address()),
            bridged_native_symbol: None,
            wrapped_native_l2_address: wrapped_configured
                .then(|| format!("{:#x}", wrapped_native_address())),
            wrapped_native_symbol: None,
        },
        indexer: IndexerConfig {
            base_url: "http://localhost:3000".to_string(),
        },
        wallet: WalletConfig { private_key: None },
        polling: PollingConfig {
            balance_interval_ms: 20,
            claim_interval_ms: 20,
        },
        fees: FeeConfig {
            base_fee: "0.001".to_string(),
            fee_bps: 10,
        },
    }
}

/// Programmable wallet session.
pub struct MockWallet {
    address: Address,
    active: Mutex<u64>,
    pub reject_switch: AtomicBool,
    pub switch_requests: AtomicU32,
}

impl MockWallet {
    pub fn new(initial_chain: u64) -> Self {
        MockWallet {
            address: wallet_address(),
            active: Mutex::new(initial_chain),
            reject_switch: AtomicBool::new(false),
            switch_requests: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    fn address(&self) -> Address {
        self.address
    }

    async fn active_chain_id(&self) -> u64 {
        *self.active.lock().unwrap()
    }

    async fn request_switch(&self, chain_id: u64) -> SwitchOutcome {
        self.switch_requests.fetch_add(1, Ordering::SeqCst);
        if self.reject_switch.load(Ordering::SeqCst) {
            return SwitchOutcome::Rejected;
        }
        *self.active.lock().unwrap() = chain_id;
        SwitchOutcome::Switched
    }
}

/// Programmable chain client recording every submitted call.
pub struct MockChain {
    chain_id: u64,
    bridge: Address,
    pub native_balances: Mutex<HashMap<Address, U256>>,
    /// (token, owner) -> balance
    pub erc20_balances: Mutex<HashMap<(Address, Address), U256>>,
    /// (token, spender) -> allowance
    pub allowances: Mutex<HashMap<(Address, Address), U256>>,
    pub metadata: Mutex<HashMap<Address, Erc20Metadata>>,
    pub timelock_secs: u64,
    pub wrapped_native: Address,
    pub submitted: Mutex<Vec<BridgeCall>>,
    /// When set, submit() fails with this message.
    pub fail_submit: Mutex<Option<String>>,
    /// When set, confirmation() reports a revert with this message.
    pub revert_with: Mutex<Option<String>>,
    /// While true, confirmation() stays Pending.
    pub hold_confirmation: AtomicBool,
    /// While true, all reads fail.
    pub fail_reads: AtomicBool,
    /// Whether an Approve call actually raises the allowance.
    pub approve_applies: AtomicBool,
    pub read_calls: AtomicU64,
    next_tx: AtomicU64,
}

impl MockChain {
    pub fn new(chain_id: u64) -> Self {
        MockChain {
            chain_id,
            bridge: bridge_address(chain_id),
            native_balances: Mutex::new(HashMap::new()),
            erc20_balances: Mutex::new(HashMap::new()),
            allowances: Mutex::new(HashMap::new()),
            metadata: Mutex::new(HashMap::new()),
            timelock_secs: 600,
            wrapped_native: wrapped_native_address(),
            submitted: Mutex::new(Vec::new()),
            fail_submit: Mutex::new(None),
            revert_with: Mutex::new(None),
            hold_confirmation: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
            approve_applies: AtomicBool::new(true),
            read_calls: AtomicU64::new(0),
            next_tx: AtomicU64::new(1),
        }
    }

    pub fn set_native_balance(&self, owner: Address, value: U256) {
        self.native_balances.lock().unwrap().insert(owner, value);
    }

    pub fn set_erc20_balance(&self, token: Address, owner: Address, value: U256) {
        self.erc20_balances
            .lock()
            .unwrap()
            .insert((token, owner), value);
    }

    pub fn set_allowance(&self, token: Address, spender: Address, value: U256) {
        self.allowances
            .lock()
            .unwrap()
            .insert((token, spender), value);
    }

    pub fn submitted_calls(&self) -> Vec<BridgeCall> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn approve_count(&self) -> usize {
        self.submitted_calls()
            .iter()
            .filter(|c| matches!(c, BridgeCall::Approve { .. }))
            .count()
    }

    fn note_read(&self) -> Result<(), ClientError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(ClientError::Rpc("mock rpc down".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ChainClient for MockChain {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn bridge_address(&self) -> Address {
        self.bridge
    }

    async fn native_balance(&self, owner: Address) -> Result<U256, ClientError> {
        self.note_read()?;
        Ok(self
            .native_balances
            .lock()
            .unwrap()
            .get(&owner)
            .copied()
            .unwrap_or(U256::ZERO))
    }

    async fn erc20_balance(&self, token: Address, owner: Address) -> Result<U256, ClientError> {
        self.note_read()?;
        Ok(self
            .erc20_balances
            .lock()
            .unwrap()
            .get(&(token, owner))
            .copied()
            .unwrap_or(U256::ZERO))
    }

    async fn erc20_allowance(
        &self,
        token: Address,
        _owner: Address,
        spender: Address,
    ) -> Result<U256, ClientError> {
        self.note_read()?;
        Ok(self
            .allowances
            .lock()
            .unwrap()
            .get(&(token, spender))
            .copied()
            .unwrap_or(U256::ZERO))
    }

    async fn erc20_metadata(&self, token: Address) -> Result<Erc20Metadata, ClientError> {
        self.note_read()?;
        self.metadata
            .lock()
            .unwrap()
            .get(&token)
            .cloned()
            .ok_or_else(|| ClientError::Rpc("metadata read failed".to_string()))
    }

    async fn timelock_duration(&self) -> Result<u64, ClientError> {
        self.note_read()?;
        Ok(self.timelock_secs)
    }

    async fn wrapped_native_address(&self) -> Result<Address, ClientError> {
        self.note_read()?;
        Ok(self.wrapped_native)
    }

    async fn submit(&self, call: &BridgeCall) -> Result<TxRef, ClientError> {
        if let Some(message) = self.fail_submit.lock().unwrap().clone() {
            return Err(ClientError::Rejected(message));
        }

        self.submitted.lock().unwrap().push(call.clone());

        // Approvals take effect unless the mock simulates a non-standard
        // token that applies a different amount.
        if let BridgeCall::Approve {
            token,
            spender,
            amount,
        } = call
        {
            if self.approve_applies.load(Ordering::SeqCst) {
                self.set_allowance(*token, *spender, *amount);
            }
        }

        let seq = self.next_tx.fetch_add(1, Ordering::SeqCst);
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&seq.to_be_bytes());
        Ok(TxRef(B256::from(bytes)))
    }

    async fn confirmation(&self, _tx: &TxRef) -> Result<TxOutcome, ClientError> {
        if self.hold_confirmation.load(Ordering::SeqCst) {
            return Ok(TxOutcome::Pending);
        }
        if let Some(reason) = self.revert_with.lock().unwrap().clone() {
            return Ok(TxOutcome::Reverted(reason));
        }
        Ok(TxOutcome::Confirmed)
    }
}

/// Programmable pending-withdrawal source.
pub struct MockSource {
    pub withdrawals: Mutex<Vec<PendingWithdrawal>>,
    pub fail: AtomicBool,
    pub fetches: AtomicU64,
}

impl MockSource {
    pub fn new() -> Self {
        MockSource {
            withdrawals: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
            fetches: AtomicU64::new(0),
        }
    }

    pub fn set(&self, records: Vec<PendingWithdrawal>) {
        *self.withdrawals.lock().unwrap() = records;
    }
}

#[async_trait]
impl WithdrawalSource for MockSource {
    async fn withdrawals_for(&self, _owner: Address) -> Result<Vec<PendingWithdrawal>, ClientError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ClientError::Rpc("indexer unavailable".to_string()));
        }
        Ok(self.withdrawals.lock().unwrap().clone())
    }
}

/// A withdrawal record as the indexer would hand it over.
pub fn pending_withdrawal(id: u64, timestamp: u64, processed: bool) -> PendingWithdrawal {
    PendingWithdrawal {
        withdrawal_id: id,
        owner: wallet_address(),
        token: Address::ZERO,
        amount: U256::from(1_000_000_000_000_000_000u128),
        timestamp,
        processed,
        claimable: false,
        time_remaining: 0,
    }
}

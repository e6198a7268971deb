//! Bridge session orchestrator
//!
//! Composes the registry, directory, reader, network gate, approval
//! coordinator, transfer submitter, and claim tracker into one per-wallet
//! session, and exposes the per-flow state consumed by presentation
//! layers. One session serves one connected wallet; claim attempts for
//! different withdrawals may run concurrently.

use alloy::primitives::{Address, U256};
use alloy::signers::local::PrivateKeySigner;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};

use crate::claims::{
    spawn_claim_polling, ClaimTracker, HttpWithdrawalSource, PendingWithdrawal, WithdrawalSource,
};
use crate::client::{ChainClient, EvmChainClient};
use crate::config::BridgeConfig;
use crate::directory::{Chain, ChainDirectory};
use crate::error::BridgeError;
use crate::fees::FeeSchedule;
use crate::poll::Poller;
use crate::reader::{watch_balance, BalanceReader, BalanceReading};
use crate::registry::{Token, TokenRegistry};
use crate::submitter::{FlowStatus, SharedStatus, TransferSubmitter};
use crate::types::{ChainSide, Direction, TransferIntent, TxRef};
use crate::wallet::{LocalWallet, WalletProvider};

/// One user session against the bridge.
pub struct BridgeSession {
    config: Arc<BridgeConfig>,
    directory: ChainDirectory,
    registry: Arc<TokenRegistry>,
    wallet: Arc<dyn WalletProvider>,
    clients: HashMap<u64, Arc<dyn ChainClient>>,
    submitter: TransferSubmitter,
    claims: Arc<ClaimTracker>,
    source: Arc<dyn WithdrawalSource>,
    fees: FeeSchedule,
    deposit_status: SharedStatus,
    withdraw_status: SharedStatus,
    claim_statuses: Mutex<HashMap<u64, SharedStatus>>,
    selections: Mutex<HashMap<Direction, Token>>,
}

impl BridgeSession {
    /// Assemble a session from explicit collaborators.
    ///
    /// Performs the startup reads: the wrapped-native address (unless
    /// configured) and the claim timelock, both cached for the session's
    /// lifetime.
    pub async fn new(
        config: BridgeConfig,
        wallet: Arc<dyn WalletProvider>,
        clients: HashMap<u64, Arc<dyn ChainClient>>,
        source: Arc<dyn WithdrawalSource>,
    ) -> Result<Self, BridgeError> {
        config
            .validate()
            .map_err(|e| BridgeError::Configuration(e.to_string()))?;
        let directory = ChainDirectory::from_config(&config)
            .map_err(|e| BridgeError::Configuration(e.to_string()))?;

        let l1_id = config.l1.chain_id;
        let l2_id = config.l2.chain_id;
        let l1_client = clients
            .get(&l1_id)
            .ok_or_else(|| BridgeError::configuration("no client for l1"))?
            .clone();
        let l2_client = clients
            .get(&l2_id)
            .ok_or_else(|| BridgeError::configuration("no client for l2"))?
            .clone();

        let wrapped_native_l2 = match config.tokens.wrapped_native_l2_address.as_deref() {
            Some(addr) => Address::from_str(addr)
                .map_err(|e| BridgeError::Configuration(format!("bad wrapped address: {e}")))?,
            None => l2_client.wrapped_native_address().await.map_err(|e| {
                BridgeError::Configuration(format!(
                    "failed to resolve wrapped-native address from l2 bridge: {e}"
                ))
            })?,
        };
        let registry = Arc::new(TokenRegistry::from_config(&config, wrapped_native_l2)?);

        let claims = Arc::new(ClaimTracker::from_chain(l1_client.as_ref()).await.map_err(
            |e| BridgeError::Configuration(format!("failed to read claim timelock: {e}")),
        )?);

        let fees = FeeSchedule::from_config(&config.fees, 18)?;
        let submitter = TransferSubmitter::new(wallet.clone(), clients.clone());

        // Both flows start on their chain's native token, as the token
        // lists do.
        let selections = HashMap::from([
            (
                Direction::Deposit,
                registry
                    .find(&config.l1.coin_symbol, l1_id)
                    .cloned()
                    .ok_or_else(|| BridgeError::configuration("l1 native token missing"))?,
            ),
            (
                Direction::Withdraw,
                registry
                    .find(&config.l2.coin_symbol, l2_id)
                    .cloned()
                    .ok_or_else(|| BridgeError::configuration("l2 native token missing"))?,
            ),
        ]);

        info!(
            l1 = l1_id,
            l2 = l2_id,
            wallet = %wallet.address(),
            timelock_secs = claims.timelock_secs(),
            "bridge session established"
        );

        Ok(BridgeSession {
            config: Arc::new(config),
            directory,
            registry,
            wallet,
            clients,
            submitter,
            claims,
            source,
            fees,
            deposit_status: Arc::new(Mutex::new(FlowStatus::idle())),
            withdraw_status: Arc::new(Mutex::new(FlowStatus::idle())),
            claim_statuses: Mutex::new(HashMap::new()),
            selections: Mutex::new(selections),
        })
    }

    /// Connect a session using the built-in collaborators: EVM clients for
    /// both chains, a headless local wallet, and the HTTP withdrawal
    /// source. Without a configured key the session is read-only and any
    /// submission is rejected by the signer layer.
    pub async fn connect(config: BridgeConfig) -> Result<Self, BridgeError> {
        let key = config.wallet.private_key.clone();
        let signer = match key.as_deref() {
            Some(key) => key
                .parse::<PrivateKeySigner>()
                .map_err(|e| BridgeError::Configuration(format!("bad wallet key: {e}")))?,
            None => {
                warn!("no wallet key configured; session is read-only");
                PrivateKeySigner::random()
            }
        };
        let wallet: Arc<dyn WalletProvider> =
            Arc::new(LocalWallet::new(&signer, config.l1.chain_id));

        let mut clients: HashMap<u64, Arc<dyn ChainClient>> = HashMap::new();
        for chain in [&config.l1, &config.l2] {
            let bridge = Address::from_str(&chain.bridge_address)
                .map_err(|e| BridgeError::Configuration(format!("bad bridge address: {e}")))?;
            let client = EvmChainClient::new(
                chain.chain_id,
                &chain.rpc_url,
                bridge,
                key.as_deref(),
            )
            .map_err(|e| BridgeError::Configuration(e.to_string()))?;
            clients.insert(chain.chain_id, Arc::new(client));
        }

        let source: Arc<dyn WithdrawalSource> = Arc::new(
            HttpWithdrawalSource::new(&config.indexer.base_url)
                .map_err(|e| BridgeError::Configuration(e.to_string()))?,
        );

        Self::new(config, wallet, clients, source).await
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn directory(&self) -> &ChainDirectory {
        &self.directory
    }

    pub fn registry(&self) -> &TokenRegistry {
        &self.registry
    }

    pub fn wallet_address(&self) -> Address {
        self.wallet.address()
    }

    pub fn fee_schedule(&self) -> &FeeSchedule {
        &self.fees
    }

    fn client_for(&self, chain_id: u64) -> Result<Arc<dyn ChainClient>, BridgeError> {
        self.clients
            .get(&chain_id)
            .cloned()
            .ok_or_else(|| {
                BridgeError::Configuration(format!("no client configured for chain {chain_id}"))
            })
    }

    fn chain(&self, side: ChainSide) -> &Chain {
        self.directory.chain(side)
    }

    // =========================================================================
    // Token surface
    // =========================================================================

    /// Source tokens offered on a chain, native first, stable order.
    pub fn available_tokens(&self, chain_id: u64) -> Vec<Token> {
        self.registry
            .tokens_for(chain_id)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Select the source token for a flow; returns (selected, counterpart).
    /// Selection clears nothing on chain, but any approval evaluation
    /// starts from scratch on the next execute.
    pub fn select_token(
        &self,
        direction: Direction,
        symbol: &str,
    ) -> Result<(Token, Token), BridgeError> {
        let chain_id = self.source_chain(direction);
        let token = self
            .registry
            .find(symbol, chain_id)
            .cloned()
            .ok_or_else(|| {
                BridgeError::Validation(format!(
                    "unknown token {symbol:?} on chain {chain_id}"
                ))
            })?;
        let counterpart = self.registry.counterpart_of(&token, direction).clone();
        self.selections
            .lock()
            .expect("selections lock")
            .insert(direction, token.clone());
        Ok((token, counterpart))
    }

    /// The currently selected source token for a flow.
    pub fn selected_token(&self, direction: Direction) -> Option<Token> {
        self.selections
            .lock()
            .expect("selections lock")
            .get(&direction)
            .cloned()
    }

    /// Destination-side counterpart of the current selection.
    pub fn counterpart_token(&self, direction: Direction) -> Option<Token> {
        self.selected_token(direction)
            .map(|t| self.registry.counterpart_of(&t, direction).clone())
    }

    /// Resolve a user-entered contract address into a session token.
    pub async fn resolve_custom_token(
        &self,
        chain_id: u64,
        address: Address,
    ) -> Result<Token, BridgeError> {
        let client = self.client_for(chain_id)?;
        self.registry
            .resolve_custom_token(client.as_ref(), address, chain_id)
            .await
    }

    // =========================================================================
    // Balances
    // =========================================================================

    pub fn reader_for(&self, chain_id: u64) -> Result<BalanceReader, BridgeError> {
        Ok(BalanceReader::new(self.client_for(chain_id)?))
    }

    /// Current balance of `token` for the session wallet on `chain_id`.
    pub async fn balance_of(&self, token: &Token, chain_id: u64) -> Result<BalanceReading, BridgeError> {
        let reader = self.reader_for(chain_id)?;
        Ok(reader.balance_of(token, self.wallet.address()).await)
    }

    /// Periodically refreshed balance slot owned by the caller; dropping
    /// the poller stops the reads.
    pub fn watch_balance(
        &self,
        token: Token,
        chain_id: u64,
    ) -> Result<(Arc<Mutex<BalanceReading>>, Poller), BridgeError> {
        let reader = Arc::new(self.reader_for(chain_id)?);
        let interval = Duration::from_millis(self.config.polling.balance_interval_ms);
        Ok(watch_balance(reader, token, self.wallet.address(), interval))
    }

    // =========================================================================
    // Deposit / withdraw flows
    // =========================================================================

    fn source_chain(&self, direction: Direction) -> u64 {
        match direction {
            Direction::Deposit => self.config.l1.chain_id,
            Direction::Withdraw => self.config.l2.chain_id,
            Direction::Claim => self.config.l1.chain_id,
        }
    }

    fn flow_status_handle(&self, direction: Direction) -> &SharedStatus {
        match direction {
            Direction::Withdraw => &self.withdraw_status,
            _ => &self.deposit_status,
        }
    }

    /// Run a deposit or withdrawal for the session wallet.
    pub async fn transfer(
        &self,
        direction: Direction,
        symbol: &str,
        amount: &str,
    ) -> Result<Option<TxRef>, BridgeError> {
        let source_chain = self.source_chain(direction);
        let (token, _) = self.select_token(direction, symbol)?;

        let intent = TransferIntent {
            direction,
            token: token.clone(),
            amount: amount.to_string(),
            source_chain,
            dest_chain: if source_chain == self.config.l1.chain_id {
                self.config.l2.chain_id
            } else {
                self.config.l1.chain_id
            },
            recipient: self.wallet.address(),
        };

        let balance = self.balance_of(&token, source_chain).await?;
        self.submitter
            .execute(&intent, balance, self.flow_status_handle(direction))
            .await
    }

    pub async fn deposit(&self, symbol: &str, amount: &str) -> Result<Option<TxRef>, BridgeError> {
        self.transfer(Direction::Deposit, symbol, amount).await
    }

    pub async fn withdraw(&self, symbol: &str, amount: &str) -> Result<Option<TxRef>, BridgeError> {
        self.transfer(Direction::Withdraw, symbol, amount).await
    }

    pub fn deposit_status(&self) -> FlowStatus {
        self.deposit_status.lock().expect("flow status lock").clone()
    }

    pub fn withdraw_status(&self) -> FlowStatus {
        self.withdraw_status.lock().expect("flow status lock").clone()
    }

    // =========================================================================
    // Claims
    // =========================================================================

    pub fn claims(&self) -> &ClaimTracker {
        &self.claims
    }

    /// Pull the latest pending withdrawals for the session wallet.
    pub async fn refresh_withdrawals(&self) {
        self.claims.sync(self.source.as_ref(), self.wallet.address()).await;
    }

    /// Start the periodic eligibility refresh. The poller is owned by the
    /// caller; dropping it stops the loop.
    pub fn spawn_claim_polling(&self) -> Poller {
        spawn_claim_polling(
            self.claims.clone(),
            self.source.clone(),
            self.wallet.address(),
            Duration::from_millis(self.config.polling.claim_interval_ms),
        )
    }

    pub fn pending_withdrawals(&self) -> Vec<PendingWithdrawal> {
        self.claims.snapshot()
    }

    pub fn is_claimable(&self, withdrawal_id: u64) -> bool {
        self.claims
            .get(withdrawal_id)
            .map(|w| w.claimable)
            .unwrap_or(false)
    }

    pub fn time_remaining(&self, withdrawal_id: u64) -> Option<u64> {
        self.claims.get(withdrawal_id).map(|w| w.time_remaining)
    }

    /// Release a claimable withdrawal on L1.
    pub async fn claim(
        &self,
        withdrawal_id: u64,
        origin_tx: &str,
    ) -> Result<Option<TxRef>, BridgeError> {
        let withdrawal = self.claims.get(withdrawal_id).ok_or_else(|| {
            BridgeError::Validation(format!("unknown withdrawal {withdrawal_id}"))
        })?;

        let status = self.claim_status_handle(withdrawal_id);
        let result = self
            .submitter
            .execute_claim(
                self.config.l1.chain_id,
                &withdrawal,
                origin_tx,
                &status,
            )
            .await;

        if let Ok(Some(_)) = result {
            self.claims.mark_processed(withdrawal_id);
        }
        result
    }

    fn claim_status_handle(&self, withdrawal_id: u64) -> SharedStatus {
        self.claim_statuses
            .lock()
            .expect("claim statuses lock")
            .entry(withdrawal_id)
            .or_insert_with(|| Arc::new(Mutex::new(FlowStatus::idle())))
            .clone()
    }

    pub fn claim_status(&self, withdrawal_id: u64) -> Option<FlowStatus> {
        self.claim_statuses
            .lock()
            .expect("claim statuses lock")
            .get(&withdrawal_id)
            .map(|s| s.lock().expect("flow status lock").clone())
    }

    /// Estimated bridge fee for an amount in smallest units.
    pub fn estimate_fee(&self, amount: U256) -> U256 {
        self.fees.estimate(amount)
    }

    /// Explorer link for a transaction on one of the two chains.
    pub fn tx_url(&self, side: ChainSide, tx: &TxRef) -> String {
        self.chain(side).tx_url(tx)
    }
}

//! EVM chain client
//!
//! alloy-backed implementation of [`ChainClient`]. Providers are built per
//! operation from the configured RPC URL; write operations additionally
//! attach the session signer.

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, FixedBytes, U256};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::{Client, Http};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::client::{BridgeCall, ChainClient, ClientError, Erc20Metadata, TxOutcome};
use crate::contracts::{BridgeL1, BridgeL2, ERC20};
use crate::types::TxRef;

/// Client for one EVM chain, optionally able to sign.
pub struct EvmChainClient {
    chain_id: u64,
    rpc_url: String,
    bridge_address: Address,
    signer: Option<PrivateKeySigner>,
}

impl EvmChainClient {
    /// Create a client. `private_key` is required only for write flows.
    pub fn new(
        chain_id: u64,
        rpc_url: &str,
        bridge_address: Address,
        private_key: Option<&str>,
    ) -> Result<Self, ClientError> {
        // Validate the URL once up front so later per-call parses cannot fail.
        rpc_url
            .parse::<reqwest::Url>()
            .map_err(|e| ClientError::Rpc(format!("invalid rpc url {rpc_url:?}: {e}")))?;

        let signer = match private_key {
            Some(key) => Some(
                key.parse::<PrivateKeySigner>()
                    .map_err(|e| ClientError::Rejected(format!("invalid private key: {e}")))?,
            ),
            None => None,
        };

        if let Some(ref signer) = signer {
            info!(
                chain_id,
                signer = %signer.address(),
                bridge = %bridge_address,
                "EVM client initialized with signer"
            );
        } else {
            info!(chain_id, bridge = %bridge_address, "EVM client initialized read-only");
        }

        Ok(Self {
            chain_id,
            rpc_url: rpc_url.to_string(),
            bridge_address,
            signer,
        })
    }

    fn read_provider(&self) -> Result<RootProvider<Http<Client>>, ClientError> {
        let url = self
            .rpc_url
            .parse()
            .map_err(|e| ClientError::Rpc(format!("invalid rpc url: {e}")))?;
        Ok(ProviderBuilder::new().on_http(url))
    }

    fn write_signer(&self) -> Result<PrivateKeySigner, ClientError> {
        self.signer
            .clone()
            .ok_or_else(|| ClientError::Rejected("no signing key configured".to_string()))
    }
}

fn rpc_err(e: impl std::fmt::Display) -> ClientError {
    ClientError::Rpc(e.to_string())
}

fn reject_err(e: impl std::fmt::Display) -> ClientError {
    ClientError::Rejected(e.to_string())
}

#[async_trait]
impl ChainClient for EvmChainClient {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn bridge_address(&self) -> Address {
        self.bridge_address
    }

    async fn native_balance(&self, owner: Address) -> Result<U256, ClientError> {
        let provider = self.read_provider()?;
        provider.get_balance(owner).await.map_err(rpc_err)
    }

    async fn erc20_balance(&self, token: Address, owner: Address) -> Result<U256, ClientError> {
        let provider = self.read_provider()?;
        let contract = ERC20::new(token, &provider);
        let result = contract.balanceOf(owner).call().await.map_err(rpc_err)?;
        Ok(result._0)
    }

    async fn erc20_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ClientError> {
        let provider = self.read_provider()?;
        let contract = ERC20::new(token, &provider);
        let result = contract
            .allowance(owner, spender)
            .call()
            .await
            .map_err(rpc_err)?;
        Ok(result._0)
    }

    async fn erc20_metadata(&self, token: Address) -> Result<Erc20Metadata, ClientError> {
        let provider = self.read_provider()?;
        let contract = ERC20::new(token, &provider);
        let name = contract.name().call().await.map_err(rpc_err)?._0;
        let symbol = contract.symbol().call().await.map_err(rpc_err)?._0;
        let decimals = contract.decimals().call().await.map_err(rpc_err)?._0;
        Ok(Erc20Metadata {
            name,
            symbol,
            decimals,
        })
    }

    async fn timelock_duration(&self) -> Result<u64, ClientError> {
        let provider = self.read_provider()?;
        let contract = BridgeL1::new(self.bridge_address, &provider);
        let duration = contract.timelockDuration().call().await.map_err(rpc_err)?;
        duration
            ._0
            .try_into()
            .map_err(|_| ClientError::Rpc("timelock duration out of range".to_string()))
    }

    async fn wrapped_native_address(&self) -> Result<Address, ClientError> {
        let provider = self.read_provider()?;
        let contract = BridgeL2::new(self.bridge_address, &provider);
        let result = contract.wrappedNative().call().await.map_err(rpc_err)?;
        Ok(result._0)
    }

    async fn submit(&self, call: &BridgeCall) -> Result<TxRef, ClientError> {
        let signer = self.write_signer()?;
        let wallet = EthereumWallet::from(signer);
        let url = self
            .rpc_url
            .parse()
            .map_err(|e| ClientError::Rpc(format!("invalid rpc url: {e}")))?;
        // with_recommended_fillers() fills nonce, gas, and fees; a bare
        // wallet provider can sign but not populate those fields.
        let provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(wallet)
            .on_http(url);
        debug!(chain_id = self.chain_id, ?call, "submitting bridge call");

        let tx_hash = match call {
            BridgeCall::Approve {
                token,
                spender,
                amount,
            } => {
                let contract = ERC20::new(*token, &provider);
                *contract
                    .approve(*spender, *amount)
                    .send()
                    .await
                    .map_err(reject_err)?
                    .tx_hash()
            }
            BridgeCall::DepositNative { amount } => {
                let contract = BridgeL1::new(self.bridge_address, &provider);
                *contract
                    .depositNative()
                    .value(*amount)
                    .send()
                    .await
                    .map_err(reject_err)?
                    .tx_hash()
            }
            BridgeCall::DepositErc20 { token, amount } => {
                let contract = BridgeL1::new(self.bridge_address, &provider);
                *contract
                    .depositErc20(*token, *amount)
                    .send()
                    .await
                    .map_err(reject_err)?
                    .tx_hash()
            }
            BridgeCall::WithdrawNative { amount } => {
                let contract = BridgeL2::new(self.bridge_address, &provider);
                // Burn-by-payment: amount is both the argument and the value.
                *contract
                    .withdrawNative(*amount)
                    .value(*amount)
                    .send()
                    .await
                    .map_err(reject_err)?
                    .tx_hash()
            }
            BridgeCall::WithdrawWrapped { amount } => {
                let contract = BridgeL2::new(self.bridge_address, &provider);
                *contract
                    .withdrawWrapped(*amount)
                    .send()
                    .await
                    .map_err(reject_err)?
                    .tx_hash()
            }
            BridgeCall::WithdrawErc20 { token, amount } => {
                let contract = BridgeL2::new(self.bridge_address, &provider);
                *contract
                    .withdrawErc20(*token, *amount)
                    .send()
                    .await
                    .map_err(reject_err)?
                    .tx_hash()
            }
            BridgeCall::Release {
                withdrawal_id,
                recipient,
                token,
                amount,
                origin_ref,
            } => {
                let contract = BridgeL1::new(self.bridge_address, &provider);
                match token {
                    None => {
                        *contract
                            .releaseNative(
                                U256::from(*withdrawal_id),
                                *recipient,
                                *amount,
                                FixedBytes(*origin_ref),
                            )
                            .send()
                            .await
                            .map_err(reject_err)?
                            .tx_hash()
                    }
                    Some(token) => {
                        *contract
                            .releaseErc20(
                                U256::from(*withdrawal_id),
                                *recipient,
                                *token,
                                *amount,
                                FixedBytes(*origin_ref),
                            )
                            .send()
                            .await
                            .map_err(reject_err)?
                            .tx_hash()
                    }
                }
            }
        };

        info!(chain_id = self.chain_id, tx = %tx_hash, "bridge call accepted by network");
        Ok(TxRef(tx_hash))
    }

    async fn confirmation(&self, tx: &TxRef) -> Result<TxOutcome, ClientError> {
        let provider = self.read_provider()?;
        match provider
            .get_transaction_receipt(tx.0)
            .await
            .map_err(rpc_err)?
        {
            None => Ok(TxOutcome::Pending),
            Some(receipt) => {
                if receipt.status() {
                    Ok(TxOutcome::Confirmed)
                } else {
                    Ok(TxOutcome::Reverted("transaction reverted".to_string()))
                }
            }
        }
    }
}

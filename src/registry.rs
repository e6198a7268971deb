//! Token registry
//!
//! Per-chain catalog of bridgeable assets. Each token carries its
//! classification and a per-chain address map; native tokens never resolve
//! to a contract address. Call-site dispatch keys off [`TokenKind`], never
//! off symbol strings.

use alloy::primitives::Address;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::debug;

use crate::client::ChainClient;
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::types::Direction;

/// Token classification driving contract-call selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A chain's base gas-paying asset.
    Native,
    /// ERC-20 representation of the *other* chain's native asset.
    WrappedNative,
    /// Any other bridgeable ERC-20.
    Erc20,
}

/// A bridgeable asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub kind: TokenKind,
    /// Chain id → contract address. Native tokens keep a zero-address
    /// sentinel on their home chain only.
    pub addresses: HashMap<u64, Address>,
}

impl Token {
    pub fn native(symbol: &str, name: &str, home_chain: u64) -> Self {
        let mut addresses = HashMap::new();
        addresses.insert(home_chain, Address::ZERO);
        Token {
            symbol: symbol.to_string(),
            name: name.to_string(),
            decimals: 18,
            kind: TokenKind::Native,
            addresses,
        }
    }

    pub fn wrapped_native(symbol: &str, name: &str, chain_id: u64, address: Address) -> Self {
        Token {
            symbol: symbol.to_string(),
            name: name.to_string(),
            decimals: 18,
            kind: TokenKind::WrappedNative,
            addresses: HashMap::from([(chain_id, address)]),
        }
    }

    pub fn erc20(
        symbol: &str,
        name: &str,
        decimals: u8,
        addresses: HashMap<u64, Address>,
    ) -> Self {
        Token {
            symbol: symbol.to_string(),
            name: name.to_string(),
            decimals,
            kind: TokenKind::Erc20,
            addresses,
        }
    }

    pub fn is_native(&self) -> bool {
        self.kind == TokenKind::Native
    }

    /// Contract address on a chain. Native tokens always resolve to
    /// `None`, whatever chain is asked; non-native tokens resolve to their
    /// mapped address, zero-address entries treated as absent.
    pub fn address_on(&self, chain_id: u64) -> Option<Address> {
        if self.is_native() {
            return None;
        }
        self.addresses
            .get(&chain_id)
            .copied()
            .filter(|addr| *addr != Address::ZERO)
    }

    /// The single chain a native or wrapped token belongs to.
    fn home_chain(&self) -> Option<u64> {
        match self.kind {
            TokenKind::Native | TokenKind::WrappedNative => {
                self.addresses.keys().next().copied()
            }
            TokenKind::Erc20 => None,
        }
    }
}

/// Catalog of bridgeable tokens for one bridge instance.
///
/// Token order is the declaration order below and is stable: lookups and
/// listings must be reproducible across runs.
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    l1_chain_id: u64,
    l2_chain_id: u64,
    tokens: Vec<Token>,
}

impl TokenRegistry {
    /// Build the registry from configuration plus the resolved address of
    /// the L2 wrapped-native token.
    ///
    /// The counterpart mapping is validated total here; a token the mapping
    /// cannot place is a configuration error at startup, never an error
    /// surfaced to a user mid-flow.
    pub fn from_config(
        config: &BridgeConfig,
        wrapped_native_l2: Address,
    ) -> Result<Self, BridgeError> {
        let l1 = config.l1.chain_id;
        let l2 = config.l2.chain_id;

        let bridged_address = Address::from_str(&config.tokens.bridged_native_l1_address)
            .map_err(|e| {
                BridgeError::Configuration(format!("bad bridged token address: {e}"))
            })?;
        if wrapped_native_l2 == Address::ZERO {
            return Err(BridgeError::configuration(
                "wrapped-native address on l2 resolved to zero",
            ));
        }

        let bridged_symbol = config
            .tokens
            .bridged_native_symbol
            .clone()
            .unwrap_or_else(|| config.l2.coin_symbol.clone());
        let wrapped_symbol = config
            .tokens
            .wrapped_native_symbol
            .clone()
            .unwrap_or_else(|| format!("w{}", config.l1.coin_symbol));

        let mut tokens = vec![
            Token::native(&config.l1.coin_symbol, &config.l1.name, l1),
            Token::native(&config.l2.coin_symbol, &config.l2.name, l2),
            Token::wrapped_native(
                &wrapped_symbol,
                &format!("Wrapped {}", config.l1.coin_symbol),
                l2,
                wrapped_native_l2,
            ),
            Token::wrapped_native(
                &bridged_symbol,
                &format!("Bridged {}", config.l2.coin_symbol),
                l1,
                bridged_address,
            ),
        ];
        tokens.extend(builtin_erc20s(l1));

        let registry = TokenRegistry {
            l1_chain_id: l1,
            l2_chain_id: l2,
            tokens,
        };
        registry.validate()?;
        Ok(registry)
    }

    /// Registry for hand-assembled token sets (tests, fixtures).
    pub fn with_tokens(
        l1_chain_id: u64,
        l2_chain_id: u64,
        tokens: Vec<Token>,
    ) -> Result<Self, BridgeError> {
        let registry = TokenRegistry {
            l1_chain_id,
            l2_chain_id,
            tokens,
        };
        registry.validate()?;
        Ok(registry)
    }

    fn validate(&self) -> Result<(), BridgeError> {
        for side in [self.l1_chain_id, self.l2_chain_id] {
            let natives = self
                .tokens
                .iter()
                .filter(|t| t.kind == TokenKind::Native && t.home_chain() == Some(side))
                .count();
            if natives != 1 {
                return Err(BridgeError::Configuration(format!(
                    "chain {side} must have exactly one native token, found {natives}"
                )));
            }
            let wrapped = self
                .tokens
                .iter()
                .filter(|t| t.kind == TokenKind::WrappedNative && t.home_chain() == Some(side))
                .count();
            if wrapped != 1 {
                return Err(BridgeError::Configuration(format!(
                    "chain {side} must have exactly one wrapped-native token, found {wrapped}"
                )));
            }
        }
        for token in &self.tokens {
            if matches!(token.kind, TokenKind::Native | TokenKind::WrappedNative)
                && token.addresses.len() != 1
            {
                return Err(BridgeError::Configuration(format!(
                    "token {} must map exactly one chain",
                    token.symbol
                )));
            }
        }
        Ok(())
    }

    pub fn l1_chain_id(&self) -> u64 {
        self.l1_chain_id
    }

    pub fn l2_chain_id(&self) -> u64 {
        self.l2_chain_id
    }

    fn other_chain(&self, chain_id: u64) -> u64 {
        if chain_id == self.l1_chain_id {
            self.l2_chain_id
        } else {
            self.l1_chain_id
        }
    }

    /// Tokens usable as a source token on `chain_id`: the chain's native
    /// token first, then every token with a non-zero address there, in
    /// declaration order.
    pub fn tokens_for(&self, chain_id: u64) -> Vec<&Token> {
        let mut result = Vec::new();
        result.extend(
            self.tokens
                .iter()
                .filter(|t| t.is_native() && t.home_chain() == Some(chain_id)),
        );
        result.extend(
            self.tokens
                .iter()
                .filter(|t| t.address_on(chain_id).is_some()),
        );
        result
    }

    /// Look up a source token by symbol on a chain.
    pub fn find(&self, symbol: &str, chain_id: u64) -> Option<&Token> {
        self.tokens_for(chain_id)
            .into_iter()
            .find(|t| t.symbol.eq_ignore_ascii_case(symbol))
    }

    /// Destination-side representation of a source token.
    ///
    /// The table is fixed: a native asset maps to its wrapped
    /// representation on the far side, a wrapped representation maps back
    /// to the native asset it stands for, and any other ERC-20 passes
    /// through unchanged (assumed already bridged). The mapping is total
    /// over every token the registry exposes and does not depend on the
    /// direction of travel.
    pub fn counterpart_of<'a>(&'a self, token: &'a Token, direction: Direction) -> &'a Token {
        debug!(token = %token.symbol, %direction, "resolving counterpart token");
        match token.kind {
            TokenKind::Native => {
                let home = token.home_chain().unwrap_or(self.l1_chain_id);
                let far = self.other_chain(home);
                self.tokens
                    .iter()
                    .find(|t| t.kind == TokenKind::WrappedNative && t.home_chain() == Some(far))
                    .expect("registry validated: wrapped-native exists on both chains")
            }
            TokenKind::WrappedNative => {
                let home = token.home_chain().unwrap_or(self.l2_chain_id);
                let far = self.other_chain(home);
                self.tokens
                    .iter()
                    .find(|t| t.kind == TokenKind::Native && t.home_chain() == Some(far))
                    .expect("registry validated: native exists on both chains")
            }
            TokenKind::Erc20 => self
                .tokens
                .iter()
                .find(|t| t.symbol == token.symbol && t.kind == TokenKind::Erc20)
                .unwrap_or(token),
        }
    }

    /// Resolve a user-entered contract address into a session-scoped token.
    ///
    /// Any failed or empty metadata read is an [`BridgeError::InvalidToken`];
    /// decimals of 0 is a valid value, not a missing one.
    pub async fn resolve_custom_token(
        &self,
        client: &dyn ChainClient,
        address: Address,
        chain_id: u64,
    ) -> Result<Token, BridgeError> {
        let metadata = client
            .erc20_metadata(address)
            .await
            .map_err(|e| BridgeError::InvalidToken(e.to_string()))?;

        if metadata.symbol.trim().is_empty() {
            return Err(BridgeError::InvalidToken(
                "token reports an empty symbol".to_string(),
            ));
        }
        if metadata.name.trim().is_empty() {
            return Err(BridgeError::InvalidToken(
                "token reports an empty name".to_string(),
            ));
        }

        debug!(
            %address,
            chain_id,
            symbol = %metadata.symbol,
            decimals = metadata.decimals,
            "resolved custom token"
        );

        Ok(Token::erc20(
            &metadata.symbol,
            &metadata.name,
            metadata.decimals,
            HashMap::from([(chain_id, address)]),
        ))
    }
}

/// Well-known ERC-20s available out of the box on supported L1 chains.
fn builtin_erc20s(l1_chain_id: u64) -> Vec<Token> {
    let entries: &[(&str, &str, u8, &str)] = match l1_chain_id {
        // Ethereum Sepolia
        11155111 => &[
            ("USDT", "Tether USD", 6, "0x7169D38820dfd117C3FA1f22a697dba58d90BA06"),
            ("USDC", "USD Coin", 6, "0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238"),
            ("WETH", "Wrapped Ethereum", 18, "0xfFf9976782d46CC05630D1f6eBAb18b2324d6B14"),
            ("DAI", "Dai Stablecoin", 18, "0x11fE4B6AE13d2a6055C8D9cF65c55bac32B5d844"),
        ],
        // Ethereum mainnet
        1 => &[
            ("USDT", "Tether USD", 6, "0xdAC17F958D2ee523a2206206994597C13D831ec7"),
            ("USDC", "USD Coin", 6, "0xA0b86a33E6441c8C616f0c96f95E0cc79823c744"),
            ("WETH", "Wrapped Ethereum", 18, "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
            ("DAI", "Dai Stablecoin", 18, "0x6B175474E89094C44Da98b954EedeAC495271d0F"),
        ],
        _ => &[],
    };

    entries
        .iter()
        .map(|(symbol, name, decimals, address)| {
            let addr = Address::from_str(address).expect("builtin catalog address");
            Token::erc20(symbol, name, *decimals, HashMap::from([(l1_chain_id, addr)]))
        })
        .collect()
}

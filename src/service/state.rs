use alloy::primitives::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::{FactoryHandle, PairBook, RouterHandle, TokenSet};
use crate::config::DeploymentConfig;

/// Signer used for deployments and faucet drips.
pub const DEPLOYER_SIGNER_INDEX: usize = 0;

/// Signer passed to the factory as fee recipient setter.
pub const FEE_OWNER_SIGNER_INDEX: usize = 0;

/// Signer that receives dripped tokens and provides the initial liquidity.
pub const LIQUIDITY_FUNDER_SIGNER_INDEX: usize = 1;

pub const DEFAULT_DEADLINE_SECONDS: u64 = 60;

/// Names under which the compiled contracts are looked up.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ContractNames {
    pub factory: String,
    pub faucet_token: String,
    pub pair: String,
    pub router: String,
}

impl Default for ContractNames {
    fn default() -> Self {
        Self {
            factory: "UniswapV2Factory".to_string(),
            faucet_token: "FaucetToken".to_string(),
            pair: "UniswapV2Pair".to_string(),
            router: "UniswapV2Router02".to_string(),
        }
    }
}

/// Price and depth of the pools seeded in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolInitializer {
    /// Quote units per base unit
    pub midpoint_ratio: Decimal,
    /// Integer precision: the base side is 10^ratio_decimals before scaling
    pub ratio_decimals: u32,
    /// Scales liquidity depth without changing the price; 1 keeps the unscaled amounts
    pub ratio_multiplier: Decimal,
}

impl Default for PoolInitializer {
    fn default() -> Self {
        Self {
            midpoint_ratio: Decimal::TWO,
            ratio_decimals: 22,
            ratio_multiplier: Decimal::ONE,
        }
    }
}

impl PoolInitializer {
    pub fn with_multiplier(self, ratio_multiplier: Decimal) -> Self {
        Self {
            ratio_multiplier,
            ..self
        }
    }
}

/// Everything one deployment run knows about the exchange it is building.
///
/// Created fresh per run and mutated in place by each step. Handles are only ever
/// added; redeploying a factory or router requires a new session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    // accounts, resolved on first use
    pub deployer_account: Option<Address>,
    pub factory_fee_owner_account: Option<Address>,
    pub pool_initialize_account: Option<Address>,
    // tokens
    pub token_symbol_list: Vec<String>,
    pub tokens: TokenSet,
    pub pairs: PairBook,
    // contracts
    pub factory: Option<FactoryHandle>,
    pub router: Option<RouterHandle>,
    pub deadline_seconds: u64,
    pub pool_initializer: PoolInitializer,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(
            ["WETH", "TOKA", "TOKB"].map(String::from).to_vec(),
            PoolInitializer::default(),
            DEFAULT_DEADLINE_SECONDS,
        )
    }
}

impl SessionState {
    pub fn new(
        token_symbol_list: Vec<String>,
        pool_initializer: PoolInitializer,
        deadline_seconds: u64,
    ) -> Self {
        Self {
            deployer_account: None,
            factory_fee_owner_account: None,
            pool_initialize_account: None,
            token_symbol_list,
            tokens: TokenSet::default(),
            pairs: PairBook::default(),
            factory: None,
            router: None,
            deadline_seconds,
            pool_initializer,
        }
    }

    pub fn from_config(config: &DeploymentConfig) -> Self {
        Self::new(
            config.token_symbols.clone(),
            config.pool_initializer,
            config.deadline_seconds,
        )
    }

    /// A fresh session over the same symbols for the configured additional pool.
    pub fn additional_from_config(config: &DeploymentConfig) -> Option<Self> {
        config.additional_pool.map(|pool_initializer| {
            Self::new(
                config.token_symbols.clone(),
                pool_initializer,
                config.deadline_seconds,
            )
        })
    }

    /// The symbol whose token is the base leg of every pair (conventionally WETH).
    pub fn base_symbol(&self) -> Option<&str> {
        self.token_symbol_list.first().map(String::as_str)
    }

    /// Symbols listed more than once, in list order.
    pub fn duplicate_symbols(&self) -> Vec<&str> {
        let mut duplicates = Vec::new();
        for (i, symbol) in self.token_symbol_list.iter().enumerate() {
            if self.token_symbol_list[..i].contains(symbol) && !duplicates.contains(&symbol.as_str())
            {
                duplicates.push(symbol.as_str());
            }
        }
        duplicates
    }

    /// Summary of the deployed contracts, pairs in list order.
    pub fn summary(&self) -> SessionSummary {
        let mut pairs = Vec::new();
        for (i, first) in self.token_symbol_list.iter().enumerate() {
            for second in &self.token_symbol_list[i + 1..] {
                if let Some(pair) = self.pairs.get(first, second) {
                    pairs.push(PairSummary {
                        first: first.clone(),
                        second: second.clone(),
                        address: pair.address,
                    });
                }
            }
        }

        SessionSummary {
            factory: self.factory.as_ref().map(|f| f.address),
            router: self.router.as_ref().map(|r| r.address),
            tokens: self
                .tokens
                .iter()
                .map(|t| (t.symbol.clone(), t.address))
                .collect(),
            pairs,
            pool_initializer: self.pool_initializer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairSummary {
    pub first: String,
    pub second: String,
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub factory: Option<Address>,
    pub router: Option<Address>,
    pub tokens: Vec<(String, Address)>,
    pub pairs: Vec<PairSummary>,
    pub pool_initializer: PoolInitializer,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::types::{PairHandle, TokenHandle};

    #[test]
    fn test_default_state_should_work() {
        let state = SessionState::default();

        assert_eq!(state.token_symbol_list, vec!["WETH", "TOKA", "TOKB"]);
        assert_eq!(state.base_symbol(), Some("WETH"));
        assert_eq!(state.deadline_seconds, 60);
        assert_eq!(state.pool_initializer.midpoint_ratio, Decimal::TWO);
        assert_eq!(state.pool_initializer.ratio_decimals, 22);
        assert_eq!(state.pool_initializer.ratio_multiplier, Decimal::ONE);
        assert!(state.tokens.is_empty());
        assert!(state.pairs.is_empty());
        assert!(state.factory.is_none());
        assert!(state.router.is_none());
        assert!(state.factory_fee_owner_account.is_none());
        assert!(state.pool_initialize_account.is_none());
    }

    #[test]
    fn test_default_contract_names() {
        let names = ContractNames::default();
        assert_eq!(names.factory, "UniswapV2Factory");
        assert_eq!(names.faucet_token, "FaucetToken");
        assert_eq!(names.pair, "UniswapV2Pair");
        assert_eq!(names.router, "UniswapV2Router02");
    }

    #[test]
    fn test_duplicate_symbols() {
        let state = SessionState::new(
            ["WETH", "TOKA", "WETH", "TOKB", "TOKA", "WETH"]
                .map(String::from)
                .to_vec(),
            PoolInitializer::default(),
            60,
        );
        assert_eq!(state.duplicate_symbols(), vec!["WETH", "TOKA"]);
        assert!(SessionState::default().duplicate_symbols().is_empty());
    }

    #[test]
    fn test_summary_lists_pairs_in_symbol_order() {
        let mut state = SessionState::default();
        for (i, symbol) in ["WETH", "TOKA", "TOKB"].iter().enumerate() {
            state.tokens.insert(TokenHandle {
                symbol: symbol.to_string(),
                address: Address::with_last_byte(i as u8 + 1),
            });
        }
        for (first, second, byte) in [("TOKA", "TOKB", 12), ("WETH", "TOKB", 11), ("WETH", "TOKA", 10)] {
            state.pairs.insert(
                first,
                second,
                PairHandle {
                    address: Address::with_last_byte(byte),
                    token_a: Address::ZERO,
                    token_b: Address::ZERO,
                },
            );
        }

        let summary = state.summary();
        let order: Vec<(&str, &str)> = summary
            .pairs
            .iter()
            .map(|p| (p.first.as_str(), p.second.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![("WETH", "TOKA"), ("WETH", "TOKB"), ("TOKA", "TOKB")]
        );
        assert_eq!(summary.tokens.len(), 3);
        assert!(summary.factory.is_none());
    }

    #[test]
    fn test_state_from_config() {
        let config = DeploymentConfig {
            token_symbols: ["WETH", "TOKC"].map(String::from).to_vec(),
            deadline_seconds: 120,
            additional_pool: Some(PoolInitializer::default().with_multiplier(Decimal::TEN)),
            ..DeploymentConfig::default()
        };

        let state = SessionState::from_config(&config);
        assert_eq!(state.token_symbol_list, vec!["WETH", "TOKC"]);
        assert_eq!(state.deadline_seconds, 120);
        assert_eq!(state.pool_initializer, PoolInitializer::default());

        let additional = SessionState::additional_from_config(&config).unwrap();
        assert_eq!(additional.token_symbol_list, state.token_symbol_list);
        assert_eq!(additional.pool_initializer.ratio_multiplier, Decimal::TEN);
        assert!(additional.tokens.is_empty());

        let without = DeploymentConfig::default();
        assert!(SessionState::additional_from_config(&without).is_none());
    }

    #[test]
    fn test_pool_initializer_deserializes_with_defaults() {
        let init: PoolInitializer = serde_yaml::from_str("ratio_multiplier: 2.0").unwrap();
        assert_eq!(init.midpoint_ratio, Decimal::TWO);
        assert_eq!(init.ratio_decimals, 22);
        assert_eq!(init.ratio_multiplier, Decimal::TWO);
    }
}

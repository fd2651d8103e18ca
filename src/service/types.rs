use std::collections::BTreeMap;

use alloy::primitives::{Address, B256, U256};
use serde::Serialize;

/// A deployed faucet token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenHandle {
    pub symbol: String,
    pub address: Address,
}

/// A deployed Uniswap V2 pair, as created for `token_a`/`token_b`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairHandle {
    pub address: Address,
    pub token_a: Address,
    pub token_b: Address,
}

/// A deployed Uniswap V2 factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactoryHandle {
    pub address: Address,
    /// Account passed to the factory constructor (fee recipient setter)
    pub fee_to_setter: Address,
}

/// A deployed Uniswap V2 router and the bindings it was constructed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouterHandle {
    pub address: Address,
    pub factory: Address,
    pub base_token: Address,
    /// keccak256 of the pair creation bytecode
    pub init_code_hash: B256,
}

/// Deployed tokens keyed by symbol, iterated in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSet {
    handles: Vec<TokenHandle>,
}

impl TokenSet {
    /// Insert a token, replacing any previous handle with the same symbol in place.
    pub fn insert(&mut self, handle: TokenHandle) {
        match self.handles.iter_mut().find(|h| h.symbol == handle.symbol) {
            Some(existing) => *existing = handle,
            None => self.handles.push(handle),
        }
    }

    pub fn get(&self, symbol: &str) -> Option<&TokenHandle> {
        self.handles.iter().find(|h| h.symbol == symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.get(symbol).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TokenHandle> {
        self.handles.iter()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// Pairs keyed by the symbol that comes first in the session's symbol list, iterated
/// in symbol order.
///
/// `get(a, b)` only finds a pair when `a` precedes `b`; the symmetric entry is never
/// recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairBook {
    pairs: BTreeMap<String, BTreeMap<String, PairHandle>>,
}

impl PairBook {
    pub fn insert(&mut self, first: &str, second: &str, handle: PairHandle) {
        self.pairs
            .entry(first.to_string())
            .or_default()
            .insert(second.to_string(), handle);
    }

    pub fn get(&self, first: &str, second: &str) -> Option<&PairHandle> {
        self.pairs.get(first).and_then(|inner| inner.get(second))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &PairHandle)> {
        self.pairs.iter().flat_map(|(first, inner)| {
            inner
                .iter()
                .map(move |(second, handle)| (first.as_str(), second.as_str(), handle))
        })
    }

    pub fn len(&self) -> usize {
        self.pairs.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Base and quote amounts added to every seeded pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidityAmounts {
    pub base: U256,
    pub quote: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenListItem {
    pub chain_id: u64,
    pub address: Address,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
}

/// A token list document describing deployed tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenList {
    pub name: String,
    pub tokens: Vec<TokenListItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(symbol: &str, last_byte: u8) -> TokenHandle {
        TokenHandle {
            symbol: symbol.to_string(),
            address: Address::with_last_byte(last_byte),
        }
    }

    #[test]
    fn test_token_set_keeps_insertion_order_and_replaces_in_place() {
        let mut tokens = TokenSet::default();
        tokens.insert(token("WETH", 1));
        tokens.insert(token("TOKA", 2));
        tokens.insert(token("TOKB", 3));
        tokens.insert(token("TOKA", 9));

        let symbols: Vec<&str> = tokens.iter().map(|t| t.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["WETH", "TOKA", "TOKB"]);
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens.get("TOKA").unwrap().address, Address::with_last_byte(9));
        assert!(!tokens.contains("TOKC"));
    }

    #[test]
    fn test_pair_book_is_not_symmetric() {
        let mut pairs = PairBook::default();
        let handle = PairHandle {
            address: Address::with_last_byte(10),
            token_a: Address::with_last_byte(1),
            token_b: Address::with_last_byte(2),
        };
        pairs.insert("WETH", "TOKA", handle.clone());

        assert_eq!(pairs.get("WETH", "TOKA"), Some(&handle));
        assert_eq!(pairs.get("TOKA", "WETH"), None);
        assert_eq!(pairs.len(), 1);

        pairs.insert("TOKA", "TOKB", handle.clone());
        pairs.insert("TOKA", "TOKA2", handle.clone());
        let order: Vec<(&str, &str)> = pairs.iter().map(|(a, b, _)| (a, b)).collect();
        assert_eq!(
            order,
            vec![("TOKA", "TOKA2"), ("TOKA", "TOKB"), ("WETH", "TOKA")]
        );
    }

    #[test]
    fn test_token_list_serializes_in_camel_case() {
        let list = TokenList {
            name: "hardhat".to_string(),
            tokens: vec![TokenListItem {
                chain_id: 1337,
                address: Address::with_last_byte(1),
                symbol: "TOKA".to_string(),
                name: "Token A".to_string(),
                decimals: 18,
            }],
        };

        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json["name"], "hardhat");
        assert_eq!(json["tokens"][0]["chainId"], 1337);
        assert_eq!(json["tokens"][0]["symbol"], "TOKA");
        assert_eq!(json["tokens"][0]["decimals"], 18);
        assert_eq!(
            json["tokens"][0]["address"],
            "0x0000000000000000000000000000000000000001"
        );
    }
}

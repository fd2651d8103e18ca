use std::sync::Arc;

use alloy::primitives::{Address, B256, Bytes, U256, keccak256};
use alloy::sol_types::SolValue;
use tracing::instrument;

use crate::repository::{AddLiquidityParams, ChainGateway};
use crate::service::state::{
    ContractNames, DEPLOYER_SIGNER_INDEX, FEE_OWNER_SIGNER_INDEX, LIQUIDITY_FUNDER_SIGNER_INDEX,
    SessionState,
};
use crate::service::types::{
    FactoryHandle, LiquidityAmounts, PairHandle, RouterHandle, TokenHandle, TokenList,
    TokenListItem, TokenSet,
};
use crate::service::utils::{liquidity_amounts, pair_address, relative_deadline};
use crate::service::{ServiceError, ServiceResult};

/// Dripped amounts are this multiple of what is added as liquidity.
pub const DRIP_HEADROOM_FACTOR: u64 = 2;

pub const DEFAULT_TOKEN_LIST_NAME: &str = "hardhat";

/// Every unordered index pair `(i, j)` with `i < j < n`, in ascending list order.
pub fn pair_indices(n: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..n).flat_map(move |i| (i + 1..n).map(move |j| (i, j)))
}

/// Index pairs that receive liquidity: like [`pair_indices`] but never involving the
/// base token at index 0.
pub fn seeded_pair_indices(n: usize) -> impl Iterator<Item = (usize, usize)> {
    pair_indices(n).filter(|&(i, _)| i > 0)
}

/// Deploys and seeds a Uniswap V2 test exchange through a [`ChainGateway`].
///
/// Each `auto_*` step reads what it needs from a [`SessionState`] and records what it
/// deployed back into it as soon as the transaction is confirmed, so a failed run leaves
/// the state describing exactly what exists on chain.
pub struct PoolDeployer {
    gateway: Arc<dyn ChainGateway>,
    names: ContractNames,
    token_list_name: String,
    token_list_chain_id: Option<u64>,
}

impl PoolDeployer {
    pub fn new(gateway: Arc<dyn ChainGateway>, names: ContractNames) -> Self {
        Self {
            gateway,
            names,
            token_list_name: DEFAULT_TOKEN_LIST_NAME.to_string(),
            token_list_chain_id: None,
        }
    }

    /// Overrides the token list name and chain id. Without a chain id the
    /// connected chain is queried.
    pub fn with_token_list(mut self, name: impl Into<String>, chain_id: Option<u64>) -> Self {
        self.token_list_name = name.into();
        self.token_list_chain_id = chain_id;
        self
    }

    pub fn names(&self) -> &ContractNames {
        &self.names
    }

    // Accounts

    async fn signer(&self, index: usize) -> ServiceResult<Address> {
        let signers = self.gateway.signers().await?;
        signers
            .get(index)
            .copied()
            .ok_or(ServiceError::MissingSigner {
                index,
                available: signers.len(),
            })
    }

    async fn resolve_account(&self, slot: &mut Option<Address>, index: usize) -> ServiceResult<Address> {
        if let Some(account) = *slot {
            return Ok(account);
        }

        let account = self.signer(index).await?;
        tracing::debug!("Resolved signer #{index} to {account}");
        *slot = Some(account);
        Ok(account)
    }

    fn token<'a>(state: &'a SessionState, symbol: &str) -> ServiceResult<&'a TokenHandle> {
        state
            .tokens
            .get(symbol)
            .ok_or_else(|| ServiceError::TokenNotDeployed(symbol.to_string()))
    }

    fn ensure_all_tokens_deployed(state: &SessionState) -> ServiceResult<()> {
        match state
            .token_symbol_list
            .iter()
            .find(|symbol| !state.tokens.contains(symbol))
        {
            Some(missing) => Err(ServiceError::TokenNotDeployed(missing.clone())),
            None => Ok(()),
        }
    }

    // Token Set

    #[instrument(skip(self), err)]
    pub async fn deploy_token(&self, symbol: &str, deployer: Address) -> ServiceResult<TokenHandle> {
        let args = Bytes::from((symbol.to_string(),).abi_encode_params());
        let address = self
            .gateway
            .deploy_contract(&self.names.faucet_token, args, deployer)
            .await?;

        tracing::info!("Deployed token {symbol} at {address}");
        Ok(TokenHandle {
            symbol: symbol.to_string(),
            address,
        })
    }

    /// Deploys one faucet token per symbol, in order, each confirmed before the next.
    #[instrument(skip(self), err)]
    pub async fn deploy_tokens(
        &self,
        symbols: &[String],
        deployer: Address,
    ) -> ServiceResult<TokenSet> {
        let mut tokens = TokenSet::default();
        for symbol in symbols {
            tokens.insert(self.deploy_token(symbol, deployer).await?);
        }
        Ok(tokens)
    }

    #[instrument(skip(self, state), err)]
    pub async fn auto_deploy_tokens(&self, state: &mut SessionState) -> ServiceResult<()> {
        let duplicates = state.duplicate_symbols();
        if !duplicates.is_empty() {
            return Err(ServiceError::Precondition(format!(
                "Token symbols must be unique, duplicated: {}",
                duplicates.join(", ")
            )));
        }

        let deployer = self
            .resolve_account(&mut state.deployer_account, DEPLOYER_SIGNER_INDEX)
            .await?;

        // record each token as soon as it is confirmed
        for symbol in state.token_symbol_list.clone() {
            let token = self.deploy_token(&symbol, deployer).await?;
            state.tokens.insert(token);
        }

        Ok(())
    }

    // Factory

    #[instrument(skip(self), err)]
    pub async fn deploy_factory(
        &self,
        fee_to_setter: Address,
        deployer: Address,
    ) -> ServiceResult<FactoryHandle> {
        let args = Bytes::from((fee_to_setter,).abi_encode_params());
        let address = self
            .gateway
            .deploy_contract(&self.names.factory, args, deployer)
            .await?;

        Ok(FactoryHandle {
            address,
            fee_to_setter,
        })
    }

    #[instrument(skip(self, state), err)]
    pub async fn auto_deploy_factory(&self, state: &mut SessionState) -> ServiceResult<()> {
        if state.factory.is_some() {
            return Err(ServiceError::AlreadyDeployed("factory".to_string()));
        }

        let fee_owner = self
            .resolve_account(&mut state.factory_fee_owner_account, FEE_OWNER_SIGNER_INDEX)
            .await?;
        let deployer = self
            .resolve_account(&mut state.deployer_account, DEPLOYER_SIGNER_INDEX)
            .await?;

        let factory = self.deploy_factory(fee_owner, deployer).await?;
        tracing::info!("Factory deployed at {} (fee owner {fee_owner})", factory.address);
        state.factory = Some(factory);
        Ok(())
    }

    // Pairs

    /// Creates the pair for two tokens. Creating an existing pair reverts on chain.
    #[instrument(skip(self), err)]
    pub async fn create_pair(
        &self,
        factory: &FactoryHandle,
        token_a: &TokenHandle,
        token_b: &TokenHandle,
        from: Address,
    ) -> ServiceResult<PairHandle> {
        let address = self
            .gateway
            .create_pair(factory.address, token_a.address, token_b.address, from)
            .await?;

        tracing::info!(
            "Created pair {}/{} at {address}",
            token_a.symbol,
            token_b.symbol
        );
        Ok(PairHandle {
            address,
            token_a: token_a.address,
            token_b: token_b.address,
        })
    }

    /// Creates every pair of the session's tokens, recorded as `pairs[first][second]`.
    #[instrument(skip(self, state), err)]
    pub async fn auto_deploy_pairs(&self, state: &mut SessionState) -> ServiceResult<()> {
        self.deploy_pairs(state, false).await
    }

    async fn deploy_pairs(&self, state: &mut SessionState, skip_existing: bool) -> ServiceResult<()> {
        let factory = state.factory.clone().ok_or_else(|| {
            ServiceError::Precondition("factory must be deployed before pairs".to_string())
        })?;
        Self::ensure_all_tokens_deployed(state)?;

        let from = self
            .resolve_account(&mut state.deployer_account, DEPLOYER_SIGNER_INDEX)
            .await?;

        let symbols = state.token_symbol_list.clone();
        for (i, j) in pair_indices(symbols.len()) {
            let (first, second) = (&symbols[i], &symbols[j]);
            let token_a = Self::token(state, first)?.clone();
            let token_b = Self::token(state, second)?.clone();

            if skip_existing {
                if let Some(existing) = state.pairs.get(first, second) {
                    if existing.token_a == token_a.address && existing.token_b == token_b.address {
                        tracing::debug!("Pair {first}/{second} already exists at {}", existing.address);
                        continue;
                    }
                }
            }

            let pair = self.create_pair(&factory, &token_a, &token_b, from).await?;
            state.pairs.insert(first, second, pair);
        }

        Ok(())
    }

    // Router

    /// keccak256 of the pair creation bytecode, as used by the factory's CREATE2.
    #[instrument(skip(self), err)]
    pub async fn pair_init_code_hash(&self) -> ServiceResult<B256> {
        let bytecode = self.gateway.contract_bytecode(&self.names.pair).await?;
        Ok(keccak256(&bytecode))
    }

    #[instrument(skip(self), err)]
    pub async fn deploy_router(
        &self,
        factory: Address,
        base_token: Address,
        deployer: Address,
    ) -> ServiceResult<RouterHandle> {
        let init_code_hash = self.pair_init_code_hash().await?;
        self.deploy_router_with_hash(factory, base_token, init_code_hash, deployer)
            .await
    }

    async fn deploy_router_with_hash(
        &self,
        factory: Address,
        base_token: Address,
        init_code_hash: B256,
        deployer: Address,
    ) -> ServiceResult<RouterHandle> {
        let args = Bytes::from((factory, base_token, init_code_hash).abi_encode_params());
        let address = self
            .gateway
            .deploy_contract(&self.names.router, args, deployer)
            .await?;

        tracing::info!("Router deployed at {address} (init code hash {init_code_hash})");
        Ok(RouterHandle {
            address,
            factory,
            base_token,
            init_code_hash,
        })
    }

    /// Checks that every recorded pair sits where the router will look for it. The
    /// first mismatch in symbol list order is reported.
    fn verify_pair_addresses(
        state: &SessionState,
        factory: Address,
        init_code_hash: B256,
    ) -> ServiceResult<()> {
        let symbols = &state.token_symbol_list;
        for (i, j) in pair_indices(symbols.len()) {
            let (base, quote) = (&symbols[i], &symbols[j]);
            let Some(pair) = state.pairs.get(base, quote) else {
                continue;
            };
            let expected = pair_address(factory, pair.token_a, pair.token_b, init_code_hash);
            if expected != pair.address {
                return Err(ServiceError::InitCodeHashMismatch {
                    base: base.clone(),
                    quote: quote.clone(),
                    actual: pair.address,
                    expected,
                });
            }
        }
        Ok(())
    }

    #[instrument(skip(self, state), err)]
    pub async fn auto_deploy_router(&self, state: &mut SessionState) -> ServiceResult<()> {
        if state.router.is_some() {
            return Err(ServiceError::AlreadyDeployed("router".to_string()));
        }

        let factory = state.factory.clone().ok_or_else(|| {
            ServiceError::Precondition("factory must be deployed before the router".to_string())
        })?;
        let base_symbol = state.base_symbol().ok_or_else(|| {
            ServiceError::Precondition("token symbol list is empty".to_string())
        })?;
        let base_token = Self::token(state, base_symbol)?.address;

        let init_code_hash = self.pair_init_code_hash().await?;
        Self::verify_pair_addresses(state, factory.address, init_code_hash)?;

        let deployer = self
            .resolve_account(&mut state.deployer_account, DEPLOYER_SIGNER_INDEX)
            .await?;
        let router = self
            .deploy_router_with_hash(factory.address, base_token, init_code_hash, deployer)
            .await?;
        state.router = Some(router);
        Ok(())
    }

    // Liquidity

    /// Drips both tokens to `funder`, approves the router, and adds liquidity.
    ///
    /// The transactions are sent in this order, each confirmed before the next: drip A,
    /// drip B, approve A, approve B, add liquidity. Minimum amounts are zero.
    #[allow(clippy::too_many_arguments)]
    #[instrument(skip(self, router, amounts), err)]
    pub async fn drip_and_initialize_pool(
        &self,
        dripper: Address,
        funder: Address,
        router: &RouterHandle,
        token_a: &TokenHandle,
        token_b: &TokenHandle,
        amounts: LiquidityAmounts,
        deadline_seconds: u64,
    ) -> ServiceResult<()> {
        let headroom = U256::from(DRIP_HEADROOM_FACTOR);
        let drip_a = amounts.base.checked_mul(headroom).ok_or_else(|| {
            ServiceError::ArithmeticOverflow(format!("{} * {headroom}", amounts.base))
        })?;
        let drip_b = amounts.quote.checked_mul(headroom).ok_or_else(|| {
            ServiceError::ArithmeticOverflow(format!("{} * {headroom}", amounts.quote))
        })?;

        tracing::info!(
            "Dripping {} {} and {} {} to {funder}",
            drip_a,
            token_a.symbol,
            drip_b,
            token_b.symbol
        );
        self.gateway
            .drip(token_a.address, funder, drip_a, dripper)
            .await?;
        self.gateway
            .drip(token_b.address, funder, drip_b, dripper)
            .await?;

        self.gateway
            .approve(token_a.address, router.address, U256::MAX, funder)
            .await?;
        self.gateway
            .approve(token_b.address, router.address, U256::MAX, funder)
            .await?;

        let params = AddLiquidityParams {
            token_a: token_a.address,
            token_b: token_b.address,
            amount_a_desired: amounts.base,
            amount_b_desired: amounts.quote,
            amount_a_min: U256::ZERO,
            amount_b_min: U256::ZERO,
            to: funder,
            // evaluated right before sending
            deadline: relative_deadline(deadline_seconds),
        };
        let tx_hash = self
            .gateway
            .add_liquidity(router.address, params, funder)
            .await?;

        tracing::info!(
            "Added liquidity {}/{} in tx {tx_hash}",
            token_a.symbol,
            token_b.symbol
        );
        Ok(())
    }

    /// Seeds every pair that does not involve the base token.
    #[instrument(skip(self, state), err)]
    pub async fn auto_drip_and_initialize_pools(&self, state: &mut SessionState) -> ServiceResult<()> {
        let router = state.router.clone().ok_or_else(|| {
            ServiceError::Precondition("router must be deployed before seeding liquidity".to_string())
        })?;
        let amounts = liquidity_amounts(&state.pool_initializer)?;

        let funder = self
            .resolve_account(&mut state.pool_initialize_account, LIQUIDITY_FUNDER_SIGNER_INDEX)
            .await?;
        let dripper = self
            .resolve_account(&mut state.deployer_account, DEPLOYER_SIGNER_INDEX)
            .await?;

        tracing::info!(
            "Seeding pools with {} base / {} quote (ratio {}, multiplier {})",
            amounts.base,
            amounts.quote,
            state.pool_initializer.midpoint_ratio,
            state.pool_initializer.ratio_multiplier
        );

        let symbols = state.token_symbol_list.clone();
        for (i, j) in seeded_pair_indices(symbols.len()) {
            let token_a = Self::token(state, &symbols[i])?;
            let token_b = Self::token(state, &symbols[j])?;
            self.drip_and_initialize_pool(
                dripper,
                funder,
                &router,
                token_a,
                token_b,
                amounts,
                state.deadline_seconds,
            )
            .await?;
        }

        Ok(())
    }

    // Pipelines

    /// Runs every step, reusing the factory, pairs and router the session already has.
    #[instrument(skip(self, state), err)]
    pub async fn deploy_all(&self, state: &mut SessionState, redeploy_tokens: bool) -> ServiceResult<()> {
        if redeploy_tokens {
            if state.router.is_some() {
                return Err(ServiceError::Precondition(
                    "cannot redeploy tokens under an existing router; start a fresh session"
                        .to_string(),
                ));
            }
            self.auto_deploy_tokens(state).await?;
        }

        match state.factory.as_ref().map(|f| f.address) {
            Some(factory) => tracing::info!("Reusing factory at {factory}"),
            None => self.auto_deploy_factory(state).await?,
        }

        self.deploy_pairs(state, true).await?;

        match state.router.clone() {
            None => self.auto_deploy_router(state).await?,
            Some(router) => {
                let factory = state.factory.as_ref().map(|f| f.address);
                let base_token = state
                    .base_symbol()
                    .and_then(|symbol| state.tokens.get(symbol))
                    .map(|t| t.address);
                if factory != Some(router.factory) || base_token != Some(router.base_token) {
                    return Err(ServiceError::Precondition(format!(
                        "router {} is bound to another factory or base token",
                        router.address
                    )));
                }
                tracing::info!("Reusing router at {}", router.address);
            }
        }

        self.auto_drip_and_initialize_pools(state).await
    }

    pub async fn auto_deploy_all(&self, state: &mut SessionState) -> ServiceResult<()> {
        self.deploy_all(state, true).await
    }

    /// Deploys an independent factory, pairs, router and liquidity in `second`, reusing
    /// the token contracts of `first`.
    #[instrument(skip(self, first, second), err)]
    pub async fn deploy_additional_pool(
        &self,
        first: &SessionState,
        second: &mut SessionState,
    ) -> ServiceResult<()> {
        if second.factory.is_some() || second.router.is_some() {
            return Err(ServiceError::Precondition(
                "an additional pool needs a session without factory or router".to_string(),
            ));
        }

        second.tokens = first.tokens.clone();
        Self::ensure_all_tokens_deployed(second)?;

        self.deploy_all(second, false).await
    }

    // Token list

    #[instrument(skip(self, tokens), err)]
    pub async fn token_list(&self, tokens: &TokenSet, chain_id: u64) -> ServiceResult<TokenList> {
        let mut items = Vec::with_capacity(tokens.len());
        for token in tokens.iter() {
            let metadata = self.gateway.token_metadata(token.address).await?;
            items.push(TokenListItem {
                chain_id,
                address: token.address,
                symbol: metadata.symbol,
                name: metadata.name,
                decimals: metadata.decimals,
            });
        }

        Ok(TokenList {
            name: self.token_list_name.clone(),
            tokens: items,
        })
    }

    #[instrument(skip(self, state), err)]
    pub async fn auto_token_list(&self, state: &SessionState) -> ServiceResult<TokenList> {
        let chain_id = match self.token_list_chain_id {
            Some(chain_id) => chain_id,
            None => self.gateway.chain_id().await?,
        };
        self.token_list(&state.tokens, chain_id).await
    }

    // Quotes

    /// Output amount of swapping `amount_in` along `path` through the session's router.
    #[instrument(skip(self, state), err)]
    pub async fn quote_amount_out(
        &self,
        state: &SessionState,
        amount_in: U256,
        path: &[&str],
    ) -> ServiceResult<U256> {
        let router = state.router.as_ref().ok_or_else(|| {
            ServiceError::Precondition("router must be deployed before quoting".to_string())
        })?;
        if path.len() < 2 {
            return Err(ServiceError::InvalidAmount(format!(
                "Swap path needs at least two tokens, got {}",
                path.len()
            )));
        }

        let addresses = path
            .iter()
            .map(|symbol| Self::token(state, symbol).map(|t| t.address))
            .collect::<ServiceResult<Vec<_>>>()?;

        let amounts = self
            .gateway
            .get_amounts_out(router.address, amount_in, addresses)
            .await?;

        amounts.last().copied().ok_or_else(|| {
            ServiceError::InternalError("Router returned no output amount".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_indices_cover_every_unordered_pair_once() {
        for n in 0..8usize {
            let pairs: Vec<(usize, usize)> = pair_indices(n).collect();

            assert_eq!(pairs.len(), n * n.saturating_sub(1) / 2);
            assert!(pairs.iter().all(|&(i, j)| i < j && j < n));
            let mut deduped = pairs.clone();
            deduped.sort();
            deduped.dedup();
            assert_eq!(deduped.len(), pairs.len());
            // outer index ascends, inner index ascends within it
            assert!(pairs.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_pair_indices_for_three_tokens() {
        let pairs: Vec<(usize, usize)> = pair_indices(3).collect();
        assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 2)]);
    }

    #[test]
    fn test_seeded_pair_indices_skip_the_base_token() {
        let seeded: Vec<(usize, usize)> = seeded_pair_indices(4).collect();
        assert_eq!(seeded, vec![(1, 2), (1, 3), (2, 3)]);
        assert_eq!(seeded_pair_indices(2).count(), 0);
        assert_eq!(seeded_pair_indices(1).count(), 0);
    }
}

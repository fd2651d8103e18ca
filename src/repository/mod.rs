pub mod alloy;
pub mod artifacts;
pub mod contract;
pub mod error;

use ::alloy::primitives::{Address, B256, Bytes, U256};
pub use alloy::{AddLiquidityParams, AlloyChainGateway, TokenMetadata};
pub use artifacts::ArtifactStore;
use async_trait::async_trait;
pub use error::RepositoryError;

pub(crate) type RepoResult<T> = std::result::Result<T, RepositoryError>;

/// Capability surface for deploying and addressing the contracts of a test exchange.
///
/// Every state-changing operation waits for the transaction receipt and checks its
/// status before returning, so callers can feed the result straight into the next
/// dependent call. Nothing is retried: the first failure is returned as is.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Returns the chain id of the connected network.
    async fn chain_id(&self) -> RepoResult<u64>;

    /// Returns the ordered list of accounts able to sign transactions.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Address>)` - Configured signer addresses, or the node's unlocked
    ///   accounts when no private keys were configured
    /// * `Err(RepositoryError)` - If the accounts cannot be listed
    async fn signers(&self) -> RepoResult<Vec<Address>>;

    /// Returns the creation bytecode of a compiled contract.
    ///
    /// # Arguments
    ///
    /// * `name` - The contract name, as it appears in the compiled artifacts
    ///
    /// # Returns
    ///
    /// * `Ok(Bytes)` - The creation (init) code
    /// * `Err(RepositoryError)` - If no artifact is known under that name
    async fn contract_bytecode(&self, name: &str) -> RepoResult<Bytes>;

    /// Deploys a named contract and waits until the deployment is confirmed.
    ///
    /// # Arguments
    ///
    /// * `name` - The contract name
    /// * `constructor_args` - ABI-encoded constructor parameters
    /// * `from` - The deploying account
    ///
    /// # Returns
    ///
    /// * `Ok(Address)` - The address of the deployed contract
    /// * `Err(RepositoryError)` - If the transaction fails or the constructor reverts
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let args = Bytes::from((fee_to_setter,).abi_encode_params());
    /// let factory = gateway.deploy_contract("UniswapV2Factory", args, deployer).await?;
    /// ```
    async fn deploy_contract(
        &self,
        name: &str,
        constructor_args: Bytes,
        from: Address,
    ) -> RepoResult<Address>;

    /// Creates a pair on a Uniswap V2 factory.
    ///
    /// # Returns
    ///
    /// * `Ok(Address)` - The pair address, taken from the `PairCreated` event
    /// * `Err(RepositoryError)` - If the pair already exists or the call fails
    async fn create_pair(
        &self,
        factory: Address,
        token_a: Address,
        token_b: Address,
        from: Address,
    ) -> RepoResult<Address>;

    /// Mints faucet tokens to an account.
    ///
    /// # Returns
    ///
    /// * `Ok(B256)` - The confirmed transaction hash
    async fn drip(
        &self,
        token: Address,
        to: Address,
        amount: U256,
        from: Address,
    ) -> RepoResult<B256>;

    /// Approves `spender` to move `amount` of `token` on behalf of `owner`.
    ///
    /// # Returns
    ///
    /// * `Ok(B256)` - The confirmed transaction hash
    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
        owner: Address,
    ) -> RepoResult<B256>;

    /// Adds liquidity through a Uniswap V2 router.
    ///
    /// # Returns
    ///
    /// * `Ok(B256)` - The confirmed transaction hash
    /// * `Err(RepositoryError)` - If the deadline expired, allowances or balances
    ///   are insufficient, or the call fails
    async fn add_liquidity(
        &self,
        router: Address,
        params: AddLiquidityParams,
        from: Address,
    ) -> RepoResult<B256>;

    /// Retrieves the expected output amounts for a swap along `path`.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<U256>)` - Array of amounts where the last element is the expected output
    /// * `Err(RepositoryError)` - If the router call fails or a pool has no liquidity
    async fn get_amounts_out(
        &self,
        router: Address,
        amount_in: U256,
        path: Vec<Address>,
    ) -> RepoResult<Vec<U256>>;

    /// Retrieves name, symbol and decimals of a token.
    async fn token_metadata(&self, token: Address) -> RepoResult<TokenMetadata>;
}

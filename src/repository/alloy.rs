use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use alloy::network::{Ethereum, EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, B256, Bytes, U256};
use alloy::providers::{PendingTransactionBuilder, Provider};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use tracing::instrument;

use super::artifacts::ArtifactStore;
use super::error::RepositoryError;
use crate::repository::contract::{IFaucetToken, IUniswapV2Factory, IUniswapV2Router02};
use crate::repository::{ChainGateway, RepoResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Arguments of `IUniswapV2Router02.addLiquidity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddLiquidityParams {
    pub token_a: Address,
    pub token_b: Address,
    pub amount_a_desired: U256,
    pub amount_b_desired: U256,
    pub amount_a_min: U256,
    pub amount_b_min: U256,
    pub to: Address,
    pub deadline: U256,
}

/// Builds a wallet holding every configured key. The first key becomes the default signer.
pub fn wallet_from_private_keys(
    private_keys: &[String],
) -> Result<(EthereumWallet, Vec<Address>), RepositoryError> {
    let mut signers = private_keys.iter().map(|key| {
        PrivateKeySigner::from_str(key)
            .map_err(|e| RepositoryError::ParseError(format!("Invalid private key: {e}")))
    });

    let first = signers
        .next()
        .ok_or_else(|| RepositoryError::ParseError("No private keys provided".to_string()))??;

    let mut addresses = vec![first.address()];
    let mut wallet = EthereumWallet::from(first);

    for signer in signers {
        let signer = signer?;
        addresses.push(signer.address());
        wallet.register_signer(signer);
    }

    Ok((wallet, addresses))
}

pub struct AlloyChainGateway<P> {
    provider: Arc<P>,
    artifacts: ArtifactStore,
    signers: Vec<Address>,
}

impl<P: Provider + Clone + 'static> AlloyChainGateway<P> {
    /// Creates a gateway signing with the node's unlocked accounts.
    pub fn new(provider: Arc<P>, artifacts: ArtifactStore) -> Self {
        Self {
            provider,
            artifacts,
            signers: Vec::new(),
        }
    }

    /// Creates a gateway whose provider already carries a wallet for `signers`.
    pub fn with_signers(provider: Arc<P>, artifacts: ArtifactStore, signers: Vec<Address>) -> Self {
        Self {
            provider,
            artifacts,
            signers,
        }
    }
}

fn send_error(action: &str, e: impl Display) -> RepositoryError {
    let msg = e.to_string();
    if msg.contains("revert") {
        RepositoryError::Reverted(format!("{action}: {msg}"))
    } else {
        RepositoryError::ContractError(format!("{action}: {msg}"))
    }
}

async fn confirm(
    pending: PendingTransactionBuilder<Ethereum>,
    action: &str,
) -> RepoResult<TransactionReceipt> {
    let receipt = pending.get_receipt().await.map_err(|e| {
        RepositoryError::RpcError(format!("{action}: failed to get receipt: {e}"))
    })?;

    if !receipt.status() {
        return Err(RepositoryError::Reverted(format!(
            "{action} (tx {})",
            receipt.transaction_hash
        )));
    }

    tracing::debug!(
        "{action} confirmed in tx {} (gas used: {})",
        receipt.transaction_hash,
        receipt.gas_used
    );
    Ok(receipt)
}

#[async_trait]
impl<P: Provider + Clone + Send + Sync + 'static> ChainGateway for AlloyChainGateway<P> {
    #[instrument(skip(self), err)]
    async fn chain_id(&self) -> RepoResult<u64> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| RepositoryError::RpcError(e.to_string()))
    }

    #[instrument(skip(self), err)]
    async fn signers(&self) -> RepoResult<Vec<Address>> {
        if !self.signers.is_empty() {
            return Ok(self.signers.clone());
        }

        self.provider
            .get_accounts()
            .await
            .map_err(|e| RepositoryError::RpcError(format!("Failed to list accounts: {e}")))
    }

    #[instrument(skip(self), err)]
    async fn contract_bytecode(&self, name: &str) -> RepoResult<Bytes> {
        self.artifacts.bytecode(name)
    }

    #[instrument(skip(self, constructor_args), err)]
    async fn deploy_contract(
        &self,
        name: &str,
        constructor_args: Bytes,
        from: Address,
    ) -> RepoResult<Address> {
        let bytecode = self.artifacts.bytecode(name)?;

        let mut code = bytecode.to_vec();
        code.extend_from_slice(&constructor_args);

        let tx = TransactionRequest::default()
            .with_from(from)
            .with_deploy_code(code);

        let pending = self.provider.send_transaction(tx).await.map_err(|e| {
            RepositoryError::DeploymentError(format!("Failed to send {name} deployment: {e}"))
        })?;

        let receipt = confirm(pending, &format!("deploy {name}"))
            .await
            .map_err(|e| RepositoryError::DeploymentError(e.to_string()))?;

        let address = receipt.contract_address.ok_or_else(|| {
            RepositoryError::DeploymentError(format!(
                "Receipt for {name} deployment has no contract address"
            ))
        })?;

        tracing::info!("Deployed {name} at {address}");
        Ok(address)
    }

    #[instrument(skip(self), err)]
    async fn create_pair(
        &self,
        factory: Address,
        token_a: Address,
        token_b: Address,
        from: Address,
    ) -> RepoResult<Address> {
        let factory_contract = IUniswapV2Factory::new(factory, self.provider.clone());

        let pending = factory_contract
            .createPair(token_a, token_b)
            .from(from)
            .send()
            .await
            .map_err(|e| send_error("createPair", e))?;

        let receipt = confirm(pending, "createPair").await?;

        // the pair address is the third argument of PairCreated
        receipt
            .inner
            .logs()
            .iter()
            .find_map(|log| log.log_decode::<IUniswapV2Factory::PairCreated>().ok())
            .map(|event| event.data().pair)
            .ok_or_else(|| {
                RepositoryError::ContractError(format!(
                    "No PairCreated event in tx {} for tokens {} and {}",
                    receipt.transaction_hash, token_a, token_b
                ))
            })
    }

    #[instrument(skip(self), err)]
    async fn drip(
        &self,
        token: Address,
        to: Address,
        amount: U256,
        from: Address,
    ) -> RepoResult<B256> {
        let contract = IFaucetToken::new(token, self.provider.clone());

        let pending = contract
            .drip(to, amount)
            .from(from)
            .send()
            .await
            .map_err(|e| send_error("drip", e))?;

        Ok(confirm(pending, "drip").await?.transaction_hash)
    }

    #[instrument(skip(self), err)]
    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
        owner: Address,
    ) -> RepoResult<B256> {
        let contract = IFaucetToken::new(token, self.provider.clone());

        let pending = contract
            .approve(spender, amount)
            .from(owner)
            .send()
            .await
            .map_err(|e| send_error("approve", e))?;

        Ok(confirm(pending, "approve").await?.transaction_hash)
    }

    #[instrument(skip(self), err)]
    async fn add_liquidity(
        &self,
        router: Address,
        params: AddLiquidityParams,
        from: Address,
    ) -> RepoResult<B256> {
        let contract = IUniswapV2Router02::new(router, self.provider.clone());

        let pending = contract
            .addLiquidity(
                params.token_a,
                params.token_b,
                params.amount_a_desired,
                params.amount_b_desired,
                params.amount_a_min,
                params.amount_b_min,
                params.to,
                params.deadline,
            )
            .from(from)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to add liquidity for {} / {}: {}",
                    params.token_a,
                    params.token_b,
                    e
                );
                send_error("addLiquidity", e)
            })?;

        Ok(confirm(pending, "addLiquidity").await?.transaction_hash)
    }

    #[instrument(skip(self), err)]
    async fn get_amounts_out(
        &self,
        router: Address,
        amount_in: U256,
        path: Vec<Address>,
    ) -> RepoResult<Vec<U256>> {
        tracing::debug!(
            "Getting swap amounts for path: {:?}, amount_in: {}",
            path,
            amount_in
        );

        let contract = IUniswapV2Router02::new(router, self.provider.clone());

        let amounts = contract
            .getAmountsOut(amount_in, path.clone())
            .call()
            .await
            .map_err(|e| {
                tracing::error!("Failed to get amounts out for path {:?}: {}", path, e);
                RepositoryError::ContractError(format!("Failed to get amounts out: {}", e))
            })?;

        tracing::debug!("Swap amounts result: {:?}", amounts);
        Ok(amounts.to_vec())
    }

    #[instrument(skip(self), err)]
    async fn token_metadata(&self, token: Address) -> RepoResult<TokenMetadata> {
        let contract = IFaucetToken::new(token, self.provider.clone());

        let name = contract
            .name()
            .call()
            .await
            .map_err(|e| RepositoryError::ContractError(e.to_string()))?;

        let symbol = contract
            .symbol()
            .call()
            .await
            .map_err(|e| RepositoryError::ContractError(e.to_string()))?;

        let decimals = contract
            .decimals()
            .call()
            .await
            .map_err(|e| RepositoryError::ContractError(e.to_string()))?;

        Ok(TokenMetadata {
            name,
            symbol,
            decimals,
        })
    }
}

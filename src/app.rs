use std::sync::Arc;

use alloy::providers::{Provider, ProviderBuilder};
use alloy::transports::http::reqwest::Url;
use anyhow::Context;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::Config;
use crate::repository::alloy::wallet_from_private_keys;
use crate::repository::{AlloyChainGateway, ArtifactStore, ChainGateway};
use crate::service::utils::{format_balance, human_token_amount};
use crate::service::{PoolDeployer, SessionState, SessionSummary, TokenList};

/// Human amount of the first quote token swapped when comparing pools.
const QUOTE_AMOUNT: u64 = 10_000;
const FALLBACK_DECIMALS: u8 = 18;

/// What a run deployed, printed as JSON by the binary.
#[derive(Debug, Serialize)]
pub struct DeploymentReport {
    pub token_list: TokenList,
    pub primary: SessionSummary,
    pub additional: Option<SessionSummary>,
    pub quotes: Vec<QuoteReport>,
}

#[derive(Debug, Serialize)]
pub struct QuoteReport {
    pub pool: String,
    pub path: Vec<String>,
    pub amount_in: String,
    pub amount_out: String,
}

/// Wires artifacts, provider and wallet into a deployer. No RPC call is made here.
pub fn build_deployer(config: &Config) -> anyhow::Result<PoolDeployer> {
    let artifacts = ArtifactStore::load(&config.artifacts.path).with_context(|| {
        format!(
            "failed to load contract artifacts from {}",
            config.artifacts.path
        )
    })?;
    let url: Url = config
        .rpc
        .url
        .parse()
        .with_context(|| format!("invalid RPC URL: {}", config.rpc.url))?;

    let gateway: Arc<dyn ChainGateway> = if config.wallet.private_keys.is_empty() {
        tracing::info!("No private keys configured, using the node's unlocked accounts");
        let provider = ProviderBuilder::new().connect_http(url).erased();
        Arc::new(AlloyChainGateway::new(Arc::new(provider), artifacts))
    } else {
        let (wallet, signers) = wallet_from_private_keys(&config.wallet.private_keys)?;
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(url)
            .erased();
        Arc::new(AlloyChainGateway::with_signers(
            Arc::new(provider),
            artifacts,
            signers,
        ))
    };

    Ok(
        PoolDeployer::new(gateway, config.deployment.contract_names.clone())
            .with_token_list(config.token_list.name.clone(), config.token_list.chain_id),
    )
}

/// Deploys the configured exchange (and the additional pool, if any) and reports it.
pub async fn run(config: &Config) -> anyhow::Result<DeploymentReport> {
    let deployer = build_deployer(config)?;

    let mut primary = SessionState::from_config(&config.deployment);
    deployer
        .auto_deploy_all(&mut primary)
        .await
        .context("failed to deploy the exchange")?;
    tracing::info!("Exchange deployed with {} pairs", primary.pairs.len());

    let token_list = deployer
        .auto_token_list(&primary)
        .await
        .context("failed to build the token list")?;

    let mut quotes = Vec::new();
    quotes.extend(quote(&deployer, "primary", &primary, &token_list).await?);

    let additional = match SessionState::additional_from_config(&config.deployment) {
        Some(mut second) => {
            deployer
                .deploy_additional_pool(&primary, &mut second)
                .await
                .context("failed to deploy the additional pool")?;
            quotes.extend(quote(&deployer, "additional", &second, &token_list).await?);
            Some(second.summary())
        }
        None => None,
    };

    Ok(DeploymentReport {
        token_list,
        primary: primary.summary(),
        additional,
        quotes,
    })
}

// quotes the first two non-base tokens; sessions with fewer have no seeded pool
async fn quote(
    deployer: &PoolDeployer,
    pool: &str,
    state: &SessionState,
    token_list: &TokenList,
) -> anyhow::Result<Option<QuoteReport>> {
    let [_, from, to, ..] = state.token_symbol_list.as_slice() else {
        return Ok(None);
    };

    let decimals_of = |symbol: &str| {
        token_list
            .tokens
            .iter()
            .find(|t| t.symbol == symbol)
            .map_or(FALLBACK_DECIMALS, |t| t.decimals)
    };
    let (decimals_in, decimals_out) = (decimals_of(from.as_str()), decimals_of(to.as_str()));

    let amount_in = human_token_amount(Decimal::from(QUOTE_AMOUNT), decimals_in)?;
    let amount_out = deployer
        .quote_amount_out(state, amount_in, &[from.as_str(), to.as_str()])
        .await
        .with_context(|| format!("failed to quote {from} -> {to} on the {pool} pool"))?;

    tracing::info!(
        "{pool} pool: {QUOTE_AMOUNT} {from} -> {} {to}",
        format_balance(amount_out, decimals_out)
    );
    Ok(Some(QuoteReport {
        pool: pool.to_string(),
        path: vec![from.clone(), to.clone()],
        amount_in: format_balance(amount_in, decimals_in),
        amount_out: format_balance(amount_out, decimals_out),
    }))
}

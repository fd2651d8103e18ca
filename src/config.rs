use std::{fs, path::Path};

use anyhow::Context;
use dotenv::dotenv;
use envsubst::substitute;
use serde::Deserialize;

use crate::service::state::{ContractNames, DEFAULT_DEADLINE_SECONDS, PoolInitializer};

/// Environment variable naming an alternative configuration file.
pub const CONFIG_PATH_ENV: &str = "SWAPPER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/default.yaml";

const INTERPOLATED_PREFIXES: [&str; 3] = ["RPC_", "WALLET_", "SWAPPER_"];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub rpc: RpcConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    pub artifacts: ArtifactsConfig,
    #[serde(default)]
    pub deployment: DeploymentConfig,
    #[serde(default)]
    pub token_list: TokenListConfig,
}

impl Config {
    pub async fn from_yaml(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        dotenv().ok();

        let path = path.as_ref();
        let file_content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file from path: {}", path.display()))?;

        let env_vars: std::collections::HashMap<String, String> = std::env::vars()
            .filter(|(key, _)| INTERPOLATED_PREFIXES.iter().any(|p| key.starts_with(p)))
            .collect();

        let interpolated = substitute(&file_content, &env_vars)
            .context("Failed to substitute environment variables in YAML")?;

        let config: Config =
            serde_yaml::from_str(&interpolated).context("Failed to parse YAML configuration")?;

        Ok(config)
    }

    /// Path from `SWAPPER_CONFIG`, else `config/default.yaml`.
    pub fn default_path() -> String {
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    pub url: String,
}

/// Private keys of the signing accounts, in signer index order. Empty means the
/// node's unlocked accounts are used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletConfig {
    #[serde(default, deserialize_with = "deserialize_keys")]
    pub private_keys: Vec<String>,
}

// accepts a YAML list or a comma separated string (as produced by env interpolation)
fn deserialize_keys<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Keys {
        List(Vec<String>),
        Joined(String),
    }

    let keys = match Option::<Keys>::deserialize(deserializer)? {
        Some(Keys::List(keys)) => keys,
        Some(Keys::Joined(joined)) => joined.split(',').map(str::to_string).collect(),
        None => Vec::new(),
    };

    Ok(keys
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect())
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactsConfig {
    /// Directory of compiled contract artifacts (Hardhat or Foundry output)
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeploymentConfig {
    pub contract_names: ContractNames,
    pub token_symbols: Vec<String>,
    pub deadline_seconds: u64,
    pub pool_initializer: PoolInitializer,
    /// When set, a second exchange reusing the same tokens is deployed with these
    /// pool parameters.
    pub additional_pool: Option<PoolInitializer>,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            contract_names: ContractNames::default(),
            token_symbols: ["WETH", "TOKA", "TOKB"].map(String::from).to_vec(),
            deadline_seconds: DEFAULT_DEADLINE_SECONDS,
            pool_initializer: PoolInitializer::default(),
            additional_pool: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TokenListConfig {
    pub name: String,
    /// Chain id written into the list; queried from the node when unset
    pub chain_id: Option<u64>,
}

impl Default for TokenListConfig {
    fn default() -> Self {
        Self {
            name: crate::service::deployer::DEFAULT_TOKEN_LIST_NAME.to_string(),
            chain_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_load_config_from_yaml() {
        let config = Config::from_yaml("config/test.yaml").await.unwrap();

        // Verify RPC config
        assert_eq!(config.rpc.url, "http://127.0.0.1:8545");

        // Verify wallet config (the two first development accounts)
        assert_eq!(config.wallet.private_keys.len(), 2);

        assert_eq!(config.artifacts.path, "artifacts");

        // Verify deployment config
        let deployment = &config.deployment;
        assert_eq!(deployment.token_symbols, vec!["WETH", "TOKA", "TOKB"]);
        assert_eq!(deployment.deadline_seconds, 60);
        assert_eq!(deployment.contract_names, ContractNames::default());
        assert_eq!(deployment.pool_initializer, PoolInitializer::default());
        assert_eq!(
            deployment.additional_pool.map(|p| p.ratio_multiplier),
            Some(Decimal::TWO)
        );

        assert_eq!(config.token_list.name, "hardhat");
        assert_eq!(config.token_list.chain_id, Some(1337));
    }

    #[tokio::test]
    async fn test_default_config_should_parse() {
        let config = Config::from_yaml(DEFAULT_CONFIG_PATH).await.unwrap();

        assert!(!config.rpc.url.is_empty());
        assert!(!config.deployment.token_symbols.is_empty());
        assert!(config.deployment.deadline_seconds > 0);
    }

    #[test]
    fn test_missing_sections_fall_back_to_defaults() {
        let yaml = "rpc:\n  url: http://localhost:8545\nartifacts:\n  path: out\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert!(config.wallet.private_keys.is_empty());
        assert_eq!(config.deployment.token_symbols, vec!["WETH", "TOKA", "TOKB"]);
        assert_eq!(config.deployment.deadline_seconds, DEFAULT_DEADLINE_SECONDS);
        assert!(config.deployment.additional_pool.is_none());
        assert_eq!(config.token_list.name, "hardhat");
        assert_eq!(config.token_list.chain_id, None);
    }

    #[test]
    fn test_private_keys_accept_joined_string() {
        let yaml = "private_keys: \"0xaa, 0xbb,\"";
        let wallet: WalletConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(wallet.private_keys, vec!["0xaa", "0xbb"]);

        let wallet: WalletConfig = serde_yaml::from_str("private_keys: \"\"").unwrap();
        assert!(wallet.private_keys.is_empty());
    }

    #[tokio::test]
    async fn test_missing_config_file_should_return_error() {
        let result = Config::from_yaml("config/does-not-exist.yaml").await;
        let err = result.unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }

    #[tokio::test]
    async fn test_config_debug_format() {
        let config = Config::from_yaml("config/test.yaml").await.unwrap();

        // Verify Debug trait works
        let debug_output = format!("{:?}", config);
        assert!(debug_output.contains("Config"));
        assert!(debug_output.contains("rpc"));
        assert!(debug_output.contains("deployment"));
        assert!(debug_output.contains("token_list"));
    }
}

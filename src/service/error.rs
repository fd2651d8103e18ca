use alloy::primitives::Address;
use thiserror::Error;

use crate::repository::RepositoryError;

#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    // Orchestration failures
    /// A contract construction or its confirmation failed.
    #[error("Deployment failed: {0}")]
    Deployment(String),

    /// A step was invoked before the step it depends on.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// A contract call was rejected by the chain.
    #[error("Transaction reverted: {0}")]
    Reverted(String),

    /// A symbol has no deployed token in the session.
    #[error("Token not deployed: {0}")]
    TokenNotDeployed(String),

    /// A contract that is set once per session was already deployed.
    #[error("{0} already deployed in this session; start a fresh session to redeploy")]
    AlreadyDeployed(String),

    /// The chain exposes fewer signers than the session needs.
    #[error("Signer #{index} requested but only {available} signers are available")]
    MissingSigner { index: usize, available: usize },

    /// The router's init code hash does not reproduce the factory's pair addresses.
    #[error(
        "Init code hash mismatch for {base}/{quote}: factory created {actual}, router derives {expected}"
    )]
    InitCodeHashMismatch {
        base: String,
        quote: String,
        actual: Address,
        expected: Address,
    },

    // Arithmetic errors
    /// The requested amount or ratio is invalid (e.g., negative or too precise).
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// An intermediate value does not fit into 256 bits.
    #[error("Arithmetic overflow: {0}")]
    ArithmeticOverflow(String),

    // Infrastructure errors (abstracted from repository layer)
    /// An error occurred while communicating with the blockchain.
    #[error("Blockchain connection error: {0}")]
    BlockchainError(String),

    /// An unexpected internal error occurred.
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DeploymentError(msg) | RepositoryError::ArtifactNotFound(msg) => {
                ServiceError::Deployment(msg)
            }
            RepositoryError::Reverted(msg) => ServiceError::Reverted(msg),
            RepositoryError::RpcError(msg) | RepositoryError::ContractError(msg) => {
                ServiceError::BlockchainError(format!("Failed to interact with blockchain: {msg}"))
            }
            RepositoryError::ParseError(msg) | RepositoryError::Other(msg) => {
                ServiceError::InternalError(msg)
            }
        }
    }
}

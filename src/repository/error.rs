use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Contract call error: {0}")]
    ContractError(String),

    #[error("Transaction reverted: {0}")]
    Reverted(String),

    #[error("Deployment error: {0}")]
    DeploymentError(String),

    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("{0}")]
    Other(String),
}

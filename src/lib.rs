pub mod app;
pub mod config;
pub mod repository;
pub mod service;

pub use app::{DeploymentReport, build_deployer, run};

// Re-export commonly used types for tests
pub use service::{
    ContractNames, PoolDeployer, PoolInitializer, ServiceError, SessionState, SessionSummary,
    TokenList, TokenListItem,
};

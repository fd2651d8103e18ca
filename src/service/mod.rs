pub mod deployer;
pub mod error;
pub mod state;
pub mod types;
pub mod utils;


pub use deployer::PoolDeployer;
pub use error::ServiceError;
pub use state::{ContractNames, PoolInitializer, SessionState, SessionSummary};
pub use types::*;

pub(crate) type ServiceResult<T> = std::result::Result<T, ServiceError>;

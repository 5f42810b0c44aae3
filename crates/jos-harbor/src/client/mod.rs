//! Harbor client and its configuration.

mod harbor_client;
mod harbor_config;

pub use harbor_client::HarborClient;
pub use harbor_config::{HarborConfig, RepositoryEntry, RepositoryFile};

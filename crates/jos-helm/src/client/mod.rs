//! Helm client and its configuration.

mod helm_client;
mod helm_config;

pub use helm_client::HelmClient;
pub use helm_config::{HelmConfig, HelmRepository};

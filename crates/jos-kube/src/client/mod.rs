//! Cluster client and its configuration.

mod kube_client;
mod kube_config;

pub use kube_client::KubeClient;
pub use kube_config::KubeConfig;

//! TLS secret repository.

use std::future::Future;

use k8s_openapi::api::core::v1::Secret;
use kube::api::{ListParams, PostParams};

use crate::model::{CertInfo, TLS_SECRET_TYPE, tls_secret};
use crate::{Error, KubeClient, Result, TRACING_TARGET_QUERY};

/// Repository for TLS secrets.
pub trait SecretRepository {
    /// Summarizes every `kubernetes.io/tls` secret of `namespace`.
    fn list_certificates(
        &self,
        namespace: &str,
    ) -> impl Future<Output = Result<Vec<CertInfo>>> + Send;

    /// Creates a TLS secret; fails with [`Error::Conflict`] if `name` exists.
    fn create_tls_secret(
        &self,
        namespace: &str,
        name: &str,
        crt: &str,
        key: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}

impl SecretRepository for KubeClient {
    async fn list_certificates(&self, namespace: &str) -> Result<Vec<CertInfo>> {
        let secrets = self
            .namespaced::<Secret>(namespace)
            .list(&ListParams::default())
            .await?;

        Ok(secrets
            .items
            .iter()
            .filter(|secret| secret.type_.as_deref() == Some(TLS_SECRET_TYPE))
            .map(CertInfo::from)
            .collect())
    }

    #[tracing::instrument(skip(self, crt, key), target = TRACING_TARGET_QUERY)]
    async fn create_tls_secret(
        &self,
        namespace: &str,
        name: &str,
        crt: &str,
        key: &str,
    ) -> Result<()> {
        let api = self.namespaced::<Secret>(namespace);
        if api.get_opt(name).await?.is_some() {
            return Err(Error::Conflict(format!(
                "TLS secret with name {name} already exists"
            )));
        }

        api.create(&PostParams::default(), &tls_secret(namespace, name, crt, key))
            .await?;

        tracing::info!(target: TRACING_TARGET_QUERY, "TLS secret created");
        Ok(())
    }
}

use std::fmt;
use std::sync::Arc;

use reqwest::{Client, RequestBuilder};

use crate::{HarborConfig, Result, TRACING_TARGET_CLIENT};

/// Inner client that holds the HTTP client and configuration.
struct HarborClientInner {
    http: Client,
    config: HarborConfig,
}

/// Client for a Harbor registry.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct HarborClient {
    inner: Arc<HarborClientInner>,
}

impl HarborClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(config: HarborConfig) -> Result<Self> {
        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            harbor_url = %config.harbor_url,
            insecure_tls = config.harbor_insecure_tls,
            timeout_secs = config.timeout().as_secs(),
            "Creating harbor client"
        );

        let http = Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(config.harbor_insecure_tls)
            .user_agent(format!("jos-harbor/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(HarborClientInner { http, config }),
        })
    }

    /// Returns the client configuration.
    #[inline]
    pub fn config(&self) -> &HarborConfig {
        &self.inner.config
    }

    /// Starts an authenticated GET request.
    pub(crate) fn get(&self, url: &str) -> RequestBuilder {
        self.authenticated(self.inner.http.get(url))
    }

    /// Starts an authenticated POST request.
    pub(crate) fn post(&self, url: &str) -> RequestBuilder {
        self.authenticated(self.inner.http.post(url))
    }

    fn authenticated(&self, request: RequestBuilder) -> RequestBuilder {
        let config = self.config();
        request.basic_auth(&config.harbor_username, Some(&config.harbor_password))
    }
}

impl fmt::Debug for HarborClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HarborClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

//! reqwest-backed implementation of [`RepoApi`].
//!
//! One `GitHubClient` is built at startup and shared by reference for the
//! whole run. Every request carries `Authorization: token <secret>` and the
//! v3 JSON `Accept` header.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Certificate, Method};
use serde_json::Value;
use tracing::debug;

use crate::api::{ApiResponse, ClientResult, RepoApi};
use crate::error::ClientError;

/// Default public API root
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Media type sent in the `Accept` header
pub const ACCEPT_MEDIA_TYPE: &str = "application/vnd.github.v3+json";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client configuration
#[derive(Clone)]
pub struct ClientConfig {
    /// API root, without trailing slash
    pub api_url: String,
    /// Authentication token
    pub token: String,
    /// Extra trust root (PEM or DER)
    pub ca_cert: Option<PathBuf>,
    /// Skip TLS verification entirely
    pub insecure: bool,
    /// Per-request timeout
    pub timeout: Duration,
}

impl ClientConfig {
    /// Create config for an API root and token
    pub fn new(api_url: &str, token: &str) -> Self {
        ClientConfig {
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            ca_cert: None,
            insecure: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Trust an additional root certificate
    pub fn with_ca_cert(mut self, path: &Path) -> Self {
        self.ca_cert = Some(path.to_path_buf());
        self
    }

    /// Disable TLS verification
    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    /// Override the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .field("ca_cert", &self.ca_cert)
            .field("insecure", &self.insecure)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// REST client for the repository hosting service
pub struct GitHubClient {
    api_url: String,
    http_client: reqwest::Client,
}

impl GitHubClient {
    /// Build the underlying HTTP client.
    ///
    /// Fails if the token cannot be encoded as a header or the trust root
    /// cannot be loaded.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("token {}", config.token))
            .map_err(|e| ClientError::InvalidHeader(e.to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_MEDIA_TYPE));

        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("repoprops/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(config.timeout);

        if let Some(path) = &config.ca_cert {
            builder = builder.add_root_certificate(load_certificate(path)?);
        }
        if config.insecure {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http_client = builder.build()?;

        Ok(GitHubClient {
            api_url: config.api_url,
            http_client,
        })
    }

    /// Absolute URL for an API path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> ClientResult<ApiResponse> {
        let url = self.url(path);
        debug!(method = %method, url = %url, "Sending request");

        let mut request = self.http_client.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        debug!(status, url = %url, "Received response");

        Ok(ApiResponse::from_text(status, &text))
    }
}

#[async_trait]
impl RepoApi for GitHubClient {
    async fn get(&self, path: &str) -> ClientResult<ApiResponse> {
        self.send(Method::GET, path, None).await
    }

    async fn patch(&self, path: &str, body: &Value) -> ClientResult<ApiResponse> {
        self.send(Method::PATCH, path, Some(body)).await
    }
}

/// Load a trust root, accepting PEM or DER encodings
fn load_certificate(path: &Path) -> ClientResult<Certificate> {
    let bytes = std::fs::read(path).map_err(|e| ClientError::Certificate {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let parsed = if bytes.windows(10).any(|w| w == b"-----BEGIN") {
        Certificate::from_pem(&bytes)
    } else {
        Certificate::from_der(&bytes)
    };

    parsed.map_err(|e| ClientError::Certificate {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

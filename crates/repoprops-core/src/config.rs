//! Run configuration, independent of how it was parsed.

use std::path::PathBuf;
use std::time::Duration;

use repoprops_client::{ClientConfig, DEFAULT_API_URL, DEFAULT_TIMEOUT};

use crate::error::ConfigError;
use crate::manifest::Delimiter;

/// Owner used for bare repository names when none is configured.
pub const DEFAULT_OWNER: &str = "source-org-test";

/// Environment variable consulted for the token when none is configured.
pub const DEFAULT_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Everything a run needs to start.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub repo_file: PathBuf,
    pub output_folder: PathBuf,
    pub cert: Option<PathBuf>,
    pub token_env: String,
    pub default_owner: String,
    pub api_url: String,
    pub delimiter: Delimiter,
    pub insecure: bool,
    pub timeout: Duration,
}

impl RunConfig {
    /// Config with defaults for everything except the manifest path.
    pub fn new(repo_file: PathBuf) -> Self {
        RunConfig {
            repo_file,
            output_folder: PathBuf::from("./output"),
            cert: None,
            token_env: DEFAULT_TOKEN_ENV.to_string(),
            default_owner: DEFAULT_OWNER.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            delimiter: Delimiter::default(),
            insecure: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Read the token from the configured environment variable.
    pub fn resolve_token(&self) -> Result<String, ConfigError> {
        self.resolve_token_with(|name| std::env::var(name).ok())
    }

    /// Token lookup through an arbitrary source. Blank values count as missing.
    pub fn resolve_token_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<String, ConfigError> {
        match lookup(&self.token_env) {
            Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err(ConfigError::MissingToken(self.token_env.clone())),
        }
    }

    /// Client settings for `token`.
    pub fn client_config(&self, token: &str) -> ClientConfig {
        let mut config = ClientConfig::new(&self.api_url, token)
            .with_insecure(self.insecure)
            .with_timeout(self.timeout);
        if let Some(cert) = &self.cert {
            config = config.with_ca_cert(cert);
        }
        config
    }
}

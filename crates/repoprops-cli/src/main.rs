//! repoprops - batch repository settings and custom property applier
//!
//! Reads a manifest where each line names a repository, the custom
//! properties to set on it and, optionally, repository settings:
//!
//! ```text
//! acme/widget::tier=gold,owner_team=infra::has_wiki=false,default_branch=main
//! ```
//!
//! Every row is processed in order. Failures are logged and never stop the
//! run; only startup problems (missing token, unreadable manifest, unusable
//! output directory or certificate) produce a non-zero exit code.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use repoprops_client::{GitHubClient, DEFAULT_API_URL};
use repoprops_core::{
    init_logging, ConfigError, Delimiter, IdentityResolver, ManifestLoader, RunConfig, RunDriver,
    DEFAULT_OWNER, DEFAULT_TOKEN_ENV, VERSION,
};
use tracing::{error, info, warn, Level};

#[derive(Parser, Debug)]
#[command(name = "repoprops")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Apply repository settings and custom properties from a manifest file",
    long_about = None
)]
struct Cli {
    /// Path to the manifest listing repositories, properties and settings
    #[arg(short = 'r', long = "repo_file")]
    repo_file: PathBuf,

    /// Folder where the run log is written
    #[arg(short = 'o', long = "output_folder", default_value = "./output")]
    output_folder: PathBuf,

    /// Additional trust root (PEM or DER)
    #[arg(short = 'c', long = "cert")]
    cert: Option<PathBuf>,

    /// Name of the environment variable holding the API token
    #[arg(short = 't', long = "token_env", default_value = DEFAULT_TOKEN_ENV)]
    token_env: String,

    /// Manifest field delimiter ('::' or the legacy ';')
    #[arg(short = 'd', long = "delimiter", default_value = "::")]
    delimiter: Delimiter,

    /// Owner applied to bare repository names
    #[arg(long = "default_owner", env = "REPOPROPS_DEFAULT_OWNER", default_value = DEFAULT_OWNER)]
    default_owner: String,

    /// REST API root
    #[arg(long = "api_url", env = "REPOPROPS_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Disable TLS certificate verification
    #[arg(long)]
    insecure: bool,

    /// Per-request timeout in seconds
    #[arg(long = "timeout_secs", default_value_t = 30)]
    timeout_secs: u64,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> RunConfig {
        RunConfig {
            repo_file: self.repo_file,
            output_folder: self.output_folder,
            cert: self.cert,
            token_env: self.token_env,
            default_owner: self.default_owner,
            api_url: self.api_url,
            delimiter: self.delimiter,
            insecure: self.insecure,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let config = cli.into_config();

    let log_path = init_logging(&config.output_folder, &config.repo_file, level)
        .context("Failed to initialise logging")?;

    if let Err(e) = run(&config).await {
        error!("{:#}", e);
        return Err(e);
    }

    info!("Log file: {}", log_path.display());
    Ok(())
}

/// Startup checks, manifest load and the batch run.
async fn run(config: &RunConfig) -> Result<()> {
    info!("repoprops {}", VERSION);
    info!(
        "Input details file path = {}",
        config.repo_file.display()
    );

    let token = config.resolve_token()?;

    if config.insecure {
        warn!("TLS certificate verification is disabled (--insecure).");
    } else if config.cert.is_none() {
        info!("Certificate path not provided. Using the system trust store.");
    }

    let client = GitHubClient::new(config.client_config(&token))
        .map_err(ConfigError::Client)
        .context("Failed to create API client")?;

    let rows = ManifestLoader::new(config.delimiter)
        .load(&config.repo_file)
        .with_context(|| format!("Error reading the file {}", config.repo_file.display()))?;

    if rows.is_empty() {
        error!(
            "No repositories found in the file {}.",
            config.repo_file.display()
        );
        return Ok(());
    }

    let driver = RunDriver::new(&client, IdentityResolver::new(&config.default_owner));
    let summary = driver.run(&rows).await;

    info!(
        "Processed {} repositories: settings applied {}, failed {}, skipped {}; \
         properties applied {}, failed {}",
        summary.rows_processed(),
        summary.settings_applied(),
        summary.settings_failed(),
        summary.settings_skipped(),
        summary.properties_applied(),
        summary.properties_failed(),
    );
    info!("*** Custom property setting process completed... Review status & log file... ***");

    Ok(())
}

//! Error taxonomy for repoprops.
//!
//! Only [`ConfigError`] is fatal; it surfaces to the process exit code.
//! Everything else is caught inside the run, logged, and the run moves on
//! to the next setting, property or row.

use std::path::PathBuf;

use repoprops_client::ClientError;

/// Startup failures. Fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    MissingToken(String),

    #[error("failed to read manifest {path:?}: {source}")]
    ManifestUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create output directory {path:?}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open log file in {path:?}: {reason}")]
    LogFile { path: PathBuf, reason: String },

    #[error("failed to build API client: {0}")]
    Client(#[from] ClientError),
}

/// Malformed manifest line or spec fragment. Logged and skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("line {line}: expected at least 2 fields separated by '{delimiter}', got {found}")]
    TooFewFields {
        line: usize,
        delimiter: String,
        found: usize,
    },

    #[error("line {line}: repository reference is empty")]
    EmptyRepoRef { line: usize },

    #[error("fragment '{fragment}' is not of the form key=value")]
    MissingEquals { fragment: String },

    #[error("fragment '{fragment}' has an empty key")]
    EmptyKey { fragment: String },

    #[error("unknown delimiter '{0}' (expected '::' or ';')")]
    UnknownDelimiter(String),
}

/// Repository reference that does not resolve to a non-empty owner and name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid repository reference '{reference}': owner and name must both be non-empty")]
pub struct InvalidRefError {
    pub reference: String,
}

/// A requested setting that cannot be sent. Logged and dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("setting '{key}' expects true or false, got '{value}'")]
    NotABoolean { key: String, value: String },

    #[error("unknown setting '{key}'")]
    UnknownKey { key: String },

    #[error("branch '{branch}' does not exist (available: {})", .available.join(", "))]
    BranchNotFound {
        branch: String,
        available: Vec<String>,
    },

    #[error("could not verify branch '{branch}': {reason}")]
    BranchLookupFailed { branch: String, reason: String },
}

/// Failure of a single remote mutation. Logged; the row continues.
#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    #[error("transport error: {0}")]
    Transport(#[from] ClientError),

    #[error("unexpected status {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("unexpected response body: {0}")]
    UnexpectedBody(String),

    #[error(transparent)]
    InvalidRef(#[from] InvalidRefError),
}

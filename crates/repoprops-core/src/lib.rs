//! repoprops Core Library
//!
//! Applies repository settings and custom property values to a batch of
//! repositories listed in a manifest file.
//!
//! ## Pipeline
//!
//! 1. [`manifest`] reads rows in file order
//! 2. [`identity`] resolves each `owner/name` (or bare `name`)
//! 3. [`settings`] validates the settings spec and sends one merged PATCH
//! 4. [`properties`] sends one PATCH per custom property
//! 5. [`driver`] runs 2-4 for every row and isolates failures
//!
//! [`telemetry`] installs the console + file logger used throughout.

pub mod config;
pub mod driver;
pub mod error;
pub mod identity;
pub mod manifest;
pub mod properties;
pub mod settings;
pub mod spec_pairs;
pub mod telemetry;

pub use config::{RunConfig, DEFAULT_OWNER, DEFAULT_TOKEN_ENV};
pub use driver::{PropertiesStatus, RowResult, RunDriver, RunSummary, SettingsStatus};
pub use error::{ApplyError, ConfigError, InvalidRefError, ParseError, ValidationError};
pub use identity::{IdentityResolver, RepoIdentity};
pub use manifest::{Delimiter, ManifestLoader, ManifestRow};
pub use properties::{PropertiesPatch, PropertiesReport, PropertyApplier, PropertyAssignment};
pub use settings::{
    classify, fetch_branches, SettingKind, SettingsApplier, SettingsOutcome, SettingsPatch,
};
pub use spec_pairs::{parse_pairs, ParsedPairs};
pub use telemetry::{init_logging, log_file_name, ConsoleFormat, FileFormat, Severity};

/// repoprops version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

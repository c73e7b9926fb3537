//! Batch orchestration across manifest rows.
//!
//! Rows are processed strictly in manifest order. Within a row the settings
//! request (if any) precedes the property requests, which run one after
//! another. Every failure is turned into a status value and logged here;
//! nothing a single row does can abort the run.

use repoprops_client::RepoApi;
use tracing::{debug, error, info};

use crate::error::ApplyError;
use crate::identity::{IdentityResolver, RepoIdentity};
use crate::manifest::ManifestRow;
use crate::properties::{PropertiesReport, PropertyApplier};
use crate::settings::{SettingsApplier, SettingsOutcome};

/// Final state of a row's settings step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsStatus {
    Skipped,
    /// Applied `(key, value)` pairs
    Applied(Vec<(String, String)>),
    Failed(String),
}

/// Final state of a row's properties step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertiesStatus {
    Skipped,
    Applied { applied: usize, failed: usize },
    Failed(String),
}

/// Outcome of one manifest row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowResult {
    /// 1-based position among processed rows
    pub index: usize,
    pub repo_ref: String,
    pub settings: SettingsStatus,
    pub properties: PropertiesStatus,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub rows: Vec<RowResult>,
}

impl RunSummary {
    pub fn rows_processed(&self) -> usize {
        self.rows.len()
    }

    pub fn settings_applied(&self) -> usize {
        self.count_settings(|s| matches!(s, SettingsStatus::Applied(_)))
    }

    pub fn settings_failed(&self) -> usize {
        self.count_settings(|s| matches!(s, SettingsStatus::Failed(_)))
    }

    pub fn settings_skipped(&self) -> usize {
        self.count_settings(|s| matches!(s, SettingsStatus::Skipped))
    }

    pub fn properties_applied(&self) -> usize {
        self.rows
            .iter()
            .map(|r| match r.properties {
                PropertiesStatus::Applied { applied, .. } => applied,
                _ => 0,
            })
            .sum()
    }

    pub fn properties_failed(&self) -> usize {
        self.rows
            .iter()
            .map(|r| match r.properties {
                PropertiesStatus::Applied { failed, .. } => failed,
                PropertiesStatus::Failed(_) => 1,
                PropertiesStatus::Skipped => 0,
            })
            .sum()
    }

    fn count_settings(&self, pred: impl Fn(&SettingsStatus) -> bool) -> usize {
        self.rows.iter().filter(|r| pred(&r.settings)).count()
    }
}

/// Drives settings and property appliers over manifest rows.
pub struct RunDriver<'a> {
    api: &'a dyn RepoApi,
    resolver: IdentityResolver,
}

impl<'a> RunDriver<'a> {
    pub fn new(api: &'a dyn RepoApi, resolver: IdentityResolver) -> Self {
        Self { api, resolver }
    }

    /// Process every row in order and report the outcome of each.
    pub async fn run(&self, rows: &[ManifestRow]) -> RunSummary {
        info!("...Custom property setting - Process Start...");
        debug!("Default owner for bare names: {}", self.resolver.default_owner());

        let mut summary = RunSummary::default();
        for (idx, row) in rows.iter().enumerate() {
            let result = self.process_row(idx + 1, row).await;
            summary.rows.push(result);
        }
        summary
    }

    /// Process one row: settings first, then properties.
    pub async fn process_row(&self, index: usize, row: &ManifestRow) -> RowResult {
        info!("{}... Processing repository: '{}'", index, row.repo_ref);

        let identity = match self.resolver.resolve(&row.repo_ref) {
            Ok(identity) => identity,
            Err(e) => {
                let e = ApplyError::from(e);
                error!("{}... Failed at repo '{}': {}", index, row.repo_ref, e);
                let settings = if row.settings_spec.trim().is_empty() {
                    SettingsStatus::Skipped
                } else {
                    SettingsStatus::Failed(e.to_string())
                };
                let properties = if row.properties_spec.trim().is_empty() {
                    PropertiesStatus::Skipped
                } else {
                    PropertiesStatus::Failed(e.to_string())
                };
                return RowResult {
                    index,
                    repo_ref: row.repo_ref.clone(),
                    settings,
                    properties,
                };
            }
        };

        let settings = self.settings_step(&identity, &row.settings_spec).await;
        let properties = self.properties_step(&identity, &row.properties_spec).await;

        RowResult {
            index,
            repo_ref: row.repo_ref.clone(),
            settings,
            properties,
        }
    }

    async fn settings_step(&self, identity: &RepoIdentity, spec: &str) -> SettingsStatus {
        match SettingsApplier::new(self.api).apply(identity, spec).await {
            Ok(SettingsOutcome::Skipped) => SettingsStatus::Skipped,
            Ok(SettingsOutcome::Applied(patch)) => {
                info!(
                    success = true,
                    "✓ Successfully updated repository settings for '{}'", identity
                );
                let entries = patch.entries();
                for (key, value) in &entries {
                    info!(success = true, "  - {}: {}", key, value);
                }
                SettingsStatus::Applied(entries)
            }
            Err(e) => {
                error!("✗ Failed to update repository settings for '{}': {}", identity, e);
                SettingsStatus::Failed(e.to_string())
            }
        }
    }

    async fn properties_step(&self, identity: &RepoIdentity, spec: &str) -> PropertiesStatus {
        if spec.trim().is_empty() {
            return PropertiesStatus::Skipped;
        }

        info!("Setting custom properties: [{}]", spec);
        let report: PropertiesReport = PropertyApplier::new(self.api).apply(identity, spec).await;

        for (assignment, result) in &report.results {
            match result {
                Ok(()) => info!(
                    success = true,
                    "...Successfully set custom property [{}] for repository '{}'...",
                    assignment.property_name,
                    identity
                ),
                Err(e) => error!(
                    "...Failed to set custom property [{}] for repository '{}': {}",
                    assignment.property_name, identity, e
                ),
            }
        }

        PropertiesStatus::Applied {
            applied: report.applied(),
            failed: report.failed(),
        }
    }
}

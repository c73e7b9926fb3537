//! Repository settings: validation and the single merged PATCH.
//!
//! The key space is closed. Each key belongs to one class:
//!
//! | Class | Validation |
//! |---|---|
//! | Boolean | value must be `true`/`false` (any case) |
//! | Branch | value must name an existing branch of the repository |
//! | Free string | none |
//!
//! Anything else is unknown and dropped. Only keys that pass validation
//! reach the request; if none do, no request is made.

use repoprops_client::RepoApi;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::error::{ApplyError, ValidationError};
use crate::identity::RepoIdentity;
use crate::spec_pairs::parse_pairs;

/// Keys coerced to booleans.
pub const BOOLEAN_KEYS: [&str; 13] = [
    "delete_branch_on_merge",
    "has_wiki",
    "has_issues",
    "has_projects",
    "allow_squash_merge",
    "allow_merge_commit",
    "allow_rebase_merge",
    "allow_auto_merge",
    "private",
    "is_template",
    "archived",
    "allow_forking",
    "web_commit_signoff_required",
];

/// Keys whose value must be an existing branch.
pub const BRANCH_KEYS: [&str; 1] = ["default_branch"];

/// Keys passed through unchanged.
pub const STRING_KEYS: [&str; 4] = ["name", "description", "homepage", "visibility"];

/// Number of branches requested per page of the branch listing
const BRANCH_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    Boolean,
    Branch,
    FreeString,
}

/// Classify a setting key. `None` means the key is unknown.
pub fn classify(key: &str) -> Option<SettingKind> {
    if BOOLEAN_KEYS.contains(&key) {
        Some(SettingKind::Boolean)
    } else if BRANCH_KEYS.contains(&key) {
        Some(SettingKind::Branch)
    } else if STRING_KEYS.contains(&key) {
        Some(SettingKind::FreeString)
    } else {
        None
    }
}

/// Strict, case-insensitive boolean coercion.
pub fn parse_bool(key: &str, value: &str) -> Result<bool, ValidationError> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ValidationError::NotABoolean {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Body of `PATCH /repos/{owner}/{name}`.
///
/// Only validated values are ever stored here; unset fields are omitted
/// from the JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_issues: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_projects: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_wiki: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_template: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_squash_merge: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_merge_commit: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_rebase_merge: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_auto_merge: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_branch_on_merge: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_forking: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_commit_signoff_required: Option<bool>,
}

impl SettingsPatch {
    /// Store a boolean setting. Returns `false` if `key` is not boolean-valued.
    pub fn set_bool(&mut self, key: &str, value: bool) -> bool {
        let slot = match key {
            "delete_branch_on_merge" => &mut self.delete_branch_on_merge,
            "has_wiki" => &mut self.has_wiki,
            "has_issues" => &mut self.has_issues,
            "has_projects" => &mut self.has_projects,
            "allow_squash_merge" => &mut self.allow_squash_merge,
            "allow_merge_commit" => &mut self.allow_merge_commit,
            "allow_rebase_merge" => &mut self.allow_rebase_merge,
            "allow_auto_merge" => &mut self.allow_auto_merge,
            "private" => &mut self.private,
            "is_template" => &mut self.is_template,
            "archived" => &mut self.archived,
            "allow_forking" => &mut self.allow_forking,
            "web_commit_signoff_required" => &mut self.web_commit_signoff_required,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    /// Store a string or branch setting. Returns `false` if `key` is not string-valued.
    pub fn set_text(&mut self, key: &str, value: &str) -> bool {
        let slot = match key {
            "name" => &mut self.name,
            "description" => &mut self.description,
            "homepage" => &mut self.homepage,
            "visibility" => &mut self.visibility,
            "default_branch" => &mut self.default_branch,
            _ => return false,
        };
        *slot = Some(value.to_string());
        true
    }

    pub fn is_empty(&self) -> bool {
        *self == SettingsPatch::default()
    }

    /// JSON request body.
    pub fn to_body(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// `(key, value)` pairs of the fields that are set, for logging.
    pub fn entries(&self) -> Vec<(String, String)> {
        match self.to_body() {
            Value::Object(map) => map
                .into_iter()
                .map(|(k, v)| {
                    let rendered = match v {
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    (k, rendered)
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Settings that survived validation, plus what was dropped and why.
#[derive(Debug, Clone, Default)]
pub struct ValidatedSettings {
    pub patch: SettingsPatch,
    pub rejected: Vec<ValidationError>,
}

/// What happened to a row's settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsOutcome {
    /// Nothing valid to send; no request was made.
    Skipped,
    /// The remote accepted the patch.
    Applied(SettingsPatch),
}

#[derive(Debug, Deserialize)]
struct BranchRecord {
    name: String,
}

/// List every branch of a repository, following pagination.
pub async fn fetch_branches(
    api: &dyn RepoApi,
    identity: &RepoIdentity,
) -> Result<Vec<String>, ApplyError> {
    let mut branches = Vec::new();
    let mut page = 1;

    loop {
        let path = format!(
            "{}/branches?per_page={}&page={}",
            identity.api_path(),
            BRANCH_PAGE_SIZE,
            page
        );
        let response = api.get(&path).await?;
        if !response.is_status(200) {
            return Err(ApplyError::Remote {
                status: response.status,
                body: response.body_text(),
            });
        }

        let records: Vec<BranchRecord> = serde_json::from_value(response.body)
            .map_err(|e| ApplyError::UnexpectedBody(e.to_string()))?;
        let count = records.len();
        branches.extend(records.into_iter().map(|b| b.name));

        if count < BRANCH_PAGE_SIZE {
            break;
        }
        page += 1;
    }

    debug!(repo = %identity, count = branches.len(), "Fetched branches");
    Ok(branches)
}

/// Validates settings specs and applies them to one repository at a time.
pub struct SettingsApplier<'a> {
    api: &'a dyn RepoApi,
}

impl<'a> SettingsApplier<'a> {
    pub fn new(api: &'a dyn RepoApi) -> Self {
        Self { api }
    }

    /// Parse and validate `spec` for `identity`.
    ///
    /// The branch list is fetched at most once, and only if a branch-valued
    /// key is present. Every dropped key is logged.
    pub async fn validate(&self, identity: &RepoIdentity, spec: &str) -> ValidatedSettings {
        let parsed = parse_pairs(spec);
        for e in &parsed.errors {
            warn!("Skipping setting fragment for '{}': {}", identity, e);
        }

        let mut validated = ValidatedSettings::default();
        let mut branches: Option<Result<Vec<String>, String>> = None;

        for (key, value) in parsed.pairs {
            let outcome = match classify(&key) {
                Some(SettingKind::Boolean) => {
                    parse_bool(&key, &value).map(|b| {
                        validated.patch.set_bool(&key, b);
                    })
                }
                Some(SettingKind::FreeString) => {
                    validated.patch.set_text(&key, &value);
                    Ok(())
                }
                Some(SettingKind::Branch) => {
                    let lookup = match branches.take() {
                        Some(cached) => cached,
                        None => fetch_branches(self.api, identity)
                            .await
                            .map_err(|e| e.to_string()),
                    };
                    match &*branches.insert(lookup) {
                        Ok(list) if list.iter().any(|b| *b == value) => {
                            validated.patch.set_text(&key, &value);
                            Ok(())
                        }
                        Ok(list) => Err(ValidationError::BranchNotFound {
                            branch: value.clone(),
                            available: list.clone(),
                        }),
                        Err(reason) => Err(ValidationError::BranchLookupFailed {
                            branch: value.clone(),
                            reason: reason.clone(),
                        }),
                    }
                }
                None => Err(ValidationError::UnknownKey { key: key.clone() }),
            };

            if let Err(e) = outcome {
                match &e {
                    ValidationError::NotABoolean { .. }
                    | ValidationError::BranchLookupFailed { .. } => {
                        error!("Validation error for '{}': {}", identity, e)
                    }
                    ValidationError::UnknownKey { .. } | ValidationError::BranchNotFound { .. } => {
                        warn!("Dropping setting for '{}': {}", identity, e)
                    }
                }
                validated.rejected.push(e);
            }
        }

        validated
    }

    /// Validate `spec` and, if anything is left, send one PATCH.
    ///
    /// Success is HTTP 200; any other status is an [`ApplyError::Remote`].
    pub async fn apply(
        &self,
        identity: &RepoIdentity,
        spec: &str,
    ) -> Result<SettingsOutcome, ApplyError> {
        if spec.trim().is_empty() {
            return Ok(SettingsOutcome::Skipped);
        }

        let validated = self.validate(identity, spec).await;
        if validated.patch.is_empty() {
            debug!(repo = %identity, "No valid settings to apply");
            return Ok(SettingsOutcome::Skipped);
        }

        info!("Updating repository settings for '{}'...", identity);
        let response = self
            .api
            .patch(&identity.api_path(), &validated.patch.to_body())
            .await?;

        if response.is_status(200) {
            Ok(SettingsOutcome::Applied(validated.patch))
        } else {
            Err(ApplyError::Remote {
                status: response.status,
                body: response.body_text(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repoprops_client::fakes::ScriptedApi;
    use serde_json::json;

    fn widget() -> RepoIdentity {
        RepoIdentity {
            owner: "acme".to_string(),
            name: "widget".to_string(),
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("has_wiki"), Some(SettingKind::Boolean));
        assert_eq!(classify("default_branch"), Some(SettingKind::Branch));
        assert_eq!(classify("visibility"), Some(SettingKind::FreeString));
        assert_eq!(classify("topics"), None);
    }

    #[test]
    fn test_every_boolean_key_has_a_field() {
        let mut patch = SettingsPatch::default();
        for key in BOOLEAN_KEYS {
            assert!(patch.set_bool(key, true), "no field for {}", key);
        }
        assert_eq!(patch.entries().len(), BOOLEAN_KEYS.len());
    }

    #[test]
    fn test_every_text_key_has_a_field() {
        let mut patch = SettingsPatch::default();
        for key in STRING_KEYS.iter().chain(BRANCH_KEYS.iter()) {
            assert!(patch.set_text(key, "x"), "no field for {}", key);
        }
        assert!(!patch.set_text("private", "x"));
    }

    #[test]
    fn test_parse_bool_case_insensitive() {
        assert_eq!(parse_bool("k", "TRUE"), Ok(true));
        assert_eq!(parse_bool("k", "False"), Ok(false));
        assert!(parse_bool("k", "yes").is_err());
        assert!(parse_bool("k", "").is_err());
    }

    #[test]
    fn test_patch_body_omits_unset_fields() {
        let mut patch = SettingsPatch::default();
        assert!(patch.is_empty());
        patch.set_bool("has_wiki", false);
        patch.set_text("default_branch", "main");
        assert_eq!(
            patch.to_body(),
            json!({"has_wiki": false, "default_branch": "main"})
        );
    }

    #[tokio::test]
    async fn test_validate_drops_unknown_and_invalid() {
        let api = ScriptedApi::new();
        let applier = SettingsApplier::new(&api);

        let validated = applier
            .validate(&widget(), "has_wiki=notabool,private=true,topics=a,broken")
            .await;

        assert_eq!(validated.patch.to_body(), json!({"private": true}));
        assert_eq!(validated.rejected.len(), 2);
        assert!(api.calls().is_empty(), "no branch lookup expected");
    }

    #[tokio::test]
    async fn test_branch_lookup_once() {
        let api = ScriptedApi::new().with_branches("acme", "widget", &["main", "dev"]);
        let applier = SettingsApplier::new(&api);

        let validated = applier
            .validate(&widget(), "default_branch=release,default_branch=dev")
            .await;

        assert_eq!(validated.patch.default_branch.as_deref(), Some("dev"));
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_branch_lookup_failure_drops_key() {
        let api = ScriptedApi::new().on_get("/repos/acme/widget/branches", 403, json!({}));
        let applier = SettingsApplier::new(&api);

        let validated = applier
            .validate(&widget(), "default_branch=main,has_issues=true")
            .await;

        assert_eq!(validated.patch.to_body(), json!({"has_issues": true}));
        assert!(matches!(
            validated.rejected[0],
            ValidationError::BranchLookupFailed { .. }
        ));
    }

    #[tokio::test]
    async fn test_apply_empty_spec_makes_no_call() {
        let api = ScriptedApi::new();
        let outcome = SettingsApplier::new(&api).apply(&widget(), "").await.unwrap();
        assert_eq!(outcome, SettingsOutcome::Skipped);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_apply_non_200_is_remote_error() {
        let api = ScriptedApi::new().on_patch(
            "/repos/acme/widget",
            422,
            json!({"message": "Validation Failed"}),
        );
        let err = SettingsApplier::new(&api)
            .apply(&widget(), "private=true")
            .await
            .unwrap_err();

        match err {
            ApplyError::Remote { status, body } => {
                assert_eq!(status, 422);
                assert!(body.contains("Validation Failed"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

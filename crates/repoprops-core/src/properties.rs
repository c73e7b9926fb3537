//! Custom property values.
//!
//! Each `name=value` pair is sent as its own
//! `PATCH /repos/{owner}/{name}/properties/values` request carrying a
//! single-entry property list. A failing property does not stop the ones
//! after it.

use repoprops_client::RepoApi;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{ApplyError, ParseError};
use crate::identity::RepoIdentity;
use crate::spec_pairs::parse_pairs;

/// One `(property_name, value)` assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyAssignment {
    pub property_name: String,
    pub value: String,
}

/// Body of the property-values endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertiesPatch {
    pub properties: Vec<PropertyAssignment>,
}

impl PropertiesPatch {
    pub fn single(assignment: PropertyAssignment) -> Self {
        Self {
            properties: vec![assignment],
        }
    }

    pub fn to_body(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Per-property results for one row, in request order.
#[derive(Debug, Default)]
pub struct PropertiesReport {
    pub results: Vec<(PropertyAssignment, Result<(), ApplyError>)>,
    pub parse_errors: Vec<ParseError>,
}

impl PropertiesReport {
    pub fn applied(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_ok()).count()
    }

    /// Failed requests plus fragments that never became a request.
    pub fn failed(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_err()).count() + self.parse_errors.len()
    }
}

fn properties_path(identity: &RepoIdentity) -> String {
    format!("{}/properties/values", identity.api_path())
}

/// Applies property specs one request per property.
pub struct PropertyApplier<'a> {
    api: &'a dyn RepoApi,
}

impl<'a> PropertyApplier<'a> {
    pub fn new(api: &'a dyn RepoApi) -> Self {
        Self { api }
    }

    /// Send one assignment. Success is HTTP 204.
    pub async fn apply_one(
        &self,
        identity: &RepoIdentity,
        assignment: &PropertyAssignment,
    ) -> Result<(), ApplyError> {
        let body = PropertiesPatch::single(assignment.clone()).to_body();
        let response = self.api.patch(&properties_path(identity), &body).await?;

        if response.is_status(204) {
            Ok(())
        } else {
            Err(ApplyError::Remote {
                status: response.status,
                body: response.body_text(),
            })
        }
    }

    /// Apply every pair in `spec`, in order.
    pub async fn apply(&self, identity: &RepoIdentity, spec: &str) -> PropertiesReport {
        let parsed = parse_pairs(spec);
        for e in &parsed.errors {
            warn!("Skipping property fragment for '{}': {}", identity, e);
        }

        let mut report = PropertiesReport {
            results: Vec::with_capacity(parsed.pairs.len()),
            parse_errors: parsed.errors,
        };

        for (name, value) in parsed.pairs {
            info!(
                "... custom_prop = '{}' : value to be set = '{}'",
                name, value
            );
            let assignment = PropertyAssignment {
                property_name: name,
                value,
            };
            let result = self.apply_one(identity, &assignment).await;
            report.results.push((assignment, result));
        }

        report
    }
}

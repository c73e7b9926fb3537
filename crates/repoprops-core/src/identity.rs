//! Repository identity resolution.

use std::fmt;

use crate::error::InvalidRefError;

/// `(owner, name)` of a target repository. Both parts are non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoIdentity {
    pub owner: String,
    pub name: String,
}

impl RepoIdentity {
    /// API path of the repository resource, e.g. `/repos/acme/widget`.
    pub fn api_path(&self) -> String {
        format!("/repos/{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Turns manifest references into identities.
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    default_owner: String,
}

impl IdentityResolver {
    pub fn new(default_owner: &str) -> Self {
        Self {
            default_owner: default_owner.trim().to_string(),
        }
    }

    pub fn default_owner(&self) -> &str {
        &self.default_owner
    }

    /// Split `owner/name` on the first `/`; a bare `name` gets the default owner.
    pub fn resolve(&self, repo_ref: &str) -> Result<RepoIdentity, InvalidRefError> {
        let reference = repo_ref.trim();
        let (owner, name) = match reference.split_once('/') {
            Some((owner, name)) => (owner.trim(), name.trim()),
            None => (self.default_owner.as_str(), reference),
        };

        if owner.is_empty() || name.is_empty() {
            return Err(InvalidRefError {
                reference: repo_ref.to_string(),
            });
        }

        Ok(RepoIdentity {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_and_name() {
        let resolver = IdentityResolver::new("default-org");
        let id = resolver.resolve("acme/widget").unwrap();
        assert_eq!(id.owner, "acme");
        assert_eq!(id.name, "widget");
        assert_eq!(id.to_string(), "acme/widget");
        assert_eq!(id.api_path(), "/repos/acme/widget");
    }

    #[test]
    fn test_bare_name_uses_default_owner() {
        let resolver = IdentityResolver::new("default-org");
        let id = resolver.resolve("widget").unwrap();
        assert_eq!(id.owner, "default-org");
        assert_eq!(id.name, "widget");
    }

    #[test]
    fn test_splits_on_first_slash_only() {
        let resolver = IdentityResolver::new("default-org");
        let id = resolver.resolve("acme/widget/extra").unwrap();
        assert_eq!(id.owner, "acme");
        assert_eq!(id.name, "widget/extra");
    }

    #[test]
    fn test_empty_sides_rejected() {
        let resolver = IdentityResolver::new("default-org");
        assert!(resolver.resolve("acme/").is_err());
        assert!(resolver.resolve("/widget").is_err());
        assert!(resolver.resolve("").is_err());
    }

    #[test]
    fn test_bare_name_without_default_owner_rejected() {
        let resolver = IdentityResolver::new("");
        let err = resolver.resolve("widget").unwrap_err();
        assert_eq!(err.reference, "widget");
    }
}

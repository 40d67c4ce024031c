//! Externally injected gate policy
//!
//! The decision logic never hard-codes identities or paths: deployments load
//! a `PolicyConfiguration` at process start (JSON or TOML) and may hot-swap
//! it at runtime through the policy store. The configuration is read-only at
//! evaluation time.

use crate::error::{GateError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Deployment-owned policy for the admission gate
///
/// # Examples
///
/// ```
/// use gantry_rs::policy::PolicyConfiguration;
///
/// let policy = PolicyConfiguration::from_json(r#"{
///     "privileged_identities": ["admin", "uploader"],
///     "readonly_exception_paths": ["/tools/find", "/tools/lookup"]
/// }"#).unwrap();
///
/// assert!(policy.is_privileged("admin"));
/// assert!(!policy.is_privileged("guest"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfiguration {
    /// Policy format version
    #[serde(default = "default_version")]
    pub version: String,

    /// Identities allowed to perform mutating operations
    ///
    /// Membership is exact and case-sensitive. The empty identity is never
    /// privileged, whatever this set contains.
    #[serde(default)]
    pub privileged_identities: HashSet<String>,

    /// URI patterns always treated as read-only regardless of HTTP verb
    ///
    /// Example: `"/tools/find"`, a lookup endpoint transported over POST
    /// that cannot alter stored state.
    #[serde(default)]
    pub readonly_exception_paths: Vec<String>,

    /// Optional modality restriction for instance admission
    ///
    /// When set, an instance's `Modality` tag must be a member in addition
    /// to passing the identity-removal check. Composes with, never replaces,
    /// the mandatory check. Absent by default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_modalities: Option<HashSet<String>>,

    /// Emit audit lines on the allow path as well
    ///
    /// Off by default to keep the hot path quiet; denials always log.
    #[serde(default)]
    pub diagnostics: bool,
}

fn default_version() -> String {
    "2024-01-01".to_string()
}

impl PolicyConfiguration {
    /// Charset accepted for privileged identity entries
    const IDENTITY_PATTERN: &'static str = r"^[A-Za-z0-9][A-Za-z0-9._@-]*$";

    /// Parse a policy from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let policy: PolicyConfiguration = serde_json::from_str(json)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Parse a policy from a TOML string
    pub fn from_toml(text: &str) -> Result<Self> {
        let policy: PolicyConfiguration = toml::from_str(text)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Load a policy file, dispatching on the `.json` / `.toml` extension
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&text),
            Some("toml") => Self::from_toml(&text),
            other => Err(GateError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    /// Serialize the policy to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate the policy structure
    ///
    /// # Errors
    ///
    /// Returns `InvalidPolicy` if an identity entry is empty or carries
    /// characters outside the accepted charset, if an exception pattern is
    /// blank, or if `allowed_modalities` is present but empty.
    pub fn validate(&self) -> Result<()> {
        let identity_re = Regex::new(Self::IDENTITY_PATTERN).unwrap();

        for identity in &self.privileged_identities {
            if !identity_re.is_match(identity) {
                return Err(GateError::InvalidPolicy(format!(
                    "privileged identity '{}' must be non-empty and contain \
                     only letters, digits, '.', '_', '@', or '-'",
                    identity
                )));
            }
        }

        for (i, pattern) in self.readonly_exception_paths.iter().enumerate() {
            if pattern.trim().is_empty() {
                return Err(GateError::InvalidPolicy(format!(
                    "readonly exception pattern {} is blank",
                    i
                )));
            }
        }

        if let Some(modalities) = &self.allowed_modalities {
            if modalities.is_empty() {
                return Err(GateError::InvalidPolicy(
                    "allowed_modalities is present but empty; omit the key to \
                     disable the modality restriction"
                        .to_string(),
                ));
            }
            if modalities.iter().any(|m| m.trim().is_empty()) {
                return Err(GateError::InvalidPolicy(
                    "allowed_modalities contains a blank entry".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Check whether an identity is privileged (exact, case-sensitive)
    pub fn is_privileged(&self, identity: &str) -> bool {
        !identity.is_empty() && self.privileged_identities.contains(identity)
    }
}

impl Default for PolicyConfiguration {
    /// Deny-by-default policy: no privileged identities, no exceptions
    fn default() -> Self {
        PolicyConfiguration {
            version: default_version(),
            privileged_identities: HashSet::new(),
            readonly_exception_paths: Vec::new(),
            allowed_modalities: None,
            diagnostics: false,
        }
    }
}

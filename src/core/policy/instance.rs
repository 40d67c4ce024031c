//! Instance admission filter
//!
//! Last gate before a persistent write: an imaging object is admitted only
//! when its identity-removal marker asserts that pseudonymization completed.
//! A false allow is a privacy breach while a false deny is an inconvenience,
//! so the comparison is exact and the filter fails closed.

use super::config::PolicyConfiguration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tag asserting that patient-identifying information has been stripped
pub const IDENTITY_REMOVED_TAG: &str = "PatientIdentityRemoved";

/// Sentinel value meaning "identity removed"; exact, case-sensitive
pub const IDENTITY_REMOVED_VALUE: &str = "YES";

/// Tag consulted by the optional modality restriction
pub const MODALITY_TAG: &str = "Modality";

/// Admission message on the allow path
pub const ADMIT_MESSAGE: &str = "Identity is removed";

/// Admission message on the deny path
pub const REJECT_MESSAGE: &str = "You should remove the identity";

/// Tag name to value mapping
pub type TagMap = HashMap<String, String, ahash::RandomState>;

/// Immutable view of one submitted imaging object
///
/// # Examples
///
/// ```
/// use gantry_rs::policy::InstanceDescriptor;
///
/// let instance = InstanceDescriptor::new("DICOM_WEB")
///     .with_tag("PatientIdentityRemoved", "YES")
///     .with_tag("Modality", "OT");
///
/// assert_eq!(instance.tags.len(), 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceDescriptor {
    /// Metadata tags extracted from the object
    pub tags: TagMap,

    /// Opaque descriptor of the submission source
    pub origin: String,

    /// Extra context supplied by the host; never consulted by the base rule
    #[serde(default)]
    pub auxiliary: TagMap,
}

impl InstanceDescriptor {
    /// Build a descriptor with no tags
    pub fn new(origin: impl Into<String>) -> Self {
        InstanceDescriptor {
            tags: TagMap::default(),
            origin: origin.into(),
            auxiliary: TagMap::default(),
        }
    }

    /// Set a metadata tag
    pub fn with_tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(name.into(), value.into());
        self
    }

    /// Set an auxiliary context entry
    pub fn with_auxiliary(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.auxiliary.insert(name.into(), value.into());
        self
    }
}

/// Outcome of the instance admission filter; `message` is always populated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionDecision {
    /// Whether the instance may be committed to storage
    pub allow: bool,

    /// Contract message, also written to the audit stream
    pub message: String,
}

impl AdmissionDecision {
    fn admitted() -> Self {
        AdmissionDecision {
            allow: true,
            message: ADMIT_MESSAGE.to_string(),
        }
    }

    fn rejected() -> Self {
        AdmissionDecision {
            allow: false,
            message: REJECT_MESSAGE.to_string(),
        }
    }
}

/// Evaluate the instance admission filter
///
/// Allows iff `tags["PatientIdentityRemoved"]` equals `"YES"` exactly (no
/// trimming, no case-folding) and, when the policy configures
/// `allowed_modalities`, the `Modality` tag is a member. The modality
/// predicate composes with the marker check; it can never turn a deny into
/// an allow. Pure and total; a deny is final for the submission attempt.
///
/// # Examples
///
/// ```
/// use gantry_rs::policy::{evaluate_instance, InstanceDescriptor, PolicyConfiguration};
///
/// let policy = PolicyConfiguration::default();
/// let instance = InstanceDescriptor::new("upload")
///     .with_tag("PatientIdentityRemoved", "YES");
///
/// assert!(evaluate_instance(&instance, &policy).allow);
/// ```
pub fn evaluate_instance(
    instance: &InstanceDescriptor,
    policy: &PolicyConfiguration,
) -> AdmissionDecision {
    let marker_ok = instance
        .tags
        .get(IDENTITY_REMOVED_TAG)
        .is_some_and(|value| value == IDENTITY_REMOVED_VALUE);

    if !marker_ok {
        return AdmissionDecision::rejected();
    }

    if let Some(allowed) = &policy.allowed_modalities {
        let modality_ok = instance
            .tags
            .get(MODALITY_TAG)
            .is_some_and(|modality| allowed.contains(modality));

        if !modality_ok {
            return AdmissionDecision::rejected();
        }
    }

    AdmissionDecision::admitted()
}

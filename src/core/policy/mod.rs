//! Admission-gate policy for imaging archives
//!
//! Provides the two decision predicates the hosting archive server invokes:
//! - Request authorization: an explicit, ordered rule chain over inbound
//!   HTTP request descriptors (read-only verb, exception paths, privileged
//!   identities, default deny)
//! - Instance admission: the identity-removal marker check over inbound
//!   imaging objects, optionally composed with a modality restriction
//!
//! Both predicates are pure functions of a descriptor and a
//! `PolicyConfiguration` snapshot; hot swap and decision caching live in
//! `PolicyStore` and `DecisionCache`.

mod cache;
mod config;
mod instance;
mod pattern;
mod request;
mod rule;
mod store;

pub use cache::DecisionCache;
pub use config::PolicyConfiguration;
pub use instance::{
    evaluate_instance, AdmissionDecision, InstanceDescriptor, TagMap, ADMIT_MESSAGE,
    IDENTITY_REMOVED_TAG, IDENTITY_REMOVED_VALUE, MODALITY_TAG, REJECT_MESSAGE,
};
pub use pattern::PatternMatcher;
pub use request::{AuthorizationDecision, Method, RequestDescriptor};
pub use rule::{evaluate_request, Effect, Rule, RuleKind, DENY_REASON, RULE_CHAIN};
pub use store::{PolicySnapshot, PolicyStore};

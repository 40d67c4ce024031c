//! The request authorization rule chain
//!
//! Precedence is data, not control flow: `RULE_CHAIN` is an ordered list of
//! predicate/effect pairs evaluated first-match-wins, so each rule's position
//! can be inspected and tested in isolation. The final entry always matches
//! and denies.
//!
//! Chain order:
//! 1. `ReadOnlyMethod` - GET requests are always allowed
//! 2. `ReadOnlyException` - URIs matching a configured exception pattern are
//!    allowed (read-only operations transported over a mutating verb)
//! 3. `PrivilegedIdentity` - members of the privileged set are allowed
//! 4. `DefaultDeny` - everything else is denied with `"no access"`

use super::config::PolicyConfiguration;
use super::pattern::PatternMatcher;
use super::request::{AuthorizationDecision, RequestDescriptor};
use serde::{Deserialize, Serialize};

/// Denial reason operators grep the audit stream for
pub const DENY_REASON: &str = "no access";

/// Effect of a matched rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Allow the request
    Allow,
    /// Deny the request
    Deny,
}

/// Names the entries of the rule chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Rule 1: the canonical read verb is always allowed
    ReadOnlyMethod,
    /// Rule 2: URI matches a configured read-only exception pattern
    ReadOnlyException,
    /// Rule 3: identity is a member of the privileged set
    PrivilegedIdentity,
    /// Rule 4: fallthrough deny
    DefaultDeny,
}

/// One predicate/effect entry of the chain
pub struct Rule {
    /// Position name, reported on the decision
    pub kind: RuleKind,
    /// Outcome when the predicate holds
    pub effect: Effect,
    applies: fn(&RequestDescriptor, &PolicyConfiguration) -> bool,
}

impl Rule {
    /// Check whether this rule's predicate holds for the given request
    pub fn applies_to(&self, request: &RequestDescriptor, policy: &PolicyConfiguration) -> bool {
        (self.applies)(request, policy)
    }
}

fn read_only_method(request: &RequestDescriptor, _policy: &PolicyConfiguration) -> bool {
    request.method.is_read_only()
}

fn readonly_exception(request: &RequestDescriptor, policy: &PolicyConfiguration) -> bool {
    policy
        .readonly_exception_paths
        .iter()
        .any(|pattern| PatternMatcher::matches(pattern, &request.uri))
}

fn privileged_identity(request: &RequestDescriptor, policy: &PolicyConfiguration) -> bool {
    policy.is_privileged(&request.identity)
}

fn fallthrough(_request: &RequestDescriptor, _policy: &PolicyConfiguration) -> bool {
    true
}

/// The ordered rule chain, first match wins
pub static RULE_CHAIN: &[Rule] = &[
    Rule {
        kind: RuleKind::ReadOnlyMethod,
        effect: Effect::Allow,
        applies: read_only_method,
    },
    Rule {
        kind: RuleKind::ReadOnlyException,
        effect: Effect::Allow,
        applies: readonly_exception,
    },
    Rule {
        kind: RuleKind::PrivilegedIdentity,
        effect: Effect::Allow,
        applies: privileged_identity,
    },
    Rule {
        kind: RuleKind::DefaultDeny,
        effect: Effect::Deny,
        applies: fallthrough,
    },
];

/// Evaluate the request authorization filter
///
/// Pure and total: deterministic in `(request, policy)`, mutates nothing,
/// never fails. Headers and source address are carried by the descriptor but
/// do not affect the outcome.
///
/// # Examples
///
/// ```
/// use gantry_rs::policy::{evaluate_request, PolicyConfiguration, RequestDescriptor};
///
/// let policy = PolicyConfiguration::default();
/// let request = RequestDescriptor::new("GET", "/studies", "10.0.0.1", "");
///
/// assert!(evaluate_request(&request, &policy).allow);
/// ```
pub fn evaluate_request(
    request: &RequestDescriptor,
    policy: &PolicyConfiguration,
) -> AuthorizationDecision {
    for rule in RULE_CHAIN {
        if rule.applies_to(request, policy) {
            return match rule.effect {
                Effect::Allow => AuthorizationDecision::allowed(rule.kind),
                Effect::Deny => AuthorizationDecision::denied(rule.kind, DENY_REASON),
            };
        }
    }

    AuthorizationDecision::denied(RuleKind::DefaultDeny, DENY_REASON)
}

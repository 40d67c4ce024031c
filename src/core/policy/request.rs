//! Request descriptor and authorization decision types
//!
//! A `RequestDescriptor` is built once per inbound HTTP call by the hosting
//! archive server and discarded after the decision is consumed. The
//! descriptor carries headers and the source address even though the base
//! rule chain never consults them, so richer policies can be layered without
//! changing the contract.

use super::rule::RuleKind;
use serde::{Deserialize, Serialize};

/// HTTP verb of an inbound request
///
/// Parsing is case-insensitive and never fails: anything unrecognized lands
/// in `Other` and is treated as mutating.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    /// Unrecognized verb, stored uppercased
    Other(String),
}

impl Method {
    /// Parse a verb, case-insensitively; unknown verbs become `Other`
    pub fn parse(s: &str) -> Method {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            "PATCH" => Method::Patch,
            "OPTIONS" => Method::Options,
            other => Method::Other(other.to_string()),
        }
    }

    /// The canonical read verb; only GET bypasses the privilege rules
    pub fn is_read_only(&self) -> bool {
        matches!(self, Method::Get)
    }

    /// Uppercase wire representation
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Options => "OPTIONS",
            Method::Other(s) => s,
        }
    }
}

impl From<String> for Method {
    fn from(s: String) -> Self {
        Method::parse(&s)
    }
}

impl From<Method> for String {
    fn from(m: Method) -> Self {
        m.as_str().to_string()
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable view of one inbound HTTP call
///
/// # Examples
///
/// ```
/// use gantry_rs::policy::RequestDescriptor;
///
/// let request = RequestDescriptor::new("POST", "/instances", "10.0.0.1", "admin")
///     .with_header("Accept", "application/json");
///
/// assert_eq!(request.identity, "admin");
/// assert_eq!(request.headers.len(), 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestDescriptor {
    /// HTTP verb
    pub method: Method,

    /// Path plus query string, as received
    pub uri: String,

    /// Remote address the call arrived from
    pub source_address: String,

    /// Authenticated identity; empty when the caller is anonymous
    pub identity: String,

    /// Header name/value pairs in arrival order
    #[serde(default)]
    pub headers: Vec<(String, String)>,
}

impl RequestDescriptor {
    /// Build a descriptor with no headers
    pub fn new(
        method: &str,
        uri: impl Into<String>,
        source_address: impl Into<String>,
        identity: impl Into<String>,
    ) -> Self {
        RequestDescriptor {
            method: Method::parse(method),
            uri: uri.into(),
            source_address: source_address.into(),
            identity: identity.into(),
            headers: Vec::new(),
        }
    }

    /// Append a header pair
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Outcome of the request authorization filter
///
/// `rule` names the chain entry that produced the outcome so precedence is
/// testable per rule; `reason` is populated on deny for audit purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationDecision {
    /// Whether the request may proceed to its handler
    pub allow: bool,

    /// Human-readable denial reason; empty on allow
    pub reason: String,

    /// The rule that decided
    pub rule: RuleKind,
}

impl AuthorizationDecision {
    /// An allow produced by the given rule
    pub fn allowed(rule: RuleKind) -> Self {
        AuthorizationDecision {
            allow: true,
            reason: String::new(),
            rule,
        }
    }

    /// A deny produced by the given rule
    pub fn denied(rule: RuleKind, reason: impl Into<String>) -> Self {
        AuthorizationDecision {
            allow: false,
            reason: reason.into(),
            rule,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse_case_insensitive() {
        assert_eq!(Method::parse("get"), Method::Get);
        assert_eq!(Method::parse("GET"), Method::Get);
        assert_eq!(Method::parse("Post"), Method::Post);
        assert_eq!(Method::parse("dElEtE"), Method::Delete);
    }

    #[test]
    fn test_method_parse_never_fails() {
        assert_eq!(
            Method::parse("propfind"),
            Method::Other("PROPFIND".to_string())
        );
        assert_eq!(Method::parse(""), Method::Other(String::new()));
    }

    #[test]
    fn test_only_get_is_read_only() {
        assert!(Method::Get.is_read_only());
        assert!(!Method::Head.is_read_only());
        assert!(!Method::Post.is_read_only());
        assert!(!Method::Options.is_read_only());
        assert!(!Method::Other("PROPFIND".to_string()).is_read_only());
    }

    #[test]
    fn test_descriptor_builder() {
        let request = RequestDescriptor::new("get", "/studies?limit=5", "10.0.0.1", "")
            .with_header("Accept", "application/dicom+json")
            .with_header("X-Forwarded-For", "192.168.1.5");

        assert_eq!(request.method, Method::Get);
        assert_eq!(request.uri, "/studies?limit=5");
        assert!(request.identity.is_empty());
        assert_eq!(request.headers.len(), 2);
        assert_eq!(request.headers[0].0, "Accept");
    }

    #[test]
    fn test_method_serde_as_string() {
        let json = serde_json::to_string(&Method::Post).unwrap();
        assert_eq!(json, "\"POST\"");

        let parsed: Method = serde_json::from_str("\"delete\"").unwrap();
        assert_eq!(parsed, Method::Delete);
    }

    #[test]
    fn test_decision_constructors() {
        let allow = AuthorizationDecision::allowed(RuleKind::ReadOnlyMethod);
        assert!(allow.allow);
        assert!(allow.reason.is_empty());

        let deny = AuthorizationDecision::denied(RuleKind::DefaultDeny, "no access");
        assert!(!deny.allow);
        assert_eq!(deny.reason, "no access");
    }
}

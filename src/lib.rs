//! # Gantry - Admission Gate for Medical-Imaging Archives
//!
//! `gantry-rs` implements the two-stage admission gate a medical-imaging
//! archive server evaluates at its request and ingestion boundaries:
//!
//! - **Request authorization**: may this inbound HTTP call proceed?
//! - **Instance admission**: may this imaging object be persisted?
//!
//! The gate enforces the archive's one hard invariant: no identifying
//! patient data is ever admitted, and only privileged identities may mutate
//! archive state. Policy (privileged identities, read-only exception paths,
//! optional modality restriction) is injected as configuration and
//! hot-swappable; decisions are deterministic pure functions of a request or
//! instance descriptor and the current policy snapshot.
//!
//! ## Quick Start
//!
//! ```rust
//! use gantry_rs::{Gate, PolicyConfiguration, RequestDescriptor};
//!
//! # fn main() -> gantry_rs::Result<()> {
//! let policy = PolicyConfiguration::from_json(r#"{
//!     "privileged_identities": ["admin"],
//!     "readonly_exception_paths": ["/tools/find"]
//! }"#)?;
//!
//! let gate = Gate::new(policy);
//!
//! // Anonymous reads pass; unprivileged mutations do not
//! assert!(gate.evaluate_request(&RequestDescriptor::new("GET", "/studies", "10.0.0.1", "")).allow);
//! assert!(!gate.evaluate_request(&RequestDescriptor::new("POST", "/instances", "10.0.0.1", "guest")).allow);
//! # Ok(())
//! # }
//! ```
//!
//! ## Host Integration
//!
//! ```rust,no_run
//! use gantry_rs::{Gate, GateBuilder};
//!
//! # fn main() -> gantry_rs::Result<()> {
//! // Load policy from a deployment file, cache decisions, audit to stderr
//! let gate = GateBuilder::new()
//!     .policy_file("/etc/gantry/policy.toml")
//!     .with_decision_cache(4096)
//!     .with_audit_log()
//!     .build()?;
//!
//! // Inbound hook A: called by the archive server before dispatch
//! let allowed = gate.allow_request("POST", "/instances", "10.0.0.1", "admin", &[]);
//! # Ok(())
//! # }
//! ```

// Core implementation
pub mod core;

// Re-export core modules so crate:: paths stay short
pub use crate::core::{audit, error, policy};

// Re-export core types that users need
pub use crate::core::{
    audit::{AuditLog, AuditRecord},
    error::{GateError, Result},
    policy::{
        evaluate_instance, evaluate_request, AdmissionDecision, AuthorizationDecision,
        DecisionCache, Effect, InstanceDescriptor, Method, PatternMatcher, PolicyConfiguration,
        PolicySnapshot, PolicyStore, RequestDescriptor, Rule, RuleKind, TagMap, DENY_REASON,
        RULE_CHAIN,
    },
};

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// The admission gate: policy store, optional decision cache, audit stream
///
/// One `Gate` is shared by every worker thread of the hosting archive
/// server; evaluation takes `&self` and is safe under unsynchronized
/// concurrent invocation.
///
/// # Examples
///
/// ```rust
/// use gantry_rs::{Gate, InstanceDescriptor, PolicyConfiguration};
///
/// let gate = Gate::new(PolicyConfiguration::default());
///
/// let instance = InstanceDescriptor::new("upload")
///     .with_tag("PatientIdentityRemoved", "YES");
/// assert!(gate.evaluate_instance(&instance).allow);
/// ```
pub struct Gate {
    store: PolicyStore,
    cache: Option<DecisionCache>,
    audit: Option<AuditLog>,
    policy_path: Option<PathBuf>,
}

impl Gate {
    /// Create a gate with the given policy, no cache, no audit stream
    pub fn new(policy: PolicyConfiguration) -> Self {
        Gate {
            store: PolicyStore::new(policy),
            cache: None,
            audit: None,
            policy_path: None,
        }
    }

    /// Create a gate from a policy file (`.json` or `.toml`)
    ///
    /// The path is remembered so `reload` can re-read it later.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading gate policy from {:?}", path);

        let policy = PolicyConfiguration::load(path)?;
        let mut gate = Gate::new(policy);
        gate.policy_path = Some(path.to_path_buf());
        Ok(gate)
    }

    /// Evaluate the request authorization filter
    ///
    /// Inbound hook A. A deny emits one audit line containing the reason;
    /// an allow stays quiet unless the policy enables diagnostics.
    pub fn evaluate_request(&self, request: &RequestDescriptor) -> AuthorizationDecision {
        let snapshot = self.store.snapshot();

        if let Some(cache) = &self.cache {
            if let Some(decision) = cache.get(request, snapshot.epoch) {
                return decision;
            }
        }

        let decision = policy::evaluate_request(request, &snapshot);

        if let Some(cache) = &self.cache {
            cache.put(request, snapshot.epoch, decision.clone());
        }

        if !decision.allow {
            debug!(
                method = %request.method,
                uri = %request.uri,
                identity = %request.identity,
                "request denied"
            );
            self.audit_line(format!(
                "deny request {} {} from {} identity '{}': {}",
                request.method, request.uri, request.source_address, request.identity,
                decision.reason
            ));
        } else if snapshot.diagnostics {
            self.audit_line(format!(
                "allow request {} {} from {} ({:?})",
                request.method, request.uri, request.source_address, decision.rule
            ));
        }

        decision
    }

    /// Evaluate the instance admission filter
    ///
    /// Inbound hook B. Both outcomes log their contract message.
    pub fn evaluate_instance(&self, instance: &InstanceDescriptor) -> AdmissionDecision {
        let snapshot = self.store.snapshot();
        let decision = policy::evaluate_instance(instance, &snapshot);

        if !decision.allow {
            debug!(origin = %instance.origin, "instance rejected");
        }
        self.audit_line(format!(
            "{} instance from '{}': {}",
            if decision.allow { "admit" } else { "reject" },
            instance.origin,
            decision.message
        ));

        decision
    }

    /// Bool-returning wrapper for the archive server's request hook
    ///
    /// `false` must cause the host to reject the call with an access-denied
    /// response; `true` must let dispatch proceed unmodified.
    pub fn allow_request(
        &self,
        method: &str,
        uri: &str,
        source_address: &str,
        identity: &str,
        headers: &[(String, String)],
    ) -> bool {
        let mut request = RequestDescriptor::new(method, uri, source_address, identity);
        request.headers = headers.to_vec();
        self.evaluate_request(&request).allow
    }

    /// Bool-returning wrapper for the archive server's instance hook
    ///
    /// `false` must cause the host to discard the instance and surface an
    /// ingestion error to the submitter; `true` lets the commit proceed.
    pub fn allow_instance(&self, tags: TagMap, origin: &str, auxiliary: TagMap) -> bool {
        let instance = InstanceDescriptor {
            tags,
            origin: origin.to_string(),
            auxiliary,
        };
        self.evaluate_instance(&instance).allow
    }

    /// Replace the policy, returning the new epoch
    ///
    /// In-flight evaluations finish against the snapshot they already hold;
    /// cached decisions from earlier epochs are never replayed.
    pub fn swap_policy(&self, policy: PolicyConfiguration) -> u64 {
        let epoch = self.store.swap(policy);
        info!(epoch, "gate policy swapped");
        epoch
    }

    /// Re-read the policy file this gate was built from and swap it in
    ///
    /// # Errors
    ///
    /// Returns `InvalidPolicy` when the gate was constructed without a file,
    /// or the load error when re-reading fails. The running policy is left
    /// untouched on error.
    pub fn reload(&self) -> Result<u64> {
        let path = self.policy_path.as_ref().ok_or_else(|| {
            GateError::InvalidPolicy("gate was not built from a policy file".to_string())
        })?;

        match PolicyConfiguration::load(path) {
            Ok(policy) => Ok(self.swap_policy(policy)),
            Err(e) => {
                warn!("policy reload from {:?} failed: {}", path, e);
                Err(e)
            }
        }
    }

    /// Snapshot of the active configuration
    pub fn policy(&self) -> PolicySnapshot {
        self.store.snapshot()
    }

    /// Number of audit records not yet flushed (0 without an audit stream)
    pub fn audit_backlog(&self) -> usize {
        self.audit.as_ref().map(|log| log.pending()).unwrap_or(0)
    }

    fn audit_line(&self, line: String) {
        if let Some(log) = &self.audit {
            log.log(line);
        }
    }
}

/// Builder for customizing gate creation
///
/// # Examples
///
/// ```rust
/// use gantry_rs::{GateBuilder, PolicyConfiguration};
///
/// # fn main() -> gantry_rs::Result<()> {
/// let gate = GateBuilder::new()
///     .policy(PolicyConfiguration::default())
///     .with_decision_cache(1024)
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct GateBuilder {
    policy: Option<PolicyConfiguration>,
    policy_path: Option<PathBuf>,
    cache_capacity: Option<usize>,
    enable_audit: bool,
    audit_capacity: usize,
    audit_flush_interval: Duration,
    audit_sink: Option<Box<dyn Fn(&[AuditRecord]) + Send + 'static>>,
}

impl GateBuilder {
    /// Create a builder with default settings
    pub fn new() -> Self {
        GateBuilder {
            policy: None,
            policy_path: None,
            cache_capacity: None,
            enable_audit: false,
            audit_capacity: AuditLog::DEFAULT_CAPACITY,
            audit_flush_interval: AuditLog::DEFAULT_FLUSH_INTERVAL,
            audit_sink: None,
        }
    }

    /// Supply the policy as a value
    pub fn policy(mut self, policy: PolicyConfiguration) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Load the policy from a file at build time (enables `Gate::reload`)
    pub fn policy_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.policy_path = Some(path.into());
        self
    }

    /// Cache request decisions (keyed by descriptor and policy epoch)
    pub fn with_decision_cache(mut self, capacity: usize) -> Self {
        self.cache_capacity = Some(capacity);
        self
    }

    /// Stream audit lines to stderr
    pub fn with_audit_log(mut self) -> Self {
        self.enable_audit = true;
        self
    }

    /// Audit queue capacity (implies `with_audit_log`)
    pub fn audit_capacity(mut self, capacity: usize) -> Self {
        self.enable_audit = true;
        self.audit_capacity = capacity;
        self
    }

    /// Audit flush interval (implies `with_audit_log`)
    pub fn audit_flush_interval(mut self, interval: Duration) -> Self {
        self.enable_audit = true;
        self.audit_flush_interval = interval;
        self
    }

    /// Send audit batches to a custom sink instead of stderr
    ///
    /// Used by tests and by hosts that fold the audit stream into their own
    /// logging pipeline.
    pub fn audit_sink<F>(mut self, sink: F) -> Self
    where
        F: Fn(&[AuditRecord]) + Send + 'static,
    {
        self.enable_audit = true;
        self.audit_sink = Some(Box::new(sink));
        self
    }

    /// Build the gate
    ///
    /// # Errors
    ///
    /// Returns `InvalidPolicy` when neither `policy` nor `policy_file` was
    /// set, or the load/validation error from the policy file.
    pub fn build(self) -> Result<Gate> {
        let (policy, path) = match (self.policy, self.policy_path) {
            (Some(policy), path) => (policy, path),
            (None, Some(path)) => (PolicyConfiguration::load(&path)?, Some(path)),
            (None, None) => {
                return Err(GateError::InvalidPolicy(
                    "a policy value or policy file must be set".to_string(),
                ))
            }
        };

        let mut gate = Gate::new(policy);
        gate.policy_path = path;

        if let Some(capacity) = self.cache_capacity {
            gate.cache = Some(DecisionCache::new(capacity));
        }

        if self.enable_audit {
            let mut log = AuditLog::new(self.audit_capacity, self.audit_flush_interval);
            match self.audit_sink {
                Some(sink) => log.start(move |records| sink(records)),
                None => log.start_stderr(),
            }
            gate.audit = Some(log);
            debug!("audit stream enabled");
        }

        Ok(gate)
    }
}

impl Default for GateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

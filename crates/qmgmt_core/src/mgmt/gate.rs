//! Permission gate and call events.
//!
//! # Responsibility
//! - Fire `mgmt-permission:<method>` before a method body runs.
//! - Compose registered policy handlers with short-circuit-on-deny.
//! - Notify observers of pre- and post-execution events.
//!
//! # Invariants
//! - Observers see the permission event before any policy decides.
//! - The first denial wins; later policies are not consulted.
//! - The gate never mutates application state.

use crate::error::MgmtError;
use log::{debug, warn};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Prefix of the pre-execution event name.
pub const PERMISSION_EVENT_PREFIX: &str = "mgmt-permission:";
/// Prefix of the post-execution event name.
pub const POST_EVENT_PREFIX: &str = "mgmt:";

/// Call fields handed to policies and observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    /// Calling domain.
    pub source: String,
    pub method: String,
    pub destination: String,
    pub argument: String,
    /// Untrusted payload, unmodified.
    pub payload: Vec<u8>,
}

/// One permission question.
#[derive(Debug, Clone, Copy)]
pub struct PermissionRequest<'a> {
    pub event: &'a str,
    pub context: &'a CallContext,
}

/// Negative policy decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub reason: String,
}

impl Denial {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Display for Denial {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Policy handler consulted on every permission event.
pub trait PolicyHandler: Send + Sync {
    fn check(&self, request: &PermissionRequest<'_>) -> Result<(), Denial>;
}

/// Passive listener for call events.
pub trait EventObserver: Send + Sync {
    fn on_event(&self, event: &str, context: &CallContext);
}

/// Denies a fixed set of method names.
#[derive(Debug, Clone, Default)]
pub struct DenyList {
    methods: BTreeSet<String>,
}

impl DenyList {
    pub fn new<I, S>(methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            methods: methods.into_iter().map(Into::into).collect(),
        }
    }
}

impl PolicyHandler for DenyList {
    fn check(&self, request: &PermissionRequest<'_>) -> Result<(), Denial> {
        if self.methods.contains(&request.context.method) {
            Err(Denial::new(format!(
                "method {} is denied for {}",
                request.context.method, request.context.source
            )))
        } else {
            Ok(())
        }
    }
}

/// Registered policies and observers.
#[derive(Default, Clone)]
pub struct PermissionGate {
    policies: Vec<Arc<dyn PolicyHandler>>,
    observers: Vec<Arc<dyn EventObserver>>,
}

impl PermissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_policy(&mut self, policy: Arc<dyn PolicyHandler>) {
        self.policies.push(policy);
    }

    pub fn add_observer(&mut self, observer: Arc<dyn EventObserver>) {
        self.observers.push(observer);
    }

    /// Fires the permission event and returns the first denial, if any.
    pub fn check_permission(&self, context: &CallContext) -> Result<(), MgmtError> {
        let event = format!("{PERMISSION_EVENT_PREFIX}{}", context.method);
        for observer in &self.observers {
            observer.on_event(&event, context);
        }

        let request = PermissionRequest {
            event: &event,
            context,
        };
        for policy in &self.policies {
            if let Err(denial) = policy.check(&request) {
                warn!(
                    "event=permission_denied module=gate status=denied method={}",
                    context.method
                );
                return Err(MgmtError::PermissionDenied {
                    event,
                    reason: denial.reason,
                });
            }
        }
        debug!(
            "event=permission_granted module=gate status=ok method={} policies={}",
            context.method,
            self.policies.len()
        );
        Ok(())
    }

    /// Notifies observers that the call completed successfully.
    pub fn fire_post(&self, context: &CallContext) {
        let event = format!("{POST_EVENT_PREFIX}{}", context.method);
        for observer in &self.observers {
            observer.on_event(&event, context);
        }
    }
}

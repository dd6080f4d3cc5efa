//! Management call error taxonomy.
//!
//! # Responsibility
//! - Classify every call failure into one caller-visible kind.
//! - Convert module errors (property, registry, label) at the boundary.
//!
//! # Invariants
//! - Protocol violations are caller or framework bugs and are never retried.
//! - `InvalidValue` and `PermissionDenied` imply that nothing was mutated.

use crate::model::label::LabelError;
use crate::property::access::PropertyError;
use crate::repo::domain_repo::RegistryError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type MgmtResult<T> = Result<T, MgmtError>;

/// Malformed call shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// A routing field contained non-ASCII bytes.
    NonAscii { field: &'static str },
    UnknownMethod(String),
    MissingArgument,
    UnexpectedArgument,
    MissingPayload,
    UnexpectedPayload,
    /// Method is restricted to `dom0` but targeted another domain.
    Dom0Only { method: String, destination: String },
    /// Method is restricted to guest domains but targeted `dom0`.
    VmOnly { method: String },
    /// A help method referenced a property the owner does not declare.
    UnknownProperty(String),
}

impl Display for ProtocolViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonAscii { field } => write!(f, "{field} contains non-ASCII bytes"),
            Self::UnknownMethod(method) => write!(f, "unknown method: {method}"),
            Self::MissingArgument => write!(f, "argument is required"),
            Self::UnexpectedArgument => write!(f, "argument is not allowed"),
            Self::MissingPayload => write!(f, "payload is required"),
            Self::UnexpectedPayload => write!(f, "payload is not allowed"),
            Self::Dom0Only {
                method,
                destination,
            } => write!(f, "{method} targets dom0 only, got `{destination}`"),
            Self::VmOnly { method } => write!(f, "{method} cannot target dom0"),
            Self::UnknownProperty(name) => write!(f, "help requested for unknown property: {name}"),
        }
    }
}

/// Caller-visible failure of a management call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MgmtError {
    Protocol(ProtocolViolation),
    /// Well-formed call with a semantically invalid value.
    InvalidValue(String),
    NotFound { kind: &'static str, name: String },
    PermissionDenied { event: String, reason: String },
    /// A delegated collaborator failed or does not support the method.
    Backend(String),
    Internal(String),
}

/// Coarse classification of `MgmtError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MgmtErrorKind {
    ProtocolViolation,
    ValidationError,
    NotFound,
    PermissionDenied,
    Backend,
    Internal,
}

impl MgmtErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProtocolViolation => "ProtocolViolation",
            Self::ValidationError => "ValidationError",
            Self::NotFound => "NotFound",
            Self::PermissionDenied => "PermissionDenied",
            Self::Backend => "Backend",
            Self::Internal => "Internal",
        }
    }
}

impl Display for MgmtErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl MgmtError {
    pub fn kind(&self) -> MgmtErrorKind {
        match self {
            Self::Protocol(_) => MgmtErrorKind::ProtocolViolation,
            Self::InvalidValue(_) => MgmtErrorKind::ValidationError,
            Self::NotFound { .. } => MgmtErrorKind::NotFound,
            Self::PermissionDenied { .. } => MgmtErrorKind::PermissionDenied,
            Self::Backend(_) => MgmtErrorKind::Backend,
            Self::Internal(_) => MgmtErrorKind::Internal,
        }
    }

    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidValue(reason.into())
    }
}

impl Display for MgmtError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Protocol(violation) => write!(f, "protocol violation: {violation}"),
            Self::InvalidValue(reason) => write!(f, "invalid value: {reason}"),
            Self::NotFound { kind, name } => write!(f, "{kind} not found: {name}"),
            Self::PermissionDenied { event, reason } => {
                write!(f, "permission denied by {event}: {reason}")
            }
            Self::Backend(reason) => write!(f, "backend error: {reason}"),
            Self::Internal(reason) => write!(f, "internal error: {reason}"),
        }
    }
}

impl Error for MgmtError {}

impl From<ProtocolViolation> for MgmtError {
    fn from(value: ProtocolViolation) -> Self {
        Self::Protocol(value)
    }
}

impl From<PropertyError> for MgmtError {
    fn from(value: PropertyError) -> Self {
        match value {
            PropertyError::OwnerNotFound(qid) => Self::not_found("domain", format!("qid={qid}")),
            PropertyError::NotFound(name) => Self::not_found("property", name),
            other @ (PropertyError::InvalidValue { .. }
            | PropertyError::ReadOnly(_)
            | PropertyError::NotResettable(_)) => Self::InvalidValue(other.to_string()),
        }
    }
}

impl From<RegistryError> for MgmtError {
    fn from(value: RegistryError) -> Self {
        match value {
            RegistryError::NotFound(qid) => Self::not_found("domain", format!("qid={qid}")),
            RegistryError::DuplicateQid(_) => Self::Internal(value.to_string()),
            other @ (RegistryError::InvalidName { .. } | RegistryError::DuplicateName(_)) => {
                Self::InvalidValue(other.to_string())
            }
        }
    }
}

impl From<LabelError> for MgmtError {
    fn from(value: LabelError) -> Self {
        match value {
            LabelError::NotFound(name) => Self::not_found("label", name),
            other => Self::InvalidValue(other.to_string()),
        }
    }
}

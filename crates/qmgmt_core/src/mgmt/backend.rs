//! External collaborators of the call executor.
//!
//! # Responsibility
//! - Define the persistence hook requested after successful mutations.
//! - Define the VM-control backend used for run states and delegated methods.
//!
//! # Invariants
//! - The core never depends on backend mutation for its own state.
//! - Backends that do not implement a delegated method report `Unsupported`.

use crate::error::MgmtError;
use crate::mgmt::method::Method;
use crate::model::entity::Entity;
use crate::model::vm_class::RunState;
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Backend failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    Unsupported(String),
    Failed(String),
}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unsupported(method) => write!(f, "method not supported by backend: {method}"),
            Self::Failed(reason) => write!(f, "backend operation failed: {reason}"),
        }
    }
}

impl Error for BackendError {}

impl From<BackendError> for MgmtError {
    fn from(value: BackendError) -> Self {
        Self::Backend(value.to_string())
    }
}

/// Save hook for the application configuration.
pub trait Persistence: Send + Sync {
    /// Called once per successful mutating call.
    fn request_save(&self);
}

/// Persistence that only records the request in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPersistence;

impl Persistence for NoopPersistence {
    fn request_save(&self) {
        debug!("event=save_requested module=backend status=skipped");
    }
}

/// Delegated call handed to the backend.
#[derive(Debug, Clone, Copy)]
pub struct BackendCall<'a> {
    pub method: Method,
    pub destination: &'a Entity,
    pub argument: &'a str,
    pub payload: &'a [u8],
}

/// Backend response to a delegated call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendOutput {
    pub text: String,
    /// Whether the backend changed configuration that must be saved.
    pub mutated: bool,
}

/// VM-control backend.
pub trait VmControl: Send + Sync {
    /// Live power state of `entity`.
    fn state(&self, entity: &Entity) -> RunState;

    fn invoke(&self, call: &BackendCall<'_>) -> Result<BackendOutput, BackendError> {
        Err(BackendError::Unsupported(call.method.name().into_owned()))
    }
}

/// Backend with no hypervisor behind it: every guest is halted and no
/// delegated method is supported.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineControl;

impl VmControl for OfflineControl {
    fn state(&self, _entity: &Entity) -> RunState {
        RunState::Halted
    }
}

#[cfg(test)]
mod tests {
    use super::{BackendCall, BackendError, OfflineControl, VmControl};
    use crate::error::{MgmtError, MgmtErrorKind};
    use crate::mgmt::method::Method;
    use crate::model::entity::Entity;
    use crate::model::vm_class::{RunState, VmClass};

    #[test]
    fn offline_backend_reports_halted_and_unsupported() {
        let backend = OfflineControl;
        let entity = Entity::new(3, "test-vm1", VmClass::AppVm);
        assert_eq!(backend.state(&entity), RunState::Halted);

        let err = backend
            .invoke(&BackendCall {
                method: Method::VmStart,
                destination: &entity,
                argument: "",
                payload: b"",
            })
            .expect_err("offline backend cannot start domains");
        assert_eq!(err, BackendError::Unsupported("mgmt.vm.Start".to_string()));

        let mapped: MgmtError = err.into();
        assert_eq!(mapped.kind(), MgmtErrorKind::Backend);
    }
}

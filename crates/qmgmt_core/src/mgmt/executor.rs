//! Management call executor.
//!
//! # Responsibility
//! - Run the per-call state machine: parse, validate shape, resolve the
//!   destination, ask the permission gate, execute, respond.
//! - Request a save once after every successful mutating handler.
//!
//! # Invariants
//! - Shape < destination < permission < execution; a call rejected at one
//!   stage never reaches the next.
//! - Application state is locked from destination resolution until the
//!   handler returns, so validate-then-mutate never interleaves.
//! - Untrusted call fields are never logged raw.

use crate::app::App;
use crate::error::{MgmtError, MgmtResult, ProtocolViolation};
use crate::logging::untrusted_field;
use crate::mgmt::backend::{Persistence, VmControl};
use crate::mgmt::gate::{CallContext, EventObserver, PermissionGate, PolicyHandler};
use crate::mgmt::handlers::{dispatch, HandlerRequest};
use crate::mgmt::method::{DestinationClass, Method};
use crate::model::entity::DOM0_NAME;
use log::{info, warn};
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};

/// One raw management call as received from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MgmtCall {
    pub method: Vec<u8>,
    pub destination: Vec<u8>,
    pub argument: Vec<u8>,
    pub payload: Vec<u8>,
}

impl MgmtCall {
    pub fn new(
        method: impl AsRef<[u8]>,
        destination: impl AsRef<[u8]>,
        argument: impl AsRef<[u8]>,
        payload: impl AsRef<[u8]>,
    ) -> Self {
        Self {
            method: method.as_ref().to_vec(),
            destination: destination.as_ref().to_vec(),
            argument: argument.as_ref().to_vec(),
            payload: payload.as_ref().to_vec(),
        }
    }
}

/// Last stage a call reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStage {
    Parsed,
    ShapeValidated,
    DestinationResolved,
    PermissionChecked,
    Executed,
    Responded,
}

impl CallStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Parsed => "parsed",
            Self::ShapeValidated => "shape_validated",
            Self::DestinationResolved => "destination_resolved",
            Self::PermissionChecked => "permission_checked",
            Self::Executed => "executed",
            Self::Responded => "responded",
        }
    }
}

impl Display for CallStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry point for management calls.
pub struct MgmtService {
    app: Mutex<App>,
    gate: PermissionGate,
    persistence: Arc<dyn Persistence>,
    backend: Arc<dyn VmControl>,
}

impl MgmtService {
    pub fn new(app: App, persistence: Arc<dyn Persistence>, backend: Arc<dyn VmControl>) -> Self {
        Self {
            app: Mutex::new(app),
            gate: PermissionGate::new(),
            persistence,
            backend,
        }
    }

    pub fn add_policy(&mut self, policy: Arc<dyn PolicyHandler>) {
        self.gate.add_policy(policy);
    }

    pub fn add_observer(&mut self, observer: Arc<dyn EventObserver>) {
        self.gate.add_observer(observer);
    }

    /// Read-only access to application state.
    pub fn with_app<R>(&self, read: impl FnOnce(&App) -> R) -> MgmtResult<R> {
        let app = self.lock_app()?;
        Ok(read(&app))
    }

    /// Executes one call and returns its UTF-8 response.
    pub fn execute(&self, call: &MgmtCall) -> MgmtResult<String> {
        let mut stage = CallStage::Parsed;
        let result = self.run(call, &mut stage);
        match &result {
            Ok(response) => info!(
                "event=mgmt_call module=mgmt status=ok method={} destination={} stage={} response_len={}",
                untrusted_field(&call.method),
                untrusted_field(&call.destination),
                stage,
                response.len()
            ),
            Err(err) => warn!(
                "event=mgmt_call module=mgmt status=error method={} destination={} stage={} kind={}",
                untrusted_field(&call.method),
                untrusted_field(&call.destination),
                stage,
                err.kind()
            ),
        }
        result
    }

    fn run(&self, call: &MgmtCall, stage: &mut CallStage) -> MgmtResult<String> {
        let method_name = ascii_field(&call.method, "method")?;
        let destination_name = ascii_field(&call.destination, "destination")?;
        let argument = ascii_field(&call.argument, "argument")?;
        let method = Method::parse(method_name)?;

        let contract = method.contract();
        contract.argument.check(
            !argument.is_empty(),
            ProtocolViolation::MissingArgument,
            ProtocolViolation::UnexpectedArgument,
        )?;
        contract.payload.check(
            !call.payload.is_empty(),
            ProtocolViolation::MissingPayload,
            ProtocolViolation::UnexpectedPayload,
        )?;
        *stage = CallStage::ShapeValidated;

        let mut app = self.lock_app()?;
        match contract.destination {
            DestinationClass::Dom0Only if destination_name != DOM0_NAME => {
                return Err(ProtocolViolation::Dom0Only {
                    method: method_name.to_string(),
                    destination: destination_name.to_string(),
                }
                .into());
            }
            DestinationClass::VmOnly
                if destination_name == DOM0_NAME && app.config().enforce_vm_only =>
            {
                return Err(ProtocolViolation::VmOnly {
                    method: method_name.to_string(),
                }
                .into());
            }
            _ => {}
        }
        let destination = app.domain_by_name(destination_name)?.qid();
        *stage = CallStage::DestinationResolved;

        let context = CallContext {
            source: app.config().source_name.clone(),
            method: method_name.to_string(),
            destination: destination_name.to_string(),
            argument: argument.to_string(),
            payload: call.payload.clone(),
        };
        self.gate.check_permission(&context)?;
        *stage = CallStage::PermissionChecked;

        let request = HandlerRequest {
            method,
            destination,
            argument,
            payload: &call.payload,
        };
        let output = dispatch(&mut app, self.backend.as_ref(), &request)?;
        *stage = CallStage::Executed;
        if output.mutated {
            self.persistence.request_save();
        }
        drop(app);

        self.gate.fire_post(&context);
        *stage = CallStage::Responded;
        Ok(output.text)
    }

    fn lock_app(&self) -> MgmtResult<std::sync::MutexGuard<'_, App>> {
        self.app
            .lock()
            .map_err(|_| MgmtError::Internal("application state lock poisoned".to_string()))
    }
}

fn ascii_field<'a>(raw: &'a [u8], field: &'static str) -> Result<&'a str, ProtocolViolation> {
    if !raw.is_ascii() {
        return Err(ProtocolViolation::NonAscii { field });
    }
    std::str::from_utf8(raw).map_err(|_| ProtocolViolation::NonAscii { field })
}

//! Method bodies.
//!
//! # Responsibility
//! - Route a validated, authorized call to its handler body.
//! - Report whether the body mutated state, so the executor can request a
//!   save exactly once.
//!
//! # Invariants
//! - Handlers run after shape, destination and permission checks.
//! - A handler returning an error has not mutated state.
//! - `dispatch` is a total match over `Method`; backend-kind variants go to
//!   `VmControl::invoke`.

mod feature;
mod label;
mod property;
mod tag;
mod vm;

use crate::app::App;
use crate::error::{MgmtError, MgmtResult};
use crate::mgmt::backend::{BackendCall, VmControl};
use crate::mgmt::method::{HandlerKind, Method};
use crate::model::entity::Entity;
use crate::property::access::PropertyTarget;
use crate::repo::domain_repo::Qid;

/// Validated call handed to a handler body.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HandlerRequest<'a> {
    pub method: Method,
    pub destination: Qid,
    pub argument: &'a str,
    pub payload: &'a [u8],
}

/// Handler result before formatting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct HandlerOutput {
    pub text: String,
    pub mutated: bool,
}

impl HandlerOutput {
    pub fn read(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mutated: false,
        }
    }

    pub fn mutated() -> Self {
        Self {
            text: String::new(),
            mutated: true,
        }
    }
}

/// One item per line, each line terminated.
pub(crate) fn lines<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items.into_iter().fold(String::new(), |mut out, item| {
        out.push_str(item.as_ref());
        out.push('\n');
        out
    })
}

pub(crate) fn destination<'a>(
    app: &'a App,
    request: &HandlerRequest<'_>,
) -> MgmtResult<&'a Entity> {
    app.domains()
        .get(request.destination)
        .ok_or_else(|| MgmtError::not_found("domain", format!("qid={}", request.destination)))
}

pub(crate) fn destination_mut<'a>(
    app: &'a mut App,
    request: &HandlerRequest<'_>,
) -> MgmtResult<&'a mut Entity> {
    app.domains_mut()
        .get_mut(request.destination)
        .ok_or_else(|| MgmtError::not_found("domain", format!("qid={}", request.destination)))
}

pub(crate) fn dispatch(
    app: &mut App,
    backend: &dyn VmControl,
    request: &HandlerRequest<'_>,
) -> MgmtResult<HandlerOutput> {
    let domain = PropertyTarget::Domain(request.destination);
    let host = PropertyTarget::Host;
    match request.method {
        Method::VmClassList => Ok(vm::list_classes()),
        Method::VmList => vm::list(app, backend, request),
        Method::VmCreate(class) => vm::create(app, class, request),
        Method::VmRemove => vm::remove(app, backend, request),
        Method::PropertyList => property::list(app, host),
        Method::PropertyGet => property::get(app, host, request.argument),
        Method::PropertySet => property::set(app, host, request),
        Method::PropertyReset => property::reset(app, host, request.argument),
        Method::PropertyHelp => property::help(app, host, request.argument),
        Method::PropertyHelpRst => property::help_rst(app, host, request.argument),
        Method::VmPropertyList => property::list(app, domain),
        Method::VmPropertyGet => property::get(app, domain, request.argument),
        Method::VmPropertySet => property::set(app, domain, request),
        Method::VmPropertyReset => property::reset(app, domain, request.argument),
        Method::VmPropertyHelp => property::help(app, domain, request.argument),
        Method::VmPropertyHelpRst => property::help_rst(app, domain, request.argument),
        Method::VmFeatureList => feature::list(app, request),
        Method::VmFeatureGet => feature::get(app, request),
        Method::VmFeatureCheckWithTemplate => feature::check_with_template(app, request),
        Method::VmFeatureSet => feature::set(app, request),
        Method::VmFeatureRemove => feature::remove(app, request),
        Method::VmTagList => tag::list(app, request),
        Method::VmTagGet => tag::get(app, request),
        Method::VmTagSet => tag::set(app, request),
        Method::VmTagRemove => tag::remove(app, request),
        Method::LabelList => Ok(label::list(app)),
        Method::LabelGet => label::get(app, request.argument),
        Method::LabelCreate => label::create(app, request),
        Method::LabelRemove => label::remove(app, request.argument),
        Method::VmCreateInPool(_)
        | Method::VmCreateTemplate
        | Method::PoolList
        | Method::PoolListDrivers
        | Method::PoolInfo
        | Method::PoolAdd
        | Method::PoolRemove
        | Method::PoolVolumeList
        | Method::PoolVolumeInfo
        | Method::PoolVolumeListSnapshots
        | Method::PoolVolumeSnapshot
        | Method::PoolVolumeRevert
        | Method::PoolVolumeResize
        | Method::BackupExecute
        | Method::BackupInfo
        | Method::BackupRestore
        | Method::VmClone
        | Method::VmFirewallGet
        | Method::VmFirewallList
        | Method::VmFirewallFlush
        | Method::VmFirewallRemoveRule
        | Method::VmFirewallInsertRule
        | Method::VmDevicePciAttach
        | Method::VmDevicePciDetach
        | Method::VmDevicePciList
        | Method::VmDevicePciAvailable
        | Method::VmMicrophoneAttach
        | Method::VmMicrophoneDetach
        | Method::VmMicrophoneStatus
        | Method::VmVolumeList
        | Method::VmVolumeListSnapshots
        | Method::VmVolumeInfo
        | Method::VmVolumeRevert
        | Method::VmVolumeResize
        | Method::VmStart
        | Method::VmShutdown
        | Method::VmPause
        | Method::VmUnpause
        | Method::VmKill => delegate(app, backend, request),
    }
}

fn delegate(
    app: &App,
    backend: &dyn VmControl,
    request: &HandlerRequest<'_>,
) -> MgmtResult<HandlerOutput> {
    debug_assert_eq!(request.method.handler_kind(), HandlerKind::Backend);
    let entity = destination(app, request)?;
    let output = backend.invoke(&BackendCall {
        method: request.method,
        destination: entity,
        argument: request.argument,
        payload: request.payload,
    })?;
    Ok(HandlerOutput {
        text: output.text,
        mutated: output.mutated,
    })
}

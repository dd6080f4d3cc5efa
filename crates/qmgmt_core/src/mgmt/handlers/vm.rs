//! Domain listing and lifecycle within the registry.

use super::{destination, lines, HandlerOutput, HandlerRequest};
use crate::app::App;
use crate::error::{MgmtError, MgmtResult};
use crate::mgmt::backend::VmControl;
use crate::model::entity::Entity;
use crate::model::vm_class::{RunState, VmClass};
use crate::property::codec::printable_ascii;

pub(super) fn list_classes() -> HandlerOutput {
    HandlerOutput::read(lines(VmClass::all().iter().map(|class| class.as_str())))
}

fn run_state(backend: &dyn VmControl, entity: &Entity) -> RunState {
    if entity.is_dom0() {
        RunState::Running
    } else {
        backend.state(entity)
    }
}

/// `dom0` lists the whole registry; any other destination lists itself.
pub(super) fn list(
    app: &App,
    backend: &dyn VmControl,
    request: &HandlerRequest<'_>,
) -> MgmtResult<HandlerOutput> {
    let target = destination(app, request)?;
    let entities = if target.is_dom0() {
        app.domains().list()
    } else {
        vec![target]
    };
    let text = entities.into_iter().fold(String::new(), |mut out, entity| {
        out.push_str(&format!(
            "{} class={} state={}\n",
            entity.name(),
            entity.class(),
            run_state(backend, entity)
        ));
        out
    });
    Ok(HandlerOutput::read(text))
}

struct CreateRequest<'a> {
    name: &'a str,
    label: &'a str,
}

// Payload is `name=<name> label=<label>`, keys in any order.
fn parse_create_payload(payload: &[u8]) -> MgmtResult<CreateRequest<'_>> {
    let text = printable_ascii(payload).map_err(MgmtError::InvalidValue)?;
    let mut name = None;
    let mut label = None;
    for pair in text.split_whitespace() {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| MgmtError::invalid(format!("malformed creation parameter `{pair}`")))?;
        let slot = match key {
            "name" => &mut name,
            "label" => &mut label,
            other => {
                return Err(MgmtError::invalid(format!(
                    "unknown creation parameter `{other}`"
                )))
            }
        };
        if slot.replace(value).is_some() {
            return Err(MgmtError::invalid(format!(
                "duplicate creation parameter `{key}`"
            )));
        }
    }
    Ok(CreateRequest {
        name: name.ok_or_else(|| MgmtError::invalid("creation parameter `name` is required"))?,
        label: label.ok_or_else(|| MgmtError::invalid("creation parameter `label` is required"))?,
    })
}

pub(super) fn create(
    app: &mut App,
    class: VmClass,
    request: &HandlerRequest<'_>,
) -> MgmtResult<HandlerOutput> {
    let params = parse_create_payload(request.payload)?;
    let template = Some(request.argument).filter(|argument| !argument.is_empty());
    app.add_new_vm(class, params.name, params.label, template)?;
    Ok(HandlerOutput::mutated())
}

pub(super) fn remove(
    app: &mut App,
    backend: &dyn VmControl,
    request: &HandlerRequest<'_>,
) -> MgmtResult<HandlerOutput> {
    let state = run_state(backend, destination(app, request)?);
    if state != RunState::Halted {
        return Err(MgmtError::invalid(format!(
            "domain must be halted to be removed, current state: {state}"
        )));
    }
    app.remove_vm(request.destination)?;
    Ok(HandlerOutput::mutated())
}

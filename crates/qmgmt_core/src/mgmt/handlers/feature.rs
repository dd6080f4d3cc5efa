//! Per-domain feature map methods.

use super::{destination, destination_mut, lines, HandlerOutput, HandlerRequest};
use crate::app::App;
use crate::error::{MgmtError, MgmtResult};
use crate::property::access::effective_value;
use crate::property::codec::printable_ascii;
use crate::property::descriptor::Owner;
use crate::property::value::PropertyValue;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static FEATURE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_.-]+$").expect("feature name regex"));

pub(super) fn list(app: &App, request: &HandlerRequest<'_>) -> MgmtResult<HandlerOutput> {
    let entity = destination(app, request)?;
    Ok(HandlerOutput::read(lines(entity.features().keys())))
}

pub(super) fn get(app: &App, request: &HandlerRequest<'_>) -> MgmtResult<HandlerOutput> {
    destination(app, request)?
        .features()
        .get(request.argument)
        .map(|value| HandlerOutput::read(value.clone()))
        .ok_or_else(|| MgmtError::not_found("feature", request.argument))
}

/// Value on the domain itself, else on the nearest template that has it.
pub(super) fn check_with_template(
    app: &App,
    request: &HandlerRequest<'_>,
) -> MgmtResult<HandlerOutput> {
    let mut visited = BTreeSet::new();
    let mut current = Some(destination(app, request)?);
    while let Some(entity) = current {
        if let Some(value) = entity.features().get(request.argument) {
            return Ok(HandlerOutput::read(value.clone()));
        }
        if !visited.insert(entity.qid()) {
            break;
        }
        current = match effective_value(app, Owner::Domain(entity), "template") {
            Some(PropertyValue::Vm(Some(qid))) => app.domains().get(qid),
            _ => None,
        };
    }
    Err(MgmtError::not_found("feature", request.argument))
}

pub(super) fn set(app: &mut App, request: &HandlerRequest<'_>) -> MgmtResult<HandlerOutput> {
    if !FEATURE_NAME_RE.is_match(request.argument) {
        return Err(MgmtError::invalid(format!(
            "invalid feature name `{}`",
            request.argument
        )));
    }
    let value = printable_ascii(request.payload).map_err(MgmtError::InvalidValue)?;
    destination_mut(app, request)?
        .features_mut()
        .insert(request.argument.to_string(), value.to_string());
    Ok(HandlerOutput::mutated())
}

pub(super) fn remove(app: &mut App, request: &HandlerRequest<'_>) -> MgmtResult<HandlerOutput> {
    destination_mut(app, request)?
        .features_mut()
        .remove(request.argument)
        .map(|_| HandlerOutput::mutated())
        .ok_or_else(|| MgmtError::not_found("feature", request.argument))
}

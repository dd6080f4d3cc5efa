//! Property methods for domains and the host.

use super::{lines, HandlerOutput, HandlerRequest};
use crate::app::App;
use crate::error::{MgmtError, MgmtResult, ProtocolViolation};
use crate::property::access::{
    get_property, list_properties, property_help, property_help_rst, reset_property,
    set_property, PropertyError, PropertyTarget,
};

pub(super) fn list(app: &App, target: PropertyTarget) -> MgmtResult<HandlerOutput> {
    Ok(HandlerOutput::read(lines(list_properties(app, target)?)))
}

pub(super) fn get(app: &App, target: PropertyTarget, name: &str) -> MgmtResult<HandlerOutput> {
    Ok(HandlerOutput::read(
        get_property(app, target, name)?.to_string(),
    ))
}

pub(super) fn set(
    app: &mut App,
    target: PropertyTarget,
    request: &HandlerRequest<'_>,
) -> MgmtResult<HandlerOutput> {
    set_property(app, target, request.argument, request.payload)?;
    Ok(HandlerOutput::mutated())
}

pub(super) fn reset(
    app: &mut App,
    target: PropertyTarget,
    name: &str,
) -> MgmtResult<HandlerOutput> {
    reset_property(app, target, name)?;
    Ok(HandlerOutput::mutated())
}

// Help is only requested for names obtained from List, so an unknown name
// is a caller bug rather than a lookup miss.
fn help_error(error: PropertyError) -> MgmtError {
    match error {
        PropertyError::NotFound(name) => ProtocolViolation::UnknownProperty(name).into(),
        other => other.into(),
    }
}

pub(super) fn help(app: &App, target: PropertyTarget, name: &str) -> MgmtResult<HandlerOutput> {
    property_help(app, target, name)
        .map(HandlerOutput::read)
        .map_err(help_error)
}

pub(super) fn help_rst(
    app: &App,
    target: PropertyTarget,
    name: &str,
) -> MgmtResult<HandlerOutput> {
    property_help_rst(app, target, name)
        .map(HandlerOutput::read)
        .map_err(help_error)
}

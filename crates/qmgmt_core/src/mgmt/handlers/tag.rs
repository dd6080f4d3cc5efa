//! Per-domain tag set methods.

use super::{destination, destination_mut, lines, HandlerOutput, HandlerRequest};
use crate::app::App;
use crate::error::{MgmtError, MgmtResult};
use once_cell::sync::Lazy;
use regex::Regex;

static TAG_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("tag name regex"));

pub(super) fn list(app: &App, request: &HandlerRequest<'_>) -> MgmtResult<HandlerOutput> {
    let entity = destination(app, request)?;
    Ok(HandlerOutput::read(lines(entity.tags())))
}

pub(super) fn get(app: &App, request: &HandlerRequest<'_>) -> MgmtResult<HandlerOutput> {
    let present = destination(app, request)?.tags().contains(request.argument);
    Ok(HandlerOutput::read(if present { "1" } else { "0" }))
}

pub(super) fn set(app: &mut App, request: &HandlerRequest<'_>) -> MgmtResult<HandlerOutput> {
    if !TAG_NAME_RE.is_match(request.argument) {
        return Err(MgmtError::invalid(format!(
            "invalid tag name `{}`",
            request.argument
        )));
    }
    destination_mut(app, request)?
        .tags_mut()
        .insert(request.argument.to_string());
    Ok(HandlerOutput::mutated())
}

pub(super) fn remove(app: &mut App, request: &HandlerRequest<'_>) -> MgmtResult<HandlerOutput> {
    if destination_mut(app, request)?
        .tags_mut()
        .remove(request.argument)
    {
        Ok(HandlerOutput::mutated())
    } else {
        Err(MgmtError::not_found("tag", request.argument))
    }
}

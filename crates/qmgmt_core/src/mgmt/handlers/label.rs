//! Label registry methods.

use super::{lines, HandlerOutput, HandlerRequest};
use crate::app::App;
use crate::error::{MgmtError, MgmtResult};
use crate::property::codec::printable_ascii;
use crate::property::relation::label_users;

pub(super) fn list(app: &App) -> HandlerOutput {
    HandlerOutput::read(lines(app.labels().list().map(|label| label.name.as_str())))
}

pub(super) fn get(app: &App, name: &str) -> MgmtResult<HandlerOutput> {
    app.labels()
        .get(name)
        .map(|label| HandlerOutput::read(label.color.clone()))
        .ok_or_else(|| MgmtError::not_found("label", name))
}

pub(super) fn create(app: &mut App, request: &HandlerRequest<'_>) -> MgmtResult<HandlerOutput> {
    let color = printable_ascii(request.payload).map_err(MgmtError::InvalidValue)?;
    app.labels_mut().create(request.argument, color)?;
    Ok(HandlerOutput::mutated())
}

pub(super) fn remove(app: &mut App, name: &str) -> MgmtResult<HandlerOutput> {
    if !app.labels().contains(name) {
        return Err(MgmtError::not_found("label", name));
    }
    let users = label_users(app, name);
    if !users.is_empty() {
        return Err(MgmtError::invalid(format!(
            "label `{name}` is still used by: {}",
            users.join(", ")
        )));
    }
    app.labels_mut().remove(name)?;
    Ok(HandlerOutput::mutated())
}

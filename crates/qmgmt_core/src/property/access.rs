//! Property access operations: list, get, set, reset, help.
//!
//! # Responsibility
//! - Resolve an owner (host or entity) and a descriptor by name.
//! - Coerce untrusted bytes through the descriptor codec before any write.
//! - Report values together with their default/explicit state.
//!
//! # Invariants
//! - A failed coercion never touches the owner's stored values.
//! - `get` is side-effect free and always yields a value for a known property.
//! - Reset only clears the explicit value; the default applies afterwards.

use crate::app::App;
use crate::property::codec::bool_literal;
use crate::property::relation::check_provider_unused;
use crate::property::descriptor::{
    DefaultValue, Owner, PropertyDescriptor, PropertyScope, Storage,
};
use crate::property::schema::{host_schema, schema_for, PropertySchema};
use crate::property::value::{PropertyBag, PropertyType, PropertyValue};
use crate::repo::domain_repo::{Qid, RegistryError};
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type PropertyResult<T> = Result<T, PropertyError>;

/// Property access errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyError {
    /// The owning entity does not exist.
    OwnerNotFound(Qid),
    /// No descriptor with this name in the owner's schema.
    NotFound(String),
    /// The value failed type coercion or a relation check.
    InvalidValue { property: String, reason: String },
    ReadOnly(String),
    NotResettable(String),
}

impl Display for PropertyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OwnerNotFound(qid) => write!(f, "domain not found: qid={qid}"),
            Self::NotFound(name) => write!(f, "no such property: {name}"),
            Self::InvalidValue { property, reason } => {
                write!(f, "invalid value for property `{property}`: {reason}")
            }
            Self::ReadOnly(name) => write!(f, "property is read-only: {name}"),
            Self::NotResettable(name) => write!(f, "property cannot be reset: {name}"),
        }
    }
}

impl Error for PropertyError {}

/// Owner selector for mutable access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyTarget {
    Host,
    Domain(Qid),
}

/// Result of a property read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyReading {
    pub is_default: bool,
    pub property_type: PropertyType,
    /// Wire-formatted value.
    pub value: String,
}

impl Display for PropertyReading {
    /// Renders `default=<True|False> type=<tag> <value>`.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "default={} type={} {}",
            bool_literal(self.is_default),
            self.property_type,
            self.value
        )
    }
}

fn scope_for(app: &App, target: PropertyTarget) -> PropertyResult<PropertyScope<'_>> {
    match target {
        PropertyTarget::Host => Ok(PropertyScope::new(app, Owner::Host)),
        PropertyTarget::Domain(qid) => app
            .domains()
            .get(qid)
            .map(|entity| PropertyScope::new(app, Owner::Domain(entity)))
            .ok_or(PropertyError::OwnerNotFound(qid)),
    }
}

fn schema_of(owner: Owner<'_>) -> &'static PropertySchema {
    match owner {
        Owner::Host => host_schema(),
        Owner::Domain(entity) => schema_for(entity.class()),
    }
}

fn bag_of<'a>(scope: &PropertyScope<'a>) -> &'a PropertyBag {
    match scope.owner {
        Owner::Host => scope.app.host_properties(),
        Owner::Domain(entity) => entity.properties(),
    }
}

fn lookup(owner: Owner<'_>, name: &str) -> PropertyResult<&'static PropertyDescriptor> {
    schema_of(owner)
        .get(name)
        .ok_or_else(|| PropertyError::NotFound(name.to_string()))
}

/// Effective value and whether it came from the default.
pub(crate) fn resolve(
    scope: &PropertyScope<'_>,
    descriptor: &PropertyDescriptor,
) -> (bool, PropertyValue) {
    match (descriptor.storage, scope.owner) {
        (Storage::Qid, Owner::Domain(entity)) => {
            return (false, PropertyValue::Int(i64::from(entity.qid())))
        }
        (Storage::Name, Owner::Domain(entity)) => {
            return (false, PropertyValue::Str(entity.name().to_string()))
        }
        (Storage::Uuid, Owner::Domain(entity)) => {
            return (false, PropertyValue::Str(entity.uuid().to_string()))
        }
        _ => {}
    }

    if let Some(value) = bag_of(scope).get(descriptor.name) {
        return (false, value.clone());
    }
    match default_of(scope, descriptor) {
        Some(value) => (true, value),
        None => {
            warn!(
                "event=property_unset module=property status=error property={}",
                descriptor.name
            );
            (true, descriptor.kind.blank())
        }
    }
}

fn default_of(scope: &PropertyScope<'_>, descriptor: &PropertyDescriptor) -> Option<PropertyValue> {
    match &descriptor.default {
        DefaultValue::Static(value) => Some(value.clone()),
        DefaultValue::Computed(provider) => Some(provider(scope)),
        DefaultValue::Required => None,
    }
}

// A domain cannot stop providing network while others route through it.
fn check_network_withdrawal(
    scope: &PropertyScope<'_>,
    descriptor: &PropertyDescriptor,
    next: &PropertyValue,
) -> PropertyResult<()> {
    if descriptor.name != "provides_network" || *next != PropertyValue::Bool(false) {
        return Ok(());
    }
    let Owner::Domain(entity) = scope.owner else {
        return Ok(());
    };
    check_provider_unused(scope.app, entity).map_err(|reason| PropertyError::InvalidValue {
        property: descriptor.name.to_string(),
        reason,
    })
}

/// Effective value of `name` for `owner`, or `None` if the owner's schema
/// has no such property.
pub(crate) fn effective_value(app: &App, owner: Owner<'_>, name: &str) -> Option<PropertyValue> {
    let descriptor = schema_of(owner).get(name)?;
    let scope = PropertyScope::new(app, owner);
    Some(resolve(&scope, descriptor).1)
}

/// Coerces untrusted bytes for `descriptor` in the owner's scope.
pub(crate) fn coerce(
    app: &App,
    owner: Owner<'_>,
    descriptor: &PropertyDescriptor,
    raw: &[u8],
) -> PropertyResult<PropertyValue> {
    let scope = PropertyScope::new(app, owner);
    descriptor
        .kind
        .codec()
        .decode(raw, &scope)
        .map_err(|reason| PropertyError::InvalidValue {
            property: descriptor.name.to_string(),
            reason,
        })
}

/// Property names of the owner, in declaration order.
pub fn list_properties(app: &App, target: PropertyTarget) -> PropertyResult<Vec<&'static str>> {
    let scope = scope_for(app, target)?;
    Ok(schema_of(scope.owner).names().collect())
}

/// Reads one property.
pub fn get_property(
    app: &App,
    target: PropertyTarget,
    name: &str,
) -> PropertyResult<PropertyReading> {
    let scope = scope_for(app, target)?;
    let descriptor = lookup(scope.owner, name)?;
    let (is_default, value) = resolve(&scope, descriptor);
    Ok(PropertyReading {
        is_default,
        property_type: descriptor.property_type(),
        value: descriptor.kind.codec().encode(&value, &scope),
    })
}

/// Coerces `raw` and stores it as the explicit value.
pub fn set_property(
    app: &mut App,
    target: PropertyTarget,
    name: &str,
    raw: &[u8],
) -> PropertyResult<()> {
    let (descriptor, value) = {
        let scope = scope_for(app, target)?;
        let descriptor = lookup(scope.owner, name)?;
        if !descriptor.writable {
            return Err(PropertyError::ReadOnly(descriptor.name.to_string()));
        }
        let value = coerce(app, scope.owner, descriptor, raw)?;
        check_network_withdrawal(&scope, descriptor, &value)?;
        (descriptor, value)
    };

    match (descriptor.storage, target, value) {
        (Storage::Name, PropertyTarget::Domain(qid), PropertyValue::Str(new_name)) => {
            app.domains_mut()
                .rename(qid, &new_name)
                .map_err(|err| match err {
                    RegistryError::NotFound(qid) => PropertyError::OwnerNotFound(qid),
                    other => PropertyError::InvalidValue {
                        property: descriptor.name.to_string(),
                        reason: other.to_string(),
                    },
                })?;
        }
        (Storage::Bag, target, value) => {
            bag_mut(app, target)?.set(descriptor.name, value);
        }
        _ => return Err(PropertyError::ReadOnly(descriptor.name.to_string())),
    }

    debug!(
        "event=property_set module=property status=ok target={} property={}",
        target_label(target),
        descriptor.name
    );
    Ok(())
}

/// Clears the explicit value so the default applies again.
pub fn reset_property(app: &mut App, target: PropertyTarget, name: &str) -> PropertyResult<()> {
    let descriptor = {
        let scope = scope_for(app, target)?;
        let descriptor = lookup(scope.owner, name)?;
        if !descriptor.resettable || descriptor.storage != Storage::Bag {
            return Err(PropertyError::NotResettable(descriptor.name.to_string()));
        }
        if let Some(fallback) = default_of(&scope, descriptor) {
            check_network_withdrawal(&scope, descriptor, &fallback)?;
        }
        descriptor
    };

    let was_explicit = bag_mut(app, target)?.clear(descriptor.name);
    debug!(
        "event=property_reset module=property status=ok target={} property={} was_explicit={}",
        target_label(target),
        descriptor.name,
        was_explicit
    );
    Ok(())
}

/// Help text of one property.
pub fn property_help(
    app: &App,
    target: PropertyTarget,
    name: &str,
) -> PropertyResult<&'static str> {
    let scope = scope_for(app, target)?;
    Ok(lookup(scope.owner, name)?.help)
}

/// Help text of one property as a reStructuredText attribute block.
pub fn property_help_rst(
    app: &App,
    target: PropertyTarget,
    name: &str,
) -> PropertyResult<String> {
    let scope = scope_for(app, target)?;
    let descriptor = lookup(scope.owner, name)?;
    Ok(format!(
        ".. attribute:: {}\n   :type: {}\n\n   {}\n",
        descriptor.name,
        descriptor.property_type(),
        descriptor.help
    ))
}

fn bag_mut(app: &mut App, target: PropertyTarget) -> PropertyResult<&mut PropertyBag> {
    match target {
        PropertyTarget::Host => Ok(app.host_properties_mut()),
        PropertyTarget::Domain(qid) => app
            .domains_mut()
            .get_mut(qid)
            .map(|entity| entity.properties_mut())
            .ok_or(PropertyError::OwnerNotFound(qid)),
    }
}

fn target_label(target: PropertyTarget) -> String {
    match target {
        PropertyTarget::Host => "host".to_string(),
        PropertyTarget::Domain(qid) => format!("qid:{qid}"),
    }
}

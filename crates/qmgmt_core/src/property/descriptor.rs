//! Property descriptor declarations.
//!
//! # Responsibility
//! - Describe one named, typed property: value rule, default, storage,
//!   write/reset capability and help text.
//!
//! # Invariants
//! - A descriptor whose default is `Required` is never resettable, so a read
//!   always has either an explicit value or a default.
//! - Identity descriptors (`qid`, `uuid`) are read-only.

use crate::app::App;
use crate::model::entity::Entity;
use crate::property::value::{PropertyType, PropertyValue};

/// Owner of the property being read or written.
#[derive(Debug, Clone, Copy)]
pub enum Owner<'a> {
    /// Application-level (host) properties.
    Host,
    Domain(&'a Entity),
}

/// Read-only context handed to default providers and value codecs.
#[derive(Clone, Copy)]
pub struct PropertyScope<'a> {
    pub app: &'a App,
    pub owner: Owner<'a>,
}

impl<'a> PropertyScope<'a> {
    pub fn new(app: &'a App, owner: Owner<'a>) -> Self {
        Self { app, owner }
    }

    /// Owning entity, when the scope is not the host.
    pub fn entity(&self) -> Option<&'a Entity> {
        match self.owner {
            Owner::Host => None,
            Owner::Domain(entity) => Some(entity),
        }
    }
}

/// Computed default provider.
pub type DefaultFn = fn(&PropertyScope<'_>) -> PropertyValue;

/// Fallback used when no explicit value is stored.
#[derive(Clone)]
pub enum DefaultValue {
    Static(PropertyValue),
    Computed(DefaultFn),
    /// No fallback; a value must be supplied when the owner is created.
    Required,
}

impl std::fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static(value) => f.debug_tuple("Static").field(value).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
            Self::Required => f.write_str("Required"),
        }
    }
}

/// Extra constraint on `str` properties. All of them require printable ASCII.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrRule {
    Printable,
    VmName,
    Ipv4,
}

/// Extra constraint on `int` properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntRule {
    Any,
    Positive,
}

/// Cross-entity check applied to `vm` properties after name resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Any,
    /// Network provider edge: no self-loop, target provides network, no cycle.
    NetVm,
    /// Target provides network (no owner-relative checks).
    NetworkProvider,
    /// Target is a `TemplateVM`.
    Template,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmRule {
    /// Whether an empty value stores an explicit "no VM".
    pub nullable: bool,
    pub relation: Relation,
}

/// Value type of a property together with its type-specific rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Str(StrRule),
    Int(IntRule),
    Bool,
    Label,
    Vm(VmRule),
}

impl PropertyKind {
    pub fn property_type(self) -> PropertyType {
        match self {
            Self::Str(_) => PropertyType::Str,
            Self::Int(_) => PropertyType::Int,
            Self::Bool => PropertyType::Bool,
            Self::Label => PropertyType::Label,
            Self::Vm(_) => PropertyType::Vm,
        }
    }

    /// Neutral value reported if a required property is somehow unset.
    pub(crate) fn blank(self) -> PropertyValue {
        match self {
            Self::Str(_) => PropertyValue::Str(String::new()),
            Self::Int(_) => PropertyValue::Int(0),
            Self::Bool => PropertyValue::Bool(false),
            Self::Label => PropertyValue::Label(String::new()),
            Self::Vm(_) => PropertyValue::Vm(None),
        }
    }
}

/// Where a property value lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    /// The owner's `PropertyBag`.
    Bag,
    /// Entity identity fields.
    Qid,
    Name,
    Uuid,
}

/// One property schema element.
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    pub name: &'static str,
    pub kind: PropertyKind,
    pub default: DefaultValue,
    pub storage: Storage,
    pub writable: bool,
    pub resettable: bool,
    pub help: &'static str,
}

impl PropertyDescriptor {
    /// Writable bag-stored property.
    pub fn new(
        name: &'static str,
        kind: PropertyKind,
        default: DefaultValue,
        help: &'static str,
    ) -> Self {
        let resettable = !matches!(default, DefaultValue::Required);
        Self {
            name,
            kind,
            default,
            storage: Storage::Bag,
            writable: true,
            resettable,
            help,
        }
    }

    /// Read-only property backed by an entity identity field.
    pub fn identity(
        name: &'static str,
        kind: PropertyKind,
        storage: Storage,
        help: &'static str,
    ) -> Self {
        Self {
            name,
            kind,
            default: DefaultValue::Required,
            storage,
            writable: false,
            resettable: false,
            help,
        }
    }

    pub fn stored_in(mut self, storage: Storage) -> Self {
        self.storage = storage;
        self
    }

    pub fn property_type(&self) -> PropertyType {
        self.kind.property_type()
    }
}

#[cfg(test)]
mod tests {
    use super::{DefaultValue, PropertyDescriptor, PropertyKind, Storage, StrRule};
    use crate::property::value::{PropertyType, PropertyValue};

    #[test]
    fn required_default_is_never_resettable() {
        let descriptor = PropertyDescriptor::new(
            "label",
            PropertyKind::Label,
            DefaultValue::Required,
            "label help",
        );
        assert!(descriptor.writable);
        assert!(!descriptor.resettable);
    }

    #[test]
    fn identity_descriptors_are_read_only() {
        let descriptor = PropertyDescriptor::identity(
            "uuid",
            PropertyKind::Str(StrRule::Printable),
            Storage::Uuid,
            "uuid help",
        );
        assert!(!descriptor.writable);
        assert!(!descriptor.resettable);
        assert_eq!(descriptor.property_type(), PropertyType::Str);
    }

    #[test]
    fn static_default_is_resettable() {
        let descriptor = PropertyDescriptor::new(
            "autostart",
            PropertyKind::Bool,
            DefaultValue::Static(PropertyValue::Bool(false)),
            "autostart help",
        );
        assert!(descriptor.resettable);
        assert_eq!(descriptor.storage, Storage::Bag);
    }
}

//! Property schemas per entity class and for the host.
//!
//! # Responsibility
//! - Declare the ordered property set of every class.
//! - Provide computed defaults that depend on the owner or the host.
//!
//! # Invariants
//! - Declaration order is the order reported by property listing.
//! - Property names are unique within a schema.

use crate::model::vm_class::VmClass;
use crate::property::access::effective_value;
use crate::property::descriptor::{
    DefaultValue, IntRule, Owner, PropertyDescriptor, PropertyKind, PropertyScope, Relation,
    Storage, StrRule, VmRule,
};
use crate::property::relation::provides_network;
use crate::property::value::PropertyValue;
use once_cell::sync::Lazy;

const NAME_HELP: &str = "User-specified name of the domain.";
const LABEL_HELP: &str =
    "Colourful label assigned to VM. This is where the colour of the padlock is set.";

/// Ordered set of descriptors.
#[derive(Debug)]
pub struct PropertySchema {
    descriptors: Vec<PropertyDescriptor>,
}

impl PropertySchema {
    fn from_descriptors(descriptors: Vec<PropertyDescriptor>) -> Self {
        debug_assert!(
            descriptors
                .iter()
                .enumerate()
                .all(|(i, d)| descriptors[..i].iter().all(|prev| prev.name != d.name)),
            "duplicate property name in schema"
        );
        Self { descriptors }
    }

    pub fn get(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.descriptors.iter().find(|descriptor| descriptor.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.descriptors.iter().map(|descriptor| descriptor.name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

static ADMIN_VM_SCHEMA: Lazy<PropertySchema> = Lazy::new(|| {
    PropertySchema::from_descriptors(identity_descriptors(
        PropertyDescriptor::identity(
            "name",
            PropertyKind::Str(StrRule::VmName),
            Storage::Name,
            NAME_HELP,
        ),
        DefaultValue::Static(PropertyValue::Label("black".to_string())),
    ))
});

static APP_VM_SCHEMA: Lazy<PropertySchema> = Lazy::new(|| {
    let mut descriptors = identity_descriptors(guest_name(), DefaultValue::Required);
    descriptors.push(PropertyDescriptor::new(
        "template",
        PropertyKind::Vm(VmRule {
            nullable: false,
            relation: Relation::Template,
        }),
        DefaultValue::Required,
        "Template, on which this domain is based.",
    ));
    descriptors.extend(guest_descriptors());
    PropertySchema::from_descriptors(descriptors)
});

static TEMPLATE_VM_SCHEMA: Lazy<PropertySchema> = Lazy::new(|| {
    let mut descriptors = identity_descriptors(guest_name(), DefaultValue::Required);
    descriptors.extend(guest_descriptors());
    PropertySchema::from_descriptors(descriptors)
});

static STANDALONE_VM_SCHEMA: Lazy<PropertySchema> = Lazy::new(|| {
    let mut descriptors = identity_descriptors(guest_name(), DefaultValue::Required);
    descriptors.extend(guest_descriptors());
    PropertySchema::from_descriptors(descriptors)
});

static HOST_SCHEMA: Lazy<PropertySchema> = Lazy::new(|| {
    PropertySchema::from_descriptors(vec![
        PropertyDescriptor::new(
            "default_netvm",
            PropertyKind::Vm(VmRule {
                nullable: true,
                relation: Relation::NetworkProvider,
            }),
            DefaultValue::Static(PropertyValue::Vm(None)),
            "Default network provider for domains that do not set `netvm`.",
        ),
        PropertyDescriptor::new(
            "default_template",
            PropertyKind::Vm(VmRule {
                nullable: true,
                relation: Relation::Template,
            }),
            DefaultValue::Static(PropertyValue::Vm(None)),
            "Default template for new AppVMs.",
        ),
        PropertyDescriptor::new(
            "default_kernel",
            PropertyKind::Str(StrRule::Printable),
            DefaultValue::Static(PropertyValue::Str(String::new())),
            "Default kernel version for domains that do not set `kernel`.",
        ),
        PropertyDescriptor::new(
            "clockvm",
            PropertyKind::Vm(VmRule {
                nullable: true,
                relation: Relation::Any,
            }),
            DefaultValue::Static(PropertyValue::Vm(None)),
            "Domain used as the network time source.",
        ),
        PropertyDescriptor::new(
            "updatevm",
            PropertyKind::Vm(VmRule {
                nullable: true,
                relation: Relation::Any,
            }),
            DefaultValue::Static(PropertyValue::Vm(None)),
            "Domain used to download updates for the control domain.",
        ),
        PropertyDescriptor::new(
            "check_updates_vm",
            PropertyKind::Bool,
            DefaultValue::Static(PropertyValue::Bool(true)),
            "Check for updates inside domains.",
        ),
    ])
});

/// Schema of an entity class.
pub fn schema_for(class: VmClass) -> &'static PropertySchema {
    match class {
        VmClass::AdminVm => &*ADMIN_VM_SCHEMA,
        VmClass::AppVm => &*APP_VM_SCHEMA,
        VmClass::TemplateVm => &*TEMPLATE_VM_SCHEMA,
        VmClass::StandaloneVm => &*STANDALONE_VM_SCHEMA,
    }
}

/// Schema of host-level properties.
pub fn host_schema() -> &'static PropertySchema {
    &*HOST_SCHEMA
}

// Guests can be renamed; the privileged domain's name is fixed.
fn guest_name() -> PropertyDescriptor {
    PropertyDescriptor::new(
        "name",
        PropertyKind::Str(StrRule::VmName),
        DefaultValue::Required,
        NAME_HELP,
    )
    .stored_in(Storage::Name)
}

fn identity_descriptors(
    name: PropertyDescriptor,
    label_default: DefaultValue,
) -> Vec<PropertyDescriptor> {
    vec![
        PropertyDescriptor::identity(
            "qid",
            PropertyKind::Int(IntRule::Any),
            Storage::Qid,
            "Internal, persistent identifier of the domain.",
        ),
        name,
        PropertyDescriptor::identity(
            "uuid",
            PropertyKind::Str(StrRule::Printable),
            Storage::Uuid,
            "Stable UUID of the domain.",
        ),
        PropertyDescriptor::new("label", PropertyKind::Label, label_default, LABEL_HELP),
    ]
}

fn guest_descriptors() -> Vec<PropertyDescriptor> {
    vec![
        PropertyDescriptor::new(
            "netvm",
            PropertyKind::Vm(VmRule {
                nullable: true,
                relation: Relation::NetVm,
            }),
            DefaultValue::Computed(default_netvm),
            "VM that provides network connection to this domain. When empty, \
             the domain has no network access.",
        ),
        PropertyDescriptor::new(
            "provides_network",
            PropertyKind::Bool,
            DefaultValue::Static(PropertyValue::Bool(false)),
            "If this domain can act as network provider (formerly known as NetVM).",
        ),
        PropertyDescriptor::new(
            "ip",
            PropertyKind::Str(StrRule::Ipv4),
            DefaultValue::Computed(default_ip),
            "IP address of this domain.",
        ),
        PropertyDescriptor::new(
            "autostart",
            PropertyKind::Bool,
            DefaultValue::Static(PropertyValue::Bool(false)),
            "Setting this to `True` means that the domain will be started on \
             host boot.",
        ),
        PropertyDescriptor::new(
            "include_in_backups",
            PropertyKind::Bool,
            DefaultValue::Static(PropertyValue::Bool(true)),
            "If this domain is to be included in default backup.",
        ),
        PropertyDescriptor::new(
            "debug",
            PropertyKind::Bool,
            DefaultValue::Static(PropertyValue::Bool(false)),
            "Turns on debugging features.",
        ),
        PropertyDescriptor::new(
            "vcpus",
            PropertyKind::Int(IntRule::Positive),
            DefaultValue::Static(PropertyValue::Int(2)),
            "Number of virtual CPUs for this domain.",
        ),
        PropertyDescriptor::new(
            "memory",
            PropertyKind::Int(IntRule::Positive),
            DefaultValue::Static(PropertyValue::Int(400)),
            "Memory currently available for this domain, in MiB.",
        ),
        PropertyDescriptor::new(
            "maxmem",
            PropertyKind::Int(IntRule::Positive),
            DefaultValue::Static(PropertyValue::Int(4000)),
            "Maximum amount of memory available for this domain, in MiB.",
        ),
        PropertyDescriptor::new(
            "kernel",
            PropertyKind::Str(StrRule::Printable),
            DefaultValue::Computed(default_kernel),
            "Kernel used by this domain. Empty means the domain boots its own kernel.",
        ),
        PropertyDescriptor::new(
            "kernelopts",
            PropertyKind::Str(StrRule::Printable),
            DefaultValue::Static(PropertyValue::Str(String::new())),
            "Kernel command line passed to domain.",
        ),
        PropertyDescriptor::new(
            "default_user",
            PropertyKind::Str(StrRule::Printable),
            DefaultValue::Static(PropertyValue::Str("user".to_string())),
            "Default user used to run commands inside the domain.",
        ),
        PropertyDescriptor::new(
            "qrexec_timeout",
            PropertyKind::Int(IntRule::Positive),
            DefaultValue::Static(PropertyValue::Int(60)),
            "Time in seconds after which qrexec connection attempt is deemed failed.",
        ),
    ]
}

// Providers default to no upstream; everyone else follows the host default,
// unless that would point the domain at itself.
fn default_netvm(scope: &PropertyScope<'_>) -> PropertyValue {
    let Some(entity) = scope.entity() else {
        return PropertyValue::Vm(None);
    };
    if provides_network(scope.app, entity) {
        return PropertyValue::Vm(None);
    }
    match effective_value(scope.app, Owner::Host, "default_netvm") {
        Some(PropertyValue::Vm(Some(qid))) if qid != entity.qid() => PropertyValue::Vm(Some(qid)),
        _ => PropertyValue::Vm(None),
    }
}

fn default_kernel(scope: &PropertyScope<'_>) -> PropertyValue {
    effective_value(scope.app, Owner::Host, "default_kernel")
        .unwrap_or_else(|| PropertyValue::Str(String::new()))
}

fn default_ip(scope: &PropertyScope<'_>) -> PropertyValue {
    let qid = scope.entity().map_or(0, |entity| entity.qid());
    PropertyValue::Str(format!("10.137.{}.{}", qid >> 8, qid & 0xff))
}

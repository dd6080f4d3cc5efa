//! VM-like entity model.
//!
//! # Responsibility
//! - Define the record tracked by the domain registry.
//! - Validate entity names against the platform charset.
//!
//! # Invariants
//! - `qid` and `uuid` never change after construction.
//! - `name` only changes through the domain registry, which keeps its name
//!   index in sync.
//! - The privileged domain is the only entity with `qid == 0`.

use crate::model::vm_class::VmClass;
use crate::property::value::PropertyBag;
use crate::repo::domain_repo::Qid;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Qid of the privileged domain.
pub const DOM0_QID: Qid = 0;
/// Name of the privileged domain.
pub const DOM0_NAME: &str = "dom0";
/// Longest accepted entity name.
pub const MAX_VM_NAME_LEN: usize = 31;

const RESERVED_NAMES: &[&str] = &["none", "default"];

static VM_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_.-]*$").expect("valid vm name regex"));

/// Validates an entity name. Returns a reason on failure.
pub fn validate_vm_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name must not be empty".to_string());
    }
    if name.len() > MAX_VM_NAME_LEN {
        return Err(format!("name longer than {MAX_VM_NAME_LEN} characters"));
    }
    if !VM_NAME_RE.is_match(name) {
        return Err("name contains disallowed characters".to_string());
    }
    if RESERVED_NAMES.contains(&name) {
        return Err(format!("name `{name}` is reserved"));
    }
    Ok(())
}

/// One VM-like object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    qid: Qid,
    name: String,
    uuid: Uuid,
    class: VmClass,
    properties: PropertyBag,
    features: BTreeMap<String, String>,
    tags: BTreeSet<String>,
}

impl Entity {
    /// Creates an entity with a fresh uuid and no explicit properties.
    ///
    /// Name validation happens when the entity enters the registry.
    pub fn new(qid: Qid, name: impl Into<String>, class: VmClass) -> Self {
        Self::with_uuid(qid, name, class, Uuid::new_v4())
    }

    /// Creates an entity with a caller-provided uuid.
    pub fn with_uuid(qid: Qid, name: impl Into<String>, class: VmClass, uuid: Uuid) -> Self {
        Self {
            qid,
            name: name.into(),
            uuid,
            class,
            properties: PropertyBag::new(),
            features: BTreeMap::new(),
            tags: BTreeSet::new(),
        }
    }

    /// The privileged domain.
    pub fn dom0() -> Self {
        Self::new(DOM0_QID, DOM0_NAME, VmClass::AdminVm)
    }

    pub fn qid(&self) -> Qid {
        self.qid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn class(&self) -> VmClass {
        self.class
    }

    pub fn is_dom0(&self) -> bool {
        self.qid == DOM0_QID
    }

    pub fn properties(&self) -> &PropertyBag {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertyBag {
        &mut self.properties
    }

    pub fn features(&self) -> &BTreeMap<String, String> {
        &self.features
    }

    pub fn features_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.features
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn tags_mut(&mut self) -> &mut BTreeSet<String> {
        &mut self.tags
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

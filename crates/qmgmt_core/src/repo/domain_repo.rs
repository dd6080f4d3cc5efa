//! Domain registry contract and in-memory implementation.
//!
//! # Responsibility
//! - Own every entity by value, keyed by qid.
//! - Provide name lookup and insertion-ordered listing.
//!
//! # Invariants
//! - qid and name are each unique at all times.
//! - Listing order is insertion order; the privileged domain comes first
//!   because it is inserted first.
//! - Renames update the name index and the entity atomically.
//! - `dom0` names the qid-0 domain and nothing else.

use crate::model::entity::{validate_vm_name, Entity, DOM0_NAME, DOM0_QID};
use log::debug;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Small integer identity of an entity.
pub type Qid = u32;

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Domain registry errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    InvalidName { name: String, reason: String },
    DuplicateName(String),
    DuplicateQid(Qid),
    NotFound(Qid),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName { name, reason } => {
                write!(f, "invalid domain name `{name}`: {reason}")
            }
            Self::DuplicateName(name) => write!(f, "domain name already in use: {name}"),
            Self::DuplicateQid(qid) => write!(f, "domain qid already in use: {qid}"),
            Self::NotFound(qid) => write!(f, "domain not found: qid={qid}"),
        }
    }
}

impl Error for RegistryError {}

/// Registry interface for VM-like entities.
pub trait DomainRepository: Send {
    fn get(&self, qid: Qid) -> Option<&Entity>;
    fn get_mut(&mut self, qid: Qid) -> Option<&mut Entity>;
    fn find_by_name(&self, name: &str) -> Option<&Entity>;
    /// All entities in insertion order.
    fn list(&self) -> Vec<&Entity>;
    fn insert(&mut self, entity: Entity) -> RegistryResult<Qid>;
    fn remove(&mut self, qid: Qid) -> RegistryResult<Entity>;
    fn rename(&mut self, qid: Qid, new_name: &str) -> RegistryResult<()>;
    /// Smallest unused positive qid.
    fn next_free_qid(&self) -> Qid;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory domain registry.
#[derive(Debug, Default)]
pub struct InMemoryDomains {
    entities: BTreeMap<Qid, Entity>,
    order: Vec<Qid>,
    names: BTreeMap<String, Qid>,
}

impl InMemoryDomains {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the privileged domain.
    pub fn with_dom0() -> Self {
        let dom0 = Entity::dom0();
        let qid = dom0.qid();
        Self {
            names: BTreeMap::from([(dom0.name().to_string(), qid)]),
            order: vec![qid],
            entities: BTreeMap::from([(qid, dom0)]),
        }
    }
}

impl DomainRepository for InMemoryDomains {
    fn get(&self, qid: Qid) -> Option<&Entity> {
        self.entities.get(&qid)
    }

    fn get_mut(&mut self, qid: Qid) -> Option<&mut Entity> {
        self.entities.get_mut(&qid)
    }

    fn find_by_name(&self, name: &str) -> Option<&Entity> {
        let qid = self.names.get(name)?;
        self.entities.get(qid)
    }

    fn list(&self) -> Vec<&Entity> {
        self.order
            .iter()
            .filter_map(|qid| self.entities.get(qid))
            .collect()
    }

    fn insert(&mut self, entity: Entity) -> RegistryResult<Qid> {
        validate_vm_name(entity.name()).map_err(|reason| RegistryError::InvalidName {
            name: entity.name().to_string(),
            reason,
        })?;
        if (entity.name() == DOM0_NAME) != (entity.qid() == DOM0_QID) {
            return Err(reserved_name(entity.name()));
        }
        if self.entities.contains_key(&entity.qid()) {
            return Err(RegistryError::DuplicateQid(entity.qid()));
        }
        if self.names.contains_key(entity.name()) {
            return Err(RegistryError::DuplicateName(entity.name().to_string()));
        }

        let qid = entity.qid();
        debug!(
            "event=domain_insert module=repo status=ok qid={} class={}",
            qid,
            entity.class()
        );
        self.names.insert(entity.name().to_string(), qid);
        self.order.push(qid);
        self.entities.insert(qid, entity);
        Ok(qid)
    }

    fn remove(&mut self, qid: Qid) -> RegistryResult<Entity> {
        let entity = self
            .entities
            .remove(&qid)
            .ok_or(RegistryError::NotFound(qid))?;
        self.names.remove(entity.name());
        self.order.retain(|existing| *existing != qid);
        debug!("event=domain_remove module=repo status=ok qid={qid}");
        Ok(entity)
    }

    fn rename(&mut self, qid: Qid, new_name: &str) -> RegistryResult<()> {
        let current = self
            .entities
            .get(&qid)
            .map(|entity| entity.name().to_string())
            .ok_or(RegistryError::NotFound(qid))?;
        if current == new_name {
            return Ok(());
        }
        if qid == DOM0_QID || new_name == DOM0_NAME {
            return Err(reserved_name(new_name));
        }
        validate_vm_name(new_name).map_err(|reason| RegistryError::InvalidName {
            name: new_name.to_string(),
            reason,
        })?;
        if self.names.contains_key(new_name) {
            return Err(RegistryError::DuplicateName(new_name.to_string()));
        }

        self.names.remove(current.as_str());
        self.names.insert(new_name.to_string(), qid);
        if let Some(entity) = self.entities.get_mut(&qid) {
            entity.set_name(new_name.to_string());
        }
        Ok(())
    }

    fn next_free_qid(&self) -> Qid {
        (1..)
            .find(|candidate| !self.entities.contains_key(candidate))
            .unwrap_or(Qid::MAX)
    }

    fn len(&self) -> usize {
        self.entities.len()
    }
}

fn reserved_name(name: &str) -> RegistryError {
    RegistryError::InvalidName {
        name: name.to_string(),
        reason: format!("`{DOM0_NAME}` is reserved for qid {DOM0_QID}"),
    }
}

//! Application state shared by every management call.
//!
//! # Responsibility
//! - Own the domain registry, label registry and host-level properties.
//! - Create and remove entities with their required properties in place.
//!
//! # Invariants
//! - The privileged domain is always present at qid 0.
//! - A new entity enters the registry only after every required property
//!   has a coerced value.
//! - An entity still referenced by another owner is never removed.

use crate::config::MgmtConfig;
use crate::error::{MgmtError, MgmtResult};
use crate::model::entity::{validate_vm_name, Entity, DOM0_QID};
use crate::model::label::LabelRegistry;
use crate::model::vm_class::VmClass;
use crate::property::access::{coerce, effective_value};
use crate::property::descriptor::{DefaultValue, Owner, Storage};
use crate::property::relation::referrers;
use crate::property::schema::schema_for;
use crate::property::value::{PropertyBag, PropertyValue};
use crate::repo::domain_repo::{DomainRepository, InMemoryDomains, Qid};
use log::info;

/// Registry plus host state.
pub struct App {
    domains: Box<dyn DomainRepository>,
    labels: LabelRegistry,
    host_properties: PropertyBag,
    config: MgmtConfig,
}

impl App {
    /// Empty application holding only `dom0`.
    pub fn new(config: MgmtConfig) -> Self {
        Self {
            domains: Box::new(InMemoryDomains::with_dom0()),
            labels: LabelRegistry::builtin(),
            host_properties: PropertyBag::new(),
            config,
        }
    }

    /// Application backed by a caller-provided registry.
    ///
    /// # Errors
    /// - Returns `InvalidValue` when the registry already holds a different
    ///   entity under the `dom0` name.
    pub fn with_repository(
        config: MgmtConfig,
        mut domains: Box<dyn DomainRepository>,
    ) -> MgmtResult<Self> {
        if domains.get(DOM0_QID).is_none() {
            domains.insert(Entity::dom0())?;
        }
        Ok(Self {
            domains,
            labels: LabelRegistry::builtin(),
            host_properties: PropertyBag::new(),
            config,
        })
    }

    pub fn domains(&self) -> &dyn DomainRepository {
        &*self.domains
    }

    pub fn domains_mut(&mut self) -> &mut dyn DomainRepository {
        &mut *self.domains
    }

    pub fn labels(&self) -> &LabelRegistry {
        &self.labels
    }

    pub fn labels_mut(&mut self) -> &mut LabelRegistry {
        &mut self.labels
    }

    pub fn host_properties(&self) -> &PropertyBag {
        &self.host_properties
    }

    pub fn host_properties_mut(&mut self) -> &mut PropertyBag {
        &mut self.host_properties
    }

    pub fn config(&self) -> &MgmtConfig {
        &self.config
    }

    /// Resolves a destination name.
    pub fn domain_by_name(&self, name: &str) -> MgmtResult<&Entity> {
        self.domains
            .find_by_name(name)
            .ok_or_else(|| MgmtError::not_found("domain", name))
    }

    /// Creates a guest entity.
    ///
    /// `template` is only accepted for `AppVM`; when omitted there, the host
    /// `default_template` applies.
    ///
    /// # Errors
    /// - `InvalidValue` for a non-creatable class, a bad or duplicate name,
    ///   an unknown label, or a missing/unsuitable template.
    pub fn add_new_vm(
        &mut self,
        class: VmClass,
        name: &str,
        label: &str,
        template: Option<&str>,
    ) -> MgmtResult<Qid> {
        if !class.is_creatable() {
            return Err(MgmtError::invalid(format!("class {class} cannot be created")));
        }
        validate_vm_name(name).map_err(|reason| {
            MgmtError::invalid(format!("invalid domain name `{name}`: {reason}"))
        })?;
        if self.domains.find_by_name(name).is_some() {
            return Err(MgmtError::invalid(format!("domain name already in use: {name}")));
        }

        let schema = schema_for(class);
        let mut entity = Entity::new(self.domains.next_free_qid(), name, class);

        if let Some(descriptor) = schema.get("label") {
            let value = coerce(self, Owner::Domain(&entity), descriptor, label.as_bytes())?;
            entity.properties_mut().set(descriptor.name, value);
        }

        match (schema.get("template"), template) {
            (Some(descriptor), Some(template)) => {
                let value = coerce(self, Owner::Domain(&entity), descriptor, template.as_bytes())?;
                entity.properties_mut().set(descriptor.name, value);
            }
            (Some(descriptor), None) => {
                match effective_value(self, Owner::Host, "default_template") {
                    Some(PropertyValue::Vm(Some(qid))) => {
                        entity
                            .properties_mut()
                            .set(descriptor.name, PropertyValue::Vm(Some(qid)));
                    }
                    _ => {
                        return Err(MgmtError::invalid(
                            "template not given and no default template is set",
                        ))
                    }
                }
            }
            (None, Some(_)) => {
                return Err(MgmtError::invalid(format!(
                    "class {class} does not take a template"
                )))
            }
            (None, None) => {}
        }

        let missing = schema.iter().find(|descriptor| {
            descriptor.storage == Storage::Bag
                && matches!(descriptor.default, DefaultValue::Required)
                && !entity.properties().is_explicit(descriptor.name)
        });
        if let Some(descriptor) = missing {
            return Err(MgmtError::invalid(format!(
                "required property `{}` has no value",
                descriptor.name
            )));
        }

        let qid = self.domains.insert(entity)?;
        info!(
            "event=domain_create module=app status=ok qid={} class={}",
            qid, class
        );
        Ok(qid)
    }

    /// Removes a guest entity that nothing references anymore.
    ///
    /// Run-state checks belong to the caller, which owns the backend.
    pub fn remove_vm(&mut self, qid: Qid) -> MgmtResult<Entity> {
        if qid == DOM0_QID {
            return Err(MgmtError::invalid("dom0 cannot be removed"));
        }
        let users = referrers(self, qid);
        if !users.is_empty() {
            return Err(MgmtError::invalid(format!(
                "domain is still in use by: {}",
                users.join(", ")
            )));
        }
        let entity = self.domains.remove(qid)?;
        info!("event=domain_remove module=app status=ok qid={qid}");
        Ok(entity)
    }
}

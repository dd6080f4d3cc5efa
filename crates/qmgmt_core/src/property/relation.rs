//! Cross-entity relation checks.
//!
//! # Responsibility
//! - Validate `netvm` edges (no self-loop, provider capability, no cycle).
//! - Keep `provides_network` set while the domain still serves a `netvm`.
//! - Validate `template` edges (target class).
//! - Report which properties still reference an entity.
//!
//! # Invariants
//! - Checks read effective values (explicit or default), never raw bags only.
//! - Checks are read-only; they run before any mutation.

use crate::app::App;
use crate::model::entity::Entity;
use crate::model::vm_class::VmClass;
use crate::property::access::effective_value;
use crate::property::descriptor::Owner;
use crate::property::value::PropertyValue;
use crate::repo::domain_repo::Qid;
use std::collections::BTreeSet;

/// Effective `provides_network` flag; classes without the property never
/// provide network.
pub fn provides_network(app: &App, entity: &Entity) -> bool {
    effective_value(app, Owner::Domain(entity), "provides_network")
        .and_then(|value| value.as_bool())
        .unwrap_or(false)
}

/// Effective `netvm` target of `entity`.
pub fn effective_netvm(app: &App, entity: &Entity) -> Option<Qid> {
    effective_value(app, Owner::Domain(entity), "netvm").and_then(|value| value.as_vm())
}

pub fn check_network_provider(app: &App, target: &Entity) -> Result<(), String> {
    if provides_network(app, target) {
        Ok(())
    } else {
        Err(format!(
            "domain `{}` does not provide network",
            target.name()
        ))
    }
}

/// Validates `owner.netvm = target`.
pub fn check_netvm(app: &App, owner: &Entity, target: &Entity) -> Result<(), String> {
    if owner.qid() == target.qid() {
        return Err(format!(
            "domain `{}` cannot be its own network provider",
            owner.name()
        ));
    }
    check_network_provider(app, target)?;

    let mut visited = BTreeSet::new();
    let mut current = Some(target.qid());
    while let Some(qid) = current {
        if qid == owner.qid() {
            return Err(format!(
                "network provider `{}` would create a loop through `{}`",
                target.name(),
                owner.name()
            ));
        }
        if !visited.insert(qid) {
            break;
        }
        current = app
            .domains()
            .get(qid)
            .and_then(|entity| effective_netvm(app, entity));
    }
    Ok(())
}

/// Rejects dropping network capability from `provider` while a domain's
/// effective `netvm` or the host `default_netvm` still points at it.
pub fn check_provider_unused(app: &App, provider: &Entity) -> Result<(), String> {
    let mut users: Vec<String> = app
        .domains()
        .list()
        .into_iter()
        .filter(|entity| entity.qid() != provider.qid())
        .filter(|entity| effective_netvm(app, entity) == Some(provider.qid()))
        .map(|entity| entity.name().to_string())
        .collect();
    let host_default = effective_value(app, Owner::Host, "default_netvm").and_then(|value| value.as_vm());
    if host_default == Some(provider.qid()) {
        users.push("host.default_netvm".to_string());
    }

    if users.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "domain `{}` still provides network to: {}",
            provider.name(),
            users.join(", ")
        ))
    }
}

pub fn check_template(target: &Entity) -> Result<(), String> {
    if target.class() == VmClass::TemplateVm {
        Ok(())
    } else {
        Err(format!(
            "domain `{}` is a {}, not a TemplateVM",
            target.name(),
            target.class()
        ))
    }
}

/// Explicit references to `qid`, as `<owner>.<property>` strings.
pub fn referrers(app: &App, qid: Qid) -> Vec<String> {
    let mut found = Vec::new();
    for entity in app.domains().list() {
        if entity.qid() == qid {
            continue;
        }
        for (name, value) in entity.properties().iter() {
            if *value == PropertyValue::Vm(Some(qid)) {
                found.push(format!("{}.{}", entity.name(), name));
            }
        }
    }
    for (name, value) in app.host_properties().iter() {
        if *value == PropertyValue::Vm(Some(qid)) {
            found.push(format!("host.{name}"));
        }
    }
    found
}

/// Entities whose effective label is `label`.
pub fn label_users(app: &App, label: &str) -> Vec<String> {
    app.domains()
        .list()
        .into_iter()
        .filter(|entity| {
            effective_value(app, Owner::Domain(entity), "label")
                .is_some_and(|value| value.as_label() == Some(label))
        })
        .map(|entity| entity.name().to_string())
        .collect()
}

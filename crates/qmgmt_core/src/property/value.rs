//! Typed property values and the explicit-override store.
//!
//! # Invariants
//! - A `PropertyBag` only holds explicitly set values; absence means the
//!   descriptor default applies.
//! - Entity references are stored as qids and resolved through the domain
//!   registry at read time.

use crate::repo::domain_repo::Qid;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Wire type tag of a property (`str|int|bool|label|vm`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    Str,
    Int,
    Bool,
    Label,
    Vm,
}

impl PropertyType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Int => "int",
            Self::Bool => "bool",
            Self::Label => "label",
            Self::Vm => "vm",
        }
    }
}

impl Display for PropertyType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed property value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Str(String),
    Int(i64),
    Bool(bool),
    /// Label referenced by name.
    Label(String),
    /// Entity reference; `None` is an explicit "no VM".
    Vm(Option<Qid>),
}

impl PropertyValue {
    pub fn property_type(&self) -> PropertyType {
        match self {
            Self::Str(_) => PropertyType::Str,
            Self::Int(_) => PropertyType::Int,
            Self::Bool(_) => PropertyType::Bool,
            Self::Label(_) => PropertyType::Label,
            Self::Vm(_) => PropertyType::Vm,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_vm(&self) -> Option<Qid> {
        match self {
            Self::Vm(value) => *value,
            _ => None,
        }
    }

    pub fn as_label(&self) -> Option<&str> {
        match self {
            Self::Label(value) => Some(value.as_str()),
            _ => None,
        }
    }
}

/// Explicitly set property values of one owner, keyed by descriptor name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyBag {
    values: BTreeMap<&'static str, PropertyValue>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.values.get(name)
    }

    pub fn is_explicit(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn set(&mut self, name: &'static str, value: PropertyValue) {
        self.values.insert(name, value);
    }

    /// Drops the explicit value. Returns whether one was present.
    pub fn clear(&mut self, name: &str) -> bool {
        self.values.remove(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &PropertyValue)> {
        self.values.iter().map(|(name, value)| (*name, value))
    }
}

#[cfg(test)]
mod tests {
    use super::{PropertyBag, PropertyType, PropertyValue};

    #[test]
    fn type_tags_match_wire_names() {
        assert_eq!(PropertyValue::Str("x".into()).property_type().as_str(), "str");
        assert_eq!(PropertyValue::Int(1).property_type().as_str(), "int");
        assert_eq!(PropertyValue::Bool(true).property_type().as_str(), "bool");
        assert_eq!(PropertyValue::Label("red".into()).property_type().as_str(), "label");
        assert_eq!(PropertyType::Vm.to_string(), "vm");
    }

    #[test]
    fn bag_tracks_explicit_values_only() {
        let mut bag = PropertyBag::new();
        assert!(!bag.is_explicit("vcpus"));

        bag.set("vcpus", PropertyValue::Int(4));
        assert!(bag.is_explicit("vcpus"));
        assert_eq!(bag.get("vcpus"), Some(&PropertyValue::Int(4)));

        assert!(bag.clear("vcpus"));
        assert!(!bag.clear("vcpus"));
        assert_eq!(bag.get("vcpus"), None);
    }
}

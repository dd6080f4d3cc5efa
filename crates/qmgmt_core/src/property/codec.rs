//! Per-type value codecs.
//!
//! Each value type decodes untrusted bytes into a `PropertyValue` and
//! renders stored values back to wire text. Decoding never panics; every
//! rejection is a human-readable reason that the access layer wraps into
//! `PropertyError::InvalidValue`.

use crate::model::entity::validate_vm_name;
use crate::model::label::is_valid_label_name;
use crate::property::descriptor::{
    IntRule, Owner, PropertyKind, PropertyScope, Relation, StrRule, VmRule,
};
use crate::property::relation;
use crate::property::value::PropertyValue;
use std::net::Ipv4Addr;

pub(crate) type DecodeResult = Result<PropertyValue, String>;

/// Decode/encode capability implemented once per value type.
pub(crate) trait ValueCodec {
    fn decode(&self, raw: &[u8], scope: &PropertyScope<'_>) -> DecodeResult;
    fn encode(&self, value: &PropertyValue, scope: &PropertyScope<'_>) -> String;
}

struct BoolCodec;
struct LabelCodec;

impl PropertyKind {
    pub(crate) fn codec(&self) -> &dyn ValueCodec {
        match self {
            Self::Str(rule) => rule,
            Self::Int(rule) => rule,
            Self::Bool => &BoolCodec,
            Self::Label => &LabelCodec,
            Self::Vm(rule) => rule,
        }
    }
}

/// Decodes bytes that must be printable ASCII (0x20..=0x7e).
pub(crate) fn printable_ascii(raw: &[u8]) -> Result<&str, String> {
    if let Some(position) = raw.iter().position(|byte| !(0x20..=0x7e).contains(byte)) {
        return Err(format!(
            "value contains a non-printable or non-ASCII byte at offset {position}"
        ));
    }
    std::str::from_utf8(raw).map_err(|err| format!("value is not valid text: {err}"))
}

impl ValueCodec for StrRule {
    fn decode(&self, raw: &[u8], _scope: &PropertyScope<'_>) -> DecodeResult {
        let text = printable_ascii(raw)?;
        match self {
            Self::Printable => {}
            Self::VmName => validate_vm_name(text)?,
            Self::Ipv4 => {
                text.parse::<Ipv4Addr>()
                    .map_err(|_| format!("`{text}` is not an IPv4 address"))?;
            }
        }
        Ok(PropertyValue::Str(text.to_string()))
    }

    fn encode(&self, value: &PropertyValue, _scope: &PropertyScope<'_>) -> String {
        match value {
            PropertyValue::Str(text) => text.clone(),
            other => fallback_text(other),
        }
    }
}

impl ValueCodec for IntRule {
    fn decode(&self, raw: &[u8], _scope: &PropertyScope<'_>) -> DecodeResult {
        let text = printable_ascii(raw)?;
        let value = text
            .parse::<i64>()
            .map_err(|_| format!("`{text}` is not a base-10 integer"))?;
        if *self == Self::Positive && value <= 0 {
            return Err(format!("value must be positive, got {value}"));
        }
        Ok(PropertyValue::Int(value))
    }

    fn encode(&self, value: &PropertyValue, _scope: &PropertyScope<'_>) -> String {
        match value {
            PropertyValue::Int(number) => number.to_string(),
            other => fallback_text(other),
        }
    }
}

impl ValueCodec for BoolCodec {
    fn decode(&self, raw: &[u8], _scope: &PropertyScope<'_>) -> DecodeResult {
        match raw {
            b"True" => Ok(PropertyValue::Bool(true)),
            b"False" => Ok(PropertyValue::Bool(false)),
            _ => Err("boolean value must be exactly `True` or `False`".to_string()),
        }
    }

    fn encode(&self, value: &PropertyValue, _scope: &PropertyScope<'_>) -> String {
        match value {
            PropertyValue::Bool(flag) => bool_literal(*flag).to_string(),
            other => fallback_text(other),
        }
    }
}

impl ValueCodec for LabelCodec {
    fn decode(&self, raw: &[u8], scope: &PropertyScope<'_>) -> DecodeResult {
        let name = printable_ascii(raw)?;
        if !is_valid_label_name(name) {
            return Err(format!("`{name}` is not a valid label name"));
        }
        if scope.app.config().check_label_existence && !scope.app.labels().contains(name) {
            return Err(format!("label `{name}` does not exist"));
        }
        Ok(PropertyValue::Label(name.to_string()))
    }

    fn encode(&self, value: &PropertyValue, _scope: &PropertyScope<'_>) -> String {
        match value {
            PropertyValue::Label(name) => name.clone(),
            other => fallback_text(other),
        }
    }
}

impl ValueCodec for VmRule {
    fn decode(&self, raw: &[u8], scope: &PropertyScope<'_>) -> DecodeResult {
        if raw.is_empty() {
            return if self.nullable {
                Ok(PropertyValue::Vm(None))
            } else {
                Err("a domain name is required".to_string())
            };
        }

        let name = printable_ascii(raw)?;
        validate_vm_name(name)?;
        let target = scope
            .app
            .domains()
            .find_by_name(name)
            .ok_or_else(|| format!("no such domain: `{name}`"))?;

        match (self.relation, scope.owner) {
            (Relation::Any, _) => {}
            (Relation::NetVm, Owner::Domain(owner)) => {
                relation::check_netvm(scope.app, owner, target)?;
            }
            (Relation::NetVm, Owner::Host) | (Relation::NetworkProvider, _) => {
                relation::check_network_provider(scope.app, target)?;
            }
            (Relation::Template, _) => relation::check_template(target)?,
        }
        Ok(PropertyValue::Vm(Some(target.qid())))
    }

    fn encode(&self, value: &PropertyValue, scope: &PropertyScope<'_>) -> String {
        match value {
            PropertyValue::Vm(Some(qid)) => scope
                .app
                .domains()
                .get(*qid)
                .map(|entity| entity.name().to_string())
                .unwrap_or_default(),
            PropertyValue::Vm(None) => String::new(),
            other => fallback_text(other),
        }
    }
}

/// Wire literal for booleans.
pub fn bool_literal(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

// A stored value never disagrees with its descriptor type, but rendering
// must not fail if it ever does.
fn fallback_text(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Str(text) | PropertyValue::Label(text) => text.clone(),
        PropertyValue::Int(number) => number.to_string(),
        PropertyValue::Bool(flag) => bool_literal(*flag).to_string(),
        PropertyValue::Vm(qid) => qid.map(|q| q.to_string()).unwrap_or_default(),
    }
}

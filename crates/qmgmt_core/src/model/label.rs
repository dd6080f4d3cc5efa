//! Colour labels attached to entities.
//!
//! # Responsibility
//! - Hold the built-in label enumeration and any labels created at runtime.
//! - Validate label names and `0xRRGGBB` colour literals.
//!
//! # Invariants
//! - Label names and indices are unique.
//! - Built-in labels can never be removed.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

static LABEL_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_-]*$").expect("label name regex"));
static LABEL_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0x[0-9a-fA-F]{6}$").expect("label color regex"));

const BUILTIN_LABELS: &[(u32, &str, &str)] = &[
    (1, "red", "0xcc0000"),
    (2, "orange", "0xf57900"),
    (3, "yellow", "0xedd400"),
    (4, "green", "0x73d216"),
    (5, "gray", "0x555753"),
    (6, "blue", "0x3465a4"),
    (7, "purple", "0x75507b"),
    (8, "black", "0x000000"),
];

/// One colour label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub index: u32,
    pub name: String,
    /// Colour literal in `0xRRGGBB` form.
    pub color: String,
}

/// Label registry errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelError {
    InvalidName(String),
    InvalidColor(String),
    DuplicateName(String),
    NotFound(String),
    BuiltIn(String),
}

impl Display for LabelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(value) => write!(f, "label name is invalid: {value}"),
            Self::InvalidColor(value) => write!(f, "label color is invalid: {value}"),
            Self::DuplicateName(value) => write!(f, "label already exists: {value}"),
            Self::NotFound(value) => write!(f, "label not found: {value}"),
            Self::BuiltIn(value) => write!(f, "built-in label cannot be removed: {value}"),
        }
    }
}

impl Error for LabelError {}

/// Returns whether `value` is a syntactically valid label name.
pub fn is_valid_label_name(value: &str) -> bool {
    LABEL_NAME_RE.is_match(value)
}

/// Index-ordered label registry.
#[derive(Debug, Clone)]
pub struct LabelRegistry {
    labels: BTreeMap<u32, Label>,
}

impl Default for LabelRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LabelRegistry {
    /// Registry holding only the built-in labels.
    pub fn builtin() -> Self {
        let labels = BUILTIN_LABELS
            .iter()
            .map(|(index, name, color)| {
                (
                    *index,
                    Label {
                        index: *index,
                        name: (*name).to_string(),
                        color: (*color).to_string(),
                    },
                )
            })
            .collect();
        Self { labels }
    }

    pub fn get(&self, name: &str) -> Option<&Label> {
        self.labels.values().find(|label| label.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Labels ordered by index.
    pub fn list(&self) -> impl Iterator<Item = &Label> {
        self.labels.values()
    }

    pub fn is_builtin(name: &str) -> bool {
        BUILTIN_LABELS.iter().any(|(_, builtin, _)| *builtin == name)
    }

    /// Adds a custom label at the next free index.
    pub fn create(&mut self, name: &str, color: &str) -> Result<&Label, LabelError> {
        if !is_valid_label_name(name) {
            return Err(LabelError::InvalidName(name.to_string()));
        }
        if !LABEL_COLOR_RE.is_match(color) {
            return Err(LabelError::InvalidColor(color.to_string()));
        }
        if self.contains(name) {
            return Err(LabelError::DuplicateName(name.to_string()));
        }

        let index = self
            .labels
            .keys()
            .next_back()
            .map_or(1, |last| last + 1);
        let label = Label {
            index,
            name: name.to_string(),
            color: color.to_ascii_lowercase(),
        };
        Ok(self.labels.entry(index).or_insert(label))
    }

    /// Removes a custom label. Usage checks belong to the caller.
    pub fn remove(&mut self, name: &str) -> Result<Label, LabelError> {
        if Self::is_builtin(name) {
            return Err(LabelError::BuiltIn(name.to_string()));
        }
        let index = self
            .get(name)
            .map(|label| label.index)
            .ok_or_else(|| LabelError::NotFound(name.to_string()))?;
        self.labels
            .remove(&index)
            .ok_or_else(|| LabelError::NotFound(name.to_string()))
    }
}

//! Entity class tags and backend run states.
//!
//! # Invariants
//! - Class names are exchanged verbatim on the wire (`AdminVM`, `AppVM`, ...).
//! - `AdminVm` is never creatable through management calls.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Class tag of a VM-like entity.
///
/// Ordering follows the wire names, so `all()` is already sorted for
/// `mgmt.vmclass.List`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VmClass {
    /// The privileged control domain.
    #[serde(rename = "AdminVM")]
    AdminVm,
    /// Guest VM whose root filesystem comes from a template.
    #[serde(rename = "AppVM")]
    AppVm,
    /// Guest VM with its own root filesystem.
    #[serde(rename = "StandaloneVM")]
    StandaloneVm,
    /// Template providing root filesystems for `AppVm`s.
    #[serde(rename = "TemplateVM")]
    TemplateVm,
}

const ALL_CLASSES: &[VmClass] = &[
    VmClass::AdminVm,
    VmClass::AppVm,
    VmClass::StandaloneVm,
    VmClass::TemplateVm,
];

impl VmClass {
    /// Stable wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AdminVm => "AdminVM",
            Self::AppVm => "AppVM",
            Self::StandaloneVm => "StandaloneVM",
            Self::TemplateVm => "TemplateVM",
        }
    }

    /// Parses a wire name. Matching is case-sensitive.
    pub fn parse(value: &str) -> Option<Self> {
        ALL_CLASSES
            .iter()
            .copied()
            .find(|class| class.as_str() == value)
    }

    pub fn all() -> &'static [VmClass] {
        ALL_CLASSES
    }

    /// Whether `mgmt.vm.Create.<class>` may instantiate this class.
    pub fn is_creatable(self) -> bool {
        !matches!(self, Self::AdminVm)
    }
}

impl Display for VmClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Live power state reported by the VM-control backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Halted,
    Transient,
    Running,
    Paused,
    Suspended,
    Halting,
    Dying,
    Crashed,
    #[serde(rename = "NA")]
    Unknown,
}

impl RunState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Halted => "Halted",
            Self::Transient => "Transient",
            Self::Running => "Running",
            Self::Paused => "Paused",
            Self::Suspended => "Suspended",
            Self::Halting => "Halting",
            Self::Dying => "Dying",
            Self::Crashed => "Crashed",
            Self::Unknown => "NA",
        }
    }
}

impl Display for RunState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

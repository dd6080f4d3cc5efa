//! Management method table.
//!
//! # Responsibility
//! - Map dot-namespaced method identifiers to a closed set of variants.
//! - Carry each variant's destination class and argument/payload contract.
//!
//! # Invariants
//! - `contract` and `handler_kind` are total matches; adding a variant
//!   without a contract does not compile.
//! - `Method::parse(m.name())` returns `m` for every `m` in `Method::all()`.

use crate::error::ProtocolViolation;
use crate::model::vm_class::VmClass;
use std::borrow::Cow;
use std::fmt::{Display, Formatter};

const CREATE_PREFIX: &str = "mgmt.vm.Create.";
const CREATE_IN_POOL_PREFIX: &str = "mgmt.vm.CreateInPool.";

/// Which destinations a method accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationClass {
    Dom0Only,
    VmOnly,
    Any,
}

/// Structural requirement on the argument or payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Forbidden,
    Optional,
}

impl Presence {
    /// Checks one field; an empty byte string counts as absent.
    pub fn check(
        self,
        present: bool,
        missing: ProtocolViolation,
        unexpected: ProtocolViolation,
    ) -> Result<(), ProtocolViolation> {
        match (self, present) {
            (Self::Required, false) => Err(missing),
            (Self::Forbidden, true) => Err(unexpected),
            _ => Ok(()),
        }
    }
}

/// Shape contract of one method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContract {
    pub destination: DestinationClass,
    pub argument: Presence,
    pub payload: Presence,
}

/// Where a method body runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Registry and property state owned by this crate.
    Core,
    /// Delegated to the VM-control backend.
    Backend,
}

/// Every management method known to the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    VmClassList,
    VmCreate(VmClass),
    VmCreateInPool(VmClass),
    VmCreateTemplate,
    LabelList,
    LabelCreate,
    LabelGet,
    LabelRemove,
    PropertyList,
    PropertyGet,
    PropertyHelp,
    PropertyHelpRst,
    PropertyReset,
    PropertySet,
    PoolList,
    PoolListDrivers,
    PoolInfo,
    PoolAdd,
    PoolRemove,
    PoolVolumeList,
    PoolVolumeInfo,
    PoolVolumeListSnapshots,
    PoolVolumeSnapshot,
    PoolVolumeRevert,
    PoolVolumeResize,
    BackupExecute,
    BackupInfo,
    BackupRestore,
    VmList,
    VmClone,
    VmRemove,
    VmPropertyList,
    VmPropertyGet,
    VmPropertyHelp,
    VmPropertyHelpRst,
    VmPropertyReset,
    VmPropertySet,
    VmFeatureList,
    VmFeatureGet,
    VmFeatureCheckWithTemplate,
    VmFeatureRemove,
    VmFeatureSet,
    VmTagList,
    VmTagGet,
    VmTagSet,
    VmTagRemove,
    VmFirewallGet,
    VmFirewallList,
    VmFirewallFlush,
    VmFirewallRemoveRule,
    VmFirewallInsertRule,
    VmDevicePciAttach,
    VmDevicePciDetach,
    VmDevicePciList,
    VmDevicePciAvailable,
    VmMicrophoneAttach,
    VmMicrophoneDetach,
    VmMicrophoneStatus,
    VmVolumeList,
    VmVolumeListSnapshots,
    VmVolumeInfo,
    VmVolumeRevert,
    VmVolumeResize,
    VmStart,
    VmShutdown,
    VmPause,
    VmUnpause,
    VmKill,
}

const FIXED_METHODS: &[Method] = &[
    Method::VmClassList,
    Method::VmCreateTemplate,
    Method::LabelList,
    Method::LabelCreate,
    Method::LabelGet,
    Method::LabelRemove,
    Method::PropertyList,
    Method::PropertyGet,
    Method::PropertyHelp,
    Method::PropertyHelpRst,
    Method::PropertyReset,
    Method::PropertySet,
    Method::PoolList,
    Method::PoolListDrivers,
    Method::PoolInfo,
    Method::PoolAdd,
    Method::PoolRemove,
    Method::PoolVolumeList,
    Method::PoolVolumeInfo,
    Method::PoolVolumeListSnapshots,
    Method::PoolVolumeSnapshot,
    Method::PoolVolumeRevert,
    Method::PoolVolumeResize,
    Method::BackupExecute,
    Method::BackupInfo,
    Method::BackupRestore,
    Method::VmList,
    Method::VmClone,
    Method::VmRemove,
    Method::VmPropertyList,
    Method::VmPropertyGet,
    Method::VmPropertyHelp,
    Method::VmPropertyHelpRst,
    Method::VmPropertyReset,
    Method::VmPropertySet,
    Method::VmFeatureList,
    Method::VmFeatureGet,
    Method::VmFeatureCheckWithTemplate,
    Method::VmFeatureRemove,
    Method::VmFeatureSet,
    Method::VmTagList,
    Method::VmTagGet,
    Method::VmTagSet,
    Method::VmTagRemove,
    Method::VmFirewallGet,
    Method::VmFirewallList,
    Method::VmFirewallFlush,
    Method::VmFirewallRemoveRule,
    Method::VmFirewallInsertRule,
    Method::VmDevicePciAttach,
    Method::VmDevicePciDetach,
    Method::VmDevicePciList,
    Method::VmDevicePciAvailable,
    Method::VmMicrophoneAttach,
    Method::VmMicrophoneDetach,
    Method::VmMicrophoneStatus,
    Method::VmVolumeList,
    Method::VmVolumeListSnapshots,
    Method::VmVolumeInfo,
    Method::VmVolumeRevert,
    Method::VmVolumeResize,
    Method::VmStart,
    Method::VmShutdown,
    Method::VmPause,
    Method::VmUnpause,
    Method::VmKill,
];

impl Method {
    /// Parses a method identifier.
    ///
    /// # Errors
    /// - `UnknownMethod` for anything outside the table, including
    ///   `Create.<Class>` with an unknown or non-creatable class.
    pub fn parse(name: &str) -> Result<Self, ProtocolViolation> {
        let unknown = || ProtocolViolation::UnknownMethod(name.to_string());

        if let Some(class) = name.strip_prefix(CREATE_PREFIX) {
            return creatable_class(class).map(Self::VmCreate).ok_or_else(unknown);
        }
        if let Some(class) = name.strip_prefix(CREATE_IN_POOL_PREFIX) {
            return creatable_class(class)
                .map(Self::VmCreateInPool)
                .ok_or_else(unknown);
        }
        FIXED_METHODS
            .iter()
            .copied()
            .find(|method| method.name() == name)
            .ok_or_else(unknown)
    }

    /// Every routable method, `Create` variants expanded per creatable class.
    pub fn all() -> Vec<Self> {
        let mut methods = FIXED_METHODS.to_vec();
        for class in VmClass::all().iter().copied().filter(|c| c.is_creatable()) {
            methods.push(Self::VmCreate(class));
            methods.push(Self::VmCreateInPool(class));
        }
        methods
    }

    /// Wire identifier.
    pub fn name(self) -> Cow<'static, str> {
        let fixed = match self {
            Self::VmCreate(class) => return Cow::Owned(format!("{CREATE_PREFIX}{class}")),
            Self::VmCreateInPool(class) => {
                return Cow::Owned(format!("{CREATE_IN_POOL_PREFIX}{class}"))
            }
            Self::VmClassList => "mgmt.vmclass.List",
            Self::VmCreateTemplate => "mgmt.vm.CreateTemplate",
            Self::LabelList => "mgmt.label.List",
            Self::LabelCreate => "mgmt.label.Create",
            Self::LabelGet => "mgmt.label.Get",
            Self::LabelRemove => "mgmt.label.Remove",
            Self::PropertyList => "mgmt.property.List",
            Self::PropertyGet => "mgmt.property.Get",
            Self::PropertyHelp => "mgmt.property.Help",
            Self::PropertyHelpRst => "mgmt.property.HelpRst",
            Self::PropertyReset => "mgmt.property.Reset",
            Self::PropertySet => "mgmt.property.Set",
            Self::PoolList => "mgmt.pool.List",
            Self::PoolListDrivers => "mgmt.pool.ListDrivers",
            Self::PoolInfo => "mgmt.pool.Info",
            Self::PoolAdd => "mgmt.pool.Add",
            Self::PoolRemove => "mgmt.pool.Remove",
            Self::PoolVolumeList => "mgmt.pool.volume.List",
            Self::PoolVolumeInfo => "mgmt.pool.volume.Info",
            Self::PoolVolumeListSnapshots => "mgmt.pool.volume.ListSnapshots",
            Self::PoolVolumeSnapshot => "mgmt.pool.volume.Snapshot",
            Self::PoolVolumeRevert => "mgmt.pool.volume.Revert",
            Self::PoolVolumeResize => "mgmt.pool.volume.Resize",
            Self::BackupExecute => "mgmt.backup.Execute",
            Self::BackupInfo => "mgmt.backup.Info",
            Self::BackupRestore => "mgmt.backup.Restore",
            Self::VmList => "mgmt.vm.List",
            Self::VmClone => "mgmt.vm.Clone",
            Self::VmRemove => "mgmt.vm.Remove",
            Self::VmPropertyList => "mgmt.vm.property.List",
            Self::VmPropertyGet => "mgmt.vm.property.Get",
            Self::VmPropertyHelp => "mgmt.vm.property.Help",
            Self::VmPropertyHelpRst => "mgmt.vm.property.HelpRst",
            Self::VmPropertyReset => "mgmt.vm.property.Reset",
            Self::VmPropertySet => "mgmt.vm.property.Set",
            Self::VmFeatureList => "mgmt.vm.feature.List",
            Self::VmFeatureGet => "mgmt.vm.feature.Get",
            Self::VmFeatureCheckWithTemplate => "mgmt.vm.feature.CheckWithTemplate",
            Self::VmFeatureRemove => "mgmt.vm.feature.Remove",
            Self::VmFeatureSet => "mgmt.vm.feature.Set",
            Self::VmTagList => "mgmt.vm.tag.List",
            Self::VmTagGet => "mgmt.vm.tag.Get",
            Self::VmTagSet => "mgmt.vm.tag.Set",
            Self::VmTagRemove => "mgmt.vm.tag.Remove",
            Self::VmFirewallGet => "mgmt.vm.firewall.Get",
            Self::VmFirewallList => "mgmt.vm.firewall.List",
            Self::VmFirewallFlush => "mgmt.vm.firewall.Flush",
            Self::VmFirewallRemoveRule => "mgmt.vm.firewall.RemoveRule",
            Self::VmFirewallInsertRule => "mgmt.vm.firewall.InsertRule",
            Self::VmDevicePciAttach => "mgmt.vm.device.pci.Attach",
            Self::VmDevicePciDetach => "mgmt.vm.device.pci.Detach",
            Self::VmDevicePciList => "mgmt.vm.device.pci.List",
            Self::VmDevicePciAvailable => "mgmt.vm.device.pci.Available",
            Self::VmMicrophoneAttach => "mgmt.vm.microphone.Attach",
            Self::VmMicrophoneDetach => "mgmt.vm.microphone.Detach",
            Self::VmMicrophoneStatus => "mgmt.vm.microphone.Status",
            Self::VmVolumeList => "mgmt.vm.volume.List",
            Self::VmVolumeListSnapshots => "mgmt.vm.volume.ListSnapshots",
            Self::VmVolumeInfo => "mgmt.vm.volume.Info",
            Self::VmVolumeRevert => "mgmt.vm.volume.Revert",
            Self::VmVolumeResize => "mgmt.vm.volume.Resize",
            Self::VmStart => "mgmt.vm.Start",
            Self::VmShutdown => "mgmt.vm.Shutdown",
            Self::VmPause => "mgmt.vm.Pause",
            Self::VmUnpause => "mgmt.vm.Unpause",
            Self::VmKill => "mgmt.vm.Kill",
        };
        Cow::Borrowed(fixed)
    }

    /// Destination class and argument/payload presence.
    pub fn contract(self) -> CallContract {
        use DestinationClass::{Any, Dom0Only, VmOnly};
        use Presence::{Forbidden as F, Optional as O, Required as R};

        let (destination, argument, payload) = match self {
            Self::VmClassList | Self::LabelList | Self::PropertyList => (Dom0Only, F, F),
            Self::VmCreate(_) | Self::VmCreateInPool(_) => (Dom0Only, O, R),
            Self::VmCreateTemplate | Self::LabelCreate => (Dom0Only, R, R),
            Self::LabelGet | Self::LabelRemove => (Dom0Only, R, F),
            Self::PropertyGet | Self::PropertyHelp | Self::PropertyHelpRst | Self::PropertyReset => {
                (Dom0Only, R, F)
            }
            Self::PropertySet => (Dom0Only, R, O),
            Self::PoolList | Self::PoolListDrivers => (Dom0Only, F, F),
            Self::PoolInfo | Self::PoolRemove => (Dom0Only, R, F),
            Self::PoolAdd => (Dom0Only, R, R),
            Self::PoolVolumeList
            | Self::PoolVolumeInfo
            | Self::PoolVolumeListSnapshots
            | Self::PoolVolumeSnapshot => (Dom0Only, R, F),
            Self::PoolVolumeRevert | Self::PoolVolumeResize => (Dom0Only, R, R),
            Self::BackupExecute | Self::BackupInfo => (Dom0Only, R, F),
            Self::BackupRestore => (Dom0Only, R, R),
            Self::VmList => (Any, F, F),
            Self::VmClone => (VmOnly, F, R),
            Self::VmRemove
            | Self::VmPropertyList
            | Self::VmFeatureList
            | Self::VmTagList
            | Self::VmFirewallGet
            | Self::VmFirewallList
            | Self::VmFirewallFlush
            | Self::VmDevicePciList
            | Self::VmDevicePciAvailable
            | Self::VmMicrophoneAttach
            | Self::VmMicrophoneDetach
            | Self::VmMicrophoneStatus
            | Self::VmVolumeList
            | Self::VmStart
            | Self::VmShutdown
            | Self::VmPause
            | Self::VmUnpause
            | Self::VmKill => (VmOnly, F, F),
            Self::VmPropertyGet
            | Self::VmPropertyHelp
            | Self::VmPropertyHelpRst
            | Self::VmPropertyReset
            | Self::VmFeatureGet
            | Self::VmFeatureCheckWithTemplate
            | Self::VmFeatureRemove
            | Self::VmTagGet
            | Self::VmTagSet
            | Self::VmTagRemove
            | Self::VmFirewallRemoveRule
            | Self::VmDevicePciAttach
            | Self::VmDevicePciDetach
            | Self::VmVolumeListSnapshots
            | Self::VmVolumeInfo => (VmOnly, R, F),
            Self::VmPropertySet | Self::VmFeatureSet => (VmOnly, R, O),
            Self::VmFirewallInsertRule | Self::VmVolumeRevert | Self::VmVolumeResize => {
                (VmOnly, R, R)
            }
        };
        CallContract {
            destination,
            argument,
            payload,
        }
    }

    pub fn handler_kind(self) -> HandlerKind {
        match self {
            Self::VmClassList
            | Self::VmCreate(_)
            | Self::LabelList
            | Self::LabelCreate
            | Self::LabelGet
            | Self::LabelRemove
            | Self::PropertyList
            | Self::PropertyGet
            | Self::PropertyHelp
            | Self::PropertyHelpRst
            | Self::PropertyReset
            | Self::PropertySet
            | Self::VmList
            | Self::VmRemove
            | Self::VmPropertyList
            | Self::VmPropertyGet
            | Self::VmPropertyHelp
            | Self::VmPropertyHelpRst
            | Self::VmPropertyReset
            | Self::VmPropertySet
            | Self::VmFeatureList
            | Self::VmFeatureGet
            | Self::VmFeatureCheckWithTemplate
            | Self::VmFeatureRemove
            | Self::VmFeatureSet
            | Self::VmTagList
            | Self::VmTagGet
            | Self::VmTagSet
            | Self::VmTagRemove => HandlerKind::Core,
            Self::VmCreateInPool(_)
            | Self::VmCreateTemplate
            | Self::PoolList
            | Self::PoolListDrivers
            | Self::PoolInfo
            | Self::PoolAdd
            | Self::PoolRemove
            | Self::PoolVolumeList
            | Self::PoolVolumeInfo
            | Self::PoolVolumeListSnapshots
            | Self::PoolVolumeSnapshot
            | Self::PoolVolumeRevert
            | Self::PoolVolumeResize
            | Self::BackupExecute
            | Self::BackupInfo
            | Self::BackupRestore
            | Self::VmClone
            | Self::VmFirewallGet
            | Self::VmFirewallList
            | Self::VmFirewallFlush
            | Self::VmFirewallRemoveRule
            | Self::VmFirewallInsertRule
            | Self::VmDevicePciAttach
            | Self::VmDevicePciDetach
            | Self::VmDevicePciList
            | Self::VmDevicePciAvailable
            | Self::VmMicrophoneAttach
            | Self::VmMicrophoneDetach
            | Self::VmMicrophoneStatus
            | Self::VmVolumeList
            | Self::VmVolumeListSnapshots
            | Self::VmVolumeInfo
            | Self::VmVolumeRevert
            | Self::VmVolumeResize
            | Self::VmStart
            | Self::VmShutdown
            | Self::VmPause
            | Self::VmUnpause
            | Self::VmKill => HandlerKind::Backend,
        }
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

fn creatable_class(name: &str) -> Option<VmClass> {
    VmClass::parse(name).filter(|class| class.is_creatable())
}

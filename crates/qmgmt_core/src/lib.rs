//! Management-call core for a VM-isolation platform.
//! This crate is the single source of truth for call shape, permission
//! gating and typed VM properties.

pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod mgmt;
pub mod model;
pub mod property;
pub mod repo;

pub use app::App;
pub use config::MgmtConfig;
pub use error::{MgmtError, MgmtErrorKind, MgmtResult, ProtocolViolation};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use mgmt::backend::{
    BackendCall, BackendError, BackendOutput, NoopPersistence, OfflineControl, Persistence,
    VmControl,
};
pub use mgmt::executor::{CallStage, MgmtCall, MgmtService};
pub use mgmt::gate::{
    CallContext, Denial, DenyList, EventObserver, PermissionGate, PermissionRequest,
    PolicyHandler, PERMISSION_EVENT_PREFIX, POST_EVENT_PREFIX,
};
pub use mgmt::method::{CallContract, DestinationClass, HandlerKind, Method, Presence};
pub use model::entity::{Entity, DOM0_NAME, DOM0_QID};
pub use model::label::{Label, LabelError, LabelRegistry};
pub use model::vm_class::{RunState, VmClass};
pub use property::access::{PropertyError, PropertyReading, PropertyResult, PropertyTarget};
pub use property::value::{PropertyType, PropertyValue};
pub use repo::domain_repo::{DomainRepository, InMemoryDomains, Qid, RegistryError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

//! Management call dispatch.
//!
//! # Responsibility
//! - Classify method identifiers and their call contracts.
//! - Gate every call through the permission event.
//! - Execute core handlers or delegate to the VM-control backend.
//!
//! # Invariants
//! - Every call that passes shape and destination checks fires
//!   `mgmt-permission:<method>` exactly once.

pub mod backend;
pub mod executor;
pub mod gate;
pub(crate) mod handlers;
pub mod method;

//! Domain model for VM-like entities.
//!
//! # Responsibility
//! - Define entities, class tags, run states and labels.
//!
//! # Invariants
//! - Every entity is identified by a stable `qid` and `uuid`.
//! - Relations between entities are qids, never owning pointers.

pub mod entity;
pub mod label;
pub mod vm_class;

//! Typed property model.
//!
//! # Responsibility
//! - Declare per-class property schemas with default semantics.
//! - Coerce untrusted bytes into typed values.
//! - Validate cross-entity relations before a value is stored.
//!
//! # Invariants
//! - Reading a known property always yields a value and its default state.
//! - A rejected value never reaches the owner's `PropertyBag`.

pub mod access;
pub(crate) mod codec;
pub mod descriptor;
pub mod relation;
pub mod schema;
pub mod value;

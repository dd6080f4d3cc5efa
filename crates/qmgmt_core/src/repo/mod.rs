//! Registry layer abstractions and in-memory implementations.
//!
//! # Responsibility
//! - Define the domain registry contract used by the call executor.
//! - Keep storage details out of property and dispatch code.
//!
//! # Invariants
//! - Registry writes validate names before mutation.
//! - Registry APIs return semantic errors (`NotFound`, `DuplicateName`).

pub mod domain_repo;

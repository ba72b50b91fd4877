//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the category store contract consumed by the service layer.
//! - Isolate SQLite query details from business orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `DuplicateName`,
//!   `ParentNotFound`) in addition to DB transport errors.

pub mod category_repo;

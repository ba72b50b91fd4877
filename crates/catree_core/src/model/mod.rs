//! Domain model for the category tree.
//!
//! # Responsibility
//! - Define canonical data structures used by store, service and codec.
//!
//! # Invariants
//! - Every category is identified by a store-assigned `CategoryId`.
//! - The parent/child edge is stored once, on the child.

pub mod category;

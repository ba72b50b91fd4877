//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into category tree use cases.
//! - Keep command/CLI layers decoupled from storage details.

pub mod category_service;
pub mod tree_render;

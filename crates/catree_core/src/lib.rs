//! Core domain logic for the category tree.
//! This crate is the single source of truth for tree invariants.

pub mod command;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod tabular;

pub use command::{Command, CommandHandler, CommandReply, HELP_MESSAGE};
pub use logging::{
    default_log_level, init_logging, init_stderr_logging, logging_status, LogTarget,
};
pub use model::category::{Category, CategoryId, CategoryValidationError, NewCategory};
pub use repo::category_repo::{CategoryRepository, RepoError, RepoResult, SqliteCategoryRepository};
pub use service::category_service::{
    AddedCategory, CategoryService, CategoryServiceError, ParentRef, RemovedCategory,
    EMPTY_TREE_MESSAGE,
};
pub use service::tree_render::render_tree;
pub use tabular::{ImportError, ImportReport, TabularError, DEFAULT_EXPORT_FILE_NAME};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

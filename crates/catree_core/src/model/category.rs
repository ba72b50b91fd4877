//! Category domain model.
//!
//! # Responsibility
//! - Define the single entity of the category tree.
//! - Normalize and validate category names before they reach storage.
//!
//! # Invariants
//! - `id` is assigned by the store and never changes.
//! - `name` is non-blank and globally unique (case-sensitive).
//! - `parent_id` is either `None` (root) or the id of an existing category.
//!   Children are never stored on the parent; they are derived by querying
//!   `parent_id`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned category identifier.
pub type CategoryId = i64;

/// One stored node of the category tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    /// `None` means root-level category.
    pub parent_id: Option<CategoryId>,
}

impl Category {
    /// Returns whether this category has no parent.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Category that has not been saved yet and therefore has no id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub parent_id: Option<CategoryId>,
}

impl NewCategory {
    /// Builds a root category after normalizing `name`.
    pub fn root(name: &str) -> Result<Self, CategoryValidationError> {
        Ok(Self {
            name: normalize_name(name)?,
            parent_id: None,
        })
    }

    /// Builds a child of `parent_id` after normalizing `name`.
    pub fn child(parent_id: CategoryId, name: &str) -> Result<Self, CategoryValidationError> {
        Ok(Self {
            name: normalize_name(name)?,
            parent_id: Some(parent_id),
        })
    }
}

/// Validation failures for category input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryValidationError {
    /// Name is empty after trimming surrounding whitespace.
    BlankName,
}

impl Display for CategoryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "category name must not be blank"),
        }
    }
}

impl Error for CategoryValidationError {}

/// Trims surrounding whitespace and rejects blank names.
///
/// Inner whitespace is kept; uniqueness is checked on the trimmed value.
pub fn normalize_name(name: &str) -> Result<String, CategoryValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CategoryValidationError::BlankName);
    }
    Ok(trimmed.to_string())
}

//! Category tree use-case service.
//!
//! # Responsibility
//! - Enforce name uniqueness and parent existence above the repository.
//! - Provide add (root / child by name / child by id), remove, list and
//!   render operations with human-readable outcomes.
//!
//! # Invariants
//! - A child is only created once its parent exists, so no category can
//!   become its own ancestor.
//! - Removal delegates subtree deletion to the repository cascade.
//! - Checks are check-then-act and not atomic across concurrent writers. The
//!   store's UNIQUE and FOREIGN KEY constraints catch lost races, and those
//!   surface as the same `DuplicateName` / `ParentNotFound` errors.

use crate::model::category::{
    normalize_name, Category, CategoryId, CategoryValidationError, NewCategory,
};
use crate::repo::category_repo::{CategoryRepository, RepoError};
use crate::service::tree_render::render_tree;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Text returned by `render_tree` when the store holds no categories.
pub const EMPTY_TREE_MESSAGE: &str = "Category tree is empty.";

/// How a caller referenced a parent category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentRef {
    Name(String),
    Id(CategoryId),
}

impl Display for ParentRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name(name) => write!(f, "\"{name}\""),
            Self::Id(id) => write!(f, "with ID {id}"),
        }
    }
}

/// Errors from category service operations.
///
/// `Display` is the user-facing failure text.
#[derive(Debug)]
pub enum CategoryServiceError {
    /// Category name is blank after trim.
    InvalidName,
    /// A category with this name already exists.
    DuplicateName(String),
    /// Referenced parent does not exist.
    ParentNotFound(ParentRef),
    /// Category to remove does not exist.
    NotFound(String),
    /// Storage-level failure.
    Repo(RepoError),
}

impl Display for CategoryServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "Category name must not be blank."),
            Self::DuplicateName(name) => write!(f, "Category \"{name}\" already exists."),
            Self::ParentNotFound(parent) => write!(f, "Parent category {parent} not found."),
            Self::NotFound(name) => write!(f, "Category \"{name}\" not found."),
            Self::Repo(err) => write!(f, "Storage failure: {err}"),
        }
    }
}

impl Error for CategoryServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CategoryServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::DuplicateName(name) => Self::DuplicateName(name),
            RepoError::ParentNotFound(id) => Self::ParentNotFound(ParentRef::Id(id)),
            other => Self::Repo(other),
        }
    }
}

impl From<CategoryValidationError> for CategoryServiceError {
    fn from(value: CategoryValidationError) -> Self {
        match value {
            CategoryValidationError::BlankName => Self::InvalidName,
        }
    }
}

impl CategoryServiceError {
    /// Stable machine-readable code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidName => "invalid_name",
            Self::DuplicateName(_) => "duplicate_name",
            Self::ParentNotFound(_) => "parent_not_found",
            Self::NotFound(_) => "not_found",
            Self::Repo(_) => "io_failure",
        }
    }
}

/// Successful add outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedCategory {
    pub category: Category,
    /// Parent as the caller referenced it; `None` for roots.
    pub parent: Option<ParentRef>,
}

impl AddedCategory {
    /// Confirmation text naming the created category.
    pub fn message(&self) -> String {
        match &self.parent {
            None => format!(
                "Category \"{}\" added as a root category.",
                self.category.name
            ),
            Some(parent) => format!(
                "Category \"{}\" added under parent category {parent}.",
                self.category.name
            ),
        }
    }
}

/// Successful remove outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedCategory {
    pub category: Category,
    /// Number of deleted categories, target included.
    pub removed_count: usize,
}

impl RemovedCategory {
    /// Confirmation text naming the removed category.
    pub fn message(&self) -> String {
        match self.removed_count.saturating_sub(1) {
            0 => format!("Category \"{}\" removed.", self.category.name),
            descendants => format!(
                "Category \"{}\" and its {descendants} descendant(s) removed.",
                self.category.name
            ),
        }
    }
}

/// Category tree service facade.
pub struct CategoryService<R: CategoryRepository> {
    repo: R,
}

impl<R: CategoryRepository> CategoryService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Adds a category with no parent.
    pub fn add_root(&self, name: &str) -> Result<AddedCategory, CategoryServiceError> {
        let result = self.try_add_root(name);
        log_outcome("category_add_root", &result, |added| added.category.id);
        result
    }

    /// Adds a child under the category named `parent_name`.
    pub fn add_child_by_name(
        &self,
        parent_name: &str,
        child_name: &str,
    ) -> Result<AddedCategory, CategoryServiceError> {
        let result = self.try_add_child_by_name(parent_name, child_name);
        log_outcome("category_add_child", &result, |added| added.category.id);
        result
    }

    /// Adds a child under the category with id `parent_id`.
    pub fn add_child_by_id(
        &self,
        parent_id: CategoryId,
        child_name: &str,
    ) -> Result<AddedCategory, CategoryServiceError> {
        let result = self.try_add_child_by_id(parent_id, child_name);
        log_outcome("category_add_child", &result, |added| added.category.id);
        result
    }

    /// Removes the category named `name` together with all descendants.
    pub fn remove(&self, name: &str) -> Result<RemovedCategory, CategoryServiceError> {
        let result = self.try_remove(name);
        log_outcome("category_remove", &result, |removed| removed.category.id);
        result
    }

    /// Lists every category in store order.
    pub fn list_all(&self) -> Result<Vec<Category>, CategoryServiceError> {
        self.repo.find_all().map_err(Into::into)
    }

    /// Finds one category by exact name.
    pub fn find_by_name(&self, name: &str) -> Result<Option<Category>, CategoryServiceError> {
        self.repo.find_by_name(name.trim()).map_err(Into::into)
    }

    /// Renders the whole tree, or `EMPTY_TREE_MESSAGE` when nothing is stored.
    pub fn render_tree(&self) -> Result<String, CategoryServiceError> {
        let categories = self.list_all()?;
        info!(
            "event=category_render module=category_service status=ok count={}",
            categories.len()
        );
        if categories.is_empty() {
            return Ok(EMPTY_TREE_MESSAGE.to_string());
        }
        Ok(render_tree(&categories))
    }

    fn try_add_root(&self, name: &str) -> Result<AddedCategory, CategoryServiceError> {
        let new_category = NewCategory::root(name)?;
        self.ensure_name_free(&new_category.name)?;
        let category = self.repo.save(&new_category)?;
        Ok(AddedCategory {
            category,
            parent: None,
        })
    }

    fn try_add_child_by_name(
        &self,
        parent_name: &str,
        child_name: &str,
    ) -> Result<AddedCategory, CategoryServiceError> {
        let child_name = normalize_name(child_name)?;
        let parent_name = parent_name.trim();
        let parent = self.repo.find_by_name(parent_name)?.ok_or_else(|| {
            CategoryServiceError::ParentNotFound(ParentRef::Name(parent_name.to_string()))
        })?;

        let parent_ref = ParentRef::Name(parent.name.clone());
        self.add_child(parent, &child_name, parent_ref)
    }

    fn try_add_child_by_id(
        &self,
        parent_id: CategoryId,
        child_name: &str,
    ) -> Result<AddedCategory, CategoryServiceError> {
        let child_name = normalize_name(child_name)?;
        let parent = self
            .repo
            .find_by_id(parent_id)?
            .ok_or(CategoryServiceError::ParentNotFound(ParentRef::Id(parent_id)))?;

        self.add_child(parent, &child_name, ParentRef::Id(parent_id))
    }

    fn add_child(
        &self,
        parent: Category,
        child_name: &str,
        parent_ref: ParentRef,
    ) -> Result<AddedCategory, CategoryServiceError> {
        self.ensure_name_free(child_name)?;
        let new_category = NewCategory::child(parent.id, child_name)?;
        let category = self.repo.save(&new_category).map_err(|err| match err {
            // Parent vanished between lookup and insert.
            RepoError::ParentNotFound(_) => {
                CategoryServiceError::ParentNotFound(parent_ref.clone())
            }
            other => other.into(),
        })?;
        Ok(AddedCategory {
            category,
            parent: Some(parent_ref),
        })
    }

    fn try_remove(&self, name: &str) -> Result<RemovedCategory, CategoryServiceError> {
        let name = name.trim();
        let category = self
            .repo
            .find_by_name(name)?
            .ok_or_else(|| CategoryServiceError::NotFound(name.to_string()))?;

        let removed_count = self.repo.delete(category.id).map_err(|err| match err {
            RepoError::NotFound(_) => CategoryServiceError::NotFound(name.to_string()),
            other => other.into(),
        })?;
        Ok(RemovedCategory {
            category,
            removed_count,
        })
    }

    fn ensure_name_free(&self, name: &str) -> Result<(), CategoryServiceError> {
        if self.repo.find_by_name(name)?.is_some() {
            return Err(CategoryServiceError::DuplicateName(name.to_string()));
        }
        Ok(())
    }
}

fn log_outcome<T>(
    event: &str,
    result: &Result<T, CategoryServiceError>,
    id_of: impl FnOnce(&T) -> CategoryId,
) {
    match result {
        Ok(value) => info!(
            "event={event} module=category_service status=ok category_id={}",
            id_of(value)
        ),
        Err(CategoryServiceError::Repo(err)) => warn!(
            "event={event} module=category_service status=error error_code=io_failure error={err}"
        ),
        Err(err) => info!(
            "event={event} module=category_service status=rejected error_code={}",
            err.code()
        ),
    }
}

//! Category service

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::Category;
use crate::ports::Repository;

pub struct CategoryService<R: Repository> {
    repository: Arc<R>,
}

impl<R: Repository> CategoryService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// All categories ordered by title
    pub fn list(&self) -> Result<Vec<Category>> {
        self.repository.atomically(|session| session.get_categories())
    }

    /// Delete a category; transactions that referenced it keep existing
    /// without a category.
    pub fn delete(&self, id: Uuid) -> Result<()> {
        if !self.repository.delete_category(id)? {
            return Err(Error::not_found(format!("Category {}", id)));
        }
        Ok(())
    }
}

//! Category management service

use crate::{
    error::{AppError, AppResult},
    models::category::{Category, CategoryRequest},
    repository::Repository,
};

#[derive(Clone)]
pub struct CategoriesService {
    repository: Repository,
}

impl CategoriesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Category> {
        self.repository.categories.get_by_id(id).await
    }

    pub async fn list(&self) -> AppResult<Vec<Category>> {
        self.repository.categories.list().await
    }

    pub async fn search_by_name(&self, name: &str) -> AppResult<Vec<Category>> {
        self.repository.categories.search_by_name(name).await
    }

    pub async fn create(&self, data: CategoryRequest) -> AppResult<Category> {
        if self.repository.categories.name_exists(&data.name, None).await? {
            return Err(AppError::Conflict(format!(
                "Category '{}' already exists",
                data.name.trim()
            )));
        }

        let category = self.repository.categories.create(&data).await?;
        tracing::info!("Created category {}", category.id);
        Ok(category)
    }

    pub async fn update(&self, id: i64, data: CategoryRequest) -> AppResult<Category> {
        // Existence first so a missing id reports NotFound, not Conflict
        self.repository.categories.get_by_id(id).await?;

        if self.repository.categories.name_exists(&data.name, Some(id)).await? {
            return Err(AppError::Conflict(format!(
                "Category '{}' already exists",
                data.name.trim()
            )));
        }

        let category = self.repository.categories.update(id, &data).await?;
        tracing::info!("Updated category {}", id);
        Ok(category)
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.repository.categories.delete(id).await?;
        tracing::info!("Deleted category {}", id);
        Ok(())
    }
}

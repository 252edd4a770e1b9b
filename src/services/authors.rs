//! Author management service

use crate::{
    error::AppResult,
    models::author::{Author, AuthorRequest},
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthorsService {
    repository: Repository,
}

impl AuthorsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Author> {
        self.repository.authors.get_by_id(id).await
    }

    pub async fn list(&self) -> AppResult<Vec<Author>> {
        self.repository.authors.list().await
    }

    pub async fn search_by_name(&self, name: &str) -> AppResult<Vec<Author>> {
        self.repository.authors.search_by_name(name).await
    }

    pub async fn create(&self, data: AuthorRequest) -> AppResult<Author> {
        let author = self.repository.authors.create(&data).await?;
        tracing::info!("Created author {}", author.id);
        Ok(author)
    }

    pub async fn update(&self, id: i64, data: AuthorRequest) -> AppResult<Author> {
        let author = self.repository.authors.update(id, &data).await?;
        tracing::info!("Updated author {}", id);
        Ok(author)
    }

    /// Delete an author together with its books and their loans
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.repository.authors.delete(id).await?;
        tracing::info!("Deleted author {}", id);
        Ok(())
    }
}

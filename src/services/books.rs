//! Book catalog service

use crate::{
    error::{AppError, AppResult},
    models::book::{isbn_key, Book, BookRequest},
    repository::Repository,
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    pub async fn list(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list().await
    }

    pub async fn search_by_title(&self, title: &str) -> AppResult<Vec<Book>> {
        self.repository.books.search_by_title(title).await
    }

    pub async fn list_by_author(&self, author_id: i64) -> AppResult<Vec<Book>> {
        self.repository.books.list_by_author(author_id).await
    }

    pub async fn list_by_category(&self, category_id: i64) -> AppResult<Vec<Book>> {
        self.repository.books.list_by_category(category_id).await
    }

    pub async fn create(&self, data: BookRequest) -> AppResult<Book> {
        if self.repository.books.isbn_exists(data.isbn.trim(), None).await? {
            return Err(AppError::Conflict(format!(
                "ISBN {} already exists",
                data.isbn.trim()
            )));
        }
        self.check_references(&data).await?;
        data.check_copies()?;

        let book = self.repository.books.create(&data).await?;
        tracing::info!("Created book {} (isbn {})", book.id, book.isbn);
        Ok(book)
    }

    pub async fn update(&self, id: i64, data: BookRequest) -> AppResult<Book> {
        let current = self.repository.books.get_by_id(id).await?;

        if isbn_key(&current.isbn) != isbn_key(&data.isbn)
            && self
                .repository
                .books
                .isbn_exists(data.isbn.trim(), Some(id))
                .await?
        {
            return Err(AppError::Conflict(format!(
                "ISBN {} already exists",
                data.isbn.trim()
            )));
        }
        self.check_references(&data).await?;
        data.check_copies()?;

        let book = self.repository.books.update(id, &data).await?;
        tracing::info!("Updated book {}", id);
        Ok(book)
    }

    /// Delete a book and every loan of it
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!("Deleted book {}", id);
        Ok(())
    }

    async fn check_references(&self, data: &BookRequest) -> AppResult<()> {
        if !self.repository.authors.exists(data.author_id).await? {
            return Err(AppError::NotFound(format!(
                "Author {} not found",
                data.author_id
            )));
        }
        if !self.repository.categories.exists(data.category_id).await? {
            return Err(AppError::NotFound(format!(
                "Category {} not found",
                data.category_id
            )));
        }
        Ok(())
    }
}

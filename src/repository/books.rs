//! Books repository for database operations

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::book::{isbn_key, Book, BookRequest},
};

use super::contains_pattern;

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    pub async fn list(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    /// Case-insensitive substring search on the title
    pub async fn search_by_title(&self, title: &str) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            r"SELECT * FROM books WHERE title ILIKE $1 ESCAPE '\' ORDER BY title, id",
        )
        .bind(contains_pattern(title))
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    pub async fn list_by_author(&self, author_id: i64) -> AppResult<Vec<Book>> {
        let books =
            sqlx::query_as::<_, Book>("SELECT * FROM books WHERE author_id = $1 ORDER BY id")
                .bind(author_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(books)
    }

    pub async fn list_by_category(&self, category_id: i64) -> AppResult<Vec<Book>> {
        let books =
            sqlx::query_as::<_, Book>("SELECT * FROM books WHERE category_id = $1 ORDER BY id")
                .bind(category_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(books)
    }

    /// Check if another book holds the same ISBN, however it is grouped
    pub async fn isbn_exists(&self, isbn: &str, exclude_id: Option<i64>) -> AppResult<bool> {
        let key = isbn_key(isbn);
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM books WHERE isbn_key = $1 AND id != $2)",
            )
            .bind(&key)
            .bind(id)
            .fetch_one(&self.pool)
            .await?
        } else {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE isbn_key = $1)")
                .bind(&key)
                .fetch_one(&self.pool)
                .await?
        };
        Ok(exists)
    }

    pub async fn create(&self, data: &BookRequest) -> AppResult<Book> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (
                title, isbn, isbn_key, description, publication_year,
                total_copies, available_copies, author_id, category_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(data.title.trim())
        .bind(data.isbn.trim())
        .bind(isbn_key(&data.isbn))
        .bind(&data.description)
        .bind(data.publication_year)
        .bind(data.total_copies)
        .bind(data.available_copies)
        .bind(data.author_id)
        .bind(data.category_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(book)
    }

    pub async fn update(&self, id: i64, data: &BookRequest) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET
                title = $1, isbn = $2, isbn_key = $3, description = $4, publication_year = $5,
                total_copies = $6, available_copies = $7, author_id = $8, category_id = $9,
                updated_at = NOW()
            WHERE id = $10
            RETURNING *
            "#,
        )
        .bind(data.title.trim())
        .bind(data.isbn.trim())
        .bind(isbn_key(&data.isbn))
        .bind(&data.description)
        .bind(data.publication_year)
        .bind(data.total_copies)
        .bind(data.available_copies)
        .bind(data.author_id)
        .bind(data.category_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    /// Delete a book; its loans go with it
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book {} not found", id)));
        }
        Ok(())
    }

    /// Take one copy off the shelf. Returns `false` when none is left.
    ///
    /// The predicate is re-checked under the row lock, so two concurrent
    /// checkouts of the last copy cannot both succeed.
    pub async fn take_copy(&self, conn: &mut PgConnection, id: i64) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE books SET available_copies = available_copies - 1, updated_at = NOW()
            WHERE id = $1 AND available_copies > 0
            "#,
        )
        .bind(id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Put one copy back, never exceeding the total
    pub async fn release_copy(&self, conn: &mut PgConnection, id: i64) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE books SET
                available_copies = LEAST(available_copies + 1, total_copies),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(conn)
        .await?;
        Ok(())
    }
}

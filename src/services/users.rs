//! User management service

use crate::{
    error::{AppError, AppResult},
    models::user::{CreateUser, Role, UpdateUser, User},
    repository::Repository,
};

use super::auth::hash_password;

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    pub async fn list(&self) -> AppResult<Vec<User>> {
        self.repository.users.list().await
    }

    /// Exact email lookup; zero or one match
    pub async fn search_by_email(&self, email: &str) -> AppResult<Vec<User>> {
        self.repository.users.search_by_email(email).await
    }

    /// Register a new user with a hashed password
    pub async fn create(&self, data: CreateUser) -> AppResult<User> {
        let role = parse_role(&data.role)?;

        if self.repository.users.email_exists(&data.email, None).await? {
            return Err(AppError::Conflict(format!(
                "Email {} is already registered",
                data.email.trim()
            )));
        }

        let password_hash = hash_password(&data.password)?;
        let user = self
            .repository
            .users
            .create(&data.name, &data.email, &password_hash, role)
            .await?;

        tracing::info!("Registered user {} with role {}", user.id, user.role);
        Ok(user)
    }

    /// Update name, email and role; the password is untouched
    pub async fn update(&self, id: i64, data: UpdateUser) -> AppResult<User> {
        let role = parse_role(&data.role)?;
        self.repository.users.get_by_id(id).await?;

        if self.repository.users.email_exists(&data.email, Some(id)).await? {
            return Err(AppError::Conflict(format!(
                "Email {} is already registered",
                data.email.trim()
            )));
        }

        let user = self
            .repository
            .users
            .update(id, &data.name, &data.email, role)
            .await?;
        tracing::info!("Updated user {}", id);
        Ok(user)
    }

    /// Delete a user, putting back the copies held by their active loans.
    ///
    /// An unknown id surfaces from the final delete; dropping `tx` then
    /// rolls back the copies released before it.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let mut tx = self.repository.pool.begin().await?;

        let held = self
            .repository
            .loans
            .lock_active_book_ids_for_user(&mut *tx, id)
            .await?;
        for book_id in &held {
            self.repository.books.release_copy(&mut *tx, *book_id).await?;
        }

        self.repository.users.delete(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!("Deleted user {} ({} copies restored)", id, held.len());
        Ok(())
    }
}

fn parse_role(raw: &str) -> AppResult<Role> {
    raw.parse::<Role>().map_err(AppError::Validation)
}

//! Book (catalog entry) model and related types

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Hyphens and whitespace used to group ISBN digits
static ISBN_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s-]+").expect("valid ISBN separator regex"));

/// Uniqueness key of an ISBN: separators removed, letters uppercased.
///
/// `978-0-306-40615-7` and `9780306406157` share a key. The ISBN itself is
/// stored as entered.
pub fn isbn_key(isbn: &str) -> String {
    ISBN_SEPARATORS.replace_all(isbn.trim(), "").to_uppercase()
}

/// Full book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub isbn: String,
    pub description: Option<String>,
    pub publication_year: Option<i32>,
    pub total_copies: i32,
    /// Copies not currently on loan, always within `0..=total_copies`
    pub available_copies: i32,
    pub author_id: i64,
    pub category_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }
}

/// Create or update book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BookRequest {
    #[validate(
        custom(function = "crate::models::not_blank", message = "Title must not be empty"),
        length(max = 255, message = "Title must be at most 255 characters")
    )]
    pub title: String,
    #[validate(
        custom(function = "crate::models::not_blank", message = "ISBN must not be empty"),
        length(max = 32, message = "ISBN must be at most 32 characters")
    )]
    pub isbn: String,
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
    #[validate(range(min = 0, max = 9999, message = "Publication year is out of range"))]
    pub publication_year: Option<i32>,
    #[validate(range(min = 1, message = "Total copies must be greater than zero"))]
    pub total_copies: i32,
    #[validate(range(min = 0, message = "Available copies must not be negative"))]
    pub available_copies: i32,
    pub author_id: i64,
    pub category_id: i64,
}

impl BookRequest {
    /// Counter invariant that field-level rules cannot express
    pub fn check_copies(&self) -> AppResult<()> {
        if self.available_copies > self.total_copies {
            return Err(AppError::Validation(format!(
                "Available copies ({}) cannot exceed total copies ({})",
                self.available_copies, self.total_copies
            )));
        }
        Ok(())
    }
}

/// Title search parameters
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TitleQuery {
    /// Case-insensitive substring of the title
    pub titulo: String,
}

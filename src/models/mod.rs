//! Data models for Biblioteca

pub mod author;
pub mod book;
pub mod category;
pub mod loan;
pub mod user;

// Re-export commonly used types
pub use author::Author;
pub use book::Book;
pub use category::Category;
pub use loan::{Loan, LoanStatus};
pub use user::{Role, User, UserClaims};

/// `validator` rule for required text: rejects empty and whitespace-only values
pub(crate) fn not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("blank"));
    }
    Ok(())
}

//! Loan management service

use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    models::loan::{expected_return_date, CreateLoan, Loan, LoanStatus, LoanTransition, UpdateLoan},
    repository::Repository,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Loan> {
        self.repository.loans.get_by_id(id).await
    }

    pub async fn list(&self) -> AppResult<Vec<Loan>> {
        self.repository.loans.list().await
    }

    pub async fn list_by_user(&self, user_id: i64) -> AppResult<Vec<Loan>> {
        self.repository.loans.list_by_user(user_id).await
    }

    pub async fn list_by_book(&self, book_id: i64) -> AppResult<Vec<Loan>> {
        self.repository.loans.list_by_book(book_id).await
    }

    /// Filter by status label, accepting the legacy labels too
    pub async fn list_by_status(&self, status: &str) -> AppResult<Vec<Loan>> {
        let status = status.parse::<LoanStatus>().map_err(AppError::Validation)?;
        self.repository.loans.list_by_status(status).await
    }

    /// Lend a copy of a book to a user for two weeks
    pub async fn create(&self, data: CreateLoan) -> AppResult<Loan> {
        if !self.repository.users.exists(data.user_id).await? {
            return Err(AppError::NotFound(format!("User {} not found", data.user_id)));
        }
        let book = self.repository.books.get_by_id(data.book_id).await?;
        if !book.is_available() {
            return Err(AppError::Unavailable(format!(
                "Book {} has no available copies",
                book.id
            )));
        }

        let today = Utc::now().date_naive();
        let mut tx = self.repository.pool.begin().await?;

        // A concurrent checkout may have taken the last copy since the read above
        if !self.repository.books.take_copy(&mut *tx, book.id).await? {
            return Err(AppError::Unavailable(format!(
                "Book {} has no available copies",
                book.id
            )));
        }
        let loan = self
            .repository
            .loans
            .insert(
                &mut *tx,
                data.user_id,
                book.id,
                today,
                expected_return_date(today),
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Created loan {} (user {}, book {}) due {}",
            loan.id,
            loan.user_id,
            loan.book_id,
            loan.expected_return_date
        );
        Ok(loan)
    }

    /// Return a borrowed book
    pub async fn return_loan(&self, id: i64) -> AppResult<Loan> {
        let mut tx = self.repository.pool.begin().await?;

        let loan = self.repository.loans.lock_by_id(&mut *tx, id).await?;
        loan.status.transition_to(LoanStatus::Returned)?;

        let today = Utc::now().date_naive();
        let loan = self
            .repository
            .loans
            .mark_returned(&mut *tx, id, today)
            .await?;
        self.repository
            .books
            .release_copy(&mut *tx, loan.book_id)
            .await?;

        tx.commit().await?;

        tracing::info!("Returned loan {} (book {})", id, loan.book_id);
        Ok(loan)
    }

    /// Update the due date and optionally the status.
    ///
    /// A change to `Returned` performs the same bookkeeping as a return.
    pub async fn update(&self, id: i64, data: UpdateLoan) -> AppResult<Loan> {
        let mut tx = self.repository.pool.begin().await?;

        let mut loan = self.repository.loans.lock_by_id(&mut *tx, id).await?;
        let transition = match data.status {
            Some(next) => loan.status.transition_to(next)?,
            None => LoanTransition::Unchanged,
        };

        if let Some(due) = data.expected_return_date {
            if due < loan.loan_date {
                return Err(AppError::Validation(format!(
                    "Expected return date {} is before the loan date {}",
                    due, loan.loan_date
                )));
            }
            loan = self
                .repository
                .loans
                .update_due_date(&mut *tx, id, due)
                .await?;
        }

        if transition == LoanTransition::Return {
            let today = Utc::now().date_naive();
            loan = self
                .repository
                .loans
                .mark_returned(&mut *tx, id, today)
                .await?;
            self.repository
                .books
                .release_copy(&mut *tx, loan.book_id)
                .await?;
        }

        tx.commit().await?;

        tracing::info!("Updated loan {} (status {})", id, loan.status);
        Ok(loan)
    }

    /// Delete a loan; an active one gives its copy back first
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let mut tx = self.repository.pool.begin().await?;

        let loan = self.repository.loans.lock_by_id(&mut *tx, id).await?;
        if loan.status == LoanStatus::Active {
            self.repository
                .books
                .release_copy(&mut *tx, loan.book_id)
                .await?;
        }
        self.repository.loans.delete(&mut *tx, id).await?;

        tx.commit().await?;

        tracing::info!("Deleted loan {} (was {})", id, loan.status);
        Ok(())
    }
}

//! Loans repository for database operations

use chrono::NaiveDate;
use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::loan::{Loan, LoanStatus},
};

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan {} not found", id)))
    }

    /// Fetch a loan and hold its row lock until the transaction ends
    pub async fn lock_by_id(&self, conn: &mut PgConnection, id: i64) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan {} not found", id)))
    }

    pub async fn list(&self) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>("SELECT * FROM loans ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(loans)
    }

    pub async fn list_by_user(&self, user_id: i64) -> AppResult<Vec<Loan>> {
        let loans =
            sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE user_id = $1 ORDER BY id")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(loans)
    }

    pub async fn list_by_book(&self, book_id: i64) -> AppResult<Vec<Loan>> {
        let loans =
            sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE book_id = $1 ORDER BY id")
                .bind(book_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(loans)
    }

    pub async fn list_by_status(&self, status: LoanStatus) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE status = $1 ORDER BY id")
            .bind(status)
            .fetch_all(&self.pool)
            .await?;
        Ok(loans)
    }

    /// Insert a new active loan
    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        user_id: i64,
        book_id: i64,
        loan_date: NaiveDate,
        expected_return_date: NaiveDate,
    ) -> AppResult<Loan> {
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (user_id, book_id, loan_date, expected_return_date, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(loan_date)
        .bind(expected_return_date)
        .bind(LoanStatus::Active)
        .fetch_one(conn)
        .await?;
        Ok(loan)
    }

    /// Close a loan on `returned_on`
    pub async fn mark_returned(
        &self,
        conn: &mut PgConnection,
        id: i64,
        returned_on: NaiveDate,
    ) -> AppResult<Loan> {
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans SET status = $1, actual_return_date = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(LoanStatus::Returned)
        .bind(returned_on)
        .bind(id)
        .fetch_one(conn)
        .await?;
        Ok(loan)
    }

    pub async fn update_due_date(
        &self,
        conn: &mut PgConnection,
        id: i64,
        expected_return_date: NaiveDate,
    ) -> AppResult<Loan> {
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans SET expected_return_date = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(expected_return_date)
        .bind(id)
        .fetch_one(conn)
        .await?;
        Ok(loan)
    }

    pub async fn delete(&self, conn: &mut PgConnection, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM loans WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Loan {} not found", id)));
        }
        Ok(())
    }

    /// Book ids of a user's active loans, one entry per loan, rows locked
    pub async fn lock_active_book_ids_for_user(
        &self,
        conn: &mut PgConnection,
        user_id: i64,
    ) -> AppResult<Vec<i64>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT book_id FROM loans WHERE user_id = $1 AND status = $2 ORDER BY id FOR UPDATE",
        )
        .bind(user_id)
        .bind(LoanStatus::Active)
        .fetch_all(conn)
        .await?;
        Ok(ids)
    }
}

//! Loan management endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::loan::{CreateLoan, Loan, UpdateLoan},
};

use super::{AuthenticatedUser, Path, ValidatedJson};

/// List all loans
#[utoipa::path(
    get,
    path = "/emprestimos",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "List of loans", body = Vec<Loan>),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Loan>>> {
    let loans = state.services.loans.list().await?;
    Ok(Json(loans))
}

/// Get loan by ID
#[utoipa::path(
    get,
    path = "/emprestimos/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Loan details", body = Loan),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Loan>> {
    let loan = state.services.loans.get_by_id(id).await?;
    Ok(Json(loan))
}

/// Loans of a user
#[utoipa::path(
    get,
    path = "/emprestimos/buscar/usuario/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Loans of the user", body = Vec<Loan>)
    )
)]
pub async fn loans_by_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Loan>>> {
    let loans = state.services.loans.list_by_user(id).await?;
    Ok(Json(loans))
}

/// Loans of a book
#[utoipa::path(
    get,
    path = "/emprestimos/buscar/livro/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Loans of the book", body = Vec<Loan>)
    )
)]
pub async fn loans_by_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Loan>>> {
    let loans = state.services.loans.list_by_book(id).await?;
    Ok(Json(loans))
}

/// Loans in a given status
#[utoipa::path(
    get,
    path = "/emprestimos/buscar/status/{status}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("status" = String, Path, description = "ACTIVE or RETURNED (ATIVO and DEVOLVIDO also accepted)")),
    responses(
        (status = 200, description = "Loans in the status", body = Vec<Loan>),
        (status = 400, description = "Unknown status", body = crate::error::ErrorResponse)
    )
)]
pub async fn loans_by_status(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(status): Path<String>,
) -> AppResult<Json<Vec<Loan>>> {
    let loans = state.services.loans.list_by_status(&status).await?;
    Ok(Json(loans))
}

/// Create a new loan (borrow a book)
#[utoipa::path(
    post,
    path = "/emprestimos",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = CreateLoan,
    responses(
        (status = 201, description = "Loan created", body = Loan),
        (status = 400, description = "Book not available", body = crate::error::ErrorResponse),
        (status = 404, description = "User or book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    ValidatedJson(data): ValidatedJson<CreateLoan>,
) -> AppResult<(StatusCode, Json<Loan>)> {
    let loan = state.services.loans.create(data).await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// Update due date or status of a loan
#[utoipa::path(
    put,
    path = "/emprestimos/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Loan ID")),
    request_body = UpdateLoan,
    responses(
        (status = 200, description = "Loan updated", body = Loan),
        (status = 400, description = "Invalid status change", body = crate::error::ErrorResponse),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i64>,
    ValidatedJson(data): ValidatedJson<UpdateLoan>,
) -> AppResult<Json<Loan>> {
    let loan = state.services.loans.update(id, data).await?;
    Ok(Json(loan))
}

/// Return a borrowed book
#[utoipa::path(
    put,
    path = "/emprestimos/{id}/devolver",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Loan returned", body = Loan),
        (status = 400, description = "Loan already returned", body = crate::error::ErrorResponse),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Loan>> {
    let loan = state.services.loans.return_loan(id).await?;
    Ok(Json(loan))
}

/// Delete a loan, giving back its copy if still active
#[utoipa::path(
    delete,
    path = "/emprestimos/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Loan ID")),
    responses(
        (status = 204, description = "Loan deleted"),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.services.loans.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

//! API handlers for the Biblioteca REST endpoints

pub mod auth;
pub mod authors;
pub mod books;
pub mod categories;
pub mod extract;
pub mod health;
pub mod loans;
pub mod openapi;
pub mod users;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    routing::{get, post, put},
    Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::user::UserClaims, AppState};

pub use extract::{Path, Query, ValidatedJson};

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    AppError::Authentication("Missing or malformed bearer token".to_string())
                })?;

        let claims = state.services.auth.decode_token(bearer.token())?;
        Ok(AuthenticatedUser(claims))
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Authentication
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        // Authors
        .route("/autores", get(authors::list_authors).post(authors::create_author))
        .route(
            "/autores/:id",
            get(authors::get_author)
                .put(authors::update_author)
                .delete(authors::delete_author),
        )
        .route("/autores/buscar/nome", get(authors::search_authors))
        // Categories
        .route(
            "/categorias",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/categorias/:id",
            get(categories::get_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        )
        .route("/categorias/buscar/nome", get(categories::search_categories))
        // Books
        .route("/livros", get(books::list_books).post(books::create_book))
        .route(
            "/livros/:id",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        .route("/livros/buscar/titulo", get(books::search_books))
        .route("/livros/buscar/autor/:id", get(books::books_by_author))
        .route("/livros/buscar/categoria/:id", get(books::books_by_category))
        // Loans
        .route("/emprestimos", get(loans::list_loans).post(loans::create_loan))
        .route(
            "/emprestimos/:id",
            get(loans::get_loan)
                .put(loans::update_loan)
                .delete(loans::delete_loan),
        )
        .route("/emprestimos/:id/devolver", put(loans::return_loan))
        .route("/emprestimos/buscar/usuario/:id", get(loans::loans_by_user))
        .route("/emprestimos/buscar/livro/:id", get(loans::loans_by_book))
        .route("/emprestimos/buscar/status/:status", get(loans::loans_by_status))
        // Users
        .route("/usuarios", get(users::list_users))
        .route(
            "/usuarios/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/usuarios/buscar/email", get(users::search_users));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .nest("/api", api)
        .with_state(state)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, authors, books, categories, loans, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Biblioteca API",
        version = "1.0.0",
        description = "Library management REST API: catalog, users and loans"
    ),
    servers(
        (url = "/api", description = "REST API")
    ),
    paths(
        // Auth
        auth::register,
        auth::login,
        auth::me,
        // Authors
        authors::list_authors,
        authors::get_author,
        authors::search_authors,
        authors::create_author,
        authors::update_author,
        authors::delete_author,
        // Categories
        categories::list_categories,
        categories::get_category,
        categories::search_categories,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        // Books
        books::list_books,
        books::get_book,
        books::search_books,
        books::books_by_author,
        books::books_by_category,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Loans
        loans::list_loans,
        loans::get_loan,
        loans::loans_by_user,
        loans::loans_by_book,
        loans::loans_by_status,
        loans::create_loan,
        loans::update_loan,
        loans::return_loan,
        loans::delete_loan,
        // Users
        users::list_users,
        users::get_user,
        users::search_users,
        users::update_user,
        users::delete_user,
    ),
    components(
        schemas(
            crate::models::user::User,
            crate::models::user::Role,
            crate::models::user::CreateUser,
            crate::models::user::UpdateUser,
            crate::models::user::LoginRequest,
            crate::models::user::LoginResponse,
            crate::models::user::UserClaims,
            crate::models::author::Author,
            crate::models::author::AuthorRequest,
            crate::models::category::Category,
            crate::models::category::CategoryRequest,
            crate::models::book::Book,
            crate::models::book::BookRequest,
            crate::models::loan::Loan,
            crate::models::loan::LoanStatus,
            crate::models::loan::CreateLoan,
            crate::models::loan::UpdateLoan,
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login and current principal"),
        (name = "authors", description = "Author management"),
        (name = "categories", description = "Category management"),
        (name = "books", description = "Book catalog"),
        (name = "loans", description = "Loan management"),
        (name = "users", description = "User management")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token obtained from /api/auth/login"))
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_routes_and_security() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/emprestimos/{id}/devolver"));
        assert!(doc.paths.paths.contains_key("/auth/login"));
        // Served at the root, outside the documented /api server
        assert!(!doc.paths.paths.contains_key("/health"));
        assert!(!doc.paths.paths.contains_key("/ready"));

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}

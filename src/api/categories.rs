//! Category endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        author::NameQuery,
        category::{Category, CategoryRequest},
    },
};

use super::{AuthenticatedUser, Path, Query, ValidatedJson};

#[utoipa::path(
    get,
    path = "/categorias",
    tag = "categories",
    responses(
        (status = 200, description = "List of categories", body = Vec<Category>)
    )
)]
pub async fn list_categories(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<Category>>> {
    let categories = state.services.categories.list().await?;
    Ok(Json(categories))
}

#[utoipa::path(
    get,
    path = "/categorias/{id}",
    tag = "categories",
    params(("id" = i64, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category details", body = Category),
        (status = 404, description = "Category not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_category(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Category>> {
    let category = state.services.categories.get_by_id(id).await?;
    Ok(Json(category))
}

#[utoipa::path(
    get,
    path = "/categorias/buscar/nome",
    tag = "categories",
    params(NameQuery),
    responses(
        (status = 200, description = "Matching categories", body = Vec<Category>)
    )
)]
pub async fn search_categories(
    State(state): State<crate::AppState>,
    Query(query): Query<NameQuery>,
) -> AppResult<Json<Vec<Category>>> {
    let categories = state.services.categories.search_by_name(&query.nome).await?;
    Ok(Json(categories))
}

/// Create a category; names are unique regardless of case
#[utoipa::path(
    post,
    path = "/categorias",
    tag = "categories",
    security(("bearer_auth" = [])),
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Invalid input or duplicate name", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_category(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    ValidatedJson(data): ValidatedJson<CategoryRequest>,
) -> AppResult<(StatusCode, Json<Category>)> {
    let category = state.services.categories.create(data).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

#[utoipa::path(
    put,
    path = "/categorias/{id}",
    tag = "categories",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Category ID")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = Category),
        (status = 400, description = "Invalid input or duplicate name", body = crate::error::ErrorResponse),
        (status = 404, description = "Category not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_category(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i64>,
    ValidatedJson(data): ValidatedJson<CategoryRequest>,
) -> AppResult<Json<Category>> {
    let category = state.services.categories.update(id, data).await?;
    Ok(Json(category))
}

#[utoipa::path(
    delete,
    path = "/categorias/{id}",
    tag = "categories",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_category(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.services.categories.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

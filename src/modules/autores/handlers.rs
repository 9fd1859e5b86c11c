use axum::{extract::State, http::StatusCode, Json};
use biblioteca_http::{ApiPath, ApiQuery, AppError, Validated};

use super::models::{AuthorRequest, AuthorResponse};
use crate::modules::libros::BookResponse;
use crate::pagination::{Page, PageQuery};
use crate::state::AppState;

/// Sortable properties and the columns behind them
pub(super) const SORTABLE: &[(&str, &str)] = &[
    ("id", "id"),
    ("nombre", "nombre"),
    ("apellido", "apellido"),
    ("nacionalidad", "nacionalidad"),
    ("fechaNacimiento", "fecha_nacimiento"),
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
];

pub(super) async fn create(
    State(state): State<AppState>,
    Validated(data): Validated<AuthorRequest>,
) -> Result<(StatusCode, Json<AuthorResponse>), AppError> {
    let author = state.authors.create(data).await?;
    Ok((StatusCode::CREATED, Json(author)))
}

pub(super) async fn get_by_id(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<AuthorResponse>, AppError> {
    Ok(Json(state.authors.get_by_id(id).await?))
}

pub(super) async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Page<AuthorResponse>>, AppError> {
    let request = query
        .resolve(&state.pagination, SORTABLE)
        .map_err(|errors| AppError::validation(&errors))?;
    Ok(Json(state.authors.list(&request).await?))
}

pub(super) async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    Validated(data): Validated<AuthorRequest>,
) -> Result<Json<AuthorResponse>, AppError> {
    Ok(Json(state.authors.update(id, data).await?))
}

pub(super) async fn deactivate(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, AppError> {
    state.authors.deactivate(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn list_books(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Vec<BookResponse>>, AppError> {
    Ok(Json(state.books.list_by_author(id).await?))
}

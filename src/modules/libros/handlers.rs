use axum::{extract::State, http::StatusCode, Json};
use biblioteca_http::{ApiPath, ApiQuery, AppError, Validated};

use super::models::{BookRequest, BookResponse};
use crate::pagination::{Page, PageQuery};
use crate::state::AppState;

pub(super) const SORTABLE: &[(&str, &str)] = &[
    ("id", "id"),
    ("titulo", "titulo"),
    ("isbn", "isbn"),
    ("genero", "genero"),
    ("anioPublicacion", "anio_publicacion"),
    ("numPaginas", "num_paginas"),
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
];

pub(super) async fn create(
    State(state): State<AppState>,
    Validated(data): Validated<BookRequest>,
) -> Result<(StatusCode, Json<BookResponse>), AppError> {
    let book = state.books.create(data).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

pub(super) async fn get_by_id(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<BookResponse>, AppError> {
    Ok(Json(state.books.get_by_id(id).await?))
}

pub(super) async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Page<BookResponse>>, AppError> {
    let request = query
        .resolve(&state.pagination, SORTABLE)
        .map_err(|errors| AppError::validation(&errors))?;
    Ok(Json(state.books.list(&request).await?))
}

pub(super) async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    Validated(data): Validated<BookRequest>,
) -> Result<Json<BookResponse>, AppError> {
    Ok(Json(state.books.update(id, data).await?))
}

pub(super) async fn deactivate(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, AppError> {
    state.books.deactivate(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

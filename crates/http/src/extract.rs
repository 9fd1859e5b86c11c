//! Extractors that reject bad input with [`AppError`] instead of axum's
//! plain-text rejections.

use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::{AppError, FieldError};

/// Request payloads that check their own fields.
///
/// Validation consumes the decoded payload and yields the checked value the
/// handler works with.
pub trait Validate {
    type Valid;

    fn validate(self) -> Result<Self::Valid, Vec<FieldError>>;
}

/// JSON body decoded as `T` and validated into `T::Valid`
pub struct Validated<T: Validate>(pub T::Valid);

impl<S, T> FromRequest<S> for Validated<T>
where
    S: Send + Sync,
    T: Validate + DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(request, state)
            .await
            .map_err(|rejection| AppError::malformed(rejection.body_text()))?;

        payload
            .validate()
            .map(Validated)
            .map_err(|errors| AppError::validation(&errors))
    }
}

/// Path parameters; undecodable segments become a 400
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| ApiPath(value))
            .map_err(|rejection| AppError::malformed(rejection.body_text()))
    }
}

/// Query string parameters; undecodable values become a 400
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| ApiQuery(value))
            .map_err(|rejection| AppError::malformed(rejection.body_text()))
    }
}

//! Error handling for the HTTP boundary
//!
//! Every failure leaves the service as the same JSON shape:
//! `{timestamp, status, error, message, path}`.

use axum::{
    body::Body,
    extract::Request,
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

const UNEXPECTED_MESSAGE: &str = "Ocurrió un error inesperado. Contacte al administrador.";

/// Standard error response body
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub timestamp: String,
    pub status: u16,
    pub error: String,
    pub message: String,
    pub path: String,
}

/// A single rejected request field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Application errors and the status each one maps to
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("method not allowed: {message}")]
    MethodNotAllowed { message: String },

    #[error("request timed out: {message}")]
    Timeout { message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Validation error from per-field messages, joined with `; `
    pub fn validation(errors: &[FieldError]) -> Self {
        let message = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Self::Validation { message }
    }

    /// Validation error for a request that could not be decoded at all
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn method_not_allowed(method: &Method) -> Self {
        Self::MethodNotAllowed {
            message: format!("El método {} no está soportado para esta ruta", method),
        }
    }

    pub fn timeout() -> Self {
        Self::Timeout {
            message: "La solicitud excedió el tiempo máximo de espera".to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Category label reported in the `error` field
    pub fn label(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "Error de validación",
            AppError::NotFound { .. } => "No encontrado",
            AppError::Conflict { .. } => "Conflicto",
            AppError::MethodNotAllowed { .. } => "Método no permitido",
            AppError::Timeout { .. } => "Tiempo de espera agotado",
            AppError::Internal(_) => "Error interno del servidor",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let label = self.label();

        let message = match self {
            AppError::Validation { message }
            | AppError::NotFound { message }
            | AppError::Conflict { message }
            | AppError::MethodNotAllowed { message }
            | AppError::Timeout { message } => {
                tracing::debug!(status_code = %status.as_u16(), %message, "request rejected");
                message
            }
            AppError::Internal(err) => {
                let error_id = Uuid::new_v4();
                let detail = format!("{:#}", err);
                tracing::error!(
                    error_id = %error_id,
                    status_code = %status.as_u16(),
                    error = %detail,
                    "unexpected error"
                );
                UNEXPECTED_MESSAGE.to_string()
            }
        };

        let body = ErrorBody {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            status: status.as_u16(),
            error: label.to_string(),
            message,
            path: String::new(),
        };

        let mut response = (status, Json(body.clone())).into_response();
        response.extensions_mut().insert(body);
        response
    }
}

/// Middleware filling the `path` of error bodies with the request path.
///
/// Error responses are built far from the request, so the body is rewritten
/// here on the way out. Routing 405s and timeout 408s arrive without a body
/// and get the common one.
pub async fn attach_request_path(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let method = request.method().clone();
    let mut response = next.run(request).await;

    if response.extensions().get::<ErrorBody>().is_none() {
        if let Some(error) = bare_status_error(response.status(), &method) {
            let allow = response.headers().get(header::ALLOW).cloned();
            response = error.into_response();
            if let Some(allow) = allow {
                response.headers_mut().insert(header::ALLOW, allow);
            }
        }
    }

    let Some(body) = response.extensions().get::<ErrorBody>().cloned() else {
        return response;
    };

    let body = ErrorBody { path, ..body };
    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.extensions.insert(body.clone());

    match serde_json::to_vec(&body) {
        Ok(bytes) => Response::from_parts(parts, Body::from(bytes)),
        Err(err) => {
            tracing::error!(error = %err, "failed to encode error body");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn bare_status_error(status: StatusCode, method: &Method) -> Option<AppError> {
    match status {
        StatusCode::METHOD_NOT_ALLOWED => Some(AppError::method_not_allowed(method)),
        StatusCode::REQUEST_TIMEOUT => Some(AppError::timeout()),
        _ => None,
    }
}

/// Fallback for unmatched routes, rendered in the common error shape
pub async fn route_not_found(request: Request) -> AppError {
    AppError::not_found(format!("No existe la ruta {}", request.uri().path()))
}

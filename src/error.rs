use biblioteca_http::AppError;
use thiserror::Error;

use crate::storage::StorageError;

/// Business rule violations raised by the services
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("No se encontró {resource} con ID {id}")]
    NotFound { resource: &'static str, id: i64 },

    #[error("Ya existe un {resource} con el valor '{value}'")]
    DuplicateResource { resource: &'static str, value: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ServiceError {
    pub fn not_found(resource: &'static str, id: i64) -> Self {
        Self::NotFound { resource, id }
    }

    pub fn duplicate(resource: &'static str, value: impl Into<String>) -> Self {
        Self::DuplicateResource {
            resource,
            value: value.into(),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound { .. } => AppError::not_found(err.to_string()),
            ServiceError::DuplicateResource { .. } => AppError::conflict(err.to_string()),
            ServiceError::Storage(source) => AppError::Internal(anyhow::Error::new(source)),
        }
    }
}

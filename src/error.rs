use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::{Display, From};
use serde_json::json;

/// Faults raised by the persistence layer.
#[derive(Debug, Display, From)]
pub enum StoreError {
    #[display(fmt = "duplicate key")]
    #[from(ignore)]
    Duplicate,
    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),
    #[display(fmt = "corrupt stored document: {}", _0)]
    #[from(ignore)]
    Corrupt(String),
}

impl std::error::Error for StoreError {}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Corrupt(e.to_string())
    }
}

/// Map a unique-index violation to [`StoreError::Duplicate`].
pub fn classify(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::Duplicate,
        _ => StoreError::Database(e),
    }
}

#[derive(Debug, Display, From)]
pub enum AppError {
    #[display(fmt = "{}", _0)]
    #[from(ignore)]
    Validation(String),
    #[display(fmt = "{}", _0)]
    #[from(ignore)]
    Conflict(String),
    #[display(fmt = "{}", _0)]
    #[from(ignore)]
    NotFound(String),
    #[display(fmt = "{}", _0)]
    #[from(ignore)]
    Unauthorized(String),
    #[display(fmt = "{}", _0)]
    #[from(ignore)]
    Internal(String),
    #[display(fmt = "{}", _0)]
    Store(StoreError),
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Store(StoreError::Database(e))
    }
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) | AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Store(e) => {
                tracing::error!(error = %e, "Store failure");
                "Internal Server Error".to_string()
            }
            AppError::Internal(detail) => {
                tracing::error!(detail = %detail, "Internal failure");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ApiError {
    #[error("Paste not found")]
    NotFound,
    #[error("Invalid secret key")]
    Forbidden,
    #[error("{0}")]
    InvalidInput(String),
    #[error("missing secret key")]
    MissingSecretKey,
    #[error("not authenticated")]
    Unauthorized,
    #[error("{source}")]
    Json {
        #[from]
        source: JsonRejection,
    },
    #[error("{source}")]
    Query {
        #[from]
        source: QueryRejection,
    },
    #[error("database error")]
    Database { source: sqlx::Error },
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::MissingSecretKey => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            // the body limit surfaces as a json rejection too
            ApiError::Json { source } if source.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            ApiError::Json { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Query { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Database { source } = &self {
            tracing::error!("database error: {source}");
        }

        (self.status_code(), Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(source: sqlx::Error) -> Self {
        match source {
            sqlx::Error::RowNotFound => ApiError::NotFound,
            _ => ApiError::Database { source },
        }
    }
}

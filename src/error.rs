use std::collections::BTreeMap;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Field name -> list of messages, rendered as the body of a 400.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0:?}")]
    Validation(FieldErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl AppError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        AppError::Validation(errors)
    }

    pub fn not_found() -> Self {
        AppError::NotFound("Not found.".to_string())
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        let detail = match self {
            AppError::Validation(errors) => return HttpResponse::build(status).json(errors),
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Internal(ref e) => {
                tracing::error!("Internal error: {:?}", e);
                e.clone()
            }
            AppError::BadRequest(ref e) => e.clone(),
            AppError::NotFound(ref e) => e.clone(),
        };

        HttpResponse::build(status).json(ErrorResponse { detail })
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::not_found().status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::field("title", "This field is required.").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Database(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_web::test]
    async fn test_validation_body_is_field_map() {
        let resp = AppError::field("price", "A valid number is required.").error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let result: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(result["price"][0], "A valid number is required.");
    }

    #[actix_web::test]
    async fn test_not_found_body_has_detail() {
        let resp = AppError::not_found().error_response();
        let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let result: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(result.detail, "Not found.");
    }
}

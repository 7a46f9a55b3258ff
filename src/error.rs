use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;

use crate::validation::ValidationErrors;

#[derive(Debug)]
pub enum AppError {
    Database(sqlx::Error),
    Validation {
        errors: ValidationErrors,
        input: serde_json::Value,
    },
    NotFound(&'static str),
}

impl AppError {
    /// Field errors plus the submitted input, echoed back for re-display.
    pub fn validation<T: Serialize>(errors: ValidationErrors, input: &T) -> Self {
        AppError::Validation {
            errors,
            input: serde_json::to_value(input).unwrap_or(serde_json::Value::Null),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(what) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": what }))).into_response()
            }
            AppError::Validation { errors, input } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "errors": errors, "input": input })),
            )
                .into_response(),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("resource not found"),
            other => AppError::Database(other),
        }
    }
}

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::services::record_extractor::ExtractError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid API Key")]
    InvalidApiKey,
    #[error("Company '{0}' not found.")]
    TenantNotFound(String),
    #[error("Malformed input: {0}")]
    MalformedInput(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<ExtractError> for AppError {
    fn from(e: ExtractError) -> Self {
        AppError::MalformedInput(e.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Storage(e.to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidApiKey => StatusCode::FORBIDDEN,
            AppError::TenantNotFound(_) => StatusCode::NOT_FOUND,
            AppError::MalformedInput(_) | AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Storage details stay in the logs
        let message = match self {
            AppError::Storage(_) => "Failed to store upload".to_string(),
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "error": message
        }))
    }
}

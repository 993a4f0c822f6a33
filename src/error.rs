use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error, Clone)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("server start failure: {0}")]
    StartServer(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("internal server error")]
    Internal,
}

impl AppError {
    /// Stable machine-readable name for the error envelope
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "ValidationError",
            AppError::NotFound(_) => "NotFound",
            AppError::InvalidState(_) => "InvalidState",
            AppError::Config(_) | AppError::StartServer(_) | AppError::Internal => "InternalError",
        }
    }

    /// Returns HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Validation(_) => 400,
            AppError::NotFound(_) => 404,
            AppError::InvalidState(_) => 409,
            AppError::Config(_) | AppError::StartServer(_) | AppError::Internal => 500,
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        HttpResponse::build(status).json(json!({
            "error": self.kind(),
            "message": self.to_string(),
        }))
    }
}

// NOTE: No need to implement From<AppError> for actix_web::Error
// because actix-web provides a blanket impl for all ResponseError types:
// impl<T: ResponseError + 'static> From<T> for actix_web::Error

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy_maps_to_distinct_status_codes() {
        assert_eq!(AppError::Validation("bad".into()).status_code(), 400);
        assert_eq!(AppError::NotFound("missing".into()).status_code(), 404);
        assert_eq!(AppError::InvalidState("ended".into()).status_code(), 409);
        assert_eq!(AppError::Internal.status_code(), 500);
    }

    #[test]
    fn test_kind_names_are_stable() {
        assert_eq!(AppError::Validation("x".into()).kind(), "ValidationError");
        assert_eq!(AppError::NotFound("x".into()).kind(), "NotFound");
        assert_eq!(AppError::InvalidState("x".into()).kind(), "InvalidState");
    }
}

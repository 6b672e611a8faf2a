//! Request-boundary error type / 请求边界错误类型

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::engine::EngineError;
use crate::models::ErrorBody;

#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed request, rejected before any store call / 请求格式错误
    #[error("{0}")]
    Validation(String),

    /// Failure talking to, or reported by, the search engine / 存储错误
    #[error(transparent)]
    Store(#[from] EngineError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Validation(msg) => tracing::debug!("Rejected request: {}", msg),
            AppError::Store(e) => tracing::error!("Search engine error: {}", e),
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Validation("docs should be an array".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        let store = AppError::from(EngineError::Unavailable("down".to_string()));
        assert_eq!(store.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(store.to_string(), "engine unavailable: down");
    }
}

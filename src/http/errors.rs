use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::alerts::AlertError;
use crate::domain::order::OrderError;

fn error_body(status: StatusCode, message: String) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({ "error": message }))
}

impl ResponseError for OrderError {
    fn status_code(&self) -> StatusCode {
        match self {
            e if e.is_validation() => StatusCode::BAD_REQUEST,
            OrderError::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
            OrderError::OrderNotFound(_) | OrderError::CustomerNotFound(_) => StatusCode::NOT_FOUND,
            OrderError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            OrderError::ConcurrentModification(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "❌ Request failed");
            // Storage details stay in the logs
            return error_body(status, "Internal storage error".to_string());
        }
        error_body(status, self.to_string())
    }
}

impl ResponseError for AlertError {
    fn status_code(&self) -> StatusCode {
        match self {
            AlertError::MissingProductName => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        error_body(self.status_code(), self.to_string())
    }
}

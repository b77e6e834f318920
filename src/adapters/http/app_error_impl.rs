use crate::app_error::{AppError, ErrorCode};
use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Database(_)
            | AppError::Gateway(_)
            | AppError::Email(_)
            | AppError::Internal(_) => {
                // Details stay in the log; the client only gets the code.
                tracing::error!(error = %self, "Request failed");
                let code = match self {
                    AppError::Database(_) => ErrorCode::DatabaseError,
                    AppError::Gateway(_) => ErrorCode::GatewayError,
                    AppError::Email(_) => ErrorCode::EmailError,
                    _ => ErrorCode::InternalError,
                };
                error_resp(StatusCode::INTERNAL_SERVER_ERROR, code, None)
            }
            AppError::InvalidCredentials => {
                error_resp(StatusCode::UNAUTHORIZED, ErrorCode::InvalidCredentials, None)
            }
            AppError::Forbidden => error_resp(StatusCode::FORBIDDEN, ErrorCode::Forbidden, None),
            AppError::RateLimited => {
                error_resp(StatusCode::TOO_MANY_REQUESTS, ErrorCode::RateLimited, None)
            }
            AppError::InvalidInput(msg) => {
                error_resp(StatusCode::BAD_REQUEST, ErrorCode::InvalidInput, Some(msg))
            }
            AppError::PaymentVerificationFailed => error_resp(
                StatusCode::BAD_REQUEST,
                ErrorCode::PaymentVerificationFailed,
                None,
            ),
            AppError::NotFound(msg) => {
                error_resp(StatusCode::NOT_FOUND, ErrorCode::NotFound, Some(msg))
            }
            AppError::Conflict(msg) => {
                error_resp(StatusCode::CONFLICT, ErrorCode::Conflict, Some(msg))
            }
        }
    }
}

fn error_resp(status: StatusCode, code: ErrorCode, message: Option<String>) -> Response {
    let body = match message {
        Some(msg) => serde_json::json!({ "code": code.as_str(), "message": msg }),
        None => serde_json::json!({ "code": code.as_str() }),
    };
    (status, Json(body)).into_response()
}

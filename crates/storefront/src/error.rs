//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use greengrocer_cart::CartServiceError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartServiceError),

    /// Session handling failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if is_server_error(&self) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Cart(err) => match err {
                CartServiceError::InvalidQuantity(_) => StatusCode::BAD_REQUEST,
                CartServiceError::LineNotFound(_) => StatusCode::NOT_FOUND,
                CartServiceError::StoreRead(_) | CartServiceError::StoreWrite(_) => {
                    StatusCode::BAD_GATEWAY
                }
                CartServiceError::ReconciliationAborted { .. } => StatusCode::SERVICE_UNAVAILABLE,
                CartServiceError::LocalCart(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Cart(err) => match err {
                CartServiceError::InvalidQuantity(_) | CartServiceError::LineNotFound(_) => {
                    err.to_string()
                }
                CartServiceError::StoreRead(_) | CartServiceError::StoreWrite(_) => {
                    "Cart storage unavailable, please retry".to_string()
                }
                CartServiceError::ReconciliationAborted { .. } => {
                    "Cart merge did not complete, your items are safe; please retry".to_string()
                }
                CartServiceError::LocalCart(_) => "Internal server error".to_string(),
            },
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::BadRequest(msg) => msg.clone(),
        };

        (status, message).into_response()
    }
}

const fn is_server_error(err: &AppError) -> bool {
    matches!(
        err,
        AppError::Internal(_)
            | AppError::Session(_)
            | AppError::Cart(
                CartServiceError::StoreRead(_)
                    | CartServiceError::StoreWrite(_)
                    | CartServiceError::LocalCart(_)
                    | CartServiceError::ReconciliationAborted { .. }
            )
    )
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use greengrocer_core::{ProductId, QuantityError};

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_validation_errors_are_client_errors() {
        assert_eq!(
            get_status(AppError::Cart(CartServiceError::InvalidQuantity(
                QuantityError::Zero
            ))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Cart(CartServiceError::LineNotFound(
                ProductId::new("p")
            ))),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_store_failures_are_bad_gateway() {
        let err = AppError::Cart(CartServiceError::StoreWrite(
            greengrocer_cart::StoreError::Unavailable("down".to_owned()),
        ));
        assert_eq!(get_status(err), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_internal_details_not_exposed() {
        let response = AppError::Internal("connection string leaked".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

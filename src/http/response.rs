//! Error presentation.
//!
//! # Design Decisions
//! - The serving core never picks status codes; this is the only place
//!   errors become responses
//! - Missing files map to 404, unreachable upstreams to 502
//! - Server-side failures are logged at error level, 404s at debug

use std::io;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::frontend::FrontendError;

impl FrontendError {
    /// Status code presented to the client for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            FrontendError::Upstream(_) | FrontendError::UpstreamBody(_) => StatusCode::BAD_GATEWAY,
            FrontendError::Http(_) => StatusCode::INTERNAL_SERVER_ERROR,
            FrontendError::Io(_) | FrontendError::Document { .. } => match self.io_kind() {
                Some(io::ErrorKind::NotFound) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for FrontendError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Request failed");
        } else {
            tracing::debug!(status = %status, error = %self, "Request failed");
        }

        let message = match status {
            StatusCode::BAD_GATEWAY => "Upstream request failed",
            StatusCode::NOT_FOUND => "Not found",
            _ => "Internal server error",
        };
        (status, message).into_response()
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authentication and authorization failures.
///
/// Messages are fixed strings: they never reveal which header was missing,
/// whether a token was close to valid, or which rule rejected the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No principal was established for this request
    AuthenticationRequired,
    /// The caller's role cannot perform this kind of operation
    InsufficientPermissions,
    /// The caller cannot access this particular resource
    AccessDenied,
    /// Only administrators can perform this operation
    AdminRequired,
    /// The request did not come through the gateway
    DirectAccessForbidden,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: &'static str,
    message: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::AuthenticationRequired => "AUTHENTICATION_REQUIRED",
            AuthError::InsufficientPermissions => "INSUFFICIENT_PERMISSIONS",
            AuthError::AccessDenied => "ACCESS_DENIED",
            AuthError::AdminRequired => "ADMIN_REQUIRED",
            AuthError::DirectAccessForbidden => "DIRECT_ACCESS_FORBIDDEN",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPermissions
            | AuthError::AccessDenied
            | AuthError::AdminRequired
            | AuthError::DirectAccessForbidden => StatusCode::FORBIDDEN,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::AuthenticationRequired => write!(f, "User not authenticated"),
            AuthError::InsufficientPermissions => {
                write!(f, "Insufficient permissions for this operation")
            }
            AuthError::AccessDenied => write!(f, "You don't have access to this resource"),
            AuthError::AdminRequired => write!(f, "Administrator privileges required"),
            AuthError::DirectAccessForbidden => write!(f, "Use the API Gateway"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.error_code(),
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}

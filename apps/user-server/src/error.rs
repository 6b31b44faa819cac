// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::AuthError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

/// Error body returned by every endpoint.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    /// Stable machine-readable code
    #[schema(example = "STUDENT_NOT_FOUND")]
    pub error: String,
    /// Human-readable description
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn student_not_found(id: &str) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "STUDENT_NOT_FOUND",
            format!("Student not found with ID: {id}"),
        )
    }

    pub fn actor_not_found(id: &str) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "ACTOR_NOT_FOUND",
            format!("Actor not found with ID: {id}"),
        )
    }

    pub fn user_not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "USER_NOT_FOUND", message)
    }

    pub fn role_not_found(id: &str) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "ROLE_NOT_FOUND",
            format!("Role not found with ID: {id}"),
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    pub fn invalid_email(email: &str, domain: &str) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "INVALID_EMAIL",
            format!("Invalid email '{email}'. Must belong to domain {domain}"),
        )
    }

    pub fn invalid_password(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_PASSWORD", message)
    }

    pub fn duplicate_user(field: &str, value: &str) -> Self {
        Self::new(
            StatusCode::CONFLICT,
            "DUPLICATE_USER",
            format!("A user with {field} '{value}' already exists"),
        )
    }

    pub fn duplicate_student(student_code: &str) -> Self {
        Self::new(
            StatusCode::CONFLICT,
            "DUPLICATE_STUDENT",
            format!("A student with code '{student_code}' already exists"),
        )
    }

    pub fn duplicate_role(name: &str) -> Self {
        Self::new(
            StatusCode::CONFLICT,
            "DUPLICATE_ROLE",
            format!("A role named '{name}' already exists"),
        )
    }

    /// Internal failure. The detail is logged, never returned.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!(error = %detail, "Internal error");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "An unexpected error occurred",
        )
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::new(err.status_code(), err.error_code(), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.code.to_string(),
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn constructors_set_status_and_code() {
        let nf = ApiError::student_not_found("s1");
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.code, "STUDENT_NOT_FOUND");
        assert!(nf.message.contains("s1"));

        let bad = ApiError::validation("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad.message, "bad");

        let dup = ApiError::duplicate_student("20201234");
        assert_eq!(dup.status, StatusCode::CONFLICT);
        assert_eq!(dup.code, "DUPLICATE_STUDENT");

        let internal = ApiError::internal("disk on fire");
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!internal.message.contains("disk"));
    }

    #[test]
    fn auth_errors_keep_their_status_and_code() {
        let err: ApiError = AuthError::AdminRequired.into();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.code, "ADMIN_REQUIRED");

        let err: ApiError = AuthError::AuthenticationRequired.into();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.code, "AUTHENTICATION_REQUIRED");
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::validation("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"VALIDATION_ERROR","message":"bad data"}"#);
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for the current principal.
//!
//! Both extractors read the request's [`SharedContext`], which the trust
//! middleware inserts. Neither one inspects headers itself.
//!
//! ```rust,ignore
//! async fn get_student(
//!     CurrentPrincipal(principal): CurrentPrincipal,
//!     State(state): State<AppState>,
//! ) -> Result<Json<StudentView>, ApiError> {
//!     enforce(principal.as_deref(), &query)?;
//! }
//! ```

use std::convert::Infallible;
use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};

use super::context::SharedContext;
use super::{AuthError, AuthenticatedPrincipal};

fn principal_from_parts(parts: &Parts) -> Option<Arc<AuthenticatedPrincipal>> {
    parts
        .extensions
        .get::<SharedContext>()
        .and_then(SharedContext::get)
}

/// The principal of this request, if one was established.
///
/// Never rejects: handlers pass the option straight to the policy, which
/// answers `AUTHENTICATION_REQUIRED` when it is absent.
pub struct CurrentPrincipal(pub Option<Arc<AuthenticatedPrincipal>>);

impl CurrentPrincipal {
    pub fn as_deref(&self) -> Option<&AuthenticatedPrincipal> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentPrincipal(principal_from_parts(parts)))
    }
}

/// Extractor that requires a principal.
///
/// Rejects with `401 AUTHENTICATION_REQUIRED` when the request has none.
pub struct Auth(pub Arc<AuthenticatedPrincipal>);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        principal_from_parts(parts)
            .map(Auth)
            .ok_or(AuthError::AuthenticationRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::context::ContextScope;
    use crate::auth::Role;
    use axum::http::Request;

    fn empty_parts() -> Parts {
        Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[tokio::test]
    async fn auth_requires_a_context() {
        let mut parts = empty_parts();
        let result = Auth::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AuthError::AuthenticationRequired)));
    }

    #[tokio::test]
    async fn auth_requires_a_principal_in_the_context() {
        let scope = ContextScope::open(None);
        let mut parts = empty_parts();
        parts.extensions.insert(scope.handle());

        let result = Auth::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AuthError::AuthenticationRequired)));
    }

    #[tokio::test]
    async fn auth_reads_principal_from_context() {
        let scope = ContextScope::open(Some(AuthenticatedPrincipal::gateway(
            "user_from_gateway",
            Role::Teacher,
            vec!["p1".to_string()],
        )));
        let mut parts = empty_parts();
        parts.extensions.insert(scope.handle());

        let Auth(principal) = Auth::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(principal.subject_id, "user_from_gateway");
        assert_eq!(principal.role, Role::Teacher);
    }

    #[tokio::test]
    async fn current_principal_is_none_without_context() {
        let mut parts = empty_parts();
        let CurrentPrincipal(principal) = CurrentPrincipal::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(principal.is_none());
    }

    #[tokio::test]
    async fn current_principal_sees_cleared_context_as_none() {
        let scope = ContextScope::open(Some(AuthenticatedPrincipal::system(None)));
        let mut parts = empty_parts();
        parts.extensions.insert(scope.handle());
        drop(scope);

        let current = CurrentPrincipal::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(current.as_deref().is_none());
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Trust gate middleware.
//!
//! Runs in front of every route:
//!
//! 1. classify the request ([`TrustClassifier::classify`]);
//! 2. reject `DirectUntrusted` with `403 DIRECT_ACCESS_FORBIDDEN`;
//! 3. build the principal and open a [`ContextScope`] for it;
//! 4. insert the scope's handle into the request extensions and run the
//!    handler;
//! 5. drop the scope, clearing the context.
//!
//! Step 5 also happens when the handler future is dropped early, because the
//! scope lives inside this middleware's future.
//!
//! [`TrustClassifier::classify`]: super::trust::TrustClassifier::classify

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::context::ContextScope;
use super::principal::build_principal;
use super::AuthError;
use crate::state::AppState;

/// Install with `axum::middleware::from_fn_with_state(state, trust_gate)`.
pub async fn trust_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let classification = state
        .classifier
        .classify(request.uri().path(), request.headers());

    tracing::debug!(
        method = %request.method(),
        path = %request.uri().path(),
        classification = ?classification,
        "Classified request"
    );

    if !classification.is_admitted() {
        tracing::warn!(
            method = %request.method(),
            path = %request.uri().path(),
            "Rejected request that bypassed the gateway"
        );
        return AuthError::DirectAccessForbidden.into_response();
    }

    let principal = build_principal(classification, request.headers());
    if let Some(principal) = &principal {
        tracing::debug!(
            subject = %principal.subject_id,
            role = %principal.role,
            trust_source = ?principal.trust_source,
            service = principal.service_name.as_deref().unwrap_or("-"),
            "Established principal"
        );
    }

    let scope = ContextScope::open(principal);
    request.extensions_mut().insert(scope.handle());

    let response = next.run(request).await;
    drop(scope);
    response
}

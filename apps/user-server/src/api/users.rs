// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Endpoints that work on any user, student or actor.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use super::profiles::{snapshot, user_view};
use crate::{
    auth::{
        enforce, Auth, AuthError, AuthenticatedPrincipal, CurrentPrincipal, Operation,
        ResourceAccessQuery, Role, TrustSource,
    },
    error::{ApiError, ErrorBody},
    models::UserLookupView,
    state::AppState,
};

/// Response for GET /service/user/me
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserMeResponse {
    /// Subject id forwarded by the gateway, or `system`
    pub user_id: String,
    pub role: Role,
    /// Program ids in the caller's scope
    pub programs: Vec<String>,
    pub trust_source: TrustSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl From<&AuthenticatedPrincipal> for UserMeResponse {
    fn from(principal: &AuthenticatedPrincipal) -> Self {
        Self {
            user_id: principal.subject_id.clone(),
            role: principal.role,
            programs: principal.program_ids.iter().cloned().collect(),
            trust_source: principal.trust_source,
            service_name: principal.service_name.clone(),
            email: principal.email.clone(),
        }
    }
}

/// Identity the gateway established for this request.
#[utoipa::path(
    get,
    path = "/service/user/me",
    tag = "Users",
    responses(
        (status = 200, description = "Caller identity", body = UserMeResponse),
        (status = 401, body = ErrorBody),
    )
)]
pub async fn get_current_user(Auth(principal): Auth) -> Json<UserMeResponse> {
    Json(principal.as_ref().into())
}

/// Program ids assigned to a user.
#[utoipa::path(
    get,
    path = "/service/user/{id}/programs",
    params(("id" = String, Path, description = "User id")),
    tag = "Users",
    responses(
        (status = 200, body = [String]),
        (status = 403, body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn get_user_programs(
    Path(id): Path<String>,
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, ApiError> {
    enforce(
        principal.as_deref(),
        &ResourceAccessQuery {
            operation: Operation::ReadUserPrograms,
            owner_id: Some(&id),
            resource_program_ids: None,
        },
    )?;

    let store = state.store.read().await;
    let user = store
        .user(&id)
        .ok_or_else(|| ApiError::user_not_found(format!("User not found with ID: {id}")))?;
    Ok(Json(user.program_ids().iter().cloned().collect()))
}

/// Look a user up by email.
///
/// The stored password digest is included only for service callers, which
/// verify credentials with it.
#[utoipa::path(
    get,
    path = "/service/user/auth/email/{email}",
    params(("email" = String, Path, description = "Email address")),
    tag = "Users",
    responses(
        (status = 200, body = UserLookupView),
        (status = 403, body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn get_user_by_email(
    Path(email): Path<String>,
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
) -> Result<Json<UserLookupView>, ApiError> {
    let principal = principal
        .as_deref()
        .ok_or(AuthError::AuthenticationRequired)?;

    let found = {
        let store = state.store.read().await;
        let user = store.user_by_email(email.trim());
        // Authorize before answering 404 so callers cannot probe for
        // addresses they have no right to see.
        enforce(
            Some(principal),
            &ResourceAccessQuery {
                operation: Operation::LookupUserByEmail,
                owner_id: user.map(|u| u.id()),
                resource_program_ids: None,
            },
        )?;
        let user = user
            .ok_or_else(|| ApiError::user_not_found(format!("User not found with email: {email}")))?;
        snapshot(&store, user)
    };

    let (record, role) = found;
    let password = (principal.role == Role::Service).then(|| record.profile.password_hash.clone());

    tracing::debug!(user_id = %record.id(), requested_by = %principal.subject_id, "User looked up by email");

    Ok(Json(UserLookupView {
        user: user_view(&state, &record.profile, role).await,
        user_type: record.kind_name(),
        password,
    }))
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Role endpoints. Mounted under both `/service/role` and `/api/roles`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use uuid::Uuid;

use crate::{
    auth::{enforce, CurrentPrincipal, Operation, ResourceAccessQuery},
    error::{ApiError, ErrorBody},
    models::{
        CreateRoleRequest, PermissionRequest, RoleExistsResponse, RoleRecord, UpdateRoleRequest,
    },
    state::AppState,
};

pub fn role_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_roles).post(create_role))
        .route("/name/{name}", get(get_role_by_name))
        .route("/{id}", get(get_role).put(update_role).delete(delete_role))
        .route("/{id}/exists", get(role_exists))
        .route(
            "/{id}/permissions",
            get(get_role_permissions).post(add_permission),
        )
        .route("/{id}/permissions/{permission}", delete(remove_permission))
}

fn required_name(name: &str) -> Result<String, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("Role name is required"));
    }
    Ok(name.to_string())
}

fn clean_permissions(permissions: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(permissions.len());
    for permission in permissions {
        let permission = permission.trim();
        if !permission.is_empty() && !cleaned.iter().any(|p| p == permission) {
            cleaned.push(permission.to_string());
        }
    }
    cleaned
}

#[utoipa::path(
    post,
    path = "/service/role",
    request_body = CreateRoleRequest,
    tag = "Roles",
    responses(
        (status = 201, body = RoleRecord),
        (status = 400, body = ErrorBody),
        (status = 403, body = ErrorBody),
        (status = 409, body = ErrorBody)
    )
)]
pub async fn create_role(
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
    Json(request): Json<CreateRoleRequest>,
) -> Result<(StatusCode, Json<RoleRecord>), ApiError> {
    let principal = enforce(
        principal.as_deref(),
        &ResourceAccessQuery::new(Operation::CreateRole),
    )?;
    let name = required_name(&request.name)?;

    let mut store = state.store.write().await;
    if store.role_by_name(&name).is_some() {
        return Err(ApiError::duplicate_role(&name));
    }

    let id_role = match request.id_role.map(|id| id.trim().to_string()) {
        Some(id) if !id.is_empty() => {
            if store.role(&id).is_some() {
                return Err(ApiError::new(
                    StatusCode::CONFLICT,
                    "DUPLICATE_ROLE",
                    format!("A role with ID '{id}' already exists"),
                ));
            }
            id
        }
        _ => Uuid::new_v4().to_string(),
    };

    let role = RoleRecord {
        id_role,
        name,
        permissions: clean_permissions(request.permissions.unwrap_or_default()),
    };
    store.insert_role(role.clone());

    tracing::info!(role_id = %role.id_role, name = %role.name, created_by = %principal.subject_id, "Role created");
    Ok((StatusCode::CREATED, Json(role)))
}

#[utoipa::path(
    get,
    path = "/service/role",
    tag = "Roles",
    responses(
        (status = 200, body = [RoleRecord]),
        (status = 403, body = ErrorBody)
    )
)]
pub async fn list_roles(
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
) -> Result<Json<Vec<RoleRecord>>, ApiError> {
    enforce(
        principal.as_deref(),
        &ResourceAccessQuery::new(Operation::ReadRole),
    )?;
    let roles = state.store.read().await.roles();
    Ok(Json(roles))
}

#[utoipa::path(
    get,
    path = "/service/role/{id}",
    params(("id" = String, Path, description = "Role id")),
    tag = "Roles",
    responses(
        (status = 200, body = RoleRecord),
        (status = 403, body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn get_role(
    Path(id): Path<String>,
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
) -> Result<Json<RoleRecord>, ApiError> {
    enforce(
        principal.as_deref(),
        &ResourceAccessQuery::new(Operation::ReadRole),
    )?;
    let store = state.store.read().await;
    let role = store.role(&id).ok_or_else(|| ApiError::role_not_found(&id))?;
    Ok(Json(role.clone()))
}

#[utoipa::path(
    get,
    path = "/service/role/name/{name}",
    params(("name" = String, Path, description = "Role name")),
    tag = "Roles",
    responses(
        (status = 200, body = RoleRecord),
        (status = 403, body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn get_role_by_name(
    Path(name): Path<String>,
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
) -> Result<Json<RoleRecord>, ApiError> {
    enforce(
        principal.as_deref(),
        &ResourceAccessQuery::new(Operation::ReadRole),
    )?;
    let store = state.store.read().await;
    let role = store.role_by_name(&name).ok_or_else(|| {
        ApiError::new(
            StatusCode::NOT_FOUND,
            "ROLE_NOT_FOUND",
            format!("Role not found with name: {name}"),
        )
    })?;
    Ok(Json(role.clone()))
}

#[utoipa::path(
    put,
    path = "/service/role/{id}",
    params(("id" = String, Path, description = "Role id")),
    request_body = UpdateRoleRequest,
    tag = "Roles",
    responses(
        (status = 200, body = RoleRecord),
        (status = 400, body = ErrorBody),
        (status = 403, body = ErrorBody),
        (status = 404, body = ErrorBody),
        (status = 409, body = ErrorBody)
    )
)]
pub async fn update_role(
    Path(id): Path<String>,
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
    Json(request): Json<UpdateRoleRequest>,
) -> Result<Json<RoleRecord>, ApiError> {
    let principal = enforce(
        principal.as_deref(),
        &ResourceAccessQuery::new(Operation::UpdateRole),
    )?;
    let name = required_name(&request.name)?;

    let mut store = state.store.write().await;
    if store.role_by_name(&name).is_some_and(|r| r.id_role != id) {
        return Err(ApiError::duplicate_role(&name));
    }

    let role = store.role_mut(&id)?;
    role.name = name;
    if let Some(permissions) = request.permissions {
        role.permissions = clean_permissions(permissions);
    }
    let role = role.clone();

    tracing::info!(role_id = %id, updated_by = %principal.subject_id, "Role updated");
    Ok(Json(role))
}

#[utoipa::path(
    delete,
    path = "/service/role/{id}",
    params(("id" = String, Path, description = "Role id")),
    tag = "Roles",
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn delete_role(
    Path(id): Path<String>,
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let principal = enforce(
        principal.as_deref(),
        &ResourceAccessQuery::new(Operation::DeleteRole),
    )?;

    state.store.write().await.remove_role(&id)?;

    tracing::warn!(role_id = %id, deleted_by = %principal.subject_id, "Role deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/service/role/{id}/exists",
    params(("id" = String, Path, description = "Role id")),
    tag = "Roles",
    responses(
        (status = 200, body = RoleExistsResponse),
        (status = 401, body = ErrorBody)
    )
)]
pub async fn role_exists(
    Path(id): Path<String>,
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
) -> Result<Json<RoleExistsResponse>, ApiError> {
    enforce(
        principal.as_deref(),
        &ResourceAccessQuery::new(Operation::CheckRoleExists),
    )?;
    let exists = state.store.read().await.role(&id).is_some();
    Ok(Json(RoleExistsResponse { role_id: id, exists }))
}

#[utoipa::path(
    get,
    path = "/service/role/{id}/permissions",
    params(("id" = String, Path, description = "Role id")),
    tag = "Roles",
    responses(
        (status = 200, body = [String]),
        (status = 403, body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn get_role_permissions(
    Path(id): Path<String>,
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, ApiError> {
    enforce(
        principal.as_deref(),
        &ResourceAccessQuery::new(Operation::ReadRole),
    )?;
    let store = state.store.read().await;
    let role = store.role(&id).ok_or_else(|| ApiError::role_not_found(&id))?;
    Ok(Json(role.permissions.clone()))
}

#[utoipa::path(
    post,
    path = "/service/role/{id}/permissions",
    params(("id" = String, Path, description = "Role id")),
    request_body = PermissionRequest,
    tag = "Roles",
    responses(
        (status = 200, body = RoleRecord),
        (status = 400, body = ErrorBody),
        (status = 403, body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn add_permission(
    Path(id): Path<String>,
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
    Json(request): Json<PermissionRequest>,
) -> Result<Json<RoleRecord>, ApiError> {
    let principal = enforce(
        principal.as_deref(),
        &ResourceAccessQuery::new(Operation::MutateRolePermissions),
    )?;
    let permission = request.permission.trim();
    if permission.is_empty() {
        return Err(ApiError::validation("Permission is required"));
    }

    let mut store = state.store.write().await;
    let role = store.role_mut(&id)?;
    if !role.permissions.iter().any(|p| p == permission) {
        role.permissions.push(permission.to_string());
        tracing::info!(role_id = %id, permission, updated_by = %principal.subject_id, "Permission added");
    }
    Ok(Json(role.clone()))
}

#[utoipa::path(
    delete,
    path = "/service/role/{id}/permissions/{permission}",
    params(
        ("id" = String, Path, description = "Role id"),
        ("permission" = String, Path, description = "Permission to remove")
    ),
    tag = "Roles",
    responses(
        (status = 200, body = RoleRecord),
        (status = 403, body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn remove_permission(
    Path((id, permission)): Path<(String, String)>,
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
) -> Result<Json<RoleRecord>, ApiError> {
    let principal = enforce(
        principal.as_deref(),
        &ResourceAccessQuery::new(Operation::MutateRolePermissions),
    )?;

    let mut store = state.store.write().await;
    let role = store.role_mut(&id)?;
    let before = role.permissions.len();
    role.permissions.retain(|p| p != &permission);
    if role.permissions.len() != before {
        tracing::info!(role_id = %id, permission = %permission, updated_by = %principal.subject_id, "Permission removed");
    }
    Ok(Json(role.clone()))
}

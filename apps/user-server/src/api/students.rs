// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Student endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::profiles::{
    build_profile, check_scope_change, prepare_password, snapshot, student_view, Snapshot,
};
use crate::{
    auth::{enforce, visible_in_listing, AuthError, CurrentPrincipal, Operation, ResourceAccessQuery},
    error::{ApiError, ErrorBody},
    models::{
        CreateStudentRequest, StudentDetails, StudentView, UpdateStudentRequest, UserKind,
        UserRecord,
    },
    state::AppState,
    validation::{parse_semester, validate_new_user_id, validate_student_code},
};

async fn into_view(state: &AppState, snapshot: Snapshot) -> Result<StudentView, ApiError> {
    let id = snapshot.0.profile.id.clone();
    student_view(state, snapshot)
        .await
        .ok_or_else(|| ApiError::student_not_found(&id))
}

#[utoipa::path(
    post,
    path = "/service/user/student",
    request_body = CreateStudentRequest,
    tag = "Students",
    responses(
        (status = 201, body = StudentView),
        (status = 400, body = ErrorBody),
        (status = 403, body = ErrorBody),
        (status = 404, description = "Role not found", body = ErrorBody),
        (status = 409, body = ErrorBody)
    )
)]
pub async fn create_student(
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
    Json(request): Json<CreateStudentRequest>,
) -> Result<(StatusCode, Json<StudentView>), ApiError> {
    let principal = enforce(
        principal.as_deref(),
        &ResourceAccessQuery::new(Operation::CreateStudent),
    )?;

    let semester = parse_semester(&request.semester)?;
    let password_hash =
        prepare_password(&state.users, request.profile.password.as_deref(), true).await?;

    let created = {
        let mut store = state.store.write().await;
        validate_new_user_id(&store, &request.id_user)?;
        validate_student_code(&store, &request.student_id, None)?;
        let profile = build_profile(
            &state.users,
            &store,
            &request.id_user,
            request.profile,
            password_hash,
            None,
        )?;

        let record = UserRecord {
            profile,
            kind: UserKind::Student(StudentDetails {
                student_code: request.student_id,
                status: request.status,
                semester,
            }),
        };
        store.put_user(record.clone());
        snapshot(&store, &record)
    };

    tracing::info!(
        student_id = %created.0.profile.id,
        created_by = %principal.subject_id,
        "Student created"
    );

    Ok((StatusCode::CREATED, Json(into_view(&state, created).await?)))
}

#[utoipa::path(
    get,
    path = "/service/user/students",
    tag = "Students",
    responses(
        (status = 200, body = [StudentView]),
        (status = 401, body = ErrorBody),
        (status = 403, body = ErrorBody)
    )
)]
pub async fn list_students(
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
) -> Result<Json<Vec<StudentView>>, ApiError> {
    let principal = enforce(
        principal.as_deref(),
        &ResourceAccessQuery::new(Operation::ListStudents),
    )?;

    let snapshots: Vec<Snapshot> = {
        let store = state.store.read().await;
        store
            .students()
            .filter(|student| visible_in_listing(principal, student.program_ids()))
            .map(|student| snapshot(&store, student))
            .collect()
    };

    let mut views = Vec::with_capacity(snapshots.len());
    for snapshot in snapshots {
        views.push(into_view(&state, snapshot).await?);
    }
    Ok(Json(views))
}

#[utoipa::path(
    get,
    path = "/service/user/student/{id}",
    params(("id" = String, Path, description = "Student user id")),
    tag = "Students",
    responses(
        (status = 200, body = StudentView),
        (status = 403, body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn get_student(
    Path(id): Path<String>,
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
) -> Result<Json<StudentView>, ApiError> {
    let principal = principal
        .as_deref()
        .ok_or(AuthError::AuthenticationRequired)?;

    let found = {
        let store = state.store.read().await;
        let student = store
            .student(&id)
            .ok_or_else(|| ApiError::student_not_found(&id))?;
        enforce(
            Some(principal),
            &ResourceAccessQuery::for_owner(Operation::ReadStudent, &id, student.program_ids()),
        )?;
        snapshot(&store, student)
    };

    Ok(Json(into_view(&state, found).await?))
}

#[utoipa::path(
    put,
    path = "/service/user/student/{id}",
    params(("id" = String, Path, description = "Student user id")),
    request_body = UpdateStudentRequest,
    tag = "Students",
    responses(
        (status = 200, body = StudentView),
        (status = 400, body = ErrorBody),
        (status = 403, body = ErrorBody),
        (status = 404, body = ErrorBody),
        (status = 409, body = ErrorBody)
    )
)]
pub async fn update_student(
    Path(id): Path<String>,
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
    Json(request): Json<UpdateStudentRequest>,
) -> Result<Json<StudentView>, ApiError> {
    let principal = principal
        .as_deref()
        .ok_or(AuthError::AuthenticationRequired)?;

    // Authorize before paying for the password hash.
    {
        let store = state.store.read().await;
        let student = store
            .student(&id)
            .ok_or_else(|| ApiError::student_not_found(&id))?;
        enforce(
            Some(principal),
            &ResourceAccessQuery::for_owner(Operation::UpdateStudent, &id, student.program_ids()),
        )?;
    }

    let semester = parse_semester(&request.semester)?;
    let password_hash =
        prepare_password(&state.users, request.profile.password.as_deref(), false).await?;

    let updated = {
        let mut store = state.store.write().await;
        let existing = store
            .student(&id)
            .cloned()
            .ok_or_else(|| ApiError::student_not_found(&id))?;
        // The record may have changed while the lock was released.
        enforce(
            Some(principal),
            &ResourceAccessQuery::for_owner(Operation::UpdateStudent, &id, existing.program_ids()),
        )?;
        check_scope_change(principal, &existing, &request.profile)?;

        validate_student_code(&store, &request.student_id, Some(&id))?;
        let profile = build_profile(
            &state.users,
            &store,
            &id,
            request.profile,
            password_hash,
            Some(&existing.profile),
        )?;

        let record = UserRecord {
            profile,
            kind: UserKind::Student(StudentDetails {
                student_code: request.student_id,
                status: request.status,
                semester,
            }),
        };
        store.put_user(record.clone());
        snapshot(&store, &record)
    };

    tracing::info!(student_id = %id, updated_by = %principal.subject_id, "Student updated");

    Ok(Json(into_view(&state, updated).await?))
}

#[utoipa::path(
    delete,
    path = "/service/user/student/{id}",
    params(("id" = String, Path, description = "Student user id")),
    tag = "Students",
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn delete_student(
    Path(id): Path<String>,
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let principal = enforce(
        principal.as_deref(),
        &ResourceAccessQuery::new(Operation::DeleteStudent),
    )?;

    state.store.write().await.remove_student(&id)?;

    tracing::warn!(student_id = %id, deleted_by = %principal.subject_id, "Student deleted");
    Ok(StatusCode::NO_CONTENT)
}

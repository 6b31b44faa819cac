// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Actor endpoints (teachers, coordinators, staff).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::profiles::{
    actor_view, build_profile, check_scope_change, prepare_password, snapshot, Snapshot,
};
use crate::{
    auth::{enforce, visible_in_listing, AuthError, CurrentPrincipal, Operation, ResourceAccessQuery},
    error::{ApiError, ErrorBody},
    models::{ActorDetails, ActorView, CreateActorRequest, UpdateActorRequest, UserKind, UserRecord},
    state::AppState,
    validation::validate_new_user_id,
};

async fn into_view(state: &AppState, snapshot: Snapshot) -> Result<ActorView, ApiError> {
    let id = snapshot.0.profile.id.clone();
    actor_view(state, snapshot)
        .await
        .ok_or_else(|| ApiError::actor_not_found(&id))
}

fn normalize_position(position: Option<String>) -> Option<String> {
    position
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
}

#[utoipa::path(
    post,
    path = "/service/user/actor",
    request_body = CreateActorRequest,
    tag = "Actors",
    responses(
        (status = 201, body = ActorView),
        (status = 400, body = ErrorBody),
        (status = 403, body = ErrorBody),
        (status = 404, description = "Role not found", body = ErrorBody),
        (status = 409, body = ErrorBody)
    )
)]
pub async fn create_actor(
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
    Json(request): Json<CreateActorRequest>,
) -> Result<(StatusCode, Json<ActorView>), ApiError> {
    let principal = enforce(
        principal.as_deref(),
        &ResourceAccessQuery::new(Operation::CreateActor),
    )?;

    let password_hash =
        prepare_password(&state.users, request.profile.password.as_deref(), true).await?;

    let created = {
        let mut store = state.store.write().await;
        validate_new_user_id(&store, &request.id_user)?;
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
            kind: UserKind::Actor(ActorDetails {
                position: normalize_position(request.position),
            }),
        };
        store.put_user(record.clone());
        snapshot(&store, &record)
    };

    tracing::info!(
        actor_id = %created.0.profile.id,
        created_by = %principal.subject_id,
        "Actor created"
    );

    Ok((StatusCode::CREATED, Json(into_view(&state, created).await?)))
}

#[utoipa::path(
    get,
    path = "/service/user/actors",
    tag = "Actors",
    responses(
        (status = 200, body = [ActorView]),
        (status = 401, body = ErrorBody),
        (status = 403, body = ErrorBody)
    )
)]
pub async fn list_actors(
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
) -> Result<Json<Vec<ActorView>>, ApiError> {
    let principal = enforce(
        principal.as_deref(),
        &ResourceAccessQuery::new(Operation::ListActors),
    )?;

    let snapshots: Vec<Snapshot> = {
        let store = state.store.read().await;
        store
            .actors()
            .filter(|actor| visible_in_listing(principal, actor.program_ids()))
            .map(|actor| snapshot(&store, actor))
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
    path = "/service/user/actor/{id}",
    params(("id" = String, Path, description = "Actor user id")),
    tag = "Actors",
    responses(
        (status = 200, body = ActorView),
        (status = 403, body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn get_actor(
    Path(id): Path<String>,
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
) -> Result<Json<ActorView>, ApiError> {
    let principal = principal
        .as_deref()
        .ok_or(AuthError::AuthenticationRequired)?;

    let found = {
        let store = state.store.read().await;
        let actor = store
            .actor(&id)
            .ok_or_else(|| ApiError::actor_not_found(&id))?;
        enforce(
            Some(principal),
            &ResourceAccessQuery::for_owner(Operation::ReadActor, &id, actor.program_ids()),
        )?;
        snapshot(&store, actor)
    };

    Ok(Json(into_view(&state, found).await?))
}

#[utoipa::path(
    put,
    path = "/service/user/actor/{id}",
    params(("id" = String, Path, description = "Actor user id")),
    request_body = UpdateActorRequest,
    tag = "Actors",
    responses(
        (status = 200, body = ActorView),
        (status = 400, body = ErrorBody),
        (status = 403, body = ErrorBody),
        (status = 404, body = ErrorBody),
        (status = 409, body = ErrorBody)
    )
)]
pub async fn update_actor(
    Path(id): Path<String>,
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
    Json(request): Json<UpdateActorRequest>,
) -> Result<Json<ActorView>, ApiError> {
    let principal = principal
        .as_deref()
        .ok_or(AuthError::AuthenticationRequired)?;

    {
        let store = state.store.read().await;
        let actor = store
            .actor(&id)
            .ok_or_else(|| ApiError::actor_not_found(&id))?;
        enforce(
            Some(principal),
            &ResourceAccessQuery::for_owner(Operation::UpdateActor, &id, actor.program_ids()),
        )?;
    }

    let password_hash =
        prepare_password(&state.users, request.profile.password.as_deref(), false).await?;

    let updated = {
        let mut store = state.store.write().await;
        let existing = store
            .actor(&id)
            .cloned()
            .ok_or_else(|| ApiError::actor_not_found(&id))?;
        enforce(
            Some(principal),
            &ResourceAccessQuery::for_owner(Operation::UpdateActor, &id, existing.program_ids()),
        )?;
        check_scope_change(principal, &existing, &request.profile)?;

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
            kind: UserKind::Actor(ActorDetails {
                position: normalize_position(request.position),
            }),
        };
        store.put_user(record.clone());
        snapshot(&store, &record)
    };

    tracing::info!(actor_id = %id, updated_by = %principal.subject_id, "Actor updated");

    Ok(Json(into_view(&state, updated).await?))
}

#[utoipa::path(
    delete,
    path = "/service/user/actor/{id}",
    params(("id" = String, Path, description = "Actor user id")),
    tag = "Actors",
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, body = ErrorBody),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn delete_actor(
    Path(id): Path<String>,
    CurrentPrincipal(principal): CurrentPrincipal,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let principal = enforce(
        principal.as_deref(),
        &ResourceAccessQuery::new(Operation::DeleteActor),
    )?;

    state.store.write().await.remove_actor(&id)?;

    tracing::warn!(actor_id = %id, deleted_by = %principal.subject_id, "Actor deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::api::test_support::{actor_request, principal, student_request, test_state};
    use crate::api::students::create_student;
    use crate::auth::{AuthenticatedPrincipal, Role};

    fn current(p: AuthenticatedPrincipal) -> CurrentPrincipal {
        CurrentPrincipal(Some(Arc::new(p)))
    }

    fn admin() -> CurrentPrincipal {
        current(principal("admin", Role::Admin, &[]))
    }

    async fn seed(state: &AppState, id: &str, programs: &[&str]) -> ActorView {
        let (_, Json(view)) = create_actor(admin(), State(state.clone()), Json(actor_request(id, programs)))
            .await
            .expect("seed actor");
        view
    }

    #[tokio::test]
    async fn coordinator_creates_actor() {
        let state = test_state();
        let mut request = actor_request("t1", &["p1"]);
        request.position = Some("  Professor  ".to_string());

        let (status, Json(view)) = create_actor(
            current(principal("c1", Role::Coordinator, &["p1"])),
            State(state.clone()),
            Json(request),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(view.user.id_user, "t1");
        assert_eq!(view.position.as_deref(), Some("Professor"));
        assert_eq!(view.user.role.unwrap().id_role, "TEACHER");
        assert!(state.store.read().await.actor("t1").is_some());
    }

    #[tokio::test]
    async fn teacher_cannot_create_or_list_actors() {
        let state = test_state();
        let teacher = || current(principal("t9", Role::Teacher, &["p1"]));

        let err = create_actor(teacher(), State(state.clone()), Json(actor_request("t1", &[])))
            .await
            .unwrap_err();
        assert_eq!(err.code, "INSUFFICIENT_PERMISSIONS");

        let err = list_actors(teacher(), State(state.clone())).await.unwrap_err();
        assert_eq!(err.code, "INSUFFICIENT_PERMISSIONS");
    }

    #[tokio::test]
    async fn ids_are_shared_between_students_and_actors() {
        let state = test_state();
        create_student(
            admin(),
            State(state.clone()),
            Json(student_request("u1", "2020000001", &[])),
        )
        .await
        .unwrap();

        let err = create_actor(admin(), State(state.clone()), Json(actor_request("u1", &[])))
            .await
            .unwrap_err();
        assert_eq!(err.code, "DUPLICATE_USER");

        // A student id is not an actor.
        let err = get_actor(Path("u1".to_string()), admin(), State(state.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.code, "ACTOR_NOT_FOUND");
        let err = delete_actor(Path("u1".to_string()), admin(), State(state.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.code, "ACTOR_NOT_FOUND");
        assert!(state.store.read().await.student("u1").is_some());
    }

    #[tokio::test]
    async fn coordinator_lists_every_actor() {
        let state = test_state();
        seed(&state, "t1", &["p1"]).await;
        seed(&state, "t2", &["p2"]).await;

        let Json(actors) = list_actors(current(principal("c1", Role::Coordinator, &[])), State(state.clone()))
            .await
            .unwrap();
        assert_eq!(actors.len(), 2);
    }

    #[tokio::test]
    async fn actor_reads_follow_programs() {
        let state = test_state();
        seed(&state, "t1", &["p1"]).await;

        let Json(view) = get_actor(
            Path("t1".to_string()),
            current(principal("t2", Role::Teacher, &["p1"])),
            State(state.clone()),
        )
        .await
        .unwrap();
        assert_eq!(view.user.id_user, "t1");

        let err = get_actor(
            Path("t1".to_string()),
            current(principal("s1", Role::Student, &["p2"])),
            State(state.clone()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, "ACCESS_DENIED");

        let err = get_actor(Path("t1".to_string()), CurrentPrincipal(None), State(state.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn coordinator_updates_actor_in_shared_program() {
        let state = test_state();
        seed(&state, "t1", &["p1"]).await;

        let request = actor_request("t1", &["p1", "p2"]);
        let Json(view) = update_actor(
            Path("t1".to_string()),
            current(principal("c1", Role::Coordinator, &["p1"])),
            State(state.clone()),
            Json(UpdateActorRequest {
                profile: request.profile,
                position: Some("Head of department".to_string()),
            }),
        )
        .await
        .unwrap();

        assert_eq!(view.position.as_deref(), Some("Head of department"));
        assert_eq!(view.user.programs.len(), 2);

        let request = actor_request("t1", &["p2"]);
        let err = update_actor(
            Path("t1".to_string()),
            current(principal("c2", Role::Coordinator, &["p9"])),
            State(state.clone()),
            Json(UpdateActorRequest {
                profile: request.profile,
                position: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, "ACCESS_DENIED");
    }

    #[tokio::test]
    async fn update_rejects_email_of_another_user() {
        let state = test_state();
        seed(&state, "t1", &[]).await;
        seed(&state, "t2", &[]).await;

        let mut request = actor_request("t1", &[]);
        request.profile.email = "t2@unibague.edu.co".to_string();
        let err = update_actor(
            Path("t1".to_string()),
            current(principal("t1", Role::Teacher, &[])),
            State(state.clone()),
            Json(UpdateActorRequest {
                profile: request.profile,
                position: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, "DUPLICATE_USER");
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn actor_self_update_keeps_role_and_programs() {
        let state = test_state();
        seed(&state, "t1", &["p1"]).await;
        let teacher = || current(principal("t1", Role::Teacher, &["p1"]));

        for (role, programs) in [("ADMIN", &["p1"][..]), ("TEACHER", &["p1", "p2"][..])] {
            let mut request = actor_request("t1", programs);
            request.profile.role.id_role = role.to_string();
            let err = update_actor(
                Path("t1".to_string()),
                teacher(),
                State(state.clone()),
                Json(UpdateActorRequest {
                    profile: request.profile,
                    position: None,
                }),
            )
            .await
            .unwrap_err();
            assert_eq!(err.status, StatusCode::FORBIDDEN);
            assert_eq!(err.code, "INSUFFICIENT_PERMISSIONS");
        }

        let mut request = actor_request("t1", &["p1"]);
        request.profile.name = "Renamed".to_string();
        let Json(view) = update_actor(
            Path("t1".to_string()),
            teacher(),
            State(state.clone()),
            Json(UpdateActorRequest {
                profile: request.profile,
                position: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(view.user.name, "Renamed");

        let store = state.store.read().await;
        let stored = store.actor("t1").unwrap();
        assert_eq!(stored.profile.role_id, "TEACHER");
        assert_eq!(stored.program_ids().len(), 1);
    }

    #[tokio::test]
    async fn delete_requires_admin() {
        let state = test_state();
        seed(&state, "t1", &[]).await;

        let err = delete_actor(
            Path("t1".to_string()),
            current(AuthenticatedPrincipal::system(None)),
            State(state.clone()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, "ADMIN_REQUIRED");

        let status = delete_actor(Path("t1".to_string()), admin(), State(state.clone()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.store.read().await.actor("t1").is_none());
    }
}

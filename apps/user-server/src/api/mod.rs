// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{middleware::trust_gate, AuthenticatedPrincipal, Role, TrustSource},
    error::ErrorBody,
    models::{
        ActorView, CreateActorRequest, CreateRoleRequest, CreateStudentRequest, PermissionRequest,
        ProfileInput, ProgramRef, RoleExistsResponse, RoleRecord, RoleRef, Sex, StudentView,
        UpdateActorRequest, UpdateRoleRequest, UpdateStudentRequest, UserLookupView, UserType,
        UserView,
    },
    state::AppState,
};

pub mod actors;
pub mod health;
mod profiles;
pub mod roles;
pub mod students;
pub mod users;

pub fn router(state: AppState) -> Router {
    let user_routes = Router::new()
        .route("/me", get(users::get_current_user))
        .route("/student", post(students::create_student))
        .route("/students", get(students::list_students))
        .route(
            "/student/{id}",
            get(students::get_student)
                .put(students::update_student)
                .delete(students::delete_student),
        )
        .route("/actor", post(actors::create_actor))
        .route("/actors", get(actors::list_actors))
        .route(
            "/actor/{id}",
            get(actors::get_actor)
                .put(actors::update_actor)
                .delete(actors::delete_actor),
        )
        .route("/{id}/programs", get(users::get_user_programs))
        .route("/auth/email/{email}", get(users::get_user_by_email));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/service/user", user_routes)
        .nest("/service/role", roles::role_routes())
        .nest("/api/roles", roles::role_routes())
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn_with_state(state.clone(), trust_gate))
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "request",
                method = %request.method(),
                path = %request.uri().path(),
                request_id = %request_id,
            )
        }))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        users::get_current_user,
        users::get_user_programs,
        users::get_user_by_email,
        students::create_student,
        students::list_students,
        students::get_student,
        students::update_student,
        students::delete_student,
        actors::create_actor,
        actors::list_actors,
        actors::get_actor,
        actors::update_actor,
        actors::delete_actor,
        roles::create_role,
        roles::list_roles,
        roles::get_role,
        roles::get_role_by_name,
        roles::update_role,
        roles::delete_role,
        roles::role_exists,
        roles::get_role_permissions,
        roles::add_permission,
        roles::remove_permission
    ),
    components(
        schemas(
            ErrorBody,
            AuthenticatedPrincipal,
            Role,
            TrustSource,
            Sex,
            RoleRef,
            ProfileInput,
            CreateStudentRequest,
            UpdateStudentRequest,
            CreateActorRequest,
            UpdateActorRequest,
            UserView,
            StudentView,
            ActorView,
            UserType,
            UserLookupView,
            ProgramRef,
            RoleRecord,
            CreateRoleRequest,
            UpdateRoleRequest,
            PermissionRequest,
            RoleExistsResponse,
            users::UserMeResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Users", description = "Identity and cross-kind user lookups"),
        (name = "Students", description = "Student management"),
        (name = "Actors", description = "Teacher, coordinator and staff management"),
        (name = "Roles", description = "Roles and their permissions")
    )
)]
struct ApiDoc;

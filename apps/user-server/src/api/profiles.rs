// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared plumbing for student and actor handlers.

use chrono::Utc;

use crate::auth::{may_change_scope, AuthError, AuthenticatedPrincipal};
use crate::credentials::{hash_secret, random_password};
use crate::error::ApiError;
use crate::models::{
    ActorView, ProfileInput, RoleRecord, StudentView, UserKind, UserProfile, UserRecord, UserView,
};
use crate::state::AppState;
use crate::store::InMemoryStore;
use crate::validation::{
    normalize_program_ids, validate_email, validate_name, validate_password, validate_phone,
    validate_role, UserSettings,
};

/// A user record together with its role, copied out of the store so views
/// can be built without holding the lock.
pub(crate) type Snapshot = (UserRecord, Option<RoleRecord>);

pub(crate) fn snapshot(store: &InMemoryStore, record: &UserRecord) -> Snapshot {
    (record.clone(), store.role(&record.profile.role_id).cloned())
}

/// Digest for a new or changed password.
///
/// `None` on create means an SSO account and gets a random password; `None`
/// on update keeps the current digest (`Ok(None)`). Hashing runs on the
/// blocking pool.
pub(crate) async fn prepare_password(
    settings: &UserSettings,
    password: Option<&str>,
    creating: bool,
) -> Result<Option<String>, ApiError> {
    let secret = match password {
        Some(password) => {
            validate_password(settings, password)?;
            password.to_string()
        }
        None if creating => random_password().map_err(ApiError::internal)?,
        None => return Ok(None),
    };

    let digest = tokio::task::spawn_blocking(move || hash_secret(&secret))
        .await
        .map_err(ApiError::internal)?
        .map_err(ApiError::internal)?;
    Ok(Some(digest))
}

/// Reject an update that would change the user's role or programs unless
/// `principal` is entitled to. Unchanged values pass for everyone.
pub(crate) fn check_scope_change(
    principal: &AuthenticatedPrincipal,
    existing: &UserRecord,
    input: &ProfileInput,
) -> Result<(), ApiError> {
    if may_change_scope(principal, existing.program_ids()) {
        return Ok(());
    }

    let role_changed = input.role.id_role != existing.profile.role_id;
    let programs_changed = normalize_program_ids(&input.programs)? != *existing.program_ids();
    if role_changed || programs_changed {
        tracing::warn!(
            subject = %principal.subject_id,
            user_id = %existing.profile.id,
            role_changed,
            programs_changed,
            "Role or program change denied"
        );
        return Err(AuthError::InsufficientPermissions.into());
    }
    Ok(())
}

/// Validate profile input and build the stored profile.
///
/// `existing` is the current profile on update; its id and creation time
/// are kept, and its email does not count as a duplicate.
pub(crate) fn build_profile(
    settings: &UserSettings,
    store: &InMemoryStore,
    id: &str,
    input: ProfileInput,
    password_hash: Option<String>,
    existing: Option<&UserProfile>,
) -> Result<UserProfile, ApiError> {
    validate_name(&input.name)?;

    let email = input.email.trim().to_string();
    let email_unchanged = existing.is_some_and(|e| e.email.eq_ignore_ascii_case(&email));
    if !email_unchanged {
        validate_email(settings, store, &email, existing.map(|e| e.id.as_str()))?;
    }

    let phone = input.phone.filter(|p| !p.trim().is_empty());
    validate_phone(phone.as_deref())?;

    let role = validate_role(store, &input.role.id_role)?;

    let password_hash = match (password_hash, existing) {
        (Some(hash), _) => hash,
        (None, Some(existing)) => existing.password_hash.clone(),
        (None, None) => return Err(ApiError::internal("new profile without a password digest")),
    };

    let now = Utc::now();
    Ok(UserProfile {
        id: id.to_string(),
        name: input.name.trim().to_string(),
        email,
        phone,
        image: input.image.filter(|i| !i.trim().is_empty()),
        sex: input.sex,
        password_hash,
        role_id: role.id_role.clone(),
        program_ids: normalize_program_ids(&input.programs)?,
        created_at: existing.map(|e| e.created_at).unwrap_or(now),
        updated_at: now,
    })
}

pub(crate) async fn user_view(state: &AppState, profile: &UserProfile, role: Option<RoleRecord>) -> UserView {
    UserView {
        id_user: profile.id.clone(),
        name: profile.name.clone(),
        email: profile.email.clone(),
        phone: profile.phone.clone(),
        image: profile.image.clone(),
        sex: profile.sex,
        role,
        programs: state.programs.resolve_programs(&profile.program_ids).await,
    }
}

/// Student view, or `None` if the record is an actor.
pub(crate) async fn student_view(state: &AppState, (record, role): Snapshot) -> Option<StudentView> {
    let UserKind::Student(details) = &record.kind else {
        return None;
    };
    Some(StudentView {
        user: user_view(state, &record.profile, role).await,
        student_id: details.student_code.clone(),
        status: details.status,
        semester: details.semester.to_string(),
    })
}

/// Actor view, or `None` if the record is a student.
pub(crate) async fn actor_view(state: &AppState, (record, role): Snapshot) -> Option<ActorView> {
    let UserKind::Actor(details) = &record.kind else {
        return None;
    };
    Some(ActorView {
        user: user_view(state, &record.profile, role).await,
        position: details.position.clone(),
    })
}

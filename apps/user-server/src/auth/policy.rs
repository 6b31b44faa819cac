// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authorization policy.
//!
//! A single decision table for every student, actor and role operation.
//! Handlers describe what they are about to do as a [`ResourceAccessQuery`]
//! and call [`authorize`] (or [`enforce`]) before touching storage.
//!
//! ## Rules (first match wins)
//!
//! | Operation | Allowed |
//! |-----------|---------|
//! | any, no principal | never (`AUTHENTICATION_REQUIRED`) |
//! | create student / actor | admin, coordinator, service |
//! | list students | admin, coordinator, teacher, service (filtered) |
//! | list actors | admin, coordinator (filtered) |
//! | read student / actor | admin, self, program overlap |
//! | update student / actor | admin, self, coordinator with overlap |
//! | change a user's role or programs | admin, coordinator with overlap |
//! | delete student / actor | admin |
//! | create / update / delete role | admin |
//! | read role | admin, coordinator, service |
//! | change role permissions | admin |
//! | role exists | any principal |
//! | read a user's programs | admin, self |
//! | look up user by email | admin, service, self |
//!
//! `Unknown` roles match no allow rule. The service principal is never
//! "self".

use std::collections::BTreeSet;

use serde::Serialize;

use super::error::AuthError;
use super::principal::AuthenticatedPrincipal;
use super::roles::Role;

/// Operations guarded by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    CreateStudent,
    CreateActor,
    ListStudents,
    ListActors,
    ReadStudent,
    ReadActor,
    UpdateStudent,
    UpdateActor,
    DeleteStudent,
    DeleteActor,
    CreateRole,
    UpdateRole,
    DeleteRole,
    ReadRole,
    MutateRolePermissions,
    CheckRoleExists,
    ReadUserPrograms,
    LookupUserByEmail,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operation::CreateStudent => "create_student",
            Operation::CreateActor => "create_actor",
            Operation::ListStudents => "list_students",
            Operation::ListActors => "list_actors",
            Operation::ReadStudent => "read_student",
            Operation::ReadActor => "read_actor",
            Operation::UpdateStudent => "update_student",
            Operation::UpdateActor => "update_actor",
            Operation::DeleteStudent => "delete_student",
            Operation::DeleteActor => "delete_actor",
            Operation::CreateRole => "create_role",
            Operation::UpdateRole => "update_role",
            Operation::DeleteRole => "delete_role",
            Operation::ReadRole => "read_role",
            Operation::MutateRolePermissions => "mutate_role_permissions",
            Operation::CheckRoleExists => "check_role_exists",
            Operation::ReadUserPrograms => "read_user_programs",
            Operation::LookupUserByEmail => "lookup_user_by_email",
        };
        f.write_str(name)
    }
}

/// Machine-readable reason for a denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenyReason {
    AuthenticationRequired,
    InsufficientPermissions,
    AccessDenied,
    AdminRequired,
}

impl From<DenyReason> for AuthError {
    fn from(reason: DenyReason) -> Self {
        match reason {
            DenyReason::AuthenticationRequired => AuthError::AuthenticationRequired,
            DenyReason::InsufficientPermissions => AuthError::InsufficientPermissions,
            DenyReason::AccessDenied => AuthError::AccessDenied,
            DenyReason::AdminRequired => AuthError::AdminRequired,
        }
    }
}

/// Result of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    fn allow_if(condition: bool, otherwise: DenyReason) -> Self {
        if condition {
            Decision::Allow
        } else {
            Decision::Deny(otherwise)
        }
    }
}

/// What is being accessed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceAccessQuery<'a> {
    pub operation: Operation,
    /// Identity of the user the resource belongs to
    pub owner_id: Option<&'a str>,
    /// Programs the resource belongs to
    pub resource_program_ids: Option<&'a BTreeSet<String>>,
}

impl<'a> ResourceAccessQuery<'a> {
    /// A query with no target resource (creates, listings, role operations).
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            owner_id: None,
            resource_program_ids: None,
        }
    }

    /// A query against one user's record.
    pub fn for_owner(
        operation: Operation,
        owner_id: &'a str,
        resource_program_ids: &'a BTreeSet<String>,
    ) -> Self {
        Self {
            operation,
            owner_id: Some(owner_id),
            resource_program_ids: Some(resource_program_ids),
        }
    }

    fn is_self(&self, principal: &AuthenticatedPrincipal) -> bool {
        self.owner_id.is_some_and(|owner| principal.is_self(owner))
    }

    fn overlaps(&self, principal: &AuthenticatedPrincipal) -> bool {
        self.resource_program_ids
            .is_some_and(|programs| principal.shares_program(programs))
    }
}

/// Decide whether `principal` may perform `query`.
pub fn authorize(
    principal: Option<&AuthenticatedPrincipal>,
    query: &ResourceAccessQuery<'_>,
) -> Decision {
    let Some(principal) = principal else {
        return Decision::Deny(DenyReason::AuthenticationRequired);
    };
    let role = principal.role;

    match query.operation {
        Operation::CreateStudent | Operation::CreateActor => Decision::allow_if(
            matches!(role, Role::Admin | Role::Coordinator | Role::Service),
            DenyReason::InsufficientPermissions,
        ),

        Operation::ListStudents => Decision::allow_if(
            matches!(
                role,
                Role::Admin | Role::Coordinator | Role::Teacher | Role::Service
            ),
            DenyReason::InsufficientPermissions,
        ),

        Operation::ListActors => Decision::allow_if(
            matches!(role, Role::Admin | Role::Coordinator),
            DenyReason::InsufficientPermissions,
        ),

        Operation::ReadStudent | Operation::ReadActor => Decision::allow_if(
            role.is_admin() || query.is_self(principal) || query.overlaps(principal),
            DenyReason::AccessDenied,
        ),

        Operation::UpdateStudent | Operation::UpdateActor => Decision::allow_if(
            role.is_admin()
                || query.is_self(principal)
                || (role == Role::Coordinator && query.overlaps(principal)),
            DenyReason::AccessDenied,
        ),

        Operation::DeleteStudent
        | Operation::DeleteActor
        | Operation::CreateRole
        | Operation::UpdateRole
        | Operation::DeleteRole
        | Operation::MutateRolePermissions => {
            Decision::allow_if(role.is_admin(), DenyReason::AdminRequired)
        }

        Operation::ReadRole => Decision::allow_if(
            matches!(role, Role::Admin | Role::Coordinator | Role::Service),
            DenyReason::InsufficientPermissions,
        ),

        Operation::CheckRoleExists => Decision::Allow,

        Operation::ReadUserPrograms => Decision::allow_if(
            role.is_admin() || query.is_self(principal),
            DenyReason::AccessDenied,
        ),

        Operation::LookupUserByEmail => Decision::allow_if(
            matches!(role, Role::Admin | Role::Service) || query.is_self(principal),
            DenyReason::AccessDenied,
        ),
    }
}

/// Like [`authorize`], but returns the principal on success and logs denials.
pub fn enforce<'p>(
    principal: Option<&'p AuthenticatedPrincipal>,
    query: &ResourceAccessQuery<'_>,
) -> Result<&'p AuthenticatedPrincipal, AuthError> {
    match (authorize(principal, query), principal) {
        (Decision::Allow, Some(principal)) => Ok(principal),
        (Decision::Allow, None) => Err(AuthError::AuthenticationRequired),
        (Decision::Deny(reason), principal) => {
            tracing::warn!(
                operation = %query.operation,
                subject = principal.map(|p| p.subject_id.as_str()).unwrap_or("-"),
                role = %principal.map(|p| p.role).unwrap_or_default(),
                owner = query.owner_id.unwrap_or("-"),
                reason = ?reason,
                "Authorization denied"
            );
            Err(reason.into())
        }
    }
}

/// Whether a listed resource is visible to `principal`.
///
/// Admins and coordinators see every entry; everyone else only sees
/// resources that share at least one program with them.
pub fn visible_in_listing(
    principal: &AuthenticatedPrincipal,
    resource_program_ids: &BTreeSet<String>,
) -> bool {
    principal.role.sees_all_programs() || principal.shares_program(resource_program_ids)
}

/// Whether `principal` may change the role or programs of a user enrolled
/// in `resource_program_ids`. Self access does not extend to these fields.
pub fn may_change_scope(
    principal: &AuthenticatedPrincipal,
    resource_program_ids: &BTreeSet<String>,
) -> bool {
    principal.role.is_admin()
        || (principal.role == Role::Coordinator && principal.shares_program(resource_program_ids))
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Data Models
//!
//! Stored records and the request/response shapes of the REST API. API
//! types derive `ToSchema` for the OpenAPI document and use the camelCase
//! field names the rest of the platform already speaks (`idUser`,
//! `studentID`, `idRole`).
//!
//! ## Users
//!
//! A [`UserRecord`] is a shared [`UserProfile`] plus a [`UserKind`] that
//! carries the student- or actor-specific fields. Authorization only looks
//! at the profile (`id`, `program_ids`), so it treats both kinds the same.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// =============================================================================
// Stored Records
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sex {
    Male,
    Female,
}

/// Fields shared by students and actors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub image: Option<String>,
    pub sex: Sex,
    /// PBKDF2 digest, never the plain password
    pub password_hash: String,
    pub role_id: String,
    pub program_ids: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentDetails {
    /// 8 to 12 digit institutional code
    pub student_code: String,
    pub status: bool,
    /// 1 to 10
    pub semester: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorDetails {
    pub position: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserKind {
    Student(StudentDetails),
    Actor(ActorDetails),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub profile: UserProfile,
    pub kind: UserKind,
}

impl UserRecord {
    pub fn id(&self) -> &str {
        &self.profile.id
    }

    pub fn program_ids(&self) -> &BTreeSet<String> {
        &self.profile.program_ids
    }

    pub fn is_student(&self) -> bool {
        matches!(self.kind, UserKind::Student(_))
    }

    pub fn is_actor(&self) -> bool {
        matches!(self.kind, UserKind::Actor(_))
    }

    pub fn kind_name(&self) -> UserType {
        match self.kind {
            UserKind::Student(_) => UserType::Student,
            UserKind::Actor(_) => UserType::Actor,
        }
    }
}

/// A role and its permission strings.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoleRecord {
    pub id_role: String,
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Program as returned by the Program service.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProgramRef {
    pub program_id: String,
    pub program_name: String,
}

// =============================================================================
// User Requests
// =============================================================================

/// Reference to an existing role.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleRef {
    pub id_role: String,
}

/// Profile fields accepted on create and update.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileInput {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    pub sex: Sex,
    /// Plain password. Omit for SSO accounts; a random one is generated.
    #[serde(default)]
    pub password: Option<String>,
    pub role: RoleRef,
    /// Program ids
    #[serde(default)]
    pub programs: Vec<String>,
}

/// Request to create a student.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateStudentRequest {
    #[serde(rename = "idUser")]
    pub id_user: String,
    #[serde(flatten)]
    pub profile: ProfileInput,
    #[serde(rename = "studentID")]
    pub student_id: String,
    #[serde(default = "default_status")]
    pub status: bool,
    /// "1" to "10"
    pub semester: String,
}

/// Request to replace a student's fields. The id never changes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateStudentRequest {
    #[serde(flatten)]
    pub profile: ProfileInput,
    #[serde(rename = "studentID")]
    pub student_id: String,
    #[serde(default = "default_status")]
    pub status: bool,
    pub semester: String,
}

/// Request to create an actor (teacher, coordinator, staff).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateActorRequest {
    #[serde(rename = "idUser")]
    pub id_user: String,
    #[serde(flatten)]
    pub profile: ProfileInput,
    #[serde(default)]
    pub position: Option<String>,
}

/// Request to replace an actor's fields. The id never changes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateActorRequest {
    #[serde(flatten)]
    pub profile: ProfileInput,
    #[serde(default)]
    pub position: Option<String>,
}

fn default_status() -> bool {
    true
}

// =============================================================================
// User Views
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserType {
    Student,
    Actor,
}

/// Profile as returned by the API, with programs resolved.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserView {
    #[serde(rename = "idUser")]
    pub id_user: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub sex: Sex,
    /// `None` if the role was deleted after the user was created
    pub role: Option<RoleRecord>,
    pub programs: Vec<ProgramRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct StudentView {
    #[serde(flatten)]
    pub user: UserView,
    #[serde(rename = "studentID")]
    pub student_id: String,
    pub status: bool,
    pub semester: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ActorView {
    #[serde(flatten)]
    pub user: UserView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

/// Result of an email lookup.
///
/// `password` carries the stored digest and is only filled for service
/// callers (the auth service verifies credentials with it).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserLookupView {
    #[serde(flatten)]
    pub user: UserView,
    pub user_type: UserType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

// =============================================================================
// Role Requests
// =============================================================================

/// Request to create a role.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoleRequest {
    /// Optional explicit id; a UUID is generated otherwise
    #[serde(default)]
    pub id_role: Option<String>,
    pub name: String,
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
}

/// Request to update a role. Permissions are kept when omitted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    pub name: String,
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PermissionRequest {
    pub permission: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoleExistsResponse {
    pub role_id: String,
    pub exists: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_student_request_reads_platform_field_names() {
        let request: CreateStudentRequest = serde_json::from_value(json!({
            "idUser": "s1",
            "name": "Ana",
            "email": "ana@unibague.edu.co",
            "sex": "FEMALE",
            "role": { "idRole": "STUDENT" },
            "programs": ["p1"],
            "studentID": "2020123456",
            "semester": "3"
        }))
        .unwrap();

        assert_eq!(request.id_user, "s1");
        assert_eq!(request.profile.role.id_role, "STUDENT");
        assert_eq!(request.profile.programs, vec!["p1"]);
        assert!(request.profile.password.is_none());
        assert!(request.status);
        assert_eq!(request.student_id, "2020123456");
    }

    #[test]
    fn student_view_is_flat() {
        let view = StudentView {
            user: UserView {
                id_user: "s1".to_string(),
                name: "Ana".to_string(),
                email: "ana@unibague.edu.co".to_string(),
                phone: None,
                image: None,
                sex: Sex::Female,
                role: None,
                programs: vec![ProgramRef {
                    program_id: "p1".to_string(),
                    program_name: "Systems Engineering".to_string(),
                }],
            },
            student_id: "2020123456".to_string(),
            status: true,
            semester: "3".to_string(),
        };

        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["idUser"], "s1");
        assert_eq!(value["studentID"], "2020123456");
        assert_eq!(value["programs"][0]["programName"], "Systems Engineering");
        assert!(value.get("phone").is_none());
        assert!(value.get("password").is_none());
    }
}

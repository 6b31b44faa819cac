// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Caller roles for authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Canonical caller roles.
///
/// ## Role Hierarchy
///
/// - `Admin` - Full access to every resource and all mutations
/// - `Coordinator` - Manages students and actors, sees every program in listings
/// - `Teacher` - Staff member (actor); sees students of their own programs
/// - `Student` - Can only see and update their own record
/// - `Service` - Internal caller authenticated by the shared service token
/// - `Unknown` - Unrecognized role name; treated as least privileged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Full administrative access
    Admin,
    /// Academic program coordinator
    Coordinator,
    /// Student
    Student,
    /// Teacher or other staff actor
    Teacher,
    /// Internal service (never produced from gateway headers)
    Service,
    /// Anything that could not be recognized
    Unknown,
}

impl Role {
    /// Parse a role name supplied by the gateway (case-insensitive).
    ///
    /// Unrecognized names map to `Unknown`. `Service` is never produced
    /// here: that role is only reachable through the service token.
    pub fn from_header(raw: &str) -> Role {
        let normalized = raw.trim().to_ascii_uppercase();
        let name = normalized.strip_prefix("ROLE_").unwrap_or(&normalized);

        match name {
            "ADMIN" | "ADMINISTRATOR" => Role::Admin,
            "COORDINATOR" | "COORD" => Role::Coordinator,
            "STUDENT" | "ALUMNO" => Role::Student,
            "TEACHER" | "ACTOR" | "DOCENTE" | "PROFESSOR" => Role::Teacher,
            _ => Role::Unknown,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Roles whose listings are not narrowed to their own programs.
    pub fn sees_all_programs(&self) -> bool {
        matches!(self, Role::Admin | Role::Coordinator)
    }

    /// Whether a principal with this role may act on its own record.
    ///
    /// The service principal is excluded so it can never stand in for a
    /// human subject.
    pub fn allows_self_access(&self) -> bool {
        !matches!(self, Role::Service)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Unknown
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "ADMIN"),
            Role::Coordinator => write!(f, "COORDINATOR"),
            Role::Student => write!(f, "STUDENT"),
            Role::Teacher => write!(f, "TEACHER"),
            Role::Service => write!(f, "SERVICE"),
            Role::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

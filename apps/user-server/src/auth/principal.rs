// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authenticated principal and its construction from trusted headers.

use std::collections::BTreeSet;

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::Role;
use super::trust::{header_value, TrustClassification, H_SERVICE_NAME};

/// Subject identifier injected by the gateway.
pub const H_USER_ID: &str = "x-user-id";
/// Role name injected by the gateway.
pub const H_USER_ROLE: &str = "x-user-role";
/// Program scope injected by the gateway (CSV or bracketed list).
pub const H_USER_PROGRAMS: &str = "x-user-programs";
/// Email injected by the gateway (audit only).
pub const H_USER_EMAIL: &str = "x-user-email";

/// Subject used for the synthesized service principal.
pub const SYSTEM_SUBJECT: &str = "system";

/// How the principal was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrustSource {
    Gateway,
    ServiceToken,
}

/// The caller of the current request.
///
/// Built fresh for every request and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedPrincipal {
    /// User or service identity
    pub subject_id: String,

    /// Canonical role
    pub role: Role,

    /// Programs this principal is scoped to
    #[schema(value_type = Vec<String>)]
    pub program_ids: BTreeSet<String>,

    /// Gateway headers or service token
    pub trust_source: TrustSource,

    /// Calling service, for service principals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,

    /// Email forwarded by the gateway, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl AuthenticatedPrincipal {
    /// A principal established by gateway headers.
    pub fn gateway(
        subject_id: impl Into<String>,
        role: Role,
        program_ids: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            role,
            program_ids: program_ids.into_iter().collect(),
            trust_source: TrustSource::Gateway,
            service_name: None,
            email: None,
        }
    }

    /// The privileged principal for a service-to-service call.
    pub fn system(service_name: Option<String>) -> Self {
        Self {
            subject_id: SYSTEM_SUBJECT.to_string(),
            role: Role::Service,
            program_ids: BTreeSet::new(),
            trust_source: TrustSource::ServiceToken,
            service_name,
            email: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Whether this principal is the owner of `owner_id`.
    ///
    /// Never true for the service principal.
    pub fn is_self(&self, owner_id: &str) -> bool {
        self.role.allows_self_access() && self.subject_id == owner_id
    }

    /// Whether any of `program_ids` is in this principal's scope.
    pub fn shares_program<'a>(&self, program_ids: impl IntoIterator<Item = &'a String>) -> bool {
        program_ids
            .into_iter()
            .any(|program| self.program_ids.contains(program))
    }
}

/// Build the principal for a classified request.
///
/// Returns `None` for public requests, for untrusted requests and for
/// gateway requests that carry no subject.
pub fn build_principal(
    classification: TrustClassification,
    headers: &HeaderMap,
) -> Option<AuthenticatedPrincipal> {
    match classification {
        TrustClassification::Public | TrustClassification::DirectUntrusted => None,
        TrustClassification::GatewayValidated => {
            let subject_id = header_value(headers, H_USER_ID)?;
            let role = header_value(headers, H_USER_ROLE)
                .map(Role::from_header)
                .unwrap_or(Role::Unknown);
            let programs = parse_programs(header_value(headers, H_USER_PROGRAMS).unwrap_or(""));

            let mut principal = AuthenticatedPrincipal::gateway(subject_id, role, programs);
            principal.email = header_value(headers, H_USER_EMAIL).map(str::to_string);
            Some(principal)
        }
        TrustClassification::ServiceToService => Some(AuthenticatedPrincipal::system(
            header_value(headers, H_SERVICE_NAME).map(str::to_string),
        )),
    }
}

/// Parse a program list header.
///
/// Accepts `p1,p2`, `["p1","p2"]`, `[p1, p2]` and `['p1']`. Blank input and
/// `[]` yield the empty set.
pub fn parse_programs(raw: &str) -> BTreeSet<String> {
    let mut s = raw.trim();

    if let Some(inner) = s.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
        s = inner;
    }

    s.split(',')
        .map(|item| item.trim().trim_matches(|c| c == '"' || c == '\'').trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Encoding used by [`serialize_programs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramsEncoding {
    /// `p1,p2`
    Csv,
    /// `["p1","p2"]`
    Bracketed,
}

/// Render a program set in the given header encoding.
pub fn serialize_programs(programs: &BTreeSet<String>, encoding: ProgramsEncoding) -> String {
    match encoding {
        ProgramsEncoding::Csv => programs
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(","),
        ProgramsEncoding::Bracketed => {
            let quoted: Vec<String> = programs.iter().map(|p| format!("\"{p}\"")).collect();
            format!("[{}]", quoted.join(","))
        }
    }
}

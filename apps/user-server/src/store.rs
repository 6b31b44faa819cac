// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory user and role store.
//!
//! Users and roles are kept in ordered maps keyed by id, so listings come
//! back in a stable order. Uniqueness rules (ids, emails, student codes,
//! role names) are checked by [`crate::validation`] before records reach
//! the store.

use std::collections::BTreeMap;

use crate::error::ApiError;
use crate::models::{RoleRecord, UserKind, UserRecord};

/// Roles every deployment starts with, as `(id, name)`.
pub const DEFAULT_ROLES: [(&str, &str); 4] = [
    ("ADMIN", "ADMIN"),
    ("COORDINATOR", "COORDINATOR"),
    ("TEACHER", "TEACHER"),
    ("STUDENT", "STUDENT"),
];

#[derive(Default)]
pub struct InMemoryStore {
    users: BTreeMap<String, UserRecord>,
    roles: BTreeMap<String, RoleRecord>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding [`DEFAULT_ROLES`].
    pub fn with_default_roles() -> Self {
        let mut store = Self::new();
        for (id, name) in DEFAULT_ROLES {
            store.insert_role(RoleRecord {
                id_role: id.to_string(),
                name: name.to_string(),
                permissions: Vec::new(),
            });
        }
        store
    }

    // -------------------------------------------------------------------------
    // Users
    // -------------------------------------------------------------------------

    pub fn user(&self, id: &str) -> Option<&UserRecord> {
        self.users.get(id)
    }

    pub fn student(&self, id: &str) -> Option<&UserRecord> {
        self.users.get(id).filter(|u| u.is_student())
    }

    pub fn actor(&self, id: &str) -> Option<&UserRecord> {
        self.users.get(id).filter(|u| u.is_actor())
    }

    pub fn students(&self) -> impl Iterator<Item = &UserRecord> {
        self.users.values().filter(|u| u.is_student())
    }

    pub fn actors(&self) -> impl Iterator<Item = &UserRecord> {
        self.users.values().filter(|u| u.is_actor())
    }

    pub fn contains_user(&self, id: &str) -> bool {
        self.users.contains_key(id)
    }

    /// Case-insensitive email lookup across students and actors.
    pub fn user_by_email(&self, email: &str) -> Option<&UserRecord> {
        self.users
            .values()
            .find(|u| u.profile.email.eq_ignore_ascii_case(email))
    }

    /// Whether a user other than `except_id` already uses `email`.
    pub fn email_taken(&self, email: &str, except_id: Option<&str>) -> bool {
        self.user_by_email(email)
            .is_some_and(|u| Some(u.id()) != except_id)
    }

    /// Whether a student other than `except_id` already uses `code`.
    pub fn student_code_taken(&self, code: &str, except_id: Option<&str>) -> bool {
        self.students().any(|u| {
            Some(u.id()) != except_id
                && matches!(&u.kind, UserKind::Student(d) if d.student_code == code)
        })
    }

    /// Insert or replace a user.
    pub fn put_user(&mut self, user: UserRecord) {
        self.users.insert(user.profile.id.clone(), user);
    }

    pub fn remove_student(&mut self, id: &str) -> Result<UserRecord, ApiError> {
        if self.student(id).is_none() {
            return Err(ApiError::student_not_found(id));
        }
        self.users
            .remove(id)
            .ok_or_else(|| ApiError::student_not_found(id))
    }

    pub fn remove_actor(&mut self, id: &str) -> Result<UserRecord, ApiError> {
        if self.actor(id).is_none() {
            return Err(ApiError::actor_not_found(id));
        }
        self.users
            .remove(id)
            .ok_or_else(|| ApiError::actor_not_found(id))
    }

    // -------------------------------------------------------------------------
    // Roles
    // -------------------------------------------------------------------------

    pub fn role(&self, id: &str) -> Option<&RoleRecord> {
        self.roles.get(id)
    }

    pub fn role_by_name(&self, name: &str) -> Option<&RoleRecord> {
        self.roles.values().find(|r| r.name == name)
    }

    pub fn roles(&self) -> Vec<RoleRecord> {
        self.roles.values().cloned().collect()
    }

    /// Insert or replace a role.
    pub fn insert_role(&mut self, role: RoleRecord) {
        self.roles.insert(role.id_role.clone(), role);
    }

    pub fn role_mut(&mut self, id: &str) -> Result<&mut RoleRecord, ApiError> {
        self.roles
            .get_mut(id)
            .ok_or_else(|| ApiError::role_not_found(id))
    }

    pub fn remove_role(&mut self, id: &str) -> Result<RoleRecord, ApiError> {
        self.roles
            .remove(id)
            .ok_or_else(|| ApiError::role_not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActorDetails, Sex, StudentDetails, UserProfile};
    use axum::http::StatusCode;
    use chrono::Utc;

    fn profile(id: &str, email: &str) -> UserProfile {
        UserProfile {
            id: id.to_string(),
            name: "Test User".to_string(),
            email: email.to_string(),
            phone: None,
            image: None,
            sex: Sex::Male,
            password_hash: "digest".to_string(),
            role_id: "STUDENT".to_string(),
            program_ids: ["p1".to_string()].into_iter().collect(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn student(id: &str, email: &str, code: &str) -> UserRecord {
        UserRecord {
            profile: profile(id, email),
            kind: UserKind::Student(StudentDetails {
                student_code: code.to_string(),
                status: true,
                semester: 1,
            }),
        }
    }

    fn actor(id: &str, email: &str) -> UserRecord {
        UserRecord {
            profile: profile(id, email),
            kind: UserKind::Actor(ActorDetails { position: None }),
        }
    }

    #[test]
    fn students_and_actors_are_kept_apart() {
        let mut store = InMemoryStore::new();
        store.put_user(student("s1", "s1@unibague.edu.co", "20201234"));
        store.put_user(actor("a1", "a1@unibague.edu.co"));

        assert!(store.student("s1").is_some());
        assert!(store.student("a1").is_none());
        assert!(store.actor("a1").is_some());
        assert!(store.actor("s1").is_none());
        assert_eq!(store.students().count(), 1);
        assert_eq!(store.actors().count(), 1);
    }

    #[test]
    fn email_uniqueness_is_case_insensitive() {
        let mut store = InMemoryStore::new();
        store.put_user(student("s1", "Ana@unibague.edu.co", "20201234"));

        assert!(store.email_taken("ana@UNIBAGUE.edu.co", None));
        assert!(!store.email_taken("ana@unibague.edu.co", Some("s1")));
        assert!(!store.email_taken("other@unibague.edu.co", None));
    }

    #[test]
    fn student_code_uniqueness_ignores_self() {
        let mut store = InMemoryStore::new();
        store.put_user(student("s1", "s1@unibague.edu.co", "20201234"));

        assert!(store.student_code_taken("20201234", None));
        assert!(store.student_code_taken("20201234", Some("s2")));
        assert!(!store.student_code_taken("20201234", Some("s1")));
    }

    #[test]
    fn removing_the_wrong_kind_is_not_found() {
        let mut store = InMemoryStore::new();
        store.put_user(actor("a1", "a1@unibague.edu.co"));

        let err = store.remove_student("a1").unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, "STUDENT_NOT_FOUND");
        assert!(store.actor("a1").is_some());

        assert!(store.remove_actor("a1").is_ok());
        assert!(store.remove_actor("a1").is_err());
    }

    #[test]
    fn default_roles_are_seeded() {
        let store = InMemoryStore::with_default_roles();
        assert_eq!(store.roles().len(), DEFAULT_ROLES.len());
        assert!(store.role("STUDENT").is_some());
        assert_eq!(store.role_by_name("TEACHER").unwrap().id_role, "TEACHER");
    }

    #[test]
    fn role_lookups_report_not_found() {
        let mut store = InMemoryStore::new();
        assert_eq!(store.role_mut("missing").unwrap_err().code, "ROLE_NOT_FOUND");
        assert_eq!(store.remove_role("missing").unwrap_err().code, "ROLE_NOT_FOUND");
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Field validation for user records.
//!
//! Checks that need the store (uniqueness, role existence) take it by
//! reference; the caller holds the lock for the whole create or update so
//! the check and the write cannot interleave with another request.

use crate::error::ApiError;
use crate::models::RoleRecord;
use crate::store::InMemoryStore;

const NAME_MIN_CHARS: usize = 2;
const NAME_MAX_CHARS: usize = 100;
const STUDENT_CODE_MIN_DIGITS: usize = 8;
const STUDENT_CODE_MAX_DIGITS: usize = 12;
const SEMESTER_RANGE: std::ops::RangeInclusive<u8> = 1..=10;

/// Institution-wide rules for user fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSettings {
    /// Required email suffix, including the `@`
    pub email_domain: String,
    pub strict_email_validation: bool,
    pub password_min_length: usize,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            email_domain: "@unibague.edu.co".to_string(),
            strict_email_validation: true,
            password_min_length: 8,
        }
    }
}

pub fn validate_name(name: &str) -> Result<(), ApiError> {
    let chars = name.trim().chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&chars) {
        return Err(ApiError::validation(format!(
            "Name must be between {NAME_MIN_CHARS} and {NAME_MAX_CHARS} characters"
        )));
    }
    Ok(())
}

/// E.164-like: optional `+`, then 2 to 15 digits not starting with 0.
pub fn validate_phone(phone: Option<&str>) -> Result<(), ApiError> {
    let Some(phone) = phone else {
        return Ok(());
    };
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    let valid = (2..=15).contains(&digits.len())
        && digits.bytes().all(|b| b.is_ascii_digit())
        && !digits.starts_with('0');
    if !valid {
        return Err(ApiError::validation("Phone number format is invalid"));
    }
    Ok(())
}

/// A new user id must be present and unused by any student or actor.
pub fn validate_new_user_id(store: &InMemoryStore, id: &str) -> Result<(), ApiError> {
    if id.trim().is_empty() {
        return Err(ApiError::validation("User ID is required"));
    }
    if store.contains_user(id) {
        return Err(ApiError::duplicate_user("ID", id));
    }
    Ok(())
}

/// Check format, domain and uniqueness. `owner_id` is the user being
/// updated, whose own address does not count as a duplicate.
pub fn validate_email(
    settings: &UserSettings,
    store: &InMemoryStore,
    email: &str,
    owner_id: Option<&str>,
) -> Result<(), ApiError> {
    if email.trim().is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if !is_email_shaped(email) {
        return Err(ApiError::validation("Email format is invalid"));
    }
    if settings.strict_email_validation
        && !email
            .to_ascii_lowercase()
            .ends_with(&settings.email_domain.to_ascii_lowercase())
    {
        return Err(ApiError::invalid_email(email, &settings.email_domain));
    }
    if store.email_taken(email, owner_id) {
        return Err(ApiError::duplicate_user("email", email));
    }
    Ok(())
}

fn is_email_shaped(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

pub fn validate_password(settings: &UserSettings, password: &str) -> Result<(), ApiError> {
    if password.trim().is_empty() {
        return Err(ApiError::invalid_password("Password is required"));
    }
    if password.chars().count() < settings.password_min_length {
        return Err(ApiError::invalid_password(format!(
            "Password must be at least {} characters long",
            settings.password_min_length
        )));
    }
    Ok(())
}

/// Student codes are 8 to 12 ASCII digits and unique among students.
pub fn validate_student_code(
    store: &InMemoryStore,
    code: &str,
    owner_id: Option<&str>,
) -> Result<(), ApiError> {
    if code.trim().is_empty() {
        return Err(ApiError::validation("Student ID is required"));
    }
    if !(STUDENT_CODE_MIN_DIGITS..=STUDENT_CODE_MAX_DIGITS).contains(&code.len())
        || !code.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(ApiError::validation(format!(
            "Student ID must be {STUDENT_CODE_MIN_DIGITS}-{STUDENT_CODE_MAX_DIGITS} digits"
        )));
    }
    if store.student_code_taken(code, owner_id) {
        return Err(ApiError::duplicate_student(code));
    }
    Ok(())
}

pub fn parse_semester(raw: &str) -> Result<u8, ApiError> {
    raw.trim()
        .parse::<u8>()
        .ok()
        .filter(|s| SEMESTER_RANGE.contains(s))
        .ok_or_else(|| ApiError::validation("Semester must be between 1 and 10"))
}

/// The referenced role must exist.
pub fn validate_role<'a>(store: &'a InMemoryStore, role_id: &str) -> Result<&'a RoleRecord, ApiError> {
    if role_id.trim().is_empty() {
        return Err(ApiError::validation("Role ID is required"));
    }
    store
        .role(role_id)
        .ok_or_else(|| ApiError::role_not_found(role_id))
}

/// Whether `id` is safe to use as a single URL path segment.
///
/// Rejects separators, dot segments and control characters.
pub fn is_valid_program_id(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && !id
            .chars()
            .any(|c| matches!(c, '/' | '\\' | '?' | '#' | '%') || c.is_control())
}

/// Trim, drop blanks and duplicates. Ids that could not be sent to the
/// Program service as a path segment are rejected.
pub fn normalize_program_ids(
    programs: &[String],
) -> Result<std::collections::BTreeSet<String>, ApiError> {
    let mut ids = std::collections::BTreeSet::new();
    for program in programs.iter().map(|p| p.trim()).filter(|p| !p.is_empty()) {
        if !is_valid_program_id(program) {
            return Err(ApiError::validation(format!(
                "Program ID '{program}' is invalid"
            )));
        }
        ids.insert(program.to_string());
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn names_are_length_checked() {
        assert!(validate_name("Al").is_ok());
        assert!(validate_name("A").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn phones_follow_e164() {
        assert!(validate_phone(None).is_ok());
        assert!(validate_phone(Some("+573001234567")).is_ok());
        assert!(validate_phone(Some("3001234567")).is_ok());
        assert!(validate_phone(Some("0300")).is_err());
        assert!(validate_phone(Some("+57 300")).is_err());
        assert!(validate_phone(Some("1")).is_err());
    }

    #[test]
    fn email_domain_is_enforced_when_strict() {
        let store = InMemoryStore::new();
        let strict = UserSettings::default();

        assert!(validate_email(&strict, &store, "ana@unibague.edu.co", None).is_ok());
        assert!(validate_email(&strict, &store, "ANA@UNIBAGUE.EDU.CO", None).is_ok());

        let err = validate_email(&strict, &store, "ana@gmail.com", None).unwrap_err();
        assert_eq!(err.code, "INVALID_EMAIL");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let relaxed = UserSettings {
            strict_email_validation: false,
            ..UserSettings::default()
        };
        assert!(validate_email(&relaxed, &store, "ana@gmail.com", None).is_ok());
    }

    #[test]
    fn malformed_emails_are_rejected() {
        let store = InMemoryStore::new();
        let relaxed = UserSettings {
            strict_email_validation: false,
            ..UserSettings::default()
        };
        for email in ["", "ana", "@unibague.edu.co", "ana@localhost", "a b@x.co", "a@b@c.co"] {
            assert!(
                validate_email(&relaxed, &store, email, None).is_err(),
                "{email:?} should be rejected"
            );
        }
    }

    #[test]
    fn passwords_respect_min_length() {
        let settings = UserSettings::default();
        assert!(validate_password(&settings, "12345678").is_ok());

        let err = validate_password(&settings, "1234567").unwrap_err();
        assert_eq!(err.code, "INVALID_PASSWORD");
        assert!(validate_password(&settings, "        ").is_err());
    }

    #[test]
    fn student_codes_are_8_to_12_digits() {
        let store = InMemoryStore::new();
        assert!(validate_student_code(&store, "12345678", None).is_ok());
        assert!(validate_student_code(&store, "123456789012", None).is_ok());
        assert!(validate_student_code(&store, "1234567", None).is_err());
        assert!(validate_student_code(&store, "1234567890123", None).is_err());
        assert!(validate_student_code(&store, "12345a78", None).is_err());
    }

    #[test]
    fn semesters_are_1_to_10() {
        assert_eq!(parse_semester("1").unwrap(), 1);
        assert_eq!(parse_semester(" 10 ").unwrap(), 10);
        assert!(parse_semester("0").is_err());
        assert!(parse_semester("11").is_err());
        assert!(parse_semester("first").is_err());
    }

    #[test]
    fn roles_must_exist() {
        let store = InMemoryStore::with_default_roles();
        assert_eq!(validate_role(&store, "STUDENT").unwrap().name, "STUDENT");
        assert_eq!(validate_role(&store, "GHOST").unwrap_err().code, "ROLE_NOT_FOUND");
        assert_eq!(validate_role(&store, " ").unwrap_err().code, "VALIDATION_ERROR");
    }

    #[test]
    fn program_ids_are_normalized() {
        let ids = normalize_program_ids(&[
            " p1 ".to_string(),
            "p2".to_string(),
            "".to_string(),
            "p1".to_string(),
        ])
        .unwrap();
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec!["p1", "p2"]);
    }

    #[test]
    fn program_ids_that_escape_the_path_are_rejected() {
        for bad in ["..", ".", "p1/../admin", "a\\b", "p1?x=1", "p1#frag", "%2e%2e", "p\n1"] {
            let err = normalize_program_ids(&["p1".to_string(), bad.to_string()]).unwrap_err();
            assert_eq!(err.code, "VALIDATION_ERROR", "{bad:?}");
        }
        assert!(is_valid_program_id("PRG-2024_01.a"));
    }
}

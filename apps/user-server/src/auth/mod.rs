// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Trust and Authorization
//!
//! This service never authenticates end users itself. The API gateway does,
//! and forwards the caller's identity as headers. Internal services call in
//! directly with a shared secret.
//!
//! ## Request Flow
//!
//! 1. [`trust`] classifies the request (public, gateway, service, direct)
//! 2. [`middleware::trust_gate`] rejects direct requests with 403
//! 3. [`principal`] builds the caller's principal from trusted headers
//! 4. [`context`] holds the principal for the lifetime of the request
//! 5. Handlers consult [`policy`] before touching any record
//!
//! ## Security
//!
//! - Identity headers are only read after the gateway marker was seen
//! - The `SERVICE` role is only reachable through the shared secret
//! - The shared secret is compared in constant time and never logged
//! - Unrecognized roles get least privilege

pub mod context;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod policy;
pub mod principal;
pub mod roles;
pub mod trust;

pub use error::AuthError;
pub use extractor::{Auth, CurrentPrincipal};
pub use policy::{
    authorize, enforce, may_change_scope, visible_in_listing, Decision, Operation,
    ResourceAccessQuery,
};
pub use principal::{AuthenticatedPrincipal, TrustSource};
pub use roles::Role;
pub use trust::{ServiceToken, TrustClassification, TrustClassifier};

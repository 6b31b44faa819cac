// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Orion User Service
//!
//! Student, actor and role management for the Orion academic platform. The
//! service sits behind the API gateway and trusts identity only from the
//! gateway headers or from a shared service token.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Trust classification, request principal and access policy
//! - `programs` - Program service client with a TTL cache
//! - `store` - In-memory user and role store

pub mod api;
pub mod auth;
pub mod config;
pub mod credentials;
pub mod error;
pub mod models;
pub mod programs;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod validation;

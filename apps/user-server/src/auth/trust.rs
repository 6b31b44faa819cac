// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Header trust classification.
//!
//! Every inbound request is classified exactly once, before any handler
//! runs. The classification decides whether the request may proceed and how
//! its principal is established:
//!
//! | Classification | Signal |
//! |----------------|--------|
//! | `Public` | path in the public allowlist (health checks) |
//! | `GatewayValidated` | `X-Gateway-Validated: true` |
//! | `ServiceToService` | `X-Internal-Request: true`, `X-Service-Request: true` and a matching `X-Service-Token` |
//! | `DirectUntrusted` | anything else; rejected |
//!
//! Classification is a pure function of the path, the headers and the
//! startup configuration. Missing or malformed headers are not errors; they
//! simply leave the request untrusted.

use axum::http::HeaderMap;
use serde::Serialize;
use subtle::ConstantTimeEq;

/// Marker set by the gateway after it authenticated the caller.
pub const H_GATEWAY_VALIDATED: &str = "x-gateway-validated";
/// Marker set on internal calls.
pub const H_INTERNAL_REQUEST: &str = "x-internal-request";
/// Marker set on service-to-service calls.
pub const H_SERVICE_REQUEST: &str = "x-service-request";
/// Shared secret presented by internal services.
pub const H_SERVICE_TOKEN: &str = "x-service-token";
/// Name of the calling service (audit only).
pub const H_SERVICE_NAME: &str = "x-service-name";

/// Sentinel value for the boolean marker headers.
const TRUE_SENTINEL: &str = "true";

/// Outcome of classifying one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrustClassification {
    Public,
    GatewayValidated,
    ServiceToService,
    DirectUntrusted,
}

impl TrustClassification {
    /// Whether the request may continue to a handler.
    pub fn is_admitted(&self) -> bool {
        !matches!(self, TrustClassification::DirectUntrusted)
    }
}

/// Shared secret for service-to-service calls.
///
/// `Debug` is redacted so the value never reaches a log line.
#[derive(Clone)]
pub struct ServiceToken(String);

impl ServiceToken {
    /// Wrap a configured secret. Blank secrets are rejected.
    pub fn new(secret: impl Into<String>) -> Option<Self> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            None
        } else {
            Some(Self(secret))
        }
    }

    /// Constant-time comparison against a presented token.
    pub fn matches(&self, presented: &str) -> bool {
        // ct_eq on slices of different length returns false without
        // inspecting content.
        bool::from(self.0.as_bytes().ct_eq(presented.as_bytes()))
    }
}

impl std::fmt::Debug for ServiceToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ServiceToken(<redacted>)")
    }
}

/// Classifier configured once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct TrustClassifier {
    public_paths: Vec<String>,
    service_token: Option<ServiceToken>,
}

impl TrustClassifier {
    /// Create a classifier.
    ///
    /// Without a service token no request can ever be classified as
    /// `ServiceToService`.
    pub fn new(public_paths: Vec<String>, service_token: Option<ServiceToken>) -> Self {
        let public_paths = public_paths
            .into_iter()
            .map(|p| p.trim().trim_end_matches('/').to_string())
            .filter(|p| !p.is_empty())
            .collect();

        Self {
            public_paths,
            service_token,
        }
    }

    /// Whether a shared secret is configured.
    pub fn service_token_configured(&self) -> bool {
        self.service_token.is_some()
    }

    /// Whether `path` is on the public allowlist.
    ///
    /// A configured entry matches the exact path and anything below it
    /// (`/health` matches `/health/live`, not `/healthz`).
    pub fn is_public_path(&self, path: &str) -> bool {
        self.public_paths.iter().any(|allowed| {
            path == allowed
                || path
                    .strip_prefix(allowed.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    /// Classify a request.
    pub fn classify(&self, path: &str, headers: &HeaderMap) -> TrustClassification {
        if self.is_public_path(path) {
            return TrustClassification::Public;
        }

        if header_is_true(headers, H_GATEWAY_VALIDATED) {
            return TrustClassification::GatewayValidated;
        }

        if self.is_service_request(headers) {
            return TrustClassification::ServiceToService;
        }

        TrustClassification::DirectUntrusted
    }

    fn is_service_request(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = &self.service_token else {
            return false;
        };

        if !header_is_true(headers, H_INTERNAL_REQUEST)
            || !header_is_true(headers, H_SERVICE_REQUEST)
        {
            return false;
        }

        header_value(headers, H_SERVICE_TOKEN).is_some_and(|presented| expected.matches(presented))
    }
}

/// Read a header as trimmed UTF-8. Non-UTF-8 and blank values read as absent.
pub(crate) fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Markers must equal the sentinel exactly; no trimming or case folding.
fn header_is_true(headers: &HeaderMap, name: &str) -> bool {
    headers
        .get(name)
        .is_some_and(|v| v.as_bytes() == TRUE_SENTINEL.as_bytes())
}

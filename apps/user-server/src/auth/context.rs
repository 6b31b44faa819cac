// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request-scoped principal store.
//!
//! Each request gets its own [`RequestContext`], carried in the request's
//! extensions. Nothing is global: two in-flight requests can never see each
//! other's principal, whichever worker thread runs them.
//!
//! The trust middleware owns a [`ContextScope`] for the lifetime of the
//! request. Dropping the scope clears the store, so the principal is
//! released when the handler returns, fails, panics or is cancelled.

use std::sync::{Arc, Mutex, MutexGuard};

use super::principal::AuthenticatedPrincipal;

/// Holds at most one principal for one request.
#[derive(Debug, Default)]
pub struct RequestContext {
    principal: Mutex<Option<Arc<AuthenticatedPrincipal>>>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the principal, replacing any previous one.
    pub fn set(&self, principal: AuthenticatedPrincipal) {
        *self.slot() = Some(Arc::new(principal));
    }

    /// The current principal, if one was established.
    pub fn get(&self) -> Option<Arc<AuthenticatedPrincipal>> {
        self.slot().clone()
    }

    /// Remove the principal. Safe to call any number of times.
    pub fn clear(&self) {
        self.slot().take();
    }

    pub fn is_empty(&self) -> bool {
        self.slot().is_none()
    }

    fn slot(&self) -> MutexGuard<'_, Option<Arc<AuthenticatedPrincipal>>> {
        // The slot holds plain data; a panic while it was locked cannot
        // leave it half-written.
        self.principal
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Cheap handle to a request's context, stored in request extensions.
#[derive(Debug, Clone, Default)]
pub struct SharedContext(pub Arc<RequestContext>);

impl SharedContext {
    pub fn get(&self) -> Option<Arc<AuthenticatedPrincipal>> {
        self.0.get()
    }
}

/// Clears the context when dropped.
#[must_use = "the context is cleared as soon as the scope is dropped"]
pub struct ContextScope {
    context: Arc<RequestContext>,
}

impl ContextScope {
    /// Open a scope with a fresh context, populated with `principal` if any.
    pub fn open(principal: Option<AuthenticatedPrincipal>) -> Self {
        let context = Arc::new(RequestContext::new());
        if let Some(principal) = principal {
            context.set(principal);
        }
        Self { context }
    }

    /// Handle to insert into the request.
    pub fn handle(&self) -> SharedContext {
        SharedContext(Arc::clone(&self.context))
    }
}

impl Drop for ContextScope {
    fn drop(&mut self) {
        self.context.clear();
    }
}

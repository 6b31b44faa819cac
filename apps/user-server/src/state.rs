// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::auth::TrustClassifier;
use crate::programs::{ProgramDirectory, StaticProgramDirectory};
use crate::store::InMemoryStore;
use crate::validation::UserSettings;

/// Paths reachable without trust headers when nothing else is configured.
const DEFAULT_PUBLIC_PATHS: [&str; 2] = ["/health", "/actuator"];

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<InMemoryStore>>,
    pub programs: Arc<dyn ProgramDirectory>,
    /// Read-only after startup
    pub classifier: Arc<TrustClassifier>,
    pub users: Arc<UserSettings>,
}

impl AppState {
    pub fn new(store: InMemoryStore) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            programs: Arc::new(StaticProgramDirectory::default()),
            classifier: Arc::new(TrustClassifier::new(
                DEFAULT_PUBLIC_PATHS.iter().map(|p| p.to_string()).collect(),
                None,
            )),
            users: Arc::new(UserSettings::default()),
        }
    }

    pub fn with_classifier(mut self, classifier: TrustClassifier) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    pub fn with_programs(mut self, programs: Arc<dyn ProgramDirectory>) -> Self {
        self.programs = programs;
        self
    }

    pub fn with_user_settings(mut self, users: UserSettings) -> Self {
        self.users = Arc::new(users);
        self
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(InMemoryStore::with_default_roles())
    }
}

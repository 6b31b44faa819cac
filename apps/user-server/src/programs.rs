// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Program lookups.
//!
//! Users store program ids only. Views resolve them to names through a
//! [`ProgramDirectory`]; in production that is the Program service over
//! HTTP, fronted by a small LRU cache with a TTL.
//!
//! A lookup never fails a request: ids the directory cannot resolve are
//! left out of the view.

use std::collections::{BTreeSet, HashMap};
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use reqwest::StatusCode;
use tokio::sync::Mutex;
use url::Url;

use crate::config::ProgramServiceConfig;
use crate::models::ProgramRef;
use crate::validation::is_valid_program_id;

#[async_trait]
pub trait ProgramDirectory: Send + Sync {
    /// Details for one program, or `None` if it does not exist or the
    /// directory is unreachable.
    async fn get_program_details(&self, program_id: &str) -> Option<ProgramRef>;

    /// Resolve ids in order, skipping the ones that cannot be found.
    async fn resolve_programs(&self, program_ids: &BTreeSet<String>) -> Vec<ProgramRef> {
        let mut programs = Vec::with_capacity(program_ids.len());
        for id in program_ids {
            match self.get_program_details(id).await {
                Some(program) => programs.push(program),
                None => tracing::debug!(program_id = %id, "Dropping unresolved program from view"),
            }
        }
        programs
    }
}

// =============================================================================
// HTTP directory
// =============================================================================

struct CacheEntry {
    program: ProgramRef,
    inserted_at: Instant,
}

/// Program service client with a TTL cache of successful lookups.
pub struct HttpProgramDirectory {
    base_url: Url,
    client: reqwest::Client,
    cache: Mutex<LruCache<String, CacheEntry>>,
    ttl: Duration,
}

impl HttpProgramDirectory {
    pub fn new(config: &ProgramServiceConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        let capacity = NonZeroUsize::new(config.cache_max_size).unwrap_or(NonZeroUsize::MIN);

        Ok(Self {
            base_url: config.base_url.clone(),
            client,
            cache: Mutex::new(LruCache::new(capacity)),
            ttl: config.cache_ttl,
        })
    }

    fn program_url(&self, program_id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(program_id);
        }
        url
    }

    async fn cached(&self, program_id: &str) -> Option<ProgramRef> {
        let mut cache = self.cache.lock().await;
        if let Some(entry) = cache.get(program_id) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.program.clone());
            }
            cache.pop(program_id);
        }
        None
    }

    async fn fetch(&self, program_id: &str) -> Option<ProgramRef> {
        if !is_valid_program_id(program_id) {
            tracing::warn!(program_id, "Refusing to look up malformed program id");
            return None;
        }
        let url = self.program_url(program_id);
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(program_id, error = %e, "Program service unreachable");
                return None;
            }
        };

        match response.status() {
            status if status.is_success() => match response.json::<ProgramRef>().await {
                Ok(program) => Some(program),
                Err(e) => {
                    tracing::warn!(program_id, error = %e, "Unreadable program service response");
                    None
                }
            },
            StatusCode::NOT_FOUND => {
                tracing::debug!(program_id, "Program not found");
                None
            }
            status => {
                tracing::warn!(program_id, %status, "Program service returned an error");
                None
            }
        }
    }
}

#[async_trait]
impl ProgramDirectory for HttpProgramDirectory {
    async fn get_program_details(&self, program_id: &str) -> Option<ProgramRef> {
        if let Some(program) = self.cached(program_id).await {
            return Some(program);
        }

        let program = self.fetch(program_id).await?;
        self.cache.lock().await.put(
            program_id.to_string(),
            CacheEntry {
                program: program.clone(),
                inserted_at: Instant::now(),
            },
        );
        Some(program)
    }
}

// =============================================================================
// Static directory
// =============================================================================

/// Fixed set of programs. Used when no Program service is wired in.
#[derive(Debug, Default, Clone)]
pub struct StaticProgramDirectory {
    programs: HashMap<String, ProgramRef>,
}

impl StaticProgramDirectory {
    pub fn new(programs: impl IntoIterator<Item = ProgramRef>) -> Self {
        Self {
            programs: programs
                .into_iter()
                .map(|p| (p.program_id.clone(), p))
                .collect(),
        }
    }
}

#[async_trait]
impl ProgramDirectory for StaticProgramDirectory {
    async fn get_program_details(&self, program_id: &str) -> Option<ProgramRef> {
        self.programs.get(program_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::{extract::Path, http::StatusCode as AxumStatus, routing::get, Json, Router};

    fn program(id: &str, name: &str) -> ProgramRef {
        ProgramRef {
            program_id: id.to_string(),
            program_name: name.to_string(),
        }
    }

    /// Serve a fake Program service on an ephemeral port. Returns its base
    /// URL and a hit counter.
    async fn fake_program_service() -> (Url, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        let app = Router::new().route(
            "/service/program/{id}",
            get(move |Path(id): Path<String>| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    match id.as_str() {
                        "p1" => Ok(Json(program("p1", "Systems Engineering"))),
                        "broken" => Err(AxumStatus::INTERNAL_SERVER_ERROR),
                        _ => Err(AxumStatus::NOT_FOUND),
                    }
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let url = Url::parse(&format!("http://{addr}/service/program")).unwrap();
        (url, hits)
    }

    fn directory(base_url: Url, ttl: Duration) -> HttpProgramDirectory {
        HttpProgramDirectory::new(&ProgramServiceConfig {
            base_url,
            timeout: Duration::from_secs(5),
            cache_ttl: ttl,
            cache_max_size: 10,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn http_directory_resolves_and_caches() {
        let (url, hits) = fake_program_service().await;
        let dir = directory(url, Duration::from_secs(300));

        let first = dir.get_program_details("p1").await.unwrap();
        assert_eq!(first.program_name, "Systems Engineering");
        let second = dir.get_program_details("p1").await.unwrap();
        assert_eq!(second, first);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_entries_are_refetched() {
        let (url, hits) = fake_program_service().await;
        let dir = directory(url, Duration::ZERO);

        dir.get_program_details("p1").await.unwrap();
        dir.get_program_details("p1").await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn missing_and_failing_programs_resolve_to_none() {
        let (url, hits) = fake_program_service().await;
        let dir = directory(url, Duration::from_secs(300));

        assert!(dir.get_program_details("nope").await.is_none());
        assert!(dir.get_program_details("broken").await.is_none());
        // Misses are not cached.
        assert!(dir.get_program_details("nope").await.is_none());
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn malformed_ids_never_reach_the_service() {
        let (url, hits) = fake_program_service().await;
        let dir = directory(url, Duration::from_secs(300));

        for id in ["..", ".", "../p1", "p1/x"] {
            assert!(dir.get_program_details(id).await.is_none(), "{id}");
        }
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unreachable_service_resolves_to_none() {
        let dir = directory(
            Url::parse("http://127.0.0.1:9/service/program").unwrap(),
            Duration::from_secs(300),
        );
        assert!(dir.get_program_details("p1").await.is_none());
    }

    #[test]
    fn program_urls_escape_ids() {
        let dir = directory(
            Url::parse("http://programs.internal/service/program/").unwrap(),
            Duration::from_secs(1),
        );
        assert_eq!(
            dir.program_url("p1").as_str(),
            "http://programs.internal/service/program/p1"
        );
        assert_eq!(
            dir.program_url("a/b c").as_str(),
            "http://programs.internal/service/program/a%2Fb%20c"
        );
    }

    #[tokio::test]
    async fn resolve_skips_unknown_ids() {
        let dir = StaticProgramDirectory::new([program("p1", "One"), program("p2", "Two")]);
        let ids: BTreeSet<String> = ["p1", "ghost", "p2"].map(String::from).into();

        let resolved = dir.resolve_programs(&ids).await;
        let names: Vec<_> = resolved.iter().map(|p| p.program_name.as_str()).collect();
        assert_eq!(names, vec!["One", "Two"]);
    }
}

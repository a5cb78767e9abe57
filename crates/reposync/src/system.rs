//! The seams to the resolver/deployer collaborator.
//!
//! Dependency-graph resolution and artifact transport live behind
//! [`RepositorySystem`]. Implementations report every artifact they touch
//! to the listeners installed on the [`ResolutionSession`] they are given.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use crate::artifact::{DeployArtifact, ResolvedArtifact};
use crate::coordinate::ArtifactCoordinate;

/// A remote repository artifacts are resolved from or deployed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteRepository {
    pub id: String,
    pub url: String,
}

impl RemoteRepository {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }
}

impl fmt::Display for RemoteRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.url)
    }
}

/// Notification that resolution finished for one artifact.
#[derive(Debug, Clone, Copy)]
pub struct RepositoryEvent<'a> {
    pub coordinate: &'a ArtifactCoordinate,
    /// `None` when the artifact could not be resolved.
    pub file: Option<&'a Path>,
    /// `None` when the artifact came from the local repository.
    pub repository: Option<&'a RemoteRepository>,
}

/// Observes artifact resolutions performed within a session.
pub trait RepositoryListener: Send + Sync {
    fn artifact_resolved(&self, event: &RepositoryEvent<'_>);
}

type CacheEntry = Arc<dyn Any + Send + Sync>;

/// Session-scoped memo store for collaborators, keyed by string.
#[derive(Default)]
pub struct ResolutionCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResolutionCache {
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = Arc::clone(entries.get(key)?);
        entry.downcast::<T>().ok()
    }

    pub fn put<T: Any + Send + Sync>(&self, key: impl Into<String>, value: Arc<T>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value);
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Context passed to every collaborator call: the listeners to notify and
/// the cache results may be memoized in.
#[derive(Clone, Default)]
pub struct ResolutionSession {
    listeners: Vec<Arc<dyn RepositoryListener>>,
    cache: Arc<ResolutionCache>,
}

impl ResolutionSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener after the ones already installed.
    pub fn with_listener(mut self, listener: Arc<dyn RepositoryListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// A session with an empty cache whose listeners are `first`, followed
    /// by this session's listeners.
    pub fn derive_fresh(&self, first: Vec<Arc<dyn RepositoryListener>>) -> Self {
        let mut listeners = first;
        listeners.extend(self.listeners.iter().cloned());
        Self {
            listeners,
            cache: Arc::new(ResolutionCache::default()),
        }
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Deliver `event` to every listener in order.
    pub fn notify(&self, event: &RepositoryEvent<'_>) {
        for listener in &self.listeners {
            listener.artifact_resolved(event);
        }
    }
}

impl fmt::Debug for ResolutionSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionSession")
            .field("listeners", &self.listeners.len())
            .field("cached", &self.cache.len())
            .finish()
    }
}

/// Resolve the transitive closure of a single root artifact.
#[derive(Debug, Clone)]
pub struct DependencyRequest {
    pub root: ArtifactCoordinate,
    pub repositories: Vec<RemoteRepository>,
}

/// The winning artifacts of a dependency resolution.
#[derive(Debug, Clone, Default)]
pub struct DependencyResult {
    pub artifact_results: Vec<ResolvedArtifact>,
}

#[derive(Debug, thiserror::Error)]
#[error("failed to resolve dependencies of {root}: {message}")]
pub struct DependencyResolutionError {
    pub root: ArtifactCoordinate,
    pub message: String,
}

/// Resolve one artifact, without its dependencies.
#[derive(Debug, Clone)]
pub struct ArtifactRequest {
    pub coordinate: ArtifactCoordinate,
    pub repositories: Vec<RemoteRepository>,
}

/// Why a single artifact request failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArtifactFailure {
    #[error("not found")]
    NotFound,

    #[error("{0}")]
    Other(String),
}

/// Outcome of one request within a batch.
#[derive(Debug, Clone)]
pub struct ArtifactResult {
    pub coordinate: ArtifactCoordinate,
    pub outcome: Result<ResolvedArtifact, Vec<ArtifactFailure>>,
}

impl ArtifactResult {
    pub fn is_resolved(&self) -> bool {
        self.outcome.is_ok()
    }
}

fn failed_count(results: &[ArtifactResult]) -> usize {
    results.iter().filter(|r| !r.is_resolved()).count()
}

/// A batch resolution in which at least one request failed. Carries the
/// outcome of every request in the batch.
#[derive(Debug, thiserror::Error)]
#[error("could not resolve {} of {} artifact(s)", failed_count(.results), .results.len())]
pub struct ArtifactResolutionError {
    pub results: Vec<ArtifactResult>,
}

/// Publish a set of artifacts to one repository in a single call.
#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub artifacts: Vec<DeployArtifact>,
    pub repository: RemoteRepository,
}

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("unsupported repository: {0}")]
    UnsupportedRepository(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("{0}")]
    Other(String),
}

/// Dependency resolution and artifact transport.
#[async_trait::async_trait]
pub trait RepositorySystem: Send + Sync {
    /// Resolve `request.root` and its transitive dependencies, reporting
    /// every artifact touched (selected or not) to the session listeners.
    async fn resolve_dependencies(
        &self,
        session: &ResolutionSession,
        request: &DependencyRequest,
    ) -> Result<DependencyResult, DependencyResolutionError>;

    /// Resolve each request independently. Fails when any request fails.
    async fn resolve_artifacts(
        &self,
        session: &ResolutionSession,
        requests: &[ArtifactRequest],
    ) -> Result<Vec<ResolvedArtifact>, ArtifactResolutionError>;

    /// Publish all artifacts of `request` together.
    async fn deploy(
        &self,
        session: &ResolutionSession,
        request: &DeployRequest,
    ) -> Result<(), DeployError>;
}

#[async_trait::async_trait]
impl<T: RepositorySystem + ?Sized> RepositorySystem for Arc<T> {
    async fn resolve_dependencies(
        &self,
        session: &ResolutionSession,
        request: &DependencyRequest,
    ) -> Result<DependencyResult, DependencyResolutionError> {
        (**self).resolve_dependencies(session, request).await
    }

    async fn resolve_artifacts(
        &self,
        session: &ResolutionSession,
        requests: &[ArtifactRequest],
    ) -> Result<Vec<ResolvedArtifact>, ArtifactResolutionError> {
        (**self).resolve_artifacts(session, requests).await
    }

    async fn deploy(
        &self,
        session: &ResolutionSession,
        request: &DeployRequest,
    ) -> Result<(), DeployError> {
        (**self).deploy(session, request).await
    }
}

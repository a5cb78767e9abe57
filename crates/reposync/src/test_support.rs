use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use crate::artifact::ResolvedArtifact;
use crate::coordinate::{ArtifactCoordinate, ArtifactPath};
use crate::system::{
    ArtifactFailure, ArtifactRequest, ArtifactResolutionError, ArtifactResult, DependencyRequest,
    DependencyResolutionError, DependencyResult, DeployError, DeployRequest, RemoteRepository,
    RepositoryEvent, RepositorySystem, ResolutionSession,
};

/// Repository every artifact comes from unless scripted otherwise.
pub const DEFAULT_ORIGIN_URL: &str = "memory://central";

#[derive(Debug, Clone, Default)]
struct Graph {
    winners: Vec<ArtifactCoordinate>,
    losers: Vec<ArtifactCoordinate>,
}

#[derive(Debug, Default)]
struct CallLog {
    dependency_requests: Vec<ArtifactCoordinate>,
    artifact_requests: Vec<Vec<ArtifactCoordinate>>,
    deployments: Vec<DeployRequest>,
    deploy_listener_counts: Vec<usize>,
}

/// Scripted repository system for testing. Dependency graphs, origins and
/// failures are declared up front; every call is recorded.
pub struct InMemoryRepositorySystem {
    default_origin: RemoteRepository,
    graphs: HashMap<ArtifactCoordinate, Graph>,
    origins: HashMap<ArtifactCoordinate, RemoteRepository>,
    available: HashSet<ArtifactCoordinate>,
    failures: HashMap<ArtifactCoordinate, ArtifactFailure>,
    failing_roots: HashSet<ArtifactCoordinate>,
    failing_deploys: HashSet<ArtifactPath>,
    log: Mutex<CallLog>,
}

impl Default for InMemoryRepositorySystem {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRepositorySystem {
    pub fn new() -> Self {
        Self {
            default_origin: RemoteRepository::new("central", DEFAULT_ORIGIN_URL),
            graphs: HashMap::new(),
            origins: HashMap::new(),
            available: HashSet::new(),
            failures: HashMap::new(),
            failing_roots: HashSet::new(),
            failing_deploys: HashSet::new(),
            log: Mutex::new(CallLog::default()),
        }
    }

    /// Resolving `root` selects `winners` and also touches `losers`.
    /// Roots without a graph resolve to themselves alone.
    pub fn add_graph(
        &mut self,
        root: ArtifactCoordinate,
        winners: Vec<ArtifactCoordinate>,
        losers: Vec<ArtifactCoordinate>,
    ) {
        self.graphs.insert(root, Graph { winners, losers });
    }

    pub fn set_origin(&mut self, coordinate: ArtifactCoordinate, origin: RemoteRepository) {
        self.origins.insert(coordinate, origin);
    }

    /// Make a single artifact resolvable by `resolve_artifacts`.
    pub fn add_artifact(&mut self, coordinate: ArtifactCoordinate) {
        self.available.insert(coordinate);
    }

    pub fn fail_artifact(&mut self, coordinate: ArtifactCoordinate, failure: ArtifactFailure) {
        self.failures.insert(coordinate, failure);
    }

    pub fn fail_root(&mut self, root: ArtifactCoordinate) {
        self.failing_roots.insert(root);
    }

    pub fn fail_deploy(&mut self, path: ArtifactPath) {
        self.failing_deploys.insert(path);
    }

    pub fn dependency_requests(&self) -> Vec<ArtifactCoordinate> {
        self.log().dependency_requests.clone()
    }

    pub fn artifact_requests(&self) -> Vec<Vec<ArtifactCoordinate>> {
        self.log().artifact_requests.clone()
    }

    pub fn deployments(&self) -> Vec<DeployRequest> {
        self.log().deployments.clone()
    }

    /// Listener count of the session each deploy call received.
    pub fn deploy_listener_counts(&self) -> Vec<usize> {
        self.log().deploy_listener_counts.clone()
    }

    fn log(&self) -> std::sync::MutexGuard<'_, CallLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn file_for(coordinate: &ArtifactCoordinate) -> PathBuf {
        PathBuf::from(format!("/memory/{}", coordinate.canonical().replace(':', "/")))
    }

    fn origin_of(&self, coordinate: &ArtifactCoordinate) -> &RemoteRepository {
        self.origins.get(coordinate).unwrap_or(&self.default_origin)
    }

    fn emit_resolved(&self, session: &ResolutionSession, coordinate: &ArtifactCoordinate) -> PathBuf {
        let file = Self::file_for(coordinate);
        session.notify(&RepositoryEvent {
            coordinate,
            file: Some(file.as_path()),
            repository: Some(self.origin_of(coordinate)),
        });
        file
    }

    fn emit_missing(&self, session: &ResolutionSession, coordinate: &ArtifactCoordinate) {
        session.notify(&RepositoryEvent {
            coordinate,
            file: None,
            repository: None,
        });
    }
}

#[async_trait::async_trait]
impl RepositorySystem for InMemoryRepositorySystem {
    async fn resolve_dependencies(
        &self,
        session: &ResolutionSession,
        request: &DependencyRequest,
    ) -> Result<DependencyResult, DependencyResolutionError> {
        self.log().dependency_requests.push(request.root.clone());

        if self.failing_roots.contains(&request.root) {
            return Err(DependencyResolutionError {
                root: request.root.clone(),
                message: "scripted failure".into(),
            });
        }

        let graph = self.graphs.get(&request.root).cloned().unwrap_or_else(|| Graph {
            winners: vec![request.root.clone()],
            losers: Vec::new(),
        });

        for loser in &graph.losers {
            self.emit_resolved(session, loser);
        }

        let artifact_results = graph
            .winners
            .into_iter()
            .map(|winner| {
                let file = self.emit_resolved(session, &winner);
                ResolvedArtifact::new(winner, file)
            })
            .collect();

        Ok(DependencyResult { artifact_results })
    }

    async fn resolve_artifacts(
        &self,
        session: &ResolutionSession,
        requests: &[ArtifactRequest],
    ) -> Result<Vec<ResolvedArtifact>, ArtifactResolutionError> {
        self.log()
            .artifact_requests
            .push(requests.iter().map(|r| r.coordinate.clone()).collect());

        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            let coordinate = &request.coordinate;
            let outcome = if let Some(failure) = self.failures.get(coordinate) {
                self.emit_missing(session, coordinate);
                Err(vec![failure.clone()])
            } else if self.available.contains(coordinate) {
                let file = self.emit_resolved(session, coordinate);
                Ok(ResolvedArtifact::new(coordinate.clone(), file))
            } else {
                self.emit_missing(session, coordinate);
                Err(vec![ArtifactFailure::NotFound])
            };
            results.push(ArtifactResult {
                coordinate: coordinate.clone(),
                outcome,
            });
        }

        if results.iter().all(ArtifactResult::is_resolved) {
            Ok(results.into_iter().filter_map(|r| r.outcome.ok()).collect())
        } else {
            Err(ArtifactResolutionError { results })
        }
    }

    async fn deploy(
        &self,
        session: &ResolutionSession,
        request: &DeployRequest,
    ) -> Result<(), DeployError> {
        {
            let mut log = self.log();
            log.deployments.push(request.clone());
            log.deploy_listener_counts.push(session.listener_count());
        }

        let failing = request
            .artifacts
            .iter()
            .any(|artifact| self.failing_deploys.contains(&artifact.coordinate.path()));
        if failing {
            return Err(DeployError::Other("scripted failure".into()));
        }
        Ok(())
    }
}

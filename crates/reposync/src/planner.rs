//! One synchronization run: resolve, collect, expand extras, filter, publish.

use std::sync::Arc;

use crate::collector::ResolutionCollector;
use crate::coordinate::{ArtifactCoordinate, CoordinateError, ExtraCoordinate};
use crate::error::SyncError;
use crate::extras::{ExtrasCandidates, plan_extra_requests};
use crate::filter::Pipeline;
use crate::report::{Feedback, SyncReport};
use crate::system::{
    ArtifactFailure, ArtifactRequest, DependencyRequest, DeployRequest, RemoteRepository,
    RepositorySystem, ResolutionSession,
};
use crate::tokens::dedup_preserving_order;

/// Id given to a target that is only known by its URL.
pub const DEFAULT_TARGET_ID: &str = "target";

/// Work out the target repository from an id, a URL, or both.
///
/// A URL is used as given. An id alone is looked up among `configured`.
pub fn target_repository(
    id: Option<&str>,
    url: Option<&str>,
    configured: &[RemoteRepository],
) -> Result<RemoteRepository, SyncError> {
    match (id, url) {
        (id, Some(url)) => Ok(RemoteRepository::new(id.unwrap_or(DEFAULT_TARGET_ID), url)),
        (Some(id), None) => configured
            .iter()
            .find(|repository| repository.id == id)
            .cloned()
            .ok_or_else(|| SyncError::RepositoryNotFound(id.to_owned())),
        (None, None) => Err(SyncError::MissingRepository),
    }
}

/// Everything one run needs to know.
#[derive(Debug, Clone)]
pub struct SyncRequest {
    artifacts: Vec<ArtifactCoordinate>,
    extras: Vec<ExtraCoordinate>,
    repositories: Vec<RemoteRepository>,
    target: RemoteRepository,
    force: bool,
    fail_on_empty: bool,
    pipeline: Pipeline,
}

impl SyncRequest {
    pub fn new(target: RemoteRepository) -> Self {
        Self {
            artifacts: Vec::new(),
            extras: Vec::new(),
            repositories: Vec::new(),
            target,
            force: false,
            fail_on_empty: true,
            pipeline: Pipeline::new(),
        }
    }

    pub fn with_artifacts(mut self, artifacts: impl IntoIterator<Item = ArtifactCoordinate>) -> Self {
        self.artifacts.extend(artifacts);
        self
    }

    pub fn with_extras(mut self, extras: impl IntoIterator<Item = ExtraCoordinate>) -> Self {
        self.extras.extend(extras);
        self
    }

    /// Remote repositories dependencies are resolved from.
    pub fn with_repositories(
        mut self,
        repositories: impl IntoIterator<Item = RemoteRepository>,
    ) -> Self {
        self.repositories.extend(repositories);
        self
    }

    /// Publish artifacts even when they were resolved from the target.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_fail_on_empty(mut self, fail_on_empty: bool) -> Self {
        self.fail_on_empty = fail_on_empty;
        self
    }

    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn target(&self) -> &RemoteRepository {
        &self.target
    }

    pub fn artifacts(&self) -> &[ArtifactCoordinate] {
        &self.artifacts
    }
}

/// Drives a [`RepositorySystem`] through one run.
pub struct SyncPlanner<'a> {
    system: &'a dyn RepositorySystem,
}

impl<'a> SyncPlanner<'a> {
    pub fn new(system: &'a dyn RepositorySystem) -> Self {
        Self { system }
    }

    /// Resolve every requested artifact, then publish what was collected,
    /// one module at a time.
    ///
    /// Each requested coordinate is resolved on its own, in request order.
    /// Nothing is published unless every resolution succeeded. A failed
    /// publication stops the run; modules already published stay published.
    pub async fn run(
        &self,
        base: &ResolutionSession,
        request: &SyncRequest,
    ) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::default();

        let artifacts = dedup_preserving_order(request.artifacts.iter().cloned());
        if artifacts.is_empty() {
            if request.fail_on_empty {
                return Err(SyncError::NoArtifacts);
            }
            report
                .feedback
                .push(Feedback::info("No artifact specified, nothing to synchronize."));
            return Ok(report);
        }
        if artifacts.iter().any(|artifact| !artifact.has_version()) {
            return Err(CoordinateError::EmptyField("version").into());
        }
        report.requested = artifacts.len();

        let extras = dedup_preserving_order(request.extras.iter().cloned());
        let ignore_origin_url = (!request.force).then(|| request.target.url.clone());
        let collector = Arc::new(ResolutionCollector::new(ignore_origin_url));
        let session = collector.begin_session(base);

        let mut candidates = ExtrasCandidates::new();
        for root in artifacts {
            tracing::info!("resolving {root}");
            let dependency_request = DependencyRequest {
                root,
                repositories: request.repositories.clone(),
            };
            let result = self
                .system
                .resolve_dependencies(&session, &dependency_request)
                .await?;
            if !extras.is_empty() {
                candidates.extend(result.artifact_results.into_iter().map(|a| a.coordinate));
            }
        }

        if !extras.is_empty() {
            let planned = plan_extra_requests(&candidates, &extras);
            report.extras_requested = planned.len();
            self.resolve_extras(&session, planned, &request.repositories, &mut report)
                .await?;
        }

        report.collected = collector.collected_count();
        report.ignored = collector.ignored_count();

        let mut groups: Vec<_> = collector.grouped_results().into_iter().collect();
        groups.sort_by(|(a, _), (b, _)| a.cmp(b));

        for (path, mut group) in groups {
            group.sort_by(|a, b| a.coordinate.cmp(&b.coordinate));
            let artifacts = request.pipeline.apply(group);
            if artifacts.is_empty() {
                tracing::debug!("nothing left to publish for {path}");
                continue;
            }

            let count = artifacts.len();
            let deploy_request = DeployRequest {
                artifacts,
                repository: request.target.clone(),
            };
            self.system
                .deploy(base, &deploy_request)
                .await
                .map_err(|source| SyncError::Publish {
                    path: path.clone(),
                    source,
                })?;

            tracing::info!("published {path} ({count} artifact(s)) to {}", request.target);
            report.published_groups += 1;
            report.published_artifacts += count;
            report
                .feedback
                .push(Feedback::info(format!("Published {path} ({count} artifact(s)).")));
        }

        Ok(report)
    }

    /// Missing extras are reported and skipped; any other failure ends the run.
    async fn resolve_extras(
        &self,
        session: &ResolutionSession,
        coordinates: Vec<ArtifactCoordinate>,
        repositories: &[RemoteRepository],
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        if coordinates.is_empty() {
            return Ok(());
        }

        let requests: Vec<ArtifactRequest> = coordinates
            .into_iter()
            .map(|coordinate| ArtifactRequest {
                coordinate,
                repositories: repositories.to_vec(),
            })
            .collect();

        let Err(err) = self.system.resolve_artifacts(session, &requests).await else {
            return Ok(());
        };

        for result in err.results {
            let Err(failures) = result.outcome else {
                continue;
            };
            if let Some(failure) = failures
                .into_iter()
                .find(|failure| *failure != ArtifactFailure::NotFound)
            {
                return Err(SyncError::ExtraResolution {
                    coordinate: result.coordinate,
                    failure,
                });
            }
            tracing::warn!("extra {} not found", result.coordinate);
            report
                .feedback
                .push(Feedback::warning(format!("Extra {} not found.", result.coordinate)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::coordinate::ArtifactPath;
    use crate::filter::{PatternFilter, VersionFilter};
    use crate::system::DeployError;
    use crate::test_support::{DEFAULT_ORIGIN_URL, InMemoryRepositorySystem};

    use super::*;

    const TARGET_URL: &str = "memory://target";

    fn c(s: &str) -> ArtifactCoordinate {
        s.parse().unwrap()
    }

    fn cs(coords: &[&str]) -> Vec<ArtifactCoordinate> {
        coords.iter().map(|s| c(s)).collect()
    }

    fn target() -> RemoteRepository {
        RemoteRepository::new("target", TARGET_URL)
    }

    fn request(artifacts: &[&str]) -> SyncRequest {
        SyncRequest::new(target())
            .with_artifacts(cs(artifacts))
            .with_repositories([RemoteRepository::new("central", DEFAULT_ORIGIN_URL)])
    }

    /// Deployed batches as `path -> [coordinates]`, in call order.
    fn deployed(system: &InMemoryRepositorySystem) -> Vec<(String, Vec<String>)> {
        system
            .deployments()
            .iter()
            .map(|deployment| {
                let path = deployment.artifacts[0].coordinate.path().to_string();
                let coords = deployment
                    .artifacts
                    .iter()
                    .map(|a| a.coordinate.to_string())
                    .collect();
                (path, coords)
            })
            .collect()
    }

    async fn run(
        system: &InMemoryRepositorySystem,
        request: &SyncRequest,
    ) -> Result<SyncReport, SyncError> {
        SyncPlanner::new(system)
            .run(&ResolutionSession::new(), request)
            .await
    }

    #[tokio::test]
    async fn each_requested_module_published_as_its_own_batch() {
        let mut system = InMemoryRepositorySystem::new();
        system.add_graph(c("g:a:1.0"), cs(&["g:a:1.0", "g:a:pom:1.0"]), vec![]);
        system.add_graph(
            c("g:b:1.0"),
            cs(&["g:b:1.0", "g:b:pom:1.0"]),
            cs(&["g:b:pom:0.9"]),
        );

        let report = run(&system, &request(&["g:a:1.0", "g:b:1.0"])).await.unwrap();

        assert_eq!(system.dependency_requests(), cs(&["g:a:1.0", "g:b:1.0"]));
        assert_eq!(
            deployed(&system),
            vec![
                ("g:a:1.0".to_owned(), vec!["g:a:1.0".to_owned(), "g:a:pom:1.0".to_owned()]),
                ("g:b:0.9".to_owned(), vec!["g:b:pom:0.9".to_owned()]),
                ("g:b:1.0".to_owned(), vec!["g:b:1.0".to_owned(), "g:b:pom:1.0".to_owned()]),
            ]
        );
        assert_eq!(report.requested, 2);
        assert_eq!(report.published_groups, 3);
        assert_eq!(report.published_artifacts, 5);
        assert_eq!(system.deployments()[0].repository, target());
    }

    #[tokio::test]
    async fn shared_dependencies_published_once() {
        let mut system = InMemoryRepositorySystem::new();
        system.add_graph(c("g:a:1.0"), cs(&["g:a:1.0", "g:c:2.0"]), vec![]);
        system.add_graph(c("g:b:1.0"), cs(&["g:b:1.0", "g:c:2.0"]), vec![]);

        run(&system, &request(&["g:a:1.0", "g:b:1.0"])).await.unwrap();

        let paths: Vec<String> = deployed(&system).into_iter().map(|(path, _)| path).collect();
        assert_eq!(paths, vec!["g:a:1.0", "g:b:1.0", "g:c:2.0"]);
    }

    #[tokio::test]
    async fn single_winner_gets_one_extra_request() {
        let mut system = InMemoryRepositorySystem::new();
        system.add_graph(c("g:a:1.0"), cs(&["g:a:1.0"]), cs(&["g:a:pom:1.0"]));
        system.add_artifact(c("g:a:jar:sources:1.0"));

        let request = request(&["g:a:1.0"]).with_extras(["jar:sources".parse().unwrap()]);
        let report = run(&system, &request).await.unwrap();

        assert_eq!(system.artifact_requests(), vec![cs(&["g:a:jar:sources:1.0"])]);
        assert_eq!(report.extras_requested, 1);
        assert_eq!(
            deployed(&system),
            vec![(
                "g:a:1.0".to_owned(),
                vec![
                    "g:a:1.0".to_owned(),
                    "g:a:jar:sources:1.0".to_owned(),
                    "g:a:pom:1.0".to_owned(),
                ]
            )]
        );
    }

    #[tokio::test]
    async fn extras_only_for_winners() {
        let mut system = InMemoryRepositorySystem::new();
        system.add_graph(c("g:a:1.0"), cs(&["g:a:1.0"]), cs(&["g:b:0.9"]));

        let request = request(&["g:a:1.0"]).with_extras(["jar:sources".parse().unwrap()]);
        run(&system, &request).await.unwrap();

        assert_eq!(system.artifact_requests(), vec![cs(&["g:a:jar:sources:1.0"])]);
    }

    #[tokio::test]
    async fn no_extras_no_batch_call() {
        let system = InMemoryRepositorySystem::new();
        run(&system, &request(&["g:a:1.0"])).await.unwrap();
        assert!(system.artifact_requests().is_empty());
    }

    #[tokio::test]
    async fn missing_extras_are_warnings() {
        let mut system = InMemoryRepositorySystem::new();
        system.add_graph(c("g:a:1.0"), cs(&["g:a:1.0", "g:b:1.0"]), vec![]);
        system.add_artifact(c("g:a:jar:sources:1.0"));

        let request = request(&["g:a:1.0"]).with_extras(["jar:sources".parse().unwrap()]);
        let report = run(&system, &request).await.unwrap();

        let warnings: Vec<&str> = report.warnings().map(Feedback::message).collect();
        assert_eq!(warnings, vec!["Extra g:b:jar:sources:1.0 not found."]);
        // The resolved extra is still published.
        assert_eq!(report.published_artifacts, 3);
    }

    #[tokio::test]
    async fn other_extra_failures_abort_before_publishing() {
        let mut system = InMemoryRepositorySystem::new();
        system.fail_artifact(
            c("g:a:jar:sources:1.0"),
            ArtifactFailure::Other("checksum mismatch".into()),
        );

        let request = request(&["g:a:1.0"]).with_extras(["jar:sources".parse().unwrap()]);
        let err = run(&system, &request).await.unwrap_err();

        match err {
            SyncError::ExtraResolution { coordinate, failure } => {
                assert_eq!(coordinate, c("g:a:jar:sources:1.0"));
                assert_eq!(failure, ArtifactFailure::Other("checksum mismatch".into()));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(system.deployments().is_empty());
    }

    #[tokio::test]
    async fn empty_request_fails_by_default() {
        let system = InMemoryRepositorySystem::new();
        let err = run(&system, &request(&[])).await.unwrap_err();
        assert!(matches!(err, SyncError::NoArtifacts));
    }

    #[tokio::test]
    async fn empty_request_can_succeed_silently() {
        let system = InMemoryRepositorySystem::new();
        let report = run(&system, &request(&[]).with_fail_on_empty(false))
            .await
            .unwrap();
        assert_eq!(report.published_groups, 0);
        assert!(system.dependency_requests().is_empty());
        assert!(system.deployments().is_empty());
    }

    #[tokio::test]
    async fn versionless_coordinates_rejected() {
        let system = InMemoryRepositorySystem::new();
        let request = SyncRequest::new(target())
            .with_artifacts([ArtifactCoordinate::versionless("g", "a", "jar", "")]);
        let err = run(&system, &request).await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::InvalidCoordinate(CoordinateError::EmptyField("version"))
        ));
        assert!(system.dependency_requests().is_empty());
    }

    #[tokio::test]
    async fn duplicate_requests_resolved_once() {
        let system = InMemoryRepositorySystem::new();
        let report = run(&system, &request(&["g:a:1.0", "g:b:1.0", "g:a:1.0"]))
            .await
            .unwrap();
        assert_eq!(system.dependency_requests(), cs(&["g:a:1.0", "g:b:1.0"]));
        assert_eq!(report.requested, 2);
    }

    #[tokio::test]
    async fn resolution_failure_aborts_before_publishing() {
        let mut system = InMemoryRepositorySystem::new();
        system.fail_root(c("g:b:1.0"));

        let err = run(&system, &request(&["g:a:1.0", "g:b:1.0", "g:c:1.0"]))
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::DependencyResolution(_)));
        assert_eq!(system.dependency_requests(), cs(&["g:a:1.0", "g:b:1.0"]));
        assert!(system.deployments().is_empty());
    }

    #[tokio::test]
    async fn artifacts_from_target_are_skipped() {
        let mut system = InMemoryRepositorySystem::new();
        system.add_graph(c("g:a:1.0"), cs(&["g:a:1.0", "g:b:1.0"]), vec![]);
        system.set_origin(c("g:b:1.0"), target());

        let report = run(&system, &request(&["g:a:1.0"])).await.unwrap();

        let paths: Vec<String> = deployed(&system).into_iter().map(|(path, _)| path).collect();
        assert_eq!(paths, vec!["g:a:1.0"]);
        assert_eq!(report.collected, 2);
        assert_eq!(report.ignored, 1);
    }

    #[tokio::test]
    async fn force_republishes_artifacts_from_target() {
        let mut system = InMemoryRepositorySystem::new();
        system.add_graph(c("g:a:1.0"), cs(&["g:a:1.0", "g:b:1.0"]), vec![]);
        system.set_origin(c("g:b:1.0"), target());

        let report = run(&system, &request(&["g:a:1.0"]).with_force(true))
            .await
            .unwrap();

        assert_eq!(report.published_groups, 2);
        assert_eq!(report.ignored, 0);
    }

    #[tokio::test]
    async fn publish_failure_stops_remaining_groups() {
        let mut system = InMemoryRepositorySystem::new();
        system.fail_deploy(ArtifactPath::new("g", "b", "1.0"));

        let err = run(&system, &request(&["g:a:1.0", "g:b:1.0", "g:c:1.0"]))
            .await
            .unwrap_err();

        match err {
            SyncError::Publish { path, source } => {
                assert_eq!(path, ArtifactPath::new("g", "b", "1.0"));
                assert!(matches!(source, DeployError::Other(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        let paths: Vec<String> = deployed(&system).into_iter().map(|(path, _)| path).collect();
        assert_eq!(paths, vec!["g:a:1.0", "g:b:1.0"]);
    }

    #[tokio::test]
    async fn filtered_out_groups_are_not_deployed() {
        let mut system = InMemoryRepositorySystem::new();
        system.add_graph(
            c("g:a:1.0"),
            cs(&["g:a:1.0", "g:snap:2.0-20220101.012345-1"]),
            vec![],
        );

        let request = request(&["g:a:1.0"])
            .with_pipeline(Pipeline::new().with_version_filter(VersionFilter::Snapshot));
        let report = run(&system, &request).await.unwrap();

        let paths: Vec<String> = deployed(&system).into_iter().map(|(path, _)| path).collect();
        assert_eq!(paths, vec!["g:snap:2.0-20220101.012345-1"]);
        assert_eq!(report.published_groups, 1);
    }

    #[tokio::test]
    async fn pipeline_filters_within_a_group() {
        let mut system = InMemoryRepositorySystem::new();
        system.add_graph(c("g:a:1.0"), cs(&["g:a:1.0", "g:a:pom:1.0"]), vec![]);

        let request = request(&["g:a:1.0"])
            .with_pipeline(Pipeline::new().with_pattern(PatternFilter::new(".*:pom:.*").unwrap()));
        run(&system, &request).await.unwrap();

        assert_eq!(
            deployed(&system),
            vec![("g:a:1.0".to_owned(), vec!["g:a:pom:1.0".to_owned()])]
        );
    }

    #[tokio::test]
    async fn snapshots_published_as_releases_when_asked() {
        let mut system = InMemoryRepositorySystem::new();
        system.add_graph(c("g:a:1.0-20220101.012345-1"), cs(&["g:a:1.0-20220101.012345-1"]), vec![]);

        let request = request(&["g:a:1.0-20220101.012345-1"])
            .with_pipeline(Pipeline::new().with_snapshot_as_release(true));
        run(&system, &request).await.unwrap();

        let artifact = &system.deployments()[0].artifacts[0];
        assert!(!artifact.is_snapshot());
        assert_eq!(artifact.base_version(), "1.0-20220101.012345-1");
    }

    #[tokio::test]
    async fn publishing_uses_the_base_session() {
        let system = InMemoryRepositorySystem::new();
        run(&system, &request(&["g:a:1.0", "g:b:1.0"])).await.unwrap();
        assert_eq!(system.deploy_listener_counts(), vec![0, 0]);
    }

    #[test]
    fn target_by_url() {
        let repository = target_repository(None, Some("file:///srv/repo"), &[]).unwrap();
        assert_eq!(repository, RemoteRepository::new(DEFAULT_TARGET_ID, "file:///srv/repo"));

        let repository = target_repository(Some("mine"), Some("file:///srv/repo"), &[]).unwrap();
        assert_eq!(repository.id, "mine");
    }

    #[test]
    fn target_by_id_is_looked_up() {
        let configured = vec![
            RemoteRepository::new("central", "file:///srv/central"),
            RemoteRepository::new("internal", "file:///srv/internal"),
        ];
        let repository = target_repository(Some("internal"), None, &configured).unwrap();
        assert_eq!(repository.url, "file:///srv/internal");

        let err = target_repository(Some("missing"), None, &configured).unwrap_err();
        assert!(matches!(err, SyncError::RepositoryNotFound(id) if id == "missing"));
    }

    #[test]
    fn target_requires_id_or_url() {
        assert!(matches!(
            target_repository(None, None, &[]),
            Err(SyncError::MissingRepository)
        ));
    }
}

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use reposync::{
    ArtifactCoordinate, ArtifactFailure, ArtifactPath, ArtifactRequest, ArtifactResolutionError,
    ArtifactResult, DependencyRequest, DependencyResolutionError, DependencyResult, DeployError,
    DeployRequest, RemoteRepository, RepositoryEvent, RepositorySystem, ResolutionSession,
    ResolvedArtifact, version,
};

use crate::error::LayoutError;
use crate::layout;
use crate::metadata::MavenMetadata;
use crate::model::{self, EffectiveModel};
use crate::pom::{Pom, PomDependency, parse_pom};

/// Parent chains longer than this are treated as cyclic.
const MAX_PARENT_DEPTH: usize = 32;

/// Scopes that never reach a consumer of the artifact.
const NON_TRANSITIVE_SCOPES: &[&str] = &["test", "provided", "system", "import"];

/// A [`RepositorySystem`] over repositories in the Maven 2 directory
/// layout, addressed by local path or `file://` URL.
///
/// Resolved files are staged into a local repository directory, which is
/// what the resolved artifacts point at.
#[derive(Debug, Clone)]
pub struct LayoutRepositorySystem {
    local_repository: PathBuf,
}

struct Node {
    model: Option<Arc<EffectiveModel>>,
    exclusions: Vec<(String, String)>,
    depth: usize,
}

/// Versions compete per `groupId:artifactId:extension:classifier`.
type ConflictKey = (String, String, String, String);

fn conflict_key(coordinate: &ArtifactCoordinate) -> ConflictKey {
    (
        coordinate.group_id().to_owned(),
        coordinate.artifact_id().to_owned(),
        coordinate.extension().to_owned(),
        coordinate.classifier().to_owned(),
    )
}

fn excluded(exclusions: &[(String, String)], dependency: &PomDependency) -> bool {
    exclusions.iter().any(|(group_id, artifact_id)| {
        (group_id == "*" || *group_id == dependency.group_id)
            && (artifact_id == "*" || *artifact_id == dependency.artifact_id)
    })
}

fn is_transitive(dependency: &PomDependency) -> bool {
    let scope = dependency.scope.as_deref().unwrap_or("compile");
    !dependency.optional && !NON_TRANSITIVE_SCOPES.contains(&scope)
}

fn copy_file(source: &Path, target: &Path) -> Result<(), LayoutError> {
    if source == target {
        return Ok(());
    }
    if let Some(dir) = target.parent() {
        fs::create_dir_all(dir).map_err(|e| LayoutError::io(dir, e))?;
    }
    fs::copy(source, target).map_err(|e| LayoutError::io(target, e))?;
    Ok(())
}

impl LayoutRepositorySystem {
    pub fn new(local_repository: impl Into<PathBuf>) -> Self {
        Self {
            local_repository: local_repository.into(),
        }
    }

    pub fn local_repository(&self) -> &Path {
        &self.local_repository
    }

    /// Find `coordinate` in the first repository that has it and stage a
    /// copy locally. Every outcome is reported to the session.
    fn fetch(
        &self,
        session: &ResolutionSession,
        coordinate: &ArtifactCoordinate,
        repositories: &[RemoteRepository],
    ) -> Result<PathBuf, ArtifactFailure> {
        let relative = layout::artifact_path(coordinate, &version::base_version(coordinate.version()));

        for repository in repositories {
            let root = match layout::repository_root(&repository.url) {
                Ok(root) => root,
                Err(err) => {
                    tracing::warn!("skipping repository {repository}: {err}");
                    continue;
                }
            };
            let source = root.join(&relative);
            if !source.is_file() {
                continue;
            }

            let staged = self.local_repository.join(&relative);
            return match copy_file(&source, &staged) {
                Ok(()) => {
                    session.notify(&RepositoryEvent {
                        coordinate,
                        file: Some(staged.as_path()),
                        repository: Some(repository),
                    });
                    Ok(staged)
                }
                Err(err) => {
                    session.notify(&RepositoryEvent {
                        coordinate,
                        file: None,
                        repository: Some(repository),
                    });
                    Err(ArtifactFailure::Other(err.to_string()))
                }
            };
        }

        session.notify(&RepositoryEvent {
            coordinate,
            file: None,
            repository: None,
        });
        Err(ArtifactFailure::NotFound)
    }

    /// The POM of a module, or `None` when no repository has one. Parsed
    /// POMs are kept in the session cache.
    fn load_pom(
        &self,
        session: &ResolutionSession,
        group_id: &str,
        artifact_id: &str,
        version: &str,
        repositories: &[RemoteRepository],
    ) -> Result<Option<Arc<Pom>>, LayoutError> {
        let key = format!("pom:{group_id}:{artifact_id}:{version}");
        if let Some(cached) = session.cache().get::<Option<Arc<Pom>>>(&key) {
            return Ok((*cached).clone());
        }

        let coordinate = ArtifactCoordinate::new(group_id, artifact_id, "pom", "", version);
        let pom = match self.fetch(session, &coordinate, repositories) {
            Ok(file) => {
                let content = fs::read_to_string(&file).map_err(|e| LayoutError::io(&file, e))?;
                let pom = parse_pom(&content).map_err(|source| LayoutError::Pom {
                    path: file.clone(),
                    source,
                })?;
                Some(Arc::new(pom))
            }
            Err(failure) => {
                tracing::warn!("no POM for {coordinate}: {failure}");
                None
            }
        };

        session.cache().put(key, Arc::new(pom.clone()));
        Ok(pom)
    }

    /// The effective model of a module, following its parent chain.
    fn model(
        &self,
        session: &ResolutionSession,
        group_id: &str,
        artifact_id: &str,
        version: &str,
        repositories: &[RemoteRepository],
    ) -> Result<Option<Arc<EffectiveModel>>, LayoutError> {
        let key = format!("model:{group_id}:{artifact_id}:{version}");
        if let Some(cached) = session.cache().get::<Option<Arc<EffectiveModel>>>(&key) {
            return Ok((*cached).clone());
        }

        let Some(pom) = self.load_pom(session, group_id, artifact_id, version, repositories)? else {
            return Ok(None);
        };

        let mut chain = vec![pom];
        while let Some(parent) = chain.last().and_then(|pom| pom.parent.clone()) {
            if chain.len() > MAX_PARENT_DEPTH {
                tracing::warn!("parent chain of {group_id}:{artifact_id}:{version} is too deep");
                break;
            }
            match self.load_pom(
                session,
                &parent.group_id,
                &parent.artifact_id,
                &parent.version,
                repositories,
            )? {
                Some(parent_pom) => chain.push(parent_pom),
                None => break,
            }
        }

        let poms: Vec<&Pom> = chain.iter().map(Arc::as_ref).collect();
        let model = EffectiveModel::from_chain(&poms).map_err(|source| LayoutError::Pom {
            path: layout::artifact_path(
                &ArtifactCoordinate::new(group_id, artifact_id, "pom", "", version),
                version,
            ),
            source,
        })?;
        let model = Some(Arc::new(model));

        session.cache().put(key, Arc::new(model.clone()));
        Ok(model)
    }

    /// Version for `dependency` declared in `model`. Management in the root
    /// POM wins below the first level.
    fn pick_version(
        dependency: &PomDependency,
        model: &EffectiveModel,
        root: Option<&EffectiveModel>,
        depth: usize,
    ) -> Option<String> {
        let managed = |m: &EffectiveModel| m.managed_for(dependency).and_then(|d| d.version.clone());
        let from_root = if depth > 0 { root.and_then(managed) } else { None };
        from_root
            .or_else(|| dependency.version.clone())
            .or_else(|| managed(model))
    }

    fn update_metadata(
        root: &Path,
        group_id: &str,
        artifact_id: &str,
        versions: &BTreeSet<&str>,
    ) -> Result<(), DeployError> {
        let path = root.join(layout::metadata_path(group_id, artifact_id));
        let mut metadata = if path.is_file() {
            let content = fs::read_to_string(&path).map_err(|e| DeployError::Io(e.to_string()))?;
            MavenMetadata::parse(&content)
                .map_err(|e| DeployError::Other(format!("{}: {e}", path.display())))?
        } else {
            MavenMetadata::new(group_id, artifact_id)
        };

        for version in versions {
            metadata.add_version(version);
        }

        let xml = metadata
            .to_xml()
            .map_err(|e| DeployError::Other(e.to_string()))?;
        fs::write(&path, xml).map_err(|e| DeployError::Io(format!("{}: {e}", path.display())))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl RepositorySystem for LayoutRepositorySystem {
    async fn resolve_dependencies(
        &self,
        session: &ResolutionSession,
        request: &DependencyRequest,
    ) -> Result<DependencyResult, DependencyResolutionError> {
        let root = &request.root;
        let repositories = request.repositories.as_slice();
        let fail = |message: String| DependencyResolutionError {
            root: root.clone(),
            message,
        };

        let root_file = self
            .fetch(session, root, repositories)
            .map_err(|failure| fail(format!("{root}: {failure}")))?;
        let root_model = self
            .model(session, root.group_id(), root.artifact_id(), root.version(), repositories)
            .map_err(|e| fail(e.to_string()))?;

        let mut artifact_results = vec![ResolvedArtifact::new(root.clone(), root_file)];
        let mut selected: HashMap<ConflictKey, String> = HashMap::new();
        selected.insert(conflict_key(root), root.version().to_owned());
        let mut expanded: HashSet<ArtifactPath> = HashSet::from([root.path()]);

        let mut queue = VecDeque::from([Node {
            model: root_model.clone(),
            exclusions: Vec::new(),
            depth: 0,
        }]);

        while let Some(node) = queue.pop_front() {
            let Some(model) = node.model else {
                continue;
            };

            for dependency in &model.dependencies {
                if !is_transitive(dependency) || excluded(&node.exclusions, dependency) {
                    continue;
                }
                let Some(version) =
                    Self::pick_version(dependency, &model, root_model.as_deref(), node.depth)
                else {
                    tracing::warn!(
                        "no version for {}:{} declared by {model}",
                        dependency.group_id,
                        dependency.artifact_id
                    );
                    continue;
                };

                let coordinate = model::dependency_coordinate(dependency, &version);
                let key = conflict_key(&coordinate);
                if let Some(winner) = selected.get(&key) {
                    if *winner != version {
                        tracing::debug!("{coordinate} loses to {winner}");
                        // Resolve the loser's POM so it is known to later builds.
                        if let Err(err) = self.model(
                            session,
                            &dependency.group_id,
                            &dependency.artifact_id,
                            &version,
                            repositories,
                        ) {
                            tracing::warn!("{err}");
                        }
                    }
                    continue;
                }
                selected.insert(key, version.clone());

                let file = self
                    .fetch(session, &coordinate, repositories)
                    .map_err(|failure| fail(format!("{coordinate}: {failure}")))?;
                artifact_results.push(ResolvedArtifact::new(coordinate.clone(), file));

                // Classified siblings share their module's POM and dependencies.
                if !expanded.insert(coordinate.path()) {
                    continue;
                }
                let child = self
                    .model(
                        session,
                        &dependency.group_id,
                        &dependency.artifact_id,
                        &version,
                        repositories,
                    )
                    .map_err(|e| fail(e.to_string()))?;
                let mut exclusions = node.exclusions.clone();
                exclusions.extend(dependency.exclusions.iter().cloned());
                queue.push_back(Node {
                    model: child,
                    exclusions,
                    depth: node.depth + 1,
                });
            }
        }

        Ok(DependencyResult { artifact_results })
    }

    async fn resolve_artifacts(
        &self,
        session: &ResolutionSession,
        requests: &[ArtifactRequest],
    ) -> Result<Vec<ResolvedArtifact>, ArtifactResolutionError> {
        let results: Vec<ArtifactResult> = requests
            .iter()
            .map(|request| ArtifactResult {
                coordinate: request.coordinate.clone(),
                outcome: self
                    .fetch(session, &request.coordinate, &request.repositories)
                    .map(|file| ResolvedArtifact::new(request.coordinate.clone(), file))
                    .map_err(|failure| vec![failure]),
            })
            .collect();

        if results.iter().all(ArtifactResult::is_resolved) {
            Ok(results.into_iter().filter_map(|r| r.outcome.ok()).collect())
        } else {
            Err(ArtifactResolutionError { results })
        }
    }

    async fn deploy(
        &self,
        _session: &ResolutionSession,
        request: &DeployRequest,
    ) -> Result<(), DeployError> {
        let root = layout::repository_root(&request.repository.url)
            .map_err(|e| DeployError::UnsupportedRepository(e.to_string()))?;

        let mut modules: BTreeMap<(&str, &str), BTreeSet<&str>> = BTreeMap::new();
        for artifact in &request.artifacts {
            let target = root.join(layout::artifact_path(
                &artifact.coordinate,
                artifact.base_version(),
            ));
            copy_file(&artifact.file, &target).map_err(|e| DeployError::Io(e.to_string()))?;
            tracing::debug!("deployed {} to {}", artifact.coordinate, target.display());

            modules
                .entry((artifact.coordinate.group_id(), artifact.coordinate.artifact_id()))
                .or_default()
                .insert(artifact.base_version());
        }

        for ((group_id, artifact_id), versions) in &modules {
            Self::update_metadata(&root, group_id, artifact_id, versions)?;
        }

        tracing::info!(
            "deployed {} artifact(s) to {}",
            request.artifacts.len(),
            request.repository
        );
        Ok(())
    }
}

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use crate::artifact::ResolvedArtifact;
use crate::coordinate::{ArtifactCoordinate, ArtifactPath};
use crate::system::{RepositoryEvent, RepositoryListener, ResolutionSession};

#[derive(Debug)]
struct CollectedEntry {
    file: PathBuf,
    /// Set once the artifact was seen coming from the ignored origin. Never
    /// cleared again.
    ignored: bool,
}

/// Records every artifact resolved within a session, once per coordinate.
///
/// Artifacts resolved from `ignore_origin_url` are already present in the
/// synchronization target, so they are remembered but left out of
/// [`grouped_results`](Self::grouped_results).
#[derive(Debug)]
pub struct ResolutionCollector {
    ignore_origin_url: Option<String>,
    entries: Mutex<HashMap<ArtifactCoordinate, CollectedEntry>>,
}

impl ResolutionCollector {
    pub fn new(ignore_origin_url: Option<String>) -> Self {
        Self {
            ignore_origin_url,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Derive a session from `base` that reports to this collector ahead of
    /// any listener `base` already has. The derived session starts with an
    /// empty cache, so nothing resolved by an earlier run is replayed from
    /// memory.
    pub fn begin_session(self: &Arc<Self>, base: &ResolutionSession) -> ResolutionSession {
        let listener: Arc<dyn RepositoryListener> = self.clone();
        base.derive_fresh(vec![listener])
    }

    fn from_ignored_origin(&self, event: &RepositoryEvent<'_>) -> bool {
        match (&self.ignore_origin_url, event.repository) {
            (Some(ignored), Some(repository)) => *ignored == repository.url,
            _ => false,
        }
    }

    /// Number of distinct coordinates recorded, ignored ones included.
    pub fn collected_count(&self) -> usize {
        self.lock().len()
    }

    /// Number of distinct coordinates skipped because of their origin.
    pub fn ignored_count(&self) -> usize {
        self.lock().values().filter(|entry| entry.ignored).count()
    }

    /// All non-ignored artifacts, grouped by module path. Ordering within and
    /// across groups is unspecified.
    pub fn grouped_results(&self) -> HashMap<ArtifactPath, Vec<ResolvedArtifact>> {
        let entries = self.lock();
        let mut groups: HashMap<ArtifactPath, Vec<ResolvedArtifact>> = HashMap::new();

        for (coordinate, entry) in entries.iter() {
            if entry.ignored {
                continue;
            }
            groups
                .entry(coordinate.path())
                .or_default()
                .push(ResolvedArtifact::new(coordinate.clone(), entry.file.clone()));
        }

        groups
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ArtifactCoordinate, CollectedEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RepositoryListener for ResolutionCollector {
    fn artifact_resolved(&self, event: &RepositoryEvent<'_>) {
        let Some(file) = event.file else {
            return;
        };

        tracing::debug!(
            "resolved {} @ {}",
            event.coordinate,
            event.repository.map_or("local", |r| r.url.as_str())
        );

        let ignored = self.from_ignored_origin(event);
        let mut entries = self.lock();
        match entries.entry(event.coordinate.clone()) {
            Entry::Vacant(vacant) => {
                vacant.insert(CollectedEntry {
                    file: file.to_path_buf(),
                    ignored,
                });
            }
            Entry::Occupied(mut occupied) => {
                if ignored {
                    occupied.get_mut().ignored = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::system::RemoteRepository;

    use super::*;

    const TARGET: &str = "file:///srv/target";
    const CENTRAL: &str = "file:///srv/central";

    fn coordinate(s: &str) -> ArtifactCoordinate {
        s.parse().unwrap()
    }

    fn resolve(
        collector: &ResolutionCollector,
        coordinate: &ArtifactCoordinate,
        file: Option<&str>,
        url: Option<&str>,
    ) {
        let repository = url.map(|u| RemoteRepository::new("repo", u));
        collector.artifact_resolved(&RepositoryEvent {
            coordinate,
            file: file.map(Path::new),
            repository: repository.as_ref(),
        });
    }

    fn collected(collector: &ResolutionCollector) -> Vec<String> {
        let mut all: Vec<String> = collector
            .grouped_results()
            .into_values()
            .flatten()
            .map(|artifact| artifact.coordinate.to_string())
            .collect();
        all.sort();
        all
    }

    #[test]
    fn unresolved_artifacts_are_never_collected() {
        let collector = ResolutionCollector::new(None);
        resolve(&collector, &coordinate("g:a:1.0"), None, Some(CENTRAL));
        assert!(collected(&collector).is_empty());
        assert_eq!(collector.collected_count(), 0);
    }

    #[test]
    fn duplicate_resolutions_collected_once() {
        let collector = ResolutionCollector::new(Some(TARGET.into()));
        let a = coordinate("g:a:1.0");
        resolve(&collector, &a, Some("/local/a-1.jar"), Some(CENTRAL));
        resolve(&collector, &a, Some("/local/a-2.jar"), Some(CENTRAL));

        let groups = collector.grouped_results();
        let group = &groups[&a.path()];
        assert_eq!(group.len(), 1);
        assert_eq!(group[0].file, PathBuf::from("/local/a-1.jar"));
    }

    #[test]
    fn ignored_origin_first_then_elsewhere_stays_ignored() {
        let collector = ResolutionCollector::new(Some(TARGET.into()));
        let a = coordinate("g:a:1.0");
        resolve(&collector, &a, Some("/local/a.jar"), Some(TARGET));
        resolve(&collector, &a, Some("/local/a.jar"), Some(CENTRAL));
        assert!(collected(&collector).is_empty());
        assert_eq!(collector.ignored_count(), 1);
    }

    #[test]
    fn elsewhere_first_then_ignored_origin_becomes_ignored() {
        let collector = ResolutionCollector::new(Some(TARGET.into()));
        let a = coordinate("g:a:1.0");
        resolve(&collector, &a, Some("/local/a.jar"), Some(CENTRAL));
        resolve(&collector, &a, Some("/local/a.jar"), Some(TARGET));
        assert!(collected(&collector).is_empty());
    }

    #[test]
    fn without_ignore_url_target_artifacts_are_kept() {
        let collector = ResolutionCollector::new(None);
        resolve(&collector, &coordinate("g:a:1.0"), Some("/local/a.jar"), Some(TARGET));
        assert_eq!(collected(&collector), vec!["g:a:1.0"]);
    }

    #[test]
    fn local_repository_hits_are_never_ignored() {
        let collector = ResolutionCollector::new(Some(TARGET.into()));
        resolve(&collector, &coordinate("g:a:1.0"), Some("/local/a.jar"), None);
        assert_eq!(collected(&collector), vec!["g:a:1.0"]);
    }

    #[test]
    fn siblings_share_a_group_but_stay_distinct() {
        let collector = ResolutionCollector::new(None);
        resolve(&collector, &coordinate("g:a:1.0"), Some("/l/a.jar"), Some(CENTRAL));
        resolve(&collector, &coordinate("g:a:pom:1.0"), Some("/l/a.pom"), Some(CENTRAL));
        resolve(
            &collector,
            &coordinate("g:a:jar:sources:1.0"),
            Some("/l/a-sources.jar"),
            Some(CENTRAL),
        );
        resolve(&collector, &coordinate("g:b:2.0"), Some("/l/b.jar"), Some(CENTRAL));

        let groups = collector.grouped_results();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&ArtifactPath::new("g", "a", "1.0")].len(), 3);
        assert_eq!(groups[&ArtifactPath::new("g", "b", "2.0")].len(), 1);
    }

    #[test]
    fn begin_session_chains_collector_first() {
        let collector = Arc::new(ResolutionCollector::new(None));
        let base = ResolutionSession::new();
        let session = collector.begin_session(&base);
        assert_eq!(session.listener_count(), 1);

        let a = coordinate("g:a:1.0");
        let repository = RemoteRepository::new("central", CENTRAL);
        session.notify(&RepositoryEvent {
            coordinate: &a,
            file: Some(Path::new("/l/a.jar")),
            repository: Some(&repository),
        });
        assert_eq!(collected(&collector), vec!["g:a:1.0"]);
    }
}

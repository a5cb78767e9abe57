//! Companion artifacts (sources, javadoc, ...) for resolved modules.

use std::collections::{BTreeSet, HashSet};

use crate::coordinate::{ArtifactCoordinate, ExtraCoordinate};

/// The winning coordinates of every dependency resolution in a run.
/// Iterates in coordinate order.
#[derive(Debug, Clone, Default)]
pub struct ExtrasCandidates {
    winners: BTreeSet<ArtifactCoordinate>,
}

impl ExtrasCandidates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, coordinate: ArtifactCoordinate) -> bool {
        self.winners.insert(coordinate)
    }

    pub fn contains(&self, coordinate: &ArtifactCoordinate) -> bool {
        self.winners.contains(coordinate)
    }

    pub fn len(&self) -> usize {
        self.winners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.winners.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArtifactCoordinate> {
        self.winners.iter()
    }
}

impl Extend<ArtifactCoordinate> for ExtrasCandidates {
    fn extend<I: IntoIterator<Item = ArtifactCoordinate>>(&mut self, iter: I) {
        self.winners.extend(iter);
    }
}

/// The extra artifacts still to resolve: each requested extra of each
/// module among `candidates`, minus plain POM modules' extras and minus
/// anything already resolved as a regular dependency.
pub fn plan_extra_requests(
    candidates: &ExtrasCandidates,
    extras: &[ExtraCoordinate],
) -> Vec<ArtifactCoordinate> {
    let mut processed_paths = HashSet::new();
    let mut queued = HashSet::new();
    let mut requests = Vec::new();

    for winner in candidates.iter() {
        // POMs mostly show up while disqualifying candidates; they have no
        // companions worth fetching.
        if winner.is_pom() {
            continue;
        }

        let path = winner.path();
        if !processed_paths.insert(path.clone()) {
            continue;
        }

        for extra in extras {
            let coordinate = ArtifactCoordinate::from_path_and_extra(&path, extra);
            if candidates.contains(&coordinate) || !queued.insert(coordinate.clone()) {
                continue;
            }
            requests.push(coordinate);
        }
    }

    requests
}

//! Per-group filtering and rewriting applied before publication.

use std::fmt;
use std::str::FromStr;

use regex::Regex;

use crate::artifact::{DeployArtifact, ResolvedArtifact};
use crate::coordinate::ArtifactCoordinate;
use crate::version;

/// Keeps artifacts whose `group:artifact:extension[:classifier]:version`
/// string matches a regular expression in full.
#[derive(Debug, Clone)]
pub struct PatternFilter {
    source: String,
    pattern: Regex,
}

impl PatternFilter {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            source: pattern.to_owned(),
            pattern: Regex::new(&format!("^(?:{pattern})$"))?,
        })
    }

    pub fn matches(&self, coordinate: &ArtifactCoordinate) -> bool {
        self.pattern.is_match(&coordinate.canonical())
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown version filter \"{0}\": expected \"snapshot\" or \"release\"")]
pub struct UnknownVersionFilter(pub String);

/// Keeps only snapshots or only releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionFilter {
    Snapshot,
    Release,
}

impl VersionFilter {
    pub fn matches(self, coordinate: &ArtifactCoordinate) -> bool {
        coordinate.is_snapshot() == (self == Self::Snapshot)
    }
}

impl FromStr for VersionFilter {
    type Err = UnknownVersionFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "snapshot" => Ok(Self::Snapshot),
            "release" => Ok(Self::Release),
            _ => Err(UnknownVersionFilter(s.to_owned())),
        }
    }
}

impl fmt::Display for VersionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Snapshot => write!(f, "snapshot"),
            Self::Release => write!(f, "release"),
        }
    }
}

/// Report a timestamped snapshot as a release of that exact version.
/// Everything else passes through unchanged.
pub fn snapshot_as_release(artifact: DeployArtifact) -> DeployArtifact {
    if artifact.is_snapshot() && version::is_timestamped_snapshot(artifact.coordinate.version()) {
        artifact.into_release()
    } else {
        artifact
    }
}

/// Pattern filter, then version filter, then the optional release rewrite.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    pattern: Option<PatternFilter>,
    version_filter: Option<VersionFilter>,
    snapshot_as_release: bool,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pattern(mut self, pattern: PatternFilter) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn with_version_filter(mut self, filter: VersionFilter) -> Self {
        self.version_filter = Some(filter);
        self
    }

    pub fn with_snapshot_as_release(mut self, enabled: bool) -> Self {
        self.snapshot_as_release = enabled;
        self
    }

    fn keeps(&self, coordinate: &ArtifactCoordinate) -> bool {
        self.pattern.as_ref().is_none_or(|p| p.matches(coordinate))
            && self.version_filter.is_none_or(|f| f.matches(coordinate))
    }

    /// Run one module's artifacts through the stages. May return nothing.
    pub fn apply(&self, group: Vec<ResolvedArtifact>) -> Vec<DeployArtifact> {
        group
            .into_iter()
            .filter(|artifact| self.keeps(&artifact.coordinate))
            .map(DeployArtifact::from)
            .map(|artifact| {
                if self.snapshot_as_release {
                    snapshot_as_release(artifact)
                } else {
                    artifact
                }
            })
            .collect()
    }
}

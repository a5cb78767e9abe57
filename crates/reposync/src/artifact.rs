use std::path::PathBuf;

use crate::coordinate::ArtifactCoordinate;
use crate::version;

/// An artifact that resolution placed on the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub coordinate: ArtifactCoordinate,
    pub file: PathBuf,
}

impl ResolvedArtifact {
    pub fn new(coordinate: ArtifactCoordinate, file: impl Into<PathBuf>) -> Self {
        Self {
            coordinate,
            file: file.into(),
        }
    }
}

/// An artifact as handed to a deployer.
///
/// Carries the Maven base version next to the coordinate: deployers lay
/// snapshots out under their base version, and the release rewrite works
/// by changing only this field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployArtifact {
    pub coordinate: ArtifactCoordinate,
    pub file: PathBuf,
    base_version: String,
}

impl DeployArtifact {
    pub fn new(coordinate: ArtifactCoordinate, file: impl Into<PathBuf>) -> Self {
        let base_version = version::base_version(coordinate.version());
        Self {
            coordinate,
            file: file.into(),
            base_version,
        }
    }

    pub fn base_version(&self) -> &str {
        &self.base_version
    }

    pub fn is_snapshot(&self) -> bool {
        self.base_version.ends_with("SNAPSHOT")
    }

    /// The same file reported as a release whose base version is the full
    /// (timestamped) version string.
    pub fn into_release(self) -> Self {
        Self {
            base_version: self.coordinate.version().to_owned(),
            ..self
        }
    }
}

impl From<ResolvedArtifact> for DeployArtifact {
    fn from(artifact: ResolvedArtifact) -> Self {
        Self::new(artifact.coordinate, artifact.file)
    }
}

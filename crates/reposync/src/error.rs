use crate::coordinate::{ArtifactCoordinate, ArtifactPath, CoordinateError};
use crate::managed::ManagedDependencyKey;
use crate::system::{ArtifactFailure, DependencyResolutionError, DeployError};

/// Everything that can end a synchronization run.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    InvalidCoordinate(#[from] CoordinateError),

    #[error("no artifact specified")]
    NoArtifacts,

    #[error("no managed version for {0}")]
    ManagedVersionNotFound(ManagedDependencyKey),

    #[error(transparent)]
    DependencyResolution(#[from] DependencyResolutionError),

    #[error("could not resolve extra {coordinate}: {failure}")]
    ExtraResolution {
        coordinate: ArtifactCoordinate,
        failure: ArtifactFailure,
    },

    #[error("deployment of {path} failed: {source}")]
    Publish {
        path: ArtifactPath,
        #[source]
        source: DeployError,
    },

    #[error("invalid filter pattern: {0}")]
    InvalidFilter(#[from] regex::Error),

    #[error("a repository id or URL is required")]
    MissingRepository,

    #[error("no repository configured with id \"{0}\"")]
    RepositoryNotFound(String),
}

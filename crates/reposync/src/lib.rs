//! Plans and runs the one-way synchronization of Maven artifacts, with
//! their transitive dependencies, into a target repository.

pub mod artifact;
pub mod collector;
pub mod coordinate;
pub mod error;
pub mod extras;
pub mod filter;
pub mod managed;
pub mod planner;
pub mod report;
pub mod system;
pub mod tokens;
pub mod version;

pub use artifact::{DeployArtifact, ResolvedArtifact};
pub use collector::ResolutionCollector;
pub use coordinate::{ArtifactCoordinate, ArtifactPath, CoordinateError, ExtraCoordinate};
pub use error::SyncError;
pub use filter::{PatternFilter, Pipeline, VersionFilter};
pub use managed::{DependencyManagement, ManagedDependencyKey, ManagedVersions};
pub use planner::{SyncPlanner, SyncRequest, target_repository};
pub use report::{Feedback, SyncReport};
pub use system::{
    ArtifactFailure, ArtifactRequest, ArtifactResolutionError, ArtifactResult,
    DependencyRequest, DependencyResolutionError, DependencyResult, DeployError, DeployRequest,
    RemoteRepository, RepositoryEvent, RepositoryListener, RepositorySystem, ResolutionCache,
    ResolutionSession,
};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

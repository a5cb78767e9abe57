//! Resolution and deployment against Maven 2 layout repositories on the
//! local filesystem.

pub mod error;
pub mod layout;
pub mod metadata;
pub mod model;
pub mod pom;
pub mod system;

pub use error::{LayoutError, PomError};
pub use layout::{file_url, repository_root};
pub use metadata::MavenMetadata;
pub use model::EffectiveModel;
pub use pom::{Pom, PomDependency, parse_pom};
pub use system::LayoutRepositorySystem;

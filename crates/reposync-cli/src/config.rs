use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use reposync::coordinate::DEFAULT_EXTENSION;
use reposync::{
    ArtifactCoordinate, CoordinateError, DependencyManagement, ExtraCoordinate,
    ManagedDependencyKey, RemoteRepository,
};
use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Where resolved artifacts are staged before publishing.
    pub local_repository: Option<PathBuf>,
    /// Repositories dependencies are resolved from, in search order.
    #[serde(default)]
    pub repositories: Vec<RepositoryEntry>,
    /// Artifacts synchronized on every run, next to those given on the
    /// command line.
    #[serde(default)]
    pub artifacts: Vec<ArtifactItem>,
    #[serde(default)]
    pub extras: Vec<ExtraItem>,
    /// Versions for artifacts listed without one.
    #[serde(default)]
    pub dependency_management: Vec<ManagedEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RepositoryEntry {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtifactItem {
    pub group_id: String,
    pub artifact_id: String,
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default)]
    pub classifier: String,
    /// Looked up in `dependency_management` when absent or empty.
    pub version: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtraItem {
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default)]
    pub classifier: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ManagedEntry {
    pub group_id: String,
    pub artifact_id: String,
    #[serde(rename = "type", default = "default_extension")]
    pub artifact_type: String,
    #[serde(default)]
    pub classifier: String,
    pub version: String,
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.into()
}

impl ArtifactItem {
    pub fn to_coordinate(&self) -> Result<ArtifactCoordinate, CoordinateError> {
        if self.group_id.is_empty() {
            return Err(CoordinateError::EmptyField("group_id"));
        }
        if self.artifact_id.is_empty() {
            return Err(CoordinateError::EmptyField("artifact_id"));
        }
        let extension = if self.extension.is_empty() {
            DEFAULT_EXTENSION
        } else {
            self.extension.as_str()
        };
        let mut coordinate = ArtifactCoordinate::versionless(
            &self.group_id,
            &self.artifact_id,
            extension,
            &self.classifier,
        );
        // An empty version is the same as none: it comes from dependency management.
        if let Some(version) = self.version.as_deref().filter(|v| !v.is_empty()) {
            coordinate.set_version(version)?;
        }
        Ok(coordinate)
    }
}

impl ExtraItem {
    pub fn to_extra(&self) -> ExtraCoordinate {
        ExtraCoordinate::new(&self.extension, &self.classifier)
    }
}

impl AppConfig {
    pub fn remote_repositories(&self) -> Vec<RemoteRepository> {
        self.repositories
            .iter()
            .map(|entry| RemoteRepository::new(&entry.id, &entry.url))
            .collect()
    }

    pub fn dependency_management(&self) -> DependencyManagement {
        self.dependency_management
            .iter()
            .map(|entry| {
                (
                    ManagedDependencyKey::new(
                        &entry.group_id,
                        &entry.artifact_id,
                        &entry.artifact_type,
                        &entry.classifier,
                    ),
                    entry.version.clone(),
                )
            })
            .collect()
    }

    /// Configured local repository, or one below the user cache directory.
    pub fn local_repository(&self) -> Result<PathBuf> {
        if let Some(path) = &self.local_repository {
            return Ok(path.clone());
        }
        let base = dirs::cache_dir().context("could not determine cache directory")?;
        Ok(base.join("reposync").join("repository"))
    }
}

/// Config file path: `~/.config/reposync/reposync.toml`
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("reposync").join("reposync.toml"))
}

/// Load `explicit` if given, which must exist. Otherwise load the default
/// config file, falling back to defaults if it is missing.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match config_path() {
            Some(path) if path.is_file() => path,
            _ => return Ok(AppConfig::default()),
        },
    };

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("failed to parse config at {}", path.display()))
}

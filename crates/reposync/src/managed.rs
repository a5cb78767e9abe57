//! Fallback versions from a project's dependency-management table.

use std::collections::HashMap;
use std::fmt;

use crate::coordinate::{ArtifactCoordinate, DEFAULT_EXTENSION};
use crate::error::SyncError;

/// Key into a dependency-management table. Versions are looked up by
/// everything but the version itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ManagedDependencyKey {
    group_id: String,
    artifact_id: String,
    artifact_type: String,
    classifier: String,
}

impl ManagedDependencyKey {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        artifact_type: impl Into<String>,
        classifier: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            artifact_type: artifact_type.into(),
            classifier: classifier.into(),
        }
    }

    /// The key a coordinate is managed under. The extension stands in for
    /// the dependency type.
    pub fn for_coordinate(coordinate: &ArtifactCoordinate) -> Self {
        let artifact_type = if coordinate.extension().is_empty() {
            DEFAULT_EXTENSION
        } else {
            coordinate.extension()
        };
        Self::new(
            coordinate.group_id(),
            coordinate.artifact_id(),
            artifact_type,
            coordinate.classifier(),
        )
    }
}

impl fmt::Display for ManagedDependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.artifact_type)?;
        if !self.classifier.is_empty() {
            write!(f, ":{}", self.classifier)?;
        }
        Ok(())
    }
}

/// A source of managed versions.
pub trait ManagedVersions {
    fn managed_version(&self, key: &ManagedDependencyKey) -> Option<&str>;
}

/// A declared dependency-management table. The first declaration of a key
/// wins.
#[derive(Debug, Clone, Default)]
pub struct DependencyManagement {
    versions: HashMap<ManagedDependencyKey, String>,
}

impl DependencyManagement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: ManagedDependencyKey, version: impl Into<String>) {
        self.versions.entry(key).or_insert_with(|| version.into());
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

impl ManagedVersions for DependencyManagement {
    fn managed_version(&self, key: &ManagedDependencyKey) -> Option<&str> {
        self.versions.get(key).map(String::as_str)
    }
}

impl FromIterator<(ManagedDependencyKey, String)> for DependencyManagement {
    fn from_iter<I: IntoIterator<Item = (ManagedDependencyKey, String)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (key, version) in iter {
            table.insert(key, version);
        }
        table
    }
}

/// Fill in a missing version from `managed`. Coordinates that already carry
/// a version are returned unchanged.
pub fn apply_managed_version(
    mut coordinate: ArtifactCoordinate,
    managed: &dyn ManagedVersions,
) -> Result<ArtifactCoordinate, SyncError> {
    if coordinate.has_version() {
        return Ok(coordinate);
    }

    let key = ManagedDependencyKey::for_coordinate(&coordinate);
    let version = managed
        .managed_version(&key)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| SyncError::ManagedVersionNotFound(key.clone()))?;

    tracing::debug!("using managed version {version} for {key}");
    coordinate.set_version(version)?;
    Ok(coordinate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DependencyManagement {
        [
            (ManagedDependencyKey::new("g", "a", "jar", ""), "1.0".to_owned()),
            (ManagedDependencyKey::new("g", "a", "jar", "tests"), "1.1".to_owned()),
            (ManagedDependencyKey::new("g", "b", "pom", ""), "2.0".to_owned()),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn fills_missing_version() {
        let coordinate = ArtifactCoordinate::versionless("g", "a", "jar", "");
        let resolved = apply_managed_version(coordinate, &table()).unwrap();
        assert_eq!(resolved.to_string(), "g:a:1.0");
    }

    #[test]
    fn classifier_and_type_are_part_of_the_key() {
        let tests = ArtifactCoordinate::versionless("g", "a", "jar", "tests");
        assert_eq!(apply_managed_version(tests, &table()).unwrap().version(), "1.1");

        let pom = ArtifactCoordinate::versionless("g", "b", "pom", "");
        assert_eq!(apply_managed_version(pom, &table()).unwrap().version(), "2.0");
    }

    #[test]
    fn empty_extension_is_looked_up_as_jar() {
        let coordinate = ArtifactCoordinate::versionless("g", "a", "", "");
        assert_eq!(
            apply_managed_version(coordinate, &table()).unwrap().version(),
            "1.0"
        );
    }

    #[test]
    fn explicit_version_is_kept() {
        let coordinate: ArtifactCoordinate = "g:a:9.9".parse().unwrap();
        let resolved = apply_managed_version(coordinate.clone(), &table()).unwrap();
        assert_eq!(resolved, coordinate);
    }

    #[test]
    fn missing_entry_is_an_error() {
        let coordinate = ArtifactCoordinate::versionless("g", "missing", "jar", "");
        let err = apply_managed_version(coordinate, &table()).unwrap_err();
        assert!(matches!(err, SyncError::ManagedVersionNotFound(_)));
        assert!(err.to_string().contains("g:missing:jar"));
    }

    #[test]
    fn first_declaration_wins() {
        let mut table = DependencyManagement::new();
        table.insert(ManagedDependencyKey::new("g", "a", "jar", ""), "1.0");
        table.insert(ManagedDependencyKey::new("g", "a", "jar", ""), "2.0");
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.managed_version(&ManagedDependencyKey::new("g", "a", "jar", "")),
            Some("1.0")
        );
    }
}

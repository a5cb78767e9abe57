//! Maven 2 repository layout: where an artifact lives below a repository root.

use std::path::{Path, PathBuf};

use reposync::ArtifactCoordinate;

use crate::error::LayoutError;

pub const METADATA_FILE: &str = "maven-metadata.xml";

const FILE_SCHEME: &str = "file://";

/// The directory a repository URL points at. Accepts `file://` URLs and
/// plain paths.
pub fn repository_root(url: &str) -> Result<PathBuf, LayoutError> {
    if let Some(path) = url.strip_prefix(FILE_SCHEME) {
        return Ok(PathBuf::from(path));
    }
    if url.contains("://") {
        return Err(LayoutError::UnsupportedUrl(url.to_owned()));
    }
    Ok(PathBuf::from(url))
}

/// `file://` URL for a local directory.
pub fn file_url(path: &Path) -> String {
    format!("{FILE_SCHEME}{}", path.display())
}

/// `group/as/dirs/artifact`
pub fn module_dir(group_id: &str, artifact_id: &str) -> PathBuf {
    let mut dir: PathBuf = group_id.split('.').collect();
    dir.push(artifact_id);
    dir
}

/// `group/as/dirs/artifact/baseVersion/artifact-version[-classifier].extension`
///
/// The directory is named after `base_version`, the file after the full
/// version, so timestamped snapshots share their `-SNAPSHOT` directory.
pub fn artifact_path(coordinate: &ArtifactCoordinate, base_version: &str) -> PathBuf {
    let mut file_name = format!("{}-{}", coordinate.artifact_id(), coordinate.version());
    if !coordinate.classifier().is_empty() {
        file_name.push('-');
        file_name.push_str(coordinate.classifier());
    }
    file_name.push('.');
    file_name.push_str(coordinate.extension());

    let mut path = module_dir(coordinate.group_id(), coordinate.artifact_id());
    path.push(base_version);
    path.push(file_name);
    path
}

/// `group/as/dirs/artifact/maven-metadata.xml`
pub fn metadata_path(group_id: &str, artifact_id: &str) -> PathBuf {
    module_dir(group_id, artifact_id).join(METADATA_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(s: &str) -> ArtifactCoordinate {
        s.parse().unwrap()
    }

    #[test]
    fn file_urls_and_paths_are_roots() {
        assert_eq!(repository_root("file:///srv/repo").unwrap(), PathBuf::from("/srv/repo"));
        assert_eq!(repository_root("/srv/repo").unwrap(), PathBuf::from("/srv/repo"));
        assert_eq!(repository_root("repo").unwrap(), PathBuf::from("repo"));
    }

    #[test]
    fn network_urls_are_unsupported() {
        let err = repository_root("https://repo.maven.apache.org/maven2").unwrap_err();
        assert!(matches!(err, LayoutError::UnsupportedUrl(_)));
    }

    #[test]
    fn file_url_round_trips() {
        let url = file_url(Path::new("/srv/repo"));
        assert_eq!(url, "file:///srv/repo");
        assert_eq!(repository_root(&url).unwrap(), PathBuf::from("/srv/repo"));
    }

    #[test]
    fn plain_artifact_path() {
        assert_eq!(
            artifact_path(&c("org.example:lib:1.0"), "1.0"),
            PathBuf::from("org/example/lib/1.0/lib-1.0.jar")
        );
    }

    #[test]
    fn classified_artifact_path() {
        assert_eq!(
            artifact_path(&c("org.example:lib:jar:sources:1.0"), "1.0"),
            PathBuf::from("org/example/lib/1.0/lib-1.0-sources.jar")
        );
        assert_eq!(
            artifact_path(&c("org.example:lib:pom:1.0"), "1.0"),
            PathBuf::from("org/example/lib/1.0/lib-1.0.pom")
        );
    }

    #[test]
    fn timestamped_snapshot_lives_in_base_version_dir() {
        assert_eq!(
            artifact_path(&c("g:a:1.0-20220101.012345-1"), "1.0-SNAPSHOT"),
            PathBuf::from("g/a/1.0-SNAPSHOT/a-1.0-20220101.012345-1.jar")
        );
    }

    #[test]
    fn metadata_lives_in_module_dir() {
        assert_eq!(
            metadata_path("org.example", "lib"),
            PathBuf::from("org/example/lib/maven-metadata.xml")
        );
    }
}

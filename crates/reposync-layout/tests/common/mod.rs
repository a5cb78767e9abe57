#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use reposync::{ArtifactCoordinate, RemoteRepository};
use reposync_layout::{file_url, layout};
use tempfile::TempDir;

/// A Maven layout repository in a temporary directory.
pub struct TestRepo {
    pub id: String,
    dir: TempDir,
}

impl TestRepo {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn remote(&self) -> RemoteRepository {
        RemoteRepository::new(&self.id, file_url(self.path()))
    }

    /// Where `coords` would live, using its Maven base version directory.
    pub fn file(&self, coords: &str) -> PathBuf {
        let coordinate: ArtifactCoordinate = coords.parse().unwrap();
        let base = reposync::version::base_version(coordinate.version());
        self.path().join(layout::artifact_path(&coordinate, &base))
    }

    /// Like [`file`](Self::file) but under an explicit version directory.
    pub fn file_in(&self, coords: &str, version_dir: &str) -> PathBuf {
        let coordinate: ArtifactCoordinate = coords.parse().unwrap();
        self.path().join(layout::artifact_path(&coordinate, version_dir))
    }

    pub fn has(&self, coords: &str) -> bool {
        self.file(coords).is_file()
    }

    pub fn put(&self, coords: &str, content: &str) {
        let path = self.file(coords);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// A jar plus a POM declaring `dependencies`.
    pub fn module(&self, gav: &str, dependencies: &[Dep]) {
        self.put(gav, &format!("jar of {gav}"));
        self.pom(gav, None, "", dependencies);
    }

    pub fn pom(&self, gav: &str, parent: Option<&str>, extra: &str, dependencies: &[Dep]) {
        let coordinate: ArtifactCoordinate = gav.parse().unwrap();
        let parent_xml = parent
            .map(|p| {
                let parent: ArtifactCoordinate = p.parse().unwrap();
                format!(
                    "<parent><groupId>{}</groupId><artifactId>{}</artifactId><version>{}</version></parent>",
                    parent.group_id(),
                    parent.artifact_id(),
                    parent.version()
                )
            })
            .unwrap_or_default();
        let dependencies_xml: String = dependencies.iter().map(Dep::to_xml).collect();
        let xml = format!(
            "<project>{parent_xml}<groupId>{}</groupId><artifactId>{}</artifactId><version>{}</version>{extra}<dependencies>{dependencies_xml}</dependencies></project>",
            coordinate.group_id(),
            coordinate.artifact_id(),
            coordinate.version()
        );
        let pom = format!(
            "{}:{}:pom:{}",
            coordinate.group_id(),
            coordinate.artifact_id(),
            coordinate.version()
        );
        self.put(&pom, &xml);
    }
}

/// A `<dependency>` element.
#[derive(Default)]
pub struct Dep {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub dependency_type: Option<String>,
    pub classifier: Option<String>,
    pub scope: Option<String>,
    pub optional: bool,
}

pub fn dep(ga: &str, version: &str) -> Dep {
    let mut dep = dep_unversioned(ga);
    dep.version = Some(version.to_owned());
    dep
}

pub fn dep_unversioned(ga: &str) -> Dep {
    let (group_id, artifact_id) = ga.split_once(':').unwrap();
    Dep {
        group_id: group_id.to_owned(),
        artifact_id: artifact_id.to_owned(),
        ..Dep::default()
    }
}

impl Dep {
    pub fn scope(mut self, scope: &str) -> Self {
        self.scope = Some(scope.to_owned());
        self
    }

    pub fn of_type(mut self, dependency_type: &str) -> Self {
        self.dependency_type = Some(dependency_type.to_owned());
        self
    }

    pub fn classifier(mut self, classifier: &str) -> Self {
        self.classifier = Some(classifier.to_owned());
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    fn to_xml(&self) -> String {
        let mut xml = format!(
            "<dependency><groupId>{}</groupId><artifactId>{}</artifactId>",
            self.group_id, self.artifact_id
        );
        if let Some(version) = &self.version {
            xml.push_str(&format!("<version>{version}</version>"));
        }
        if let Some(dependency_type) = &self.dependency_type {
            xml.push_str(&format!("<type>{dependency_type}</type>"));
        }
        if let Some(classifier) = &self.classifier {
            xml.push_str(&format!("<classifier>{classifier}</classifier>"));
        }
        if let Some(scope) = &self.scope {
            xml.push_str(&format!("<scope>{scope}</scope>"));
        }
        if self.optional {
            xml.push_str("<optional>true</optional>");
        }
        xml.push_str("</dependency>");
        xml
    }
}

//! Effective POM: a POM merged with its parents, properties interpolated.

use std::collections::{HashMap, HashSet};

use reposync::ArtifactCoordinate;
use reposync::coordinate::DEFAULT_EXTENSION;

use crate::error::PomError;
use crate::pom::{Pom, PomDependency};

/// Passes over a value while it still contains resolvable references.
const MAX_INTERPOLATION_PASSES: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveModel {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub packaging: String,
    pub properties: HashMap<String, String>,
    /// Managed dependencies, nearest declaration first.
    pub managed: Vec<PomDependency>,
    pub dependencies: Vec<PomDependency>,
}

impl EffectiveModel {
    /// Merge `chain`, a POM followed by its ancestors nearest first.
    pub fn from_chain(chain: &[&Pom]) -> Result<Self, PomError> {
        let pom = chain.first().ok_or(PomError::MissingElement("project"))?;
        let parent = pom.parent.as_ref();

        let group_id = pom
            .group_id
            .clone()
            .or_else(|| parent.map(|p| p.group_id.clone()))
            .ok_or(PomError::MissingElement("groupId"))?;
        let artifact_id = pom
            .artifact_id
            .clone()
            .ok_or(PomError::MissingElement("artifactId"))?;
        let version = pom
            .version
            .clone()
            .or_else(|| parent.map(|p| p.version.clone()))
            .ok_or(PomError::MissingElement("version"))?;
        let packaging = pom.packaging.clone().unwrap_or_else(|| DEFAULT_EXTENSION.to_owned());

        let mut properties = HashMap::new();
        for ancestor in chain.iter().rev() {
            properties.extend(ancestor.properties.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        properties.insert("project.groupId".to_owned(), group_id.clone());
        properties.insert("project.artifactId".to_owned(), artifact_id.clone());
        properties.insert("project.version".to_owned(), version.clone());
        if let Some(parent) = parent {
            properties.insert("project.parent.groupId".to_owned(), parent.group_id.clone());
            properties.insert("project.parent.version".to_owned(), parent.version.clone());
        }

        let managed = merge(chain.iter().map(|p| p.dependency_management.as_slice()), &properties);
        let dependencies = merge(chain.iter().map(|p| p.dependencies.as_slice()), &properties);

        Ok(Self {
            group_id,
            artifact_id,
            version,
            packaging,
            properties,
            managed,
            dependencies,
        })
    }

    /// The nearest managed entry for the same group, artifact, type and
    /// classifier as `dependency`.
    pub fn managed_for(&self, dependency: &PomDependency) -> Option<&PomDependency> {
        let key = management_key(dependency);
        self.managed.iter().find(|m| management_key(m) == key)
    }
}

impl std::fmt::Display for EffectiveModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

/// Interpolate each list and keep the nearest declaration of every key.
fn merge<'a>(
    lists: impl Iterator<Item = &'a [PomDependency]>,
    properties: &HashMap<String, String>,
) -> Vec<PomDependency> {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for dependency in lists.flatten() {
        let dependency = interpolate_dependency(dependency, properties);
        if seen.insert(management_key(&dependency)) {
            merged.push(dependency);
        }
    }
    merged
}

fn interpolate_dependency(
    dependency: &PomDependency,
    properties: &HashMap<String, String>,
) -> PomDependency {
    let field = |value: &Option<String>| value.as_deref().map(|v| interpolate(v, properties));
    PomDependency {
        group_id: interpolate(&dependency.group_id, properties),
        artifact_id: interpolate(&dependency.artifact_id, properties),
        version: field(&dependency.version),
        dependency_type: field(&dependency.dependency_type),
        classifier: field(&dependency.classifier),
        scope: field(&dependency.scope),
        optional: dependency.optional,
        exclusions: dependency.exclusions.clone(),
    }
}

/// Replace `${name}` references with known property values. Unknown
/// references are left as written.
pub fn interpolate(value: &str, properties: &HashMap<String, String>) -> String {
    let mut current = value.to_owned();
    for _ in 0..MAX_INTERPOLATION_PASSES {
        let next = interpolate_once(&current, properties);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn interpolate_once(value: &str, properties: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        match properties.get(name) {
            Some(replacement) => out.push_str(replacement),
            None => out.push_str(&rest[start..start + 2 + end + 1]),
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

/// `group:artifact:type:classifier`, the identity used by dependency
/// management.
pub fn management_key(dependency: &PomDependency) -> String {
    format!(
        "{}:{}:{}:{}",
        dependency.group_id,
        dependency.artifact_id,
        dependency.dependency_type.as_deref().unwrap_or(DEFAULT_EXTENSION),
        dependency.classifier.as_deref().unwrap_or_default()
    )
}

/// File extension and classifier of a dependency type.
pub fn extension_and_classifier(dependency_type: &str, classifier: &str) -> (String, String) {
    let (extension, implied) = match dependency_type {
        "test-jar" => ("jar", "tests"),
        "ejb-client" => ("jar", "client"),
        "java-source" => ("jar", "sources"),
        "javadoc" => ("jar", "javadoc"),
        "maven-plugin" | "ejb" | "bundle" => ("jar", ""),
        other => (other, ""),
    };
    let classifier = if classifier.is_empty() { implied } else { classifier };
    (extension.to_owned(), classifier.to_owned())
}

/// The file a dependency declaration refers to, at `version`.
pub fn dependency_coordinate(dependency: &PomDependency, version: &str) -> ArtifactCoordinate {
    let (extension, classifier) = extension_and_classifier(
        dependency.dependency_type.as_deref().unwrap_or(DEFAULT_EXTENSION),
        dependency.classifier.as_deref().unwrap_or_default(),
    );
    ArtifactCoordinate::new(
        &dependency.group_id,
        &dependency.artifact_id,
        extension,
        classifier,
        version,
    )
}

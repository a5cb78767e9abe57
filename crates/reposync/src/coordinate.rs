use std::fmt;
use std::str::FromStr;

use crate::version;

/// Extension assumed when a coordinate does not name one.
pub const DEFAULT_EXTENSION: &str = "jar";

const SEPARATOR: char = ':';

/// Errors raised while parsing or building coordinates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoordinateError {
    #[error(
        "invalid artifact \"{0}\": expected <groupId>:<artifactId>[:<extension>[:<classifier>]]:<version>"
    )]
    InvalidArtifact(String),

    #[error("invalid extra \"{0}\": expected <extension>[:<classifier>]")]
    InvalidExtra(String),

    #[error("{0} must not be empty")]
    EmptyField(&'static str),
}

fn require_non_empty(field: &'static str, value: String) -> Result<String, CoordinateError> {
    if value.is_empty() {
        Err(CoordinateError::EmptyField(field))
    } else {
        Ok(value)
    }
}

fn has_whitespace(s: &str) -> bool {
    s.chars().any(char::is_whitespace)
}

/// Identifies exactly one artifact file:
/// `groupId:artifactId[:extension[:classifier]]:version`.
///
/// Equality and hashing cover all five fields. The ordering is only used to
/// make iteration over coordinate sets reproducible.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactCoordinate {
    group_id: String,
    artifact_id: String,
    extension: String,
    classifier: String,
    version: String,
}

impl ArtifactCoordinate {
    /// Build a coordinate from all five parts. No field is validated, so
    /// this is also how an empty extension or classifier is expressed.
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        extension: impl Into<String>,
        classifier: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            extension: extension.into(),
            classifier: classifier.into(),
            version: version.into(),
        }
    }

    /// A coordinate whose version is still to be filled in from dependency
    /// management.
    pub fn versionless(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        extension: impl Into<String>,
        classifier: impl Into<String>,
    ) -> Self {
        Self::new(group_id, artifact_id, extension, classifier, "")
    }

    /// The extra artifact `extra` of the module at `path`.
    pub fn from_path_and_extra(path: &ArtifactPath, extra: &ExtraCoordinate) -> Self {
        Self::new(
            path.group_id(),
            path.artifact_id(),
            extra.extension(),
            extra.classifier(),
            path.version(),
        )
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn classifier(&self) -> &str {
        &self.classifier
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn has_version(&self) -> bool {
        !self.version.is_empty()
    }

    pub fn set_group_id(&mut self, group_id: impl Into<String>) -> Result<(), CoordinateError> {
        self.group_id = require_non_empty("groupId", group_id.into())?;
        Ok(())
    }

    pub fn set_artifact_id(
        &mut self,
        artifact_id: impl Into<String>,
    ) -> Result<(), CoordinateError> {
        self.artifact_id = require_non_empty("artifactId", artifact_id.into())?;
        Ok(())
    }

    pub fn set_version(&mut self, version: impl Into<String>) -> Result<(), CoordinateError> {
        self.version = require_non_empty("version", version.into())?;
        Ok(())
    }

    /// The module this artifact belongs to.
    pub fn path(&self) -> ArtifactPath {
        ArtifactPath::new(&self.group_id, &self.artifact_id, &self.version)
    }

    /// A plain POM: extension `pom` without a classifier.
    pub fn is_pom(&self) -> bool {
        self.extension == "pom" && self.classifier.is_empty()
    }

    pub fn is_snapshot(&self) -> bool {
        version::is_snapshot(&self.version)
    }

    /// `group:artifact:extension[:classifier]:version`, always naming the
    /// extension. This is the string filter patterns are matched against.
    pub fn canonical(&self) -> String {
        let mut out = format!("{}:{}:{}", self.group_id, self.artifact_id, self.extension);
        if !self.classifier.is_empty() {
            out.push(SEPARATOR);
            out.push_str(&self.classifier);
        }
        out.push(SEPARATOR);
        out.push_str(&self.version);
        out
    }
}

impl FromStr for ArtifactCoordinate {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoordinateError::InvalidArtifact(s.to_owned());
        let segments: Vec<&str> = s.split(SEPARATOR).collect();

        if segments.iter().any(|segment| has_whitespace(segment)) {
            return Err(invalid());
        }

        let (group_id, artifact_id, extension, classifier, version) = match segments.as_slice() {
            [group, artifact, version] => (*group, *artifact, "", "", *version),
            [group, artifact, extension, version] => (*group, *artifact, *extension, "", *version),
            [group, artifact, extension, classifier, version] => {
                (*group, *artifact, *extension, *classifier, *version)
            }
            _ => return Err(invalid()),
        };

        if group_id.is_empty() || artifact_id.is_empty() || version.is_empty() {
            return Err(invalid());
        }

        // An extension segment, once present, must not be empty.
        let extension = match segments.len() {
            3 => DEFAULT_EXTENSION,
            _ if extension.is_empty() => return Err(invalid()),
            _ => extension,
        };

        Ok(Self::new(group_id, artifact_id, extension, classifier, version))
    }
}

/// Shortest equivalent form: the extension and classifier segments are
/// omitted when they are the defaults.
impl fmt::Display for ArtifactCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)?;
        if self.extension != DEFAULT_EXTENSION || !self.classifier.is_empty() {
            write!(f, ":{}", self.extension)?;
            if !self.classifier.is_empty() {
                write!(f, ":{}", self.classifier)?;
            }
        }
        write!(f, ":{}", self.version)
    }
}

/// A module version, `groupId:artifactId:version`. All artifacts sharing a
/// path are published together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactPath {
    group_id: String,
    artifact_id: String,
    version: String,
}

impl ArtifactPath {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
        }
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl From<&ArtifactCoordinate> for ArtifactPath {
    fn from(coordinate: &ArtifactCoordinate) -> Self {
        coordinate.path()
    }
}

impl fmt::Display for ArtifactPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

/// A companion artifact kind, `extension[:classifier]`, such as
/// `jar:sources`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExtraCoordinate {
    extension: String,
    classifier: String,
}

impl ExtraCoordinate {
    pub fn new(extension: impl Into<String>, classifier: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            classifier: classifier.into(),
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn classifier(&self) -> &str {
        &self.classifier
    }
}

impl FromStr for ExtraCoordinate {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if has_whitespace(s) {
            return Err(CoordinateError::InvalidExtra(s.to_owned()));
        }

        let segments: Vec<&str> = s.split(SEPARATOR).collect();
        match segments.as_slice() {
            [extension] => Ok(Self::new(*extension, "")),
            [extension, classifier] => Ok(Self::new(*extension, *classifier)),
            _ => Err(CoordinateError::InvalidExtra(s.to_owned())),
        }
    }
}

impl fmt::Display for ExtraCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension)?;
        if !self.classifier.is_empty() {
            write!(f, ":{}", self.classifier)?;
        }
        Ok(())
    }
}

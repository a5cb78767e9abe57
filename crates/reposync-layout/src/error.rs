use std::path::PathBuf;

/// Errors reading or writing a repository on disk.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("unsupported repository URL \"{0}\": only local paths and file:// URLs are supported")]
    UnsupportedUrl(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid POM {path}: {source}")]
    Pom {
        path: PathBuf,
        #[source]
        source: PomError,
    },
}

impl LayoutError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors parsing or writing Maven XML documents.
#[derive(Debug, thiserror::Error)]
pub enum PomError {
    #[error("malformed XML: {0}")]
    Xml(String),

    #[error("missing <{0}>")]
    MissingElement(&'static str),
}

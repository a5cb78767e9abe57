//! What a synchronization run did, for the caller to present.

use std::fmt;

/// One user-facing message produced during a run. Library code never
/// prints; callers decide how to show these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    /// Progress, such as a published module.
    Info(String),
    /// The run continued, but something was skipped.
    Warning(String),
}

impl Feedback {
    pub fn info(msg: impl Into<String>) -> Self {
        Self::Info(msg.into())
    }

    pub fn warning(msg: impl Into<String>) -> Self {
        Self::Warning(msg.into())
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Warning(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Info(msg) | Self::Warning(msg) => msg,
        }
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info(msg) => write!(f, "{msg}"),
            Self::Warning(msg) => write!(f, "warning: {msg}"),
        }
    }
}

/// Counters and messages of one completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Distinct coordinates asked for.
    pub requested: usize,
    /// Distinct coordinates seen during resolution, ignored ones included.
    pub collected: usize,
    /// Coordinates skipped because the target already serves them.
    pub ignored: usize,
    /// Extra artifacts looked up after dependency resolution.
    pub extras_requested: usize,
    pub published_groups: usize,
    pub published_artifacts: usize,
    pub feedback: Vec<Feedback>,
}

impl SyncReport {
    pub fn warnings(&self) -> impl Iterator<Item = &Feedback> {
        self.feedback.iter().filter(|item| item.is_warning())
    }

    /// One line suitable for the end of a run.
    pub fn summary(&self) -> String {
        format!(
            "Published {} artifact(s) in {} module(s) ({} resolved, {} already in target).",
            self.published_artifacts, self.published_groups, self.collected, self.ignored
        )
    }
}

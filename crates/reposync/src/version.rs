//! Maven snapshot version detection.
//!
//! A snapshot is either a literal `-SNAPSHOT` version or a deployed
//! snapshot qualified with a timestamp and build number, for example
//! `1.0-20220101.012345-1`.

use std::sync::LazyLock;

use regex::Regex;

const SNAPSHOT_SUFFIX: &str = "SNAPSHOT";

/// A deployed snapshot: an optional `<base>-` prefix, then
/// `yyyyMMdd.HHmmss-<build>`.
static TIMESTAMPED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*-)?[0-9]{8}\.[0-9]{6}-[0-9]+$").expect("timestamp pattern is valid")
});

/// Timestamped snapshots that may be published as releases. The base must
/// be non-empty.
static RELEASABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.+-[0-9]{8}\.[0-9]{6}-[0-9]+$").expect("release pattern is valid")
});

/// True if `version` denotes any kind of snapshot.
pub fn is_snapshot(version: &str) -> bool {
    version.ends_with(SNAPSHOT_SUFFIX) || TIMESTAMPED.is_match(version)
}

/// True if `version` is `<base>-yyyyMMdd.HHmmss-<build>` with a non-empty base.
///
/// Only these versions are eligible for being published as releases.
pub fn is_timestamped_snapshot(version: &str) -> bool {
    RELEASABLE.is_match(version)
}

/// The Maven base version: a timestamped snapshot collapses back to its
/// `-SNAPSHOT` form, every other version is its own base version.
pub fn base_version(version: &str) -> String {
    match TIMESTAMPED.captures(version) {
        Some(captures) => {
            let prefix = captures.get(1).map_or("", |m| m.as_str());
            format!("{prefix}{SNAPSHOT_SUFFIX}")
        }
        None => version.to_owned(),
    }
}

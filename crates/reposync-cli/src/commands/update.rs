use anyhow::{Context, Result};
use clap::{ArgAction, Args};
use reposync::managed::apply_managed_version;
use reposync::tokens::{dedup_preserving_order, parse_artifacts, parse_extras};
use reposync::{
    ArtifactCoordinate, ExtraCoordinate, PatternFilter, Pipeline, ResolutionSession, SyncPlanner,
    SyncRequest, VersionFilter, target_repository,
};
use reposync_layout::LayoutRepositorySystem;

use super::format;
use crate::config::AppConfig;

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Artifacts to synchronize (`groupId:artifactId[:extension[:classifier]]:version`),
    /// comma or whitespace separated
    #[arg(long = "artifact", value_name = "LIST")]
    pub artifacts: Vec<String>,
    /// Companion artifacts to publish next to each resolved module (`extension[:classifier]`)
    #[arg(long = "extra", value_name = "LIST")]
    pub extras: Vec<String>,
    /// Id of the target repository
    #[arg(long)]
    pub repository_id: Option<String>,
    /// URL of the target repository
    #[arg(long)]
    pub repository_url: Option<String>,
    /// Publish artifacts even when they were resolved from the target
    #[arg(long)]
    pub force: bool,
    /// Fail when no artifact was requested
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub fail_on_no_artifact: bool,
    /// Publish timestamped snapshots as releases
    #[arg(long)]
    pub snapshot_as_release: bool,
    /// Only publish artifacts whose coordinates match this regex
    #[arg(long, value_name = "REGEX")]
    pub filter: Option<String>,
    /// Only publish snapshots or only releases
    #[arg(long, value_name = "snapshot|release")]
    pub version_filter: Option<VersionFilter>,
}

/// Merge configured and command-line inputs into one request.
pub fn build_request(config: &AppConfig, args: &UpdateArgs) -> Result<SyncRequest> {
    let managed = config.dependency_management();
    let mut artifacts: Vec<ArtifactCoordinate> = Vec::new();

    for item in &config.artifacts {
        let coordinate = item
            .to_coordinate()
            .with_context(|| format!("invalid artifact item {}:{}", item.group_id, item.artifact_id))?;
        artifacts.push(apply_managed_version(coordinate, &managed)?);
    }
    for list in &args.artifacts {
        artifacts.extend(parse_artifacts(list).with_context(|| format!("invalid --artifact {list:?}"))?);
    }

    let mut extras: Vec<ExtraCoordinate> = config.extras.iter().map(|item| item.to_extra()).collect();
    for list in &args.extras {
        extras.extend(parse_extras(list).with_context(|| format!("invalid --extra {list:?}"))?);
    }

    let repositories = config.remote_repositories();
    let target = target_repository(
        args.repository_id.as_deref(),
        args.repository_url.as_deref(),
        &repositories,
    )?;

    let mut pipeline = Pipeline::new().with_snapshot_as_release(args.snapshot_as_release);
    if let Some(pattern) = &args.filter {
        let filter = PatternFilter::new(pattern)
            .with_context(|| format!("invalid --filter pattern {pattern:?}"))?;
        pipeline = pipeline.with_pattern(filter);
    }
    if let Some(version_filter) = args.version_filter {
        pipeline = pipeline.with_version_filter(version_filter);
    }

    Ok(SyncRequest::new(target)
        .with_artifacts(dedup_preserving_order(artifacts))
        .with_extras(dedup_preserving_order(extras))
        .with_repositories(repositories)
        .with_force(args.force)
        .with_fail_on_empty(args.fail_on_no_artifact)
        .with_pipeline(pipeline))
}

/// Run one synchronization and print its feedback and summary.
pub async fn run(config: &AppConfig, args: &UpdateArgs) -> Result<()> {
    let request = build_request(config, args)?;

    let local = config.local_repository()?;
    std::fs::create_dir_all(&local)
        .with_context(|| format!("failed to create local repository: {}", local.display()))?;

    println!("Synchronizing into {}...", request.target());
    tracing::debug!(
        "{} artifact(s), local repository {}",
        request.artifacts().len(),
        local.display()
    );

    let system = LayoutRepositorySystem::new(local);
    let report = SyncPlanner::new(&system)
        .run(&ResolutionSession::new(), &request)
        .await?;

    format::print_feedback(&report.feedback);
    println!("{}", report.summary());

    Ok(())
}

use anyhow::Result;

use super::format::{self, RepositoryRow};
use crate::config::AppConfig;

pub fn run(config: &AppConfig) -> Result<()> {
    let repositories = config.remote_repositories();
    if repositories.is_empty() {
        eprintln!("No repositories configured.");
        return Ok(());
    }

    let rows: Vec<RepositoryRow<'_>> = repositories
        .iter()
        .enumerate()
        .map(|(index, repository)| RepositoryRow { repository, index })
        .collect();
    format::print_repository_table(&rows);

    Ok(())
}

use reposync::{Feedback, RemoteRepository};

const MAX_ID_WIDTH: usize = 30;

/// Print progress to stdout, warnings to stderr.
pub fn print_feedback(feedback: &[Feedback]) {
    for item in feedback {
        if item.is_warning() {
            eprintln!("{item}");
        } else {
            println!("{item}");
        }
    }
}

pub fn print_repository_table(repositories: &[RepositoryRow<'_>]) {
    for line in repository_lines(repositories) {
        println!("{line}");
    }
}

/// One numbered line of the repository listing.
pub struct RepositoryRow<'a> {
    pub repository: &'a RemoteRepository,
    pub index: usize,
}

fn repository_lines(rows: &[RepositoryRow<'_>]) -> Vec<String> {
    let id_width = rows
        .iter()
        .map(|row| row.repository.id.chars().count())
        .max()
        .unwrap_or(0)
        .min(MAX_ID_WIDTH);

    rows.iter()
        .map(|row| {
            format!(
                "{:>2}. {:<width$}  {}",
                row.index + 1,
                truncate(&row.repository.id, id_width),
                row.repository.url,
                width = id_width
            )
        })
        .collect()
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_owned()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{truncated}…")
    }
}

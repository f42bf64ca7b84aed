/// Only web URLs with this exact prefix are accepted.
pub const GITHUB_PREFIX: &str = "https://github.com/";

/// Host serving `/{owner}/{repo}/archive/...` downloads.
pub const GITHUB_ARCHIVE_BASE: &str = "https://github.com";

/// Branch assumed to be the default one. Not discovered from the API.
pub const DEFAULT_BRANCH: &str = "main";

/// Owner and repository name parsed from a GitHub web URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    /// Parse `https://github.com/{owner}/{repo}[/...]`.
    ///
    /// Path segments after the repository name are ignored, as are a query
    /// string, a fragment and a trailing `.git`. Returns `None` when the
    /// prefix is missing or either segment is empty.
    pub fn parse(input: &str) -> Option<Self> {
        let rest = input.strip_prefix(GITHUB_PREFIX)?;
        let rest = rest.split(['?', '#']).next().unwrap_or_default();

        let mut parts = rest.split('/');
        let owner = parts.next().filter(|s| !s.is_empty())?;
        let repo = parts.next()?;
        let repo = repo.strip_suffix(".git").unwrap_or(repo);
        if repo.is_empty() {
            return None;
        }

        Some(Self {
            owner: owner.to_owned(),
            repo: repo.to_owned(),
        })
    }

    /// Archive download URL for `branch` under `base` (no trailing slash).
    pub fn archive_url(&self, base: &str, branch: &str) -> String {
        format!(
            "{}/{}/{}/archive/refs/heads/{}.zip",
            base.trim_end_matches('/'),
            self.owner,
            self.repo,
            branch,
        )
    }

    /// Name GitHub gives the single top-level folder inside the archive.
    pub fn archive_root(&self, branch: &str) -> String {
        format!("{}-{}", self.repo, branch)
    }
}

/// Map a GitHub web URL to the zip archive of its `main` branch.
pub fn convert_github_to_zip_url(input: &str) -> Option<String> {
    RepoRef::parse(input).map(|r| r.archive_url(GITHUB_ARCHIVE_BASE, DEFAULT_BRANCH))
}

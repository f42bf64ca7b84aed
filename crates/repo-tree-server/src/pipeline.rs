use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use repo_tree::{ArchiveError, ArchiveFetcher, Deadline, Feedback, FileNode, RepoRef, TreeBuilder};
use repo_tree_github::extract_archive;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::error::AppError;

const ARCHIVE_FILE: &str = "repo.zip";
const EXTRACT_DIR: &str = "unzipped";

/// Fetch, extract and walk one repository archive per request.
///
/// Every request gets its own scratch directory under `scratch_root`, which
/// is removed once the request is done with it, whichever stage failed.
pub struct TreePipeline {
    fetcher: Arc<dyn ArchiveFetcher>,
    archive_base_url: String,
    branch: String,
    scratch_root: PathBuf,
    request_timeout: Duration,
}

impl TreePipeline {
    pub fn new(fetcher: Arc<dyn ArchiveFetcher>, config: &ServerConfig) -> Self {
        Self {
            fetcher,
            archive_base_url: config.archive_base_url.clone(),
            branch: config.branch.clone(),
            scratch_root: config.scratch_root(),
            request_timeout: config.request_timeout(),
        }
    }

    /// Build the tree for the repository at `raw_url`.
    ///
    /// `Ok(None)` means the archive root vanished before it could be statted.
    pub async fn run(&self, raw_url: Option<&str>) -> Result<Option<FileNode>, AppError> {
        let raw_url = raw_url
            .filter(|url| !url.is_empty())
            .ok_or(AppError::MissingUrl)?;
        let repo = RepoRef::parse(raw_url).ok_or(AppError::InvalidUrl)?;
        let archive_url = repo.archive_url(&self.archive_base_url, &self.branch);
        let expected_root = repo.archive_root(&self.branch);

        let deadline = Deadline::after(self.request_timeout);
        let stages = self.run_stages(&archive_url, expected_root, deadline);
        tokio::time::timeout(self.request_timeout, stages)
            .await
            .map_err(|_| AppError::TimedOut)?
    }

    async fn run_stages(
        &self,
        archive_url: &str,
        expected_root: String,
        deadline: Deadline,
    ) -> Result<Option<FileNode>, AppError> {
        // Blocking stages hold their own handle, so removal waits for them
        // even when this future is dropped on timeout.
        let scratch = Arc::new(
            tempfile::Builder::new()
                .prefix("repo")
                .tempdir_in(&self.scratch_root)
                .map_err(AppError::ScratchDir)?,
        );
        debug!(scratch = %scratch.path().display(), "created scratch directory");

        let archive_path = scratch.path().join(ARCHIVE_FILE);
        let bytes = self
            .fetcher
            .fetch(archive_url, &archive_path, deadline)
            .await
            .map_err(|e| stage_error(e, AppError::Download))?;
        debug!(bytes, url = archive_url, "downloaded archive");

        let stage_scratch = Arc::clone(&scratch);
        let summary = run_blocking(move || {
            let root = stage_scratch.path();
            extract_archive(&root.join(ARCHIVE_FILE), &root.join(EXTRACT_DIR), deadline)
        })
        .await?
        .map_err(|e| stage_error(e, AppError::Extract))?;
        debug!(
            files = summary.files,
            directories = summary.directories,
            bytes = summary.bytes,
            "extracted archive"
        );

        let stage_scratch = Arc::clone(&scratch);
        let report = run_blocking(move || {
            let root = locate_root(&stage_scratch.path().join(EXTRACT_DIR), &expected_root)?;
            TreeBuilder::new()
                .deadline(deadline)
                .build(&root)
                .map_err(|_| AppError::TimedOut)
        })
        .await??;

        for item in &report.feedback {
            match item {
                Feedback::Warning(msg) => warn!("{msg}"),
                Feedback::Error(msg) => error!("{msg}"),
            }
        }
        if let Some(root) = &report.root {
            info!(root = %root.name, nodes = root.node_count(), "built repository tree");
        }

        Ok(report.root)
    }
}

fn stage_error(error: ArchiveError, wrap: fn(ArchiveError) -> AppError) -> AppError {
    match error {
        ArchiveError::DeadlineExceeded => AppError::TimedOut,
        other => wrap(other),
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("blocking stage failed: {e}")))
}

/// Pick the repository root among the extracted top-level entries.
///
/// GitHub archives hold a single `{repo}-{branch}` folder, which wins when
/// present. Otherwise top-level files are ignored and the first folder by
/// name is used.
fn locate_root(extract_dir: &Path, expected: &str) -> Result<PathBuf, AppError> {
    let entries = std::fs::read_dir(extract_dir).map_err(|e| {
        warn!(error = %e, "could not list extracted archive");
        AppError::EmptyRepo
    })?;

    let mut dirs = Vec::new();
    let mut stray_files = 0usize;
    for entry in entries.flatten() {
        if entry.file_type().is_ok_and(|t| t.is_dir()) {
            dirs.push(entry.path());
        } else {
            stray_files += 1;
        }
    }
    dirs.sort();

    if stray_files > 0 {
        debug!(stray_files, "ignoring top-level files in archive");
    }
    if let Some(root) = dirs.iter().find(|dir| dir.file_name().is_some_and(|n| n == expected)) {
        return Ok(root.clone());
    }
    if dirs.len() > 1 {
        warn!(count = dirs.len(), "archive has several top-level directories, using the first");
    }

    dirs.into_iter().next().ok_or(AppError::EmptyRepo)
}

#[cfg(test)]
mod tests {
    use repo_tree::test_support::StaticArchiveFetcher;
    use tempfile::TempDir;

    use super::*;
    use crate::fixtures::{NOT_FOUND_PAGE, is_empty_dir, scenario_zip, zip_bytes, zip_bytes_with_modes};

    fn pipeline_with(fetcher: Arc<StaticArchiveFetcher>, scratch_root: &Path) -> TreePipeline {
        let config = ServerConfig {
            scratch_dir: Some(scratch_root.to_path_buf()),
            ..ServerConfig::default()
        };
        TreePipeline::new(fetcher, &config)
    }

    #[tokio::test]
    async fn builds_tree_for_scenario_archive() {
        let scratch = TempDir::new().unwrap();
        let fetcher = Arc::new(StaticArchiveFetcher::new(scenario_zip()));
        let pipeline = pipeline_with(fetcher.clone(), scratch.path());

        let tree = pipeline
            .run(Some("https://github.com/owner/repo"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            tree,
            FileNode::dir(
                "repo-main",
                vec![
                    FileNode::file("README.md"),
                    FileNode::dir("src", vec![FileNode::file("main.go")]),
                ],
            )
        );
        assert_eq!(
            fetcher.requests(),
            vec!["https://github.com/owner/repo/archive/refs/heads/main.zip".to_owned()]
        );
        assert!(is_empty_dir(scratch.path()));
    }

    #[tokio::test]
    async fn missing_or_empty_url_is_rejected() {
        let scratch = TempDir::new().unwrap();
        let fetcher = Arc::new(StaticArchiveFetcher::new(scenario_zip()));
        let pipeline = pipeline_with(fetcher.clone(), scratch.path());

        assert!(matches!(pipeline.run(None).await, Err(AppError::MissingUrl)));
        assert!(matches!(pipeline.run(Some("")).await, Err(AppError::MissingUrl)));
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn non_github_url_never_fetches() {
        let scratch = TempDir::new().unwrap();
        let fetcher = Arc::new(StaticArchiveFetcher::new(scenario_zip()));
        let pipeline = pipeline_with(fetcher.clone(), scratch.path());

        let result = pipeline.run(Some("https://example.com/x")).await;

        assert!(matches!(result, Err(AppError::InvalidUrl)));
        assert!(fetcher.requests().is_empty());
        assert!(is_empty_dir(scratch.path()));
    }

    #[tokio::test]
    async fn download_failure_cleans_up() {
        let scratch = TempDir::new().unwrap();
        let fetcher = Arc::new(StaticArchiveFetcher::failing(404));
        let pipeline = pipeline_with(fetcher, scratch.path());

        let result = pipeline.run(Some("https://github.com/owner/repo")).await;

        assert!(matches!(result, Err(AppError::Download(ArchiveError::HttpStatus(404)))));
        assert!(is_empty_dir(scratch.path()));
    }

    #[tokio::test]
    async fn error_page_body_fails_extraction() {
        let scratch = TempDir::new().unwrap();
        let fetcher = Arc::new(StaticArchiveFetcher::new(NOT_FOUND_PAGE));
        let pipeline = pipeline_with(fetcher, scratch.path());

        let result = pipeline.run(Some("https://github.com/owner/master-only")).await;

        assert!(matches!(result, Err(AppError::Extract(_))));
        assert!(is_empty_dir(scratch.path()));
    }

    #[tokio::test]
    async fn archive_without_directories_is_empty_repo() {
        let scratch = TempDir::new().unwrap();
        let fetcher = Arc::new(StaticArchiveFetcher::new(zip_bytes(&[("pax_global_header", "x")])));
        let pipeline = pipeline_with(fetcher, scratch.path());

        let result = pipeline.run(Some("https://github.com/owner/repo")).await;

        assert!(matches!(result, Err(AppError::EmptyRepo)));
        assert!(is_empty_dir(scratch.path()));
    }

    #[tokio::test]
    async fn empty_archive_is_empty_repo() {
        let scratch = TempDir::new().unwrap();
        let fetcher = Arc::new(StaticArchiveFetcher::new(zip_bytes(&[])));
        let pipeline = pipeline_with(fetcher, scratch.path());

        let result = pipeline.run(Some("https://github.com/owner/repo")).await;

        assert!(matches!(result, Err(AppError::EmptyRepo)));
    }

    #[tokio::test]
    async fn traversal_entry_fails_extraction() {
        let scratch = TempDir::new().unwrap();
        let fetcher = Arc::new(StaticArchiveFetcher::new(zip_bytes(&[
            ("repo-main/README.md", "# repo"),
            ("../escaped.txt", "owned"),
        ])));
        let pipeline = pipeline_with(fetcher, scratch.path());

        let result = pipeline.run(Some("https://github.com/owner/repo")).await;

        assert!(matches!(result, Err(AppError::Extract(ArchiveError::UnsafePath(_)))));
        assert!(is_empty_dir(scratch.path()));
    }

    #[tokio::test]
    async fn stray_files_and_extra_folders_pick_first_directory() {
        let scratch = TempDir::new().unwrap();
        let fetcher = Arc::new(StaticArchiveFetcher::new(zip_bytes(&[
            ("pax_global_header", "meta"),
            ("zeta/", ""),
            ("zeta/z.txt", "z"),
            ("alpha/", ""),
            ("alpha/a.txt", "a"),
        ])));
        let pipeline = pipeline_with(fetcher, scratch.path());

        let tree = pipeline
            .run(Some("https://github.com/owner/repo"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(tree, FileNode::dir("alpha", vec![FileNode::file("a.txt")]));
    }

    #[tokio::test]
    async fn zero_timeout_times_out_and_cleans_up() {
        let scratch = TempDir::new().unwrap();
        let fetcher = Arc::new(StaticArchiveFetcher::new(scenario_zip()));
        let config = ServerConfig {
            scratch_dir: Some(scratch.path().to_path_buf()),
            request_timeout_secs: 0,
            ..ServerConfig::default()
        };
        let pipeline = TreePipeline::new(fetcher, &config);

        let result = pipeline.run(Some("https://github.com/owner/repo")).await;

        assert!(matches!(result, Err(AppError::TimedOut)));
        assert!(is_empty_dir(scratch.path()));
    }

    #[tokio::test]
    async fn missing_scratch_root_is_scratch_error() {
        let scratch = TempDir::new().unwrap();
        let fetcher = Arc::new(StaticArchiveFetcher::new(scenario_zip()));
        let pipeline = pipeline_with(fetcher.clone(), &scratch.path().join("absent"));

        let result = pipeline.run(Some("https://github.com/owner/repo")).await;

        assert!(matches!(result, Err(AppError::ScratchDir(_))));
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn expected_root_wins_over_earlier_names() {
        let scratch = TempDir::new().unwrap();
        let fetcher = Arc::new(StaticArchiveFetcher::new(zip_bytes(&[
            ("alpha/", ""),
            ("alpha/a.txt", "a"),
            ("repo-main/", ""),
            ("repo-main/README.md", "# repo"),
        ])));
        let pipeline = pipeline_with(fetcher, scratch.path());

        let tree = pipeline
            .run(Some("https://github.com/owner/repo"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(tree, FileNode::dir("repo-main", vec![FileNode::file("README.md")]));
    }

    #[tokio::test]
    async fn read_only_directories_are_cleaned_up() {
        let scratch = TempDir::new().unwrap();
        let fetcher = Arc::new(StaticArchiveFetcher::new(zip_bytes_with_modes(&[
            ("repo-main/", "", 0o755),
            ("repo-main/locked/", "", 0o555),
            ("repo-main/locked/f.txt", "sealed", 0o444),
        ])));
        let pipeline = pipeline_with(fetcher, scratch.path());

        let tree = pipeline
            .run(Some("https://github.com/owner/repo"))
            .await
            .unwrap()
            .unwrap();

        assert!(tree.find("locked/f.txt").is_some());
        assert!(is_empty_dir(scratch.path()));
    }

    #[tokio::test]
    async fn timeout_during_extraction_cleans_up() {
        let scratch = TempDir::new().unwrap();
        // The fetch finishes past the deadline, so the timeout fires while
        // extraction is running on the blocking pool.
        let fetcher = Arc::new(
            StaticArchiveFetcher::new(scenario_zip()).with_write_delay(Duration::from_millis(1200)),
        );
        let config = ServerConfig {
            scratch_dir: Some(scratch.path().to_path_buf()),
            request_timeout_secs: 1,
            ..ServerConfig::default()
        };
        let pipeline = TreePipeline::new(fetcher, &config);

        let result = pipeline.run(Some("https://github.com/owner/repo")).await;
        assert!(matches!(result, Err(AppError::TimedOut)));

        // The blocking stage drops its scratch handle after the caller gave up.
        let mut cleaned = false;
        for _ in 0..50 {
            if is_empty_dir(scratch.path()) {
                cleaned = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(cleaned, "scratch directory left behind after timeout");
    }

    #[test]
    fn locate_root_rejects_missing_directory() {
        let scratch = TempDir::new().unwrap();
        assert!(matches!(
            locate_root(&scratch.path().join("unzipped"), "repo-main"),
            Err(AppError::EmptyRepo)
        ));
    }
}

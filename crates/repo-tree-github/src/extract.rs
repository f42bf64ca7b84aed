use std::fs::{self, File};
use std::io;
use std::path::Path;

use repo_tree::{ArchiveError, Deadline};

const OWNER_RWX: u32 = 0o700;

/// Counts of what an extraction wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub files: usize,
    pub directories: usize,
    pub bytes: u64,
}

/// Expand the zip archive at `archive_path` into `dest`.
///
/// Every entry must resolve to a path inside `dest`; an absolute name or one
/// that climbs out with `..` fails the whole extraction. Recorded Unix mode
/// bits are applied to files as they are written and to directories once all
/// entries are in place. Directories always keep owner `rwx` so the scratch
/// tree stays removable.
pub fn extract_archive(
    archive_path: &Path,
    dest: &Path,
    deadline: Deadline,
) -> Result<ExtractSummary, ArchiveError> {
    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| ArchiveError::Extraction(format!("failed to open archive: {e}")))?;

    fs::create_dir_all(dest)?;

    let mut summary = ExtractSummary::default();
    let mut dir_modes = Vec::new();

    for index in 0..archive.len() {
        deadline.check()?;

        let mut entry = archive
            .by_index(index)
            .map_err(|e| ArchiveError::Extraction(format!("failed to read entry {index}: {e}")))?;

        let relative = entry
            .enclosed_name()
            .ok_or_else(|| ArchiveError::UnsafePath(entry.name().to_owned()))?;
        let out_path = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            if let Some(mode) = entry.unix_mode() {
                dir_modes.push((out_path, mode));
            }
            summary.directories += 1;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut out = File::create(&out_path)?;
        summary.bytes += io::copy(&mut entry, &mut out).map_err(|e| {
            ArchiveError::Extraction(format!("failed to write {}: {e}", entry.name()))
        })?;

        if let Some(mode) = entry.unix_mode() {
            apply_mode(&out_path, mode)?;
        }
        summary.files += 1;
    }

    // Deepest first, so a parent's mode never blocks reaching its children.
    dir_modes.sort_by_key(|(path, _)| std::cmp::Reverse(path.components().count()));
    for (path, mode) in dir_modes {
        apply_mode(&path, mode | OWNER_RWX)?;
    }

    Ok(summary)
}

#[cfg(unix)]
fn apply_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

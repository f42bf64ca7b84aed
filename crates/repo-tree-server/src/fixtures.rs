use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;

/// Build a .zip in memory. Names ending in `/` become directory entries.
pub fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let with_modes: Vec<(&str, &str, u32)> =
        entries.iter().map(|(name, content)| (*name, *content, 0o755)).collect();
    zip_bytes_with_modes(&with_modes)
}

/// Like [`zip_bytes`], with an explicit Unix mode per entry.
pub fn zip_bytes_with_modes(entries: &[(&str, &str, u32)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));

    for (name, content, mode) in entries {
        let options = SimpleFileOptions::default().unix_permissions(*mode);
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
    }

    writer.finish().unwrap().into_inner()
}

/// `repo-main/README.md` and `repo-main/src/main.go`.
pub fn scenario_zip() -> Vec<u8> {
    zip_bytes(&[
        ("repo-main/", ""),
        ("repo-main/README.md", "# repo"),
        ("repo-main/src/", ""),
        ("repo-main/src/main.go", "package main"),
    ])
}

pub const NOT_FOUND_PAGE: &[u8] = b"<!DOCTYPE html><html><body>Not Found</body></html>";

/// True when nothing is left under `root`.
pub fn is_empty_dir(root: &std::path::Path) -> bool {
    std::fs::read_dir(root).map(|mut e| e.next().is_none()).unwrap_or(false)
}

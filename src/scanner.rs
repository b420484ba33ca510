//! Input discovery: one tier per subdirectory, one task per HTML document

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::pool::Task;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn read_dir_sorted(path: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let entries = fs::read_dir(path).map_err(|source| ScanError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ScanError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        paths.push(entry.path());
    }
    // Sorted visit order keeps tier indices reproducible across runs
    paths.sort();
    Ok(paths)
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html"))
}

/// Scan one level of tier subdirectories under `input_dir` and produce the
/// task list. Tier membership and per-tier totals are fixed here and never
/// recomputed. Files outside a tier directory are skipped.
pub fn scan_tiers(input_dir: &Path) -> Result<Vec<Task>, ScanError> {
    let mut tasks = Vec::new();

    for tier_path in read_dir_sorted(input_dir)? {
        if !tier_path.is_dir() {
            continue;
        }
        let tier = tier_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let documents: Vec<PathBuf> = read_dir_sorted(&tier_path)?
            .into_iter()
            .filter(|path| path.is_file() && is_html(path))
            .collect();

        let tier_total = documents.len();
        debug!(tier = %tier, documents = tier_total, "scanned tier");

        for (i, path) in documents.into_iter().enumerate() {
            tasks.push(Task {
                path,
                tier: tier.clone(),
                tier_index: i + 1,
                tier_total,
            });
        }
    }

    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::write(path, "<html><body>x</body></html>").unwrap();
    }

    #[test]
    fn test_scan_assigns_tier_indices() {
        let dir = tempfile::TempDir::new().unwrap();
        let tier_a = dir.path().join("a");
        let tier_b = dir.path().join("b");
        fs::create_dir(&tier_a).unwrap();
        fs::create_dir(&tier_b).unwrap();
        touch(&tier_a.join("doc_1.html"));
        touch(&tier_a.join("doc_2.html"));
        touch(&tier_b.join("only.html"));

        let tasks = scan_tiers(dir.path()).unwrap();
        assert_eq!(tasks.len(), 3);

        let a_tasks: Vec<&Task> = tasks.iter().filter(|t| t.tier == "a").collect();
        assert_eq!(a_tasks.len(), 2);
        assert_eq!(a_tasks[0].tier_index, 1);
        assert_eq!(a_tasks[1].tier_index, 2);
        assert!(a_tasks.iter().all(|t| t.tier_total == 2));

        let b_task = tasks.iter().find(|t| t.tier == "b").unwrap();
        assert_eq!((b_task.tier_index, b_task.tier_total), (1, 1));
    }

    #[test]
    fn test_scan_skips_non_html_and_top_level_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let tier = dir.path().join("tier1");
        fs::create_dir(&tier).unwrap();
        touch(&tier.join("page.html"));
        fs::write(tier.join("notes.txt"), "skip me").unwrap();
        fs::write(dir.path().join("stray.html"), "skip me too").unwrap();

        let tasks = scan_tiers(dir.path()).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].filename(), "page.html");
    }

    #[test]
    fn test_scan_empty_dataset() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(scan_tiers(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_scan_missing_dir_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(scan_tiers(&missing).is_err());
    }
}

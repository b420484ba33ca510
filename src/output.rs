//! Result aggregation: group outcomes by tier and persist them as JSON

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::pool::TaskOutcome;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Partition outcomes by tier. Membership is deterministic regardless of
/// completion order; within-tier sequence follows encounter order and
/// carries no guarantee.
pub fn group_by_tier(outcomes: Vec<TaskOutcome>) -> BTreeMap<String, Vec<TaskOutcome>> {
    let mut grouped: BTreeMap<String, Vec<TaskOutcome>> = BTreeMap::new();
    for outcome in outcomes {
        grouped
            .entry(outcome.tier().to_string())
            .or_default()
            .push(outcome);
    }
    grouped
}

/// Serialize the grouped outcomes to `path` as pretty JSON, creating parent
/// directories as needed. A failure here is fatal to the run.
pub fn write(grouped: &BTreeMap<String, Vec<TaskOutcome>>, path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| OutputError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let file = File::create(path).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::to_writer_pretty(BufWriter::new(file), grouped)?;
    Ok(())
}

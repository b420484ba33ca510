use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One unit of work: render one document. Immutable once enqueued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub path: PathBuf,
    pub tier: String,
    /// 1-based position within the tier, fixed at scan time
    pub tier_index: usize,
    pub tier_total: usize,
}

impl Task {
    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Terminal result of one task, in the persisted JSON shape.
///
/// The two record shapes are discriminated by presence of `error`, so
/// `Failure` must be tried first during deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskOutcome {
    Failure(FailureRecord),
    Success(SuccessRecord),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessRecord {
    pub filename: String,
    pub tier: String,
    pub tier_index: usize,
    pub tier_total: usize,
    pub text: String,
    pub screenshot: String,
    pub screenshot_failed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureRecord {
    pub filename: String,
    pub tier: String,
    pub tier_index: usize,
    pub tier_total: usize,
    pub error: String,
}

impl TaskOutcome {
    pub fn success(task: &Task, text: String, screenshot: &Path, screenshot_failed: bool) -> Self {
        TaskOutcome::Success(SuccessRecord {
            filename: task.filename(),
            tier: task.tier.clone(),
            tier_index: task.tier_index,
            tier_total: task.tier_total,
            text,
            screenshot: screenshot.display().to_string(),
            screenshot_failed,
        })
    }

    pub fn failure(task: &Task, error: String) -> Self {
        TaskOutcome::Failure(FailureRecord {
            filename: task.filename(),
            tier: task.tier.clone(),
            tier_index: task.tier_index,
            tier_total: task.tier_total,
            error,
        })
    }

    pub fn tier(&self) -> &str {
        match self {
            TaskOutcome::Success(record) => &record.tier,
            TaskOutcome::Failure(record) => &record.tier,
        }
    }

    pub fn filename(&self) -> &str {
        match self {
            TaskOutcome::Success(record) => &record.filename,
            TaskOutcome::Failure(record) => &record.filename,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TaskOutcome::Failure(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task() -> Task {
        Task {
            path: PathBuf::from("dataset/tier1/page_001.html"),
            tier: "tier1".to_string(),
            tier_index: 1,
            tier_total: 3,
        }
    }

    #[test]
    fn test_filename_is_base_name() {
        assert_eq!(sample_task().filename(), "page_001.html");
    }

    #[test]
    fn test_success_serializes_without_error_field() {
        let outcome = TaskOutcome::success(
            &sample_task(),
            "hello".to_string(),
            Path::new("shots/tier1/page_001.html.png"),
            false,
        );

        let value = serde_json::to_value(&outcome).unwrap();
        assert!(value.get("error").is_none());
        assert_eq!(value["filename"], "page_001.html");
        assert_eq!(value["tierIndex"], 1);
        assert_eq!(value["tierTotal"], 3);
        assert_eq!(value["screenshotFailed"], false);
    }

    #[test]
    fn test_failure_round_trips_as_failure() {
        let outcome = TaskOutcome::failure(&sample_task(), "navigation failed: timeout".into());

        let json = serde_json::to_string(&outcome).unwrap();
        let back: TaskOutcome = serde_json::from_str(&json).unwrap();
        assert!(back.is_failure());
        assert_eq!(back, outcome);
    }

    #[test]
    fn test_success_round_trips_as_success() {
        let outcome = TaskOutcome::success(
            &sample_task(),
            "body text".to_string(),
            Path::new("shots/tier1/page_001.html.png"),
            true,
        );

        let json = serde_json::to_string(&outcome).unwrap();
        let back: TaskOutcome = serde_json::from_str(&json).unwrap();
        assert!(!back.is_failure());
        assert_eq!(back, outcome);
    }
}

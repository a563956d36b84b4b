use std::fmt;
use std::path::PathBuf;

use crate::filters::Names;

/// Point of contact listed on a task.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct Poc {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub laboratory: String,
    #[serde(default)]
    pub fullname: String,
}

/// One entry of the task listing, keyed by `"{task name} / {task number}"`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct TaskInfo {
    #[serde(default, rename = "POCS")]
    pub pocs: Vec<Poc>,
    #[serde(rename = "ID")]
    pub id: String,
}

/// Query progress as reported by the server: a number or a percentage string such as `"40%"`.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(untagged)]
pub enum Progress {
    Number(f64),
    Text(String),
}

impl Progress {
    /// Progress as a percentage, when it can be read as one.
    pub fn percent(&self) -> Option<f64> {
        match self {
            Progress::Number(n) => Some(*n),
            Progress::Text(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Progress::Number(n) => write!(f, "{}%", n),
            Progress::Text(s) => f.write_str(s),
        }
    }
}

/// Server-side state of a query. The client only ever observes it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(from = "String")]
pub enum QueryStatus {
    Submitted,
    Queued,
    Running,
    Success,
    Failed,
    FailedNoReadAccess,
    FailedNoDataMatched,
    Cancelled,
    Unknown(String),
}

impl QueryStatus {
    pub fn as_str(&self) -> &str {
        match self {
            QueryStatus::Submitted => "submitted",
            QueryStatus::Queued => "queued",
            QueryStatus::Running => "running",
            QueryStatus::Success => "success",
            QueryStatus::Failed => "failed",
            QueryStatus::FailedNoReadAccess => "failed (no read access to any data included)",
            QueryStatus::FailedNoDataMatched => {
                "failed (no data matched all conditions requested)"
            }
            QueryStatus::Cancelled => "cancelled",
            QueryStatus::Unknown(s) => s,
        }
    }

    /// Whether the query will not change state any more.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QueryStatus::Success
                | QueryStatus::Failed
                | QueryStatus::FailedNoReadAccess
                | QueryStatus::FailedNoDataMatched
                | QueryStatus::Cancelled
        )
    }

    pub fn is_success(&self) -> bool {
        *self == QueryStatus::Success
    }
}

impl From<String> for QueryStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "submitted" => QueryStatus::Submitted,
            "queued" => QueryStatus::Queued,
            "running" => QueryStatus::Running,
            "success" => QueryStatus::Success,
            "failed" => QueryStatus::Failed,
            "failed (no read access to any data included)" => QueryStatus::FailedNoReadAccess,
            "failed (no data matched all conditions requested)" => {
                QueryStatus::FailedNoDataMatched
            }
            "cancelled" => QueryStatus::Cancelled,
            _ => QueryStatus::Unknown(s),
        }
    }
}

impl From<&str> for QueryStatus {
    fn from(s: &str) -> Self {
        QueryStatus::from(s.to_string())
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of [`Client::poll`](crate::Client::poll).
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct QueryInfo {
    pub progress: Progress,
    #[serde(rename = "job_status")]
    pub status: QueryStatus,
}

/// What a query should export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Explicit file paths, as listed by [`Client::files`](crate::Client::files).
    Files(Names),
    /// Every file of one datacollection.
    Datacollection(String),
}

impl Selection {
    pub fn files(files: impl Into<Names>) -> Self {
        Selection::Files(files.into())
    }

    pub fn datacollection(name: impl Into<String>) -> Self {
        Selection::Datacollection(name.into())
    }
}

/// Where [`Client::fetch`](crate::Client::fetch) puts query results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// The server moves the results into the user's JupyterHub home directory.
    UserHome,
    /// The client downloads the results into an existing local directory.
    LocalDir(PathBuf),
}

/// Outcome of a successful save.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct SaveReceipt {
    pub message: String,
    /// The file written, for local saves.
    #[serde(skip)]
    pub path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_strings_round_trip() {
        for s in [
            "submitted",
            "queued",
            "running",
            "success",
            "failed",
            "failed (no read access to any data included)",
            "failed (no data matched all conditions requested)",
            "cancelled",
        ] {
            assert_eq!(QueryStatus::from(s).as_str(), s);
        }
        assert_eq!(
            QueryStatus::from("paused"),
            QueryStatus::Unknown("paused".into())
        );
    }

    #[test]
    fn terminal_states() {
        assert!(QueryStatus::Success.is_terminal());
        assert!(QueryStatus::FailedNoDataMatched.is_terminal());
        assert!(QueryStatus::Cancelled.is_terminal());
        assert!(!QueryStatus::Running.is_terminal());
        assert!(!QueryStatus::Queued.is_terminal());
        assert!(!QueryStatus::Unknown("paused".into()).is_terminal());
    }

    #[test]
    fn progress_number_or_text() {
        let info: QueryInfo =
            serde_json::from_value(json!({"progress": 100, "job_status": "success"})).unwrap();
        assert_eq!(info.progress, Progress::Number(100.0));
        assert_eq!(info.status, QueryStatus::Success);

        let info: QueryInfo =
            serde_json::from_value(json!({"progress": "40%", "job_status": "running"})).unwrap();
        assert_eq!(info.progress, Progress::Text("40%".into()));
        assert_eq!(info.progress.percent(), Some(40.0));
        assert_eq!(info.progress.to_string(), "40%");
    }

    #[test]
    fn task_info_shape() {
        let task: TaskInfo = serde_json::from_value(json!({
            "POCS": [{"username": "admin", "laboratory": "LBNL", "fullname": " "}],
            "ID": "5d9e26ada81660b57e387f49"
        }))
        .unwrap();
        assert_eq!(task.id, "5d9e26ada81660b57e387f49");
        assert_eq!(task.pocs[0].laboratory, "LBNL");
    }
}

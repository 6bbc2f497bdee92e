use std::fmt;

use serde::{Deserialize, Serialize};

/// A single execution of a CI pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Build {
    /// Pipeline slug the build belongs to
    pub pipeline: String,
    /// Build number, incrementing per pipeline
    pub number: u64,
    /// Command jobs of this build, in API order
    pub jobs: Vec<Job>,
}

/// One unit of work within a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub name: String,
    pub state: JobState,
}

impl Job {
    pub fn new(name: impl Into<String>, state: impl Into<JobState>) -> Self {
        Self {
            name: name.into(),
            state: state.into(),
        }
    }
}

/// State of a job as reported by the CI backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobState {
    Pending,
    Scheduled,
    Running,
    Passed,
    Failed,
    Canceled,
    Skipped,
    Other(String),
}

impl JobState {
    /// The pass/fail verdict of a job, if it reached a definitive terminal state.
    pub fn verdict(&self) -> Option<Verdict> {
        match self {
            Self::Passed => Some(Verdict::Passed),
            Self::Failed => Some(Verdict::Failed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Scheduled => "scheduled",
            Self::Running => "running",
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Skipped => "skipped",
            Self::Other(state) => state,
        }
    }
}

impl From<&str> for JobState {
    fn from(value: &str) -> Self {
        match value {
            "pending" => Self::Pending,
            "scheduled" => Self::Scheduled,
            "running" => Self::Running,
            "passed" => Self::Passed,
            "failed" => Self::Failed,
            "canceled" => Self::Canceled,
            "skipped" => Self::Skipped,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for JobState {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<JobState> for String {
    fn from(value: JobState) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Merged outcome of the jobs of one platform within a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Passed,
    Failed,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_passed_and_failed_have_verdicts() {
        assert_eq!(JobState::Passed.verdict(), Some(Verdict::Passed));
        assert_eq!(JobState::Failed.verdict(), Some(Verdict::Failed));

        for state in ["pending", "scheduled", "running", "canceled", "skipped", "broken"] {
            assert_eq!(JobState::from(state).verdict(), None, "state {state}");
        }
    }

    #[test]
    fn test_unknown_state_is_preserved() {
        let state = JobState::from("timed_out");
        assert_eq!(state, JobState::Other("timed_out".to_string()));
        assert_eq!(state.to_string(), "timed_out");
    }

    #[test]
    fn test_job_state_deserializes_from_api_string() {
        let state: JobState = serde_json::from_str(r#""running""#).unwrap();
        assert_eq!(state, JobState::Running);
    }
}

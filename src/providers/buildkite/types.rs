use serde::Deserialize;

use crate::providers::{Build, Job, JobState};

/// A build as returned by the Buildkite REST API.
///
/// Only the fields the collectors read are deserialized.
#[derive(Debug, Deserialize)]
pub struct BuildkiteBuild {
    pub number: u64,
    #[serde(default)]
    pub jobs: Vec<BuildkiteJob>,
}

/// An entry of a Buildkite build's `jobs` array.
///
/// Besides command jobs (`script`) and trigger jobs (`trigger`) the array holds
/// wait steps and block steps, which are gates rather than work: waiters have no
/// state and block steps only report `blocked`/`unblocked`.
#[derive(Debug, Deserialize)]
pub struct BuildkiteJob {
    #[serde(rename = "type")]
    pub kind: String,
    /// Step label; may be missing for unlabeled command steps
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

impl BuildkiteJob {
    fn is_gate(&self) -> bool {
        matches!(self.kind.as_str(), "waiter" | "manual" | "block")
    }
}

impl BuildkiteBuild {
    /// Converts the API build into a domain build, dropping wait and block steps.
    pub fn into_build(self, pipeline: &str) -> Build {
        let jobs = self
            .jobs
            .into_iter()
            .filter(|job| !job.is_gate())
            .map(|job| {
                let state = job
                    .state
                    .map_or_else(|| JobState::Other(String::new()), JobState::from);
                Job::new(job.name.unwrap_or_default(), state)
            })
            .collect();

        Build {
            pipeline: pipeline.to_string(),
            number: self.number,
            jobs,
        }
    }
}

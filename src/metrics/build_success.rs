use std::collections::HashMap;
use std::fmt;

use log::{debug, info, warn};

use crate::dataset::{Column, DataSet, SqlType, Value};
use crate::error::{MetricsError, Result};
use crate::providers::{Build, BuildSource, Verdict};

use super::{column_names, Collector};

/// Platform a CI job runs on, derived from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Linux,
    Macos,
    Windows,
    Rbe,
}

impl Platform {
    /// Platforms in output column order.
    pub const ALL: [Platform; 4] = [Self::Linux, Self::Macos, Self::Windows, Self::Rbe];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Macos => "macos",
            Self::Windows => "windows",
            Self::Rbe => "rbe",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job name markers, checked in order; the first match wins.
const PLATFORM_MARKERS: [(&str, Platform); 4] = [
    ("ubuntu", Platform::Linux),
    ("windows", Platform::Windows),
    ("darwin", Platform::Macos),
    ("gcloud", Platform::Rbe),
];

// CREATE TABLE build_success (pipeline VARCHAR(255), build INT, linux VARCHAR(255), macos VARCHAR(255), windows VARCHAR(255), rbe VARCHAR(255), PRIMARY KEY(pipeline, build));
const BUILD_SUCCESS_COLUMNS: [Column; 6] = [
    Column::key("pipeline", SqlType::Varchar(255)),
    Column::key("build", SqlType::Int),
    Column::value("linux", SqlType::Varchar(255)),
    Column::value("macos", SqlType::Varchar(255)),
    Column::value("windows", SqlType::Varchar(255)),
    Column::value("rbe", SqlType::Varchar(255)),
];

/// Returns the platform a job runs on, or `None` if its name carries no marker.
pub fn classify_platform(job_name: &str) -> Option<Platform> {
    PLATFORM_MARKERS
        .iter()
        .find(|(marker, _)| job_name.contains(marker))
        .map(|&(_, platform)| platform)
}

/// Folds a job verdict into the current verdict of its platform.
///
/// A single failure taints the platform for the rest of the build.
pub fn merge_verdict(existing: Option<Verdict>, new: Verdict) -> Verdict {
    match existing {
        None => new,
        Some(Verdict::Failed) => Verdict::Failed,
        Some(Verdict::Passed) => new,
    }
}

fn merge_state(states: &mut HashMap<Platform, Verdict>, platform: Platform, new: Verdict) {
    let merged = merge_verdict(states.get(&platform).copied(), new);
    states.insert(platform, merged);
}

/// Per-platform verdicts of a build, or `None` if any job has not finished.
fn platform_verdicts(build: &Build) -> Option<HashMap<Platform, Verdict>> {
    let mut states = HashMap::new();

    for job in &build.jobs {
        let verdict = job.state.verdict()?;
        if let Some(platform) = classify_platform(&job.name) {
            merge_state(&mut states, platform, verdict);
        }
    }

    Some(states)
}

/// Pass/fail outcome per platform for the most recent builds of a set of pipelines.
///
/// Emits one row per finished build; builds with any job that is not yet
/// passed or failed are left out entirely.
pub struct BuildSuccess<C> {
    client: C,
    pipelines: Vec<String>,
    builds: usize,
}

impl<C> BuildSuccess<C> {
    /// Name of the reporting table.
    pub const NAME: &'static str = "build_success";

    /// Declared output schema.
    pub const COLUMNS: &'static [Column] = &BUILD_SUCCESS_COLUMNS;
}

impl<C: BuildSource> BuildSuccess<C> {
    /// Creates the collector.
    ///
    /// # Arguments
    ///
    /// * `client` - CI backend to fetch builds from
    /// * `builds` - Number of most recent builds to inspect per pipeline
    /// * `pipelines` - Pipelines to inspect, processed in this order
    pub fn new(client: C, builds: usize, pipelines: Vec<String>) -> Self {
        Self {
            client,
            pipelines,
            builds,
        }
    }

    fn build_row(
        pipeline: &str,
        build: &Build,
        states: &HashMap<Platform, Verdict>,
    ) -> Vec<Value> {
        let mut row = vec![Value::from(pipeline), Value::from(build.number)];
        row.extend(
            Platform::ALL
                .iter()
                .map(|platform| Value::from(states.get(platform).map(|v| v.as_str()))),
        );
        row
    }
}

impl<C: BuildSource> Collector for BuildSuccess<C> {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn columns(&self) -> &[Column] {
        Self::COLUMNS
    }

    async fn collect(&self) -> Result<DataSet> {
        let mut result = DataSet::new(column_names(Self::COLUMNS));
        self.collect_into(&mut result).await?;
        Ok(result)
    }
}

impl<C: BuildSource> BuildSuccess<C> {
    async fn collect_into(&self, result: &mut DataSet) -> Result<()> {
        for pipeline in &self.pipelines {
            let builds = self
                .client
                .most_recent_builds(pipeline, self.builds)
                .await
                .map_err(|e| MetricsError::Collection {
                    pipeline: pipeline.clone(),
                    source: Box::new(e),
                })?;

            let rows_before = result.len();

            for build in &builds {
                let Some(states) = platform_verdicts(build) else {
                    debug!(
                        "Skipping build {} of pipeline {}: not all jobs finished",
                        build.number, build.pipeline
                    );
                    continue;
                };

                result
                    .add_row(Self::build_row(pipeline, build, &states))
                    .map_err(|e| MetricsError::RowRejected {
                        build: build.number,
                        source: Box::new(e),
                    })?;
            }

            let emitted = result.len() - rows_before;
            if emitted == 0 {
                warn!("No finished builds found for pipeline: {pipeline}");
            } else {
                info!("Collected {emitted} builds for pipeline {pipeline}");
            }
        }

        Ok(())
    }
}

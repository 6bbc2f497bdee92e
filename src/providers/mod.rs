pub mod buildkite;
mod types;

pub use types::{Build, Job, JobState, Verdict};

use crate::error::Result;

/// Source of recent CI builds for a pipeline.
///
/// Implemented by the HTTP clients of the supported CI backends; collectors
/// depend on this trait rather than on a concrete client.
#[allow(async_fn_in_trait)]
pub trait BuildSource {
    /// Returns up to `count` of the most recent builds of `pipeline`,
    /// most recent first.
    async fn most_recent_builds(&self, pipeline: &str, count: usize) -> Result<Vec<Build>>;
}

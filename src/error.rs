use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("API request failed ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Cannot collect build success statistics for pipeline {pipeline}: {source}")]
    Collection {
        pipeline: String,
        #[source]
        source: Box<MetricsError>,
    },

    #[error("Failed to add result for build {build}: {source}")]
    RowRejected {
        build: u64,
        #[source]
        source: Box<MetricsError>,
    },

    #[error("Row has {actual} values, but the dataset declares {expected} columns")]
    RowLength { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, MetricsError>;

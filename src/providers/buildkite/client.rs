use std::time::Duration;

use log::{debug, info};
use reqwest::Client;
use url::Url;

use crate::auth::Token;
use crate::error::{MetricsError, Result};
use crate::providers::{Build, BuildSource};

use super::types::BuildkiteBuild;

/// Largest page size the Buildkite REST API accepts.
const MAX_PAGE_SIZE: usize = 100;

/// Buildkite REST API client for fetching builds of an organization's pipelines.
pub struct BuildkiteClient {
    client: Client,
    api_url: Url,
    organization: String,
    token: Option<Token>,
}

impl BuildkiteClient {
    /// Creates a new Buildkite API client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Buildkite API base URL (e.g., <https://api.buildkite.com>)
    /// * `organization` - Organization slug owning the pipelines
    /// * `token` - Optional API access token
    /// * `timeout` - Timeout applied to every request
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the base URL is invalid.
    pub fn new(
        base_url: &str,
        organization: String,
        token: Option<Token>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("ci-metrics/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| MetricsError::Config(format!("Failed to create HTTP client: {e}")))?;

        let api_url = Url::parse(base_url)
            .map_err(|e| MetricsError::Config(format!("Invalid base URL: {e}")))?;

        if api_url.cannot_be_a_base() {
            return Err(MetricsError::Config(format!(
                "Invalid base URL: {base_url}"
            )));
        }

        Ok(Self {
            client,
            api_url,
            organization,
            token,
        })
    }

    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.token {
            request.bearer_auth(token.as_str())
        } else {
            request
        }
    }

    /// Construct the builds URL of a pipeline for one page of results
    fn builds_url(&self, pipeline: &str, per_page: usize, page: usize) -> Url {
        let mut url = self.api_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "v2",
                "organizations",
                self.organization.as_str(),
                "pipelines",
                pipeline,
                "builds",
            ]);
        }
        url.query_pairs_mut()
            .append_pair("per_page", &per_page.to_string())
            .append_pair("page", &page.to_string());
        url
    }

    async fn fetch_page(
        &self,
        pipeline: &str,
        per_page: usize,
        page: usize,
    ) -> Result<Vec<BuildkiteBuild>> {
        let url = self.builds_url(pipeline, per_page, page);
        debug!("Fetching builds page {page} of pipeline {pipeline}");

        let response = self.auth_request(self.client.get(url)).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(MetricsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

impl BuildSource for BuildkiteClient {
    async fn most_recent_builds(&self, pipeline: &str, count: usize) -> Result<Vec<Build>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        info!("Fetching up to {count} builds of pipeline {pipeline}...");

        let per_page = MAX_PAGE_SIZE.min(count);
        let mut builds = Vec::new();
        let mut page = 1;

        loop {
            let fetched = self.fetch_page(pipeline, per_page, page).await?;
            let fetched_len = fetched.len();

            builds.extend(fetched.into_iter().map(|b| b.into_build(pipeline)));

            if fetched_len < per_page || builds.len() >= count {
                break;
            }

            page += 1;
        }

        builds.truncate(count);

        info!("Fetched {} builds of pipeline {pipeline}", builds.len());

        Ok(builds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Value;
    use crate::metrics::{BuildSuccess, Collector};
    use crate::providers::{Job, JobState};
    use mockito::Matcher;

    fn client(server: &mockito::Server, token: Option<Token>) -> BuildkiteClient {
        BuildkiteClient::new(
            &server.url(),
            "bazel".to_string(),
            token,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn builds_json(numbers: std::ops::RangeInclusive<u64>) -> String {
        let builds: Vec<_> = numbers
            .rev()
            .map(|n| {
                serde_json::json!({
                    "number": n,
                    "jobs": [{"type": "script", "name": "ubuntu", "state": "passed"}]
                })
            })
            .collect();
        serde_json::Value::Array(builds).to_string()
    }

    #[test]
    fn test_new_rejects_invalid_base_url() {
        let result = BuildkiteClient::new(
            "not a url",
            "bazel".to_string(),
            None,
            Duration::from_secs(5),
        );

        assert!(matches!(result, Err(MetricsError::Config(_))));
    }

    #[test]
    fn test_builds_url_encodes_segments() {
        let client = BuildkiteClient::new(
            "https://api.buildkite.com",
            "my org".to_string(),
            None,
            Duration::from_secs(5),
        )
        .unwrap();

        let url = client.builds_url("bazel-bazel", 10, 2);
        assert_eq!(
            url.as_str(),
            "https://api.buildkite.com/v2/organizations/my%20org/pipelines/bazel-bazel/builds?per_page=10&page=2"
        );
    }

    #[tokio::test]
    async fn test_most_recent_builds_sends_token_and_converts_jobs() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v2/organizations/bazel/pipelines/p1/builds")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("per_page".into(), "2".into()),
                Matcher::UrlEncoded("page".into(), "1".into()),
            ]))
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_body(
                r#"[
                    {"number": 11, "jobs": [
                        {"type": "script", "name": "darwin-test", "state": "running"}
                    ]},
                    {"number": 10, "jobs": [
                        {"type": "script", "name": "ubuntu-build", "state": "passed"},
                        {"type": "waiter"},
                        {"type": "script", "name": "windows-build", "state": "failed"}
                    ]}
                ]"#,
            )
            .create_async()
            .await;

        let client = client(&server, Some(Token::from("secret")));
        let builds = client.most_recent_builds("p1", 2).await.unwrap();

        mock.assert_async().await;
        assert_eq!(builds.len(), 2);
        assert_eq!(builds[0].number, 11);
        assert_eq!(builds[0].pipeline, "p1");
        assert_eq!(builds[0].jobs, vec![Job::new("darwin-test", JobState::Running)]);
        assert_eq!(
            builds[1].jobs,
            vec![
                Job::new("ubuntu-build", JobState::Passed),
                Job::new("windows-build", JobState::Failed),
            ]
        );
    }

    #[tokio::test]
    async fn test_running_trigger_job_keeps_build_out_of_results() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/organizations/bazel/pipelines/p/builds")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"[
                    {"number": 7, "jobs": [
                        {"type": "script", "name": "ubuntu-build", "state": "passed"},
                        {"type": "trigger", "name": "deploy downstream", "state": "running"}
                    ]},
                    {"number": 6, "jobs": [
                        {"type": "script", "name": "ubuntu-build", "state": "passed"},
                        {"type": "manual", "state": "unblocked"},
                        {"type": "trigger", "name": "deploy downstream", "state": "passed"}
                    ]}
                ]"#,
            )
            .create_async()
            .await;

        let collector = BuildSuccess::new(client(&server, None), 2, vec!["p".to_string()]);
        let data = collector.collect().await.unwrap();

        assert_eq!(data.len(), 1);
        assert_eq!(data.rows()[0][1], Value::Number(6));
        assert_eq!(data.rows()[0][2], Value::Text("passed".to_string()));
    }

    #[tokio::test]
    async fn test_most_recent_builds_paginates_and_truncates() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/v2/organizations/bazel/pipelines/p1/builds")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("per_page".into(), "100".into()),
                Matcher::UrlEncoded("page".into(), "1".into()),
            ]))
            .with_status(200)
            .with_body(builds_json(101..=200))
            .create_async()
            .await;
        let second = server
            .mock("GET", "/v2/organizations/bazel/pipelines/p1/builds")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("per_page".into(), "100".into()),
                Matcher::UrlEncoded("page".into(), "2".into()),
            ]))
            .with_status(200)
            .with_body(builds_json(1..=100))
            .create_async()
            .await;

        let builds = client(&server, None)
            .most_recent_builds("p1", 150)
            .await
            .unwrap();

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(builds.len(), 150);
        assert_eq!(builds[0].number, 200);
        assert_eq!(builds[149].number, 51);
    }

    #[tokio::test]
    async fn test_most_recent_builds_stops_on_short_page() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v2/organizations/bazel/pipelines/p1/builds")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(builds_json(1..=3))
            .expect(1)
            .create_async()
            .await;

        let builds = client(&server, None)
            .most_recent_builds("p1", 10)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(builds.len(), 3);
    }

    #[tokio::test]
    async fn test_most_recent_builds_reports_api_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/organizations/bazel/pipelines/p2/builds")
            .match_query(Matcher::Any)
            .with_status(429)
            .with_body("rate limited")
            .create_async()
            .await;

        let err = client(&server, None)
            .most_recent_builds("p2", 5)
            .await
            .unwrap_err();

        match err {
            MetricsError::Api { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "rate limited");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_most_recent_builds_with_zero_count_skips_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let builds = client(&server, None)
            .most_recent_builds("p1", 0)
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(builds.is_empty());
    }
}

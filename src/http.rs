// Blocking HTTP plumbing shared by the YouTube and Ollama clients

use std::time::Duration;

use anyhow::Context;

use crate::{Result, ScraperError};

/// Agent that reports non-2xx statuses as responses so error bodies can be read
pub(crate) fn build_agent(timeout: Option<Duration>) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(timeout)
        .http_status_as_error(false)
        .build()
        .into()
}

pub(crate) struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    #[inline]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub(crate) fn read_response(
    response: std::result::Result<ureq::http::Response<ureq::Body>, ureq::Error>,
    endpoint: &str,
) -> anyhow::Result<RawResponse> {
    let mut response = response.with_context(|| format!("Request to {} failed", endpoint))?;
    let status = response.status().as_u16();
    let body = response
        .body_mut()
        .read_to_string()
        .with_context(|| format!("Failed to read {} response body", endpoint))?;
    Ok(RawResponse { status, body })
}

/// Run a blocking client call on tokio's blocking pool, converting failures to upstream errors
pub(crate) async fn run_blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(result) => result.map_err(|e| ScraperError::upstream(&e)),
        Err(join_error) => Err(ScraperError::Upstream(format!(
            "Blocking task failed: {}",
            join_error
        ))),
    }
}

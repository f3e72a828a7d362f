//! Climate Data Store (CDS) API client.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::config::CdsConfig;

use super::{CdsCredentials, RetrievalError, RetrievalRequest, RetrievedFile, Retriever};

/// State of a CDS task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TaskState {
    Queued,
    Running,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct TaskReply {
    state: TaskState,
    #[serde(default)]
    request_id: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    error: Option<ReplyError>,
}

#[derive(Debug, Default, Deserialize)]
struct ReplyError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

impl ReplyError {
    fn describe(&self) -> String {
        match (&self.message, &self.reason) {
            (Some(message), Some(reason)) => format!("{}: {}", message, reason),
            (Some(message), None) => message.clone(),
            (None, Some(reason)) => reason.clone(),
            (None, None) => "no details given".to_string(),
        }
    }
}

/// Client for the CDS task API.
///
/// A retrieval is submitted to `/resources/{dataset}`, polled at
/// `/tasks/{id}` until it completes, then the result is streamed to disk and
/// the remote task deleted.
pub struct CdsClient {
    client: Client,
    credentials: CdsCredentials,
    poll_interval: Duration,
    request_timeout: Duration,
}

impl CdsClient {
    /// Create a new CDS client.
    pub fn new(credentials: CdsCredentials, config: &CdsConfig) -> Result<Self, RetrievalError> {
        let request_timeout = Duration::from_secs(config.timeout_secs);
        // No overall timeout on the client: result downloads can be large.
        let client = Client::builder()
            .connect_timeout(request_timeout)
            .user_agent(concat!("era5-download/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RetrievalError::api(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            credentials,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            request_timeout,
        })
    }

    /// Overrides the delay between status polls.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn base_url(&self) -> &str {
        self.credentials.url()
    }

    fn resource_url(&self, dataset: &str) -> String {
        format!(
            "{}/resources/{}",
            self.base_url(),
            urlencoding::encode(dataset)
        )
    }

    fn task_url(&self, request_id: &str) -> String {
        format!(
            "{}/tasks/{}",
            self.base_url(),
            urlencoding::encode(request_id)
        )
    }

    /// Result locations are usually absolute; relative ones hang off the API root.
    fn resolve_location(&self, location: &str) -> String {
        if location.starts_with("http://") || location.starts_with("https://") {
            location.to_string()
        } else {
            format!(
                "{}/{}",
                self.base_url(),
                location.trim_start_matches('/')
            )
        }
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .basic_auth(self.credentials.uid(), Some(self.credentials.api_key()))
            .timeout(self.request_timeout)
    }

    async fn submit(&self, request: &RetrievalRequest) -> Result<TaskReply, RetrievalError> {
        let url = self.resource_url(&request.dataset);
        debug!(dataset = %request.dataset, date = %request.date, "Submitting CDS request");

        let response = self
            .authed(self.client.post(&url).json(request))
            .send()
            .await
            .map_err(transport_error)?;

        parse_reply(response).await
    }

    async fn poll(&self, request_id: &str) -> Result<TaskReply, RetrievalError> {
        let response = self
            .authed(self.client.get(self.task_url(request_id)))
            .send()
            .await
            .map_err(transport_error)?;

        parse_reply(response).await
    }

    async fn wait_for_completion(&self, mut reply: TaskReply) -> Result<TaskReply, RetrievalError> {
        let mut last_state = reply.state;
        loop {
            match reply.state {
                TaskState::Completed => return Ok(reply),
                TaskState::Failed => {
                    let error = reply.error.unwrap_or_default();
                    return Err(RetrievalError::Rejected(error.describe()));
                }
                TaskState::Queued | TaskState::Running => {}
                TaskState::Unknown => {
                    return Err(RetrievalError::api("unknown task state in CDS reply"));
                }
            }

            let request_id = reply
                .request_id
                .clone()
                .ok_or_else(|| RetrievalError::api("CDS reply is missing request_id"))?;

            tokio::time::sleep(self.poll_interval).await;
            reply = self.poll(&request_id).await?;
            if reply.request_id.is_none() {
                reply.request_id = Some(request_id);
            }

            if reply.state != last_state {
                debug!(state = ?reply.state, "CDS request state changed");
                last_state = reply.state;
            }
        }
    }

    async fn download(&self, location: &str, target: &Path) -> Result<u64, RetrievalError> {
        let url = self.resolve_location(location);
        debug!(url = %url, target = %target.display(), "Downloading CDS result");

        let response = self.client.get(&url).send().await.map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let result = write_body(response, target).await;
        if result.is_err() {
            // Never leave a truncated file at the output path.
            if let Err(e) = tokio::fs::remove_file(target).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(target = %target.display(), "Failed to remove partial download: {}", e);
                }
            }
        }
        result
    }

    /// Frees the result on the server. Failures only warrant a warning.
    async fn delete_task(&self, request_id: &str) {
        let result = self
            .authed(self.client.delete(self.task_url(request_id)))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => warn!(
                request_id,
                "Failed to delete CDS task: HTTP {}",
                response.status()
            ),
            Err(e) => warn!(request_id, "Failed to delete CDS task: {}", e),
        }
    }
}

#[async_trait]
impl Retriever for CdsClient {
    fn name(&self) -> &str {
        "cds"
    }

    async fn retrieve(
        &self,
        request: &RetrievalRequest,
        target: &Path,
    ) -> Result<RetrievedFile, RetrievalError> {
        let reply = self.submit(request).await?;
        let reply = self.wait_for_completion(reply).await?;

        let location = reply
            .location
            .as_deref()
            .ok_or_else(|| RetrievalError::api("completed CDS reply has no location"))?;
        let size_bytes = self.download(location, target).await?;

        if let Some(request_id) = reply.request_id.as_deref() {
            self.delete_task(request_id).await;
        }

        Ok(RetrievedFile {
            path: target.to_path_buf(),
            size_bytes,
        })
    }
}

async fn write_body(response: Response, target: &Path) -> Result<u64, RetrievalError> {
    let mut file = tokio::fs::File::create(target).await?;
    let mut written = 0u64;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(transport_error)?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    Ok(written)
}

async fn parse_reply(response: Response) -> Result<TaskReply, RetrievalError> {
    let status = response.status();
    let body = response.text().await.map_err(transport_error)?;

    if !status.is_success() {
        return Err(status_error(status, &body));
    }

    serde_json::from_str(&body)
        .map_err(|e| RetrievalError::api(format!("Failed to parse CDS reply: {}", e)))
}

fn transport_error(e: reqwest::Error) -> RetrievalError {
    if e.is_timeout() {
        RetrievalError::Timeout
    } else if e.is_connect() {
        RetrievalError::ConnectionFailed(e.to_string())
    } else {
        RetrievalError::Api {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

/// Maps a non-success HTTP response to an error.
fn status_error(status: StatusCode, body: &str) -> RetrievalError {
    // CDS error bodies are JSON objects with message/reason fields.
    let detail = serde_json::from_str::<ReplyError>(body)
        .ok()
        .filter(|e| e.message.is_some() || e.reason.is_some())
        .map(|e| e.describe())
        .unwrap_or_else(|| body.chars().take(200).collect());

    let message = format!("HTTP {}: {}", status, detail);
    match status.as_u16() {
        401 | 403 => RetrievalError::Authentication(message),
        400 | 404 | 422 => RetrievalError::InvalidRequest(message),
        429 => RetrievalError::RateLimited(message),
        code => RetrievalError::Api {
            status: Some(code),
            message,
        },
    }
}

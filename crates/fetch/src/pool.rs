use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use exponential_backoff::Backoff;
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{FetchConfig, FetchError, FetchEvent, FetchRequest};

/// What a run of the pool produced. Per-request failures are collected
/// here rather than failing the run; the caller decides what a failure
/// means for its phase.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Paths downloaded by this run.
    pub completed: Vec<PathBuf>,
    /// Paths skipped because the destination was already complete.
    pub skipped: Vec<PathBuf>,
    /// Downloads kept despite a content type outside the request class's
    /// allow list; decode failures will quarantine them later.
    pub suspect: Vec<PathBuf>,
    pub failed: Vec<(Url, FetchError)>,
}

pub struct FetchPool {
    client: reqwest::Client,
    config: FetchConfig,
}

enum Fetched {
    Downloaded { dest: PathBuf, suspect: bool },
    Skipped(PathBuf),
}

impl FetchPool {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client, config })
    }

    /// Runs all requests to completion with bounded concurrency and fair
    /// scheduling across hosts. Completion order is unspecified. On
    /// cancellation, in-flight downloads finish to their safe boundary
    /// (a complete file or none) and queued requests fail `Canceled`.
    #[tracing::instrument(level = "debug", skip_all, fields(requests = requests.len()))]
    pub async fn fetch_all(
        &self,
        requests: Vec<FetchRequest>,
        events: Option<UnboundedSender<FetchEvent>>,
        cancel: &CancellationToken,
    ) -> FetchOutcome {
        let mut hosts: HashMap<String, Arc<Semaphore>> = HashMap::new();
        for request in &requests {
            hosts
                .entry(host_of(&request.url))
                .or_insert_with(|| Arc::new(Semaphore::new(self.config.per_host)));
        }

        let results = futures::stream::iter(requests.into_iter().map(|request| {
            let semaphore = hosts.get(&host_of(&request.url)).cloned();
            let events = events.clone();
            let cancel = cancel.clone();
            async move {
                let _permit = match semaphore {
                    Some(s) => s.acquire_owned().await.ok(),
                    None => None,
                };
                let result = self.fetch_one(&request, events.as_ref(), &cancel).await;
                (request, result)
            }
        }))
        .buffer_unordered(self.config.max_in_flight)
        .collect::<Vec<_>>()
        .await;

        let mut outcome = FetchOutcome::default();
        for (request, result) in results {
            match result {
                Ok(Fetched::Downloaded { dest, suspect }) => {
                    if suspect {
                        outcome.suspect.push(dest.clone());
                    }
                    outcome.completed.push(dest);
                }
                Ok(Fetched::Skipped(dest)) => outcome.skipped.push(dest),
                Err(error) => {
                    tracing::warn!(url = %request.url, %error, "download failed");
                    send(events.as_ref(), FetchEvent::Failed {
                        url: request.url.clone(),
                        error: error.to_string(),
                    });
                    outcome.failed.push((request.url, error));
                }
            }
        }
        outcome
    }

    /// One-shot GET with the pool's retry policy, for small JSON endpoints
    /// that are consumed in memory.
    pub async fn fetch_bytes(
        &self,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<bytes::Bytes, FetchError> {
        self.with_retry(url, cancel, || async {
            let response = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(|source| FetchError::Transport { url: url.clone(), source })?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status { url: url.clone(), status });
            }
            response
                .bytes()
                .await
                .map_err(|source| FetchError::Transport { url: url.clone(), source })
        })
        .await
    }

    async fn fetch_one(
        &self,
        request: &FetchRequest,
        events: Option<&UnboundedSender<FetchEvent>>,
        cancel: &CancellationToken,
    ) -> Result<Fetched, FetchError> {
        // Resume: a destination of the expected size is already done. With
        // no expected size, any existing file counts; gap detection is the
        // caller's job (`list_missing_pages`).
        if let Ok(meta) = tokio::fs::metadata(&request.dest).await {
            if meta.is_file() && request.expected_len.map_or(true, |n| n == meta.len()) {
                tracing::debug!(dest = %request.dest.display(), "destination complete, skipping");
                return Ok(Fetched::Skipped(request.dest.clone()));
            }
        }

        send(events, FetchEvent::Started { url: request.url.clone() });
        let result = self
            .with_retry(&request.url, cancel, || self.attempt(request, events))
            .await;
        if let Ok(Fetched::Downloaded { dest, .. }) = &result {
            send(events, FetchEvent::Completed { url: request.url.clone(), dest: dest.clone() });
        }
        result
    }

    /// Retries transient failures with jittered exponential backoff, up to
    /// the configured attempt count. Cancellation interrupts the backoff
    /// sleep, never an in-flight attempt.
    async fn with_retry<T, F, Fut>(
        &self,
        url: &Url,
        cancel: &CancellationToken,
        mut attempt: F,
    ) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let backoff = Backoff::new(
            self.config.attempts,
            self.config.backoff_min,
            Some(self.config.backoff_max),
        );
        let mut failures = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(FetchError::Canceled);
            }
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_transient() => {
                    failures += 1;
                    match backoff.next(failures) {
                        Some(delay) => {
                            tracing::debug!(%url, %error, ?delay, failures, "transient failure, backing off");
                            tokio::select! {
                                _ = tokio::time::sleep(delay) => {}
                                _ = cancel.cancelled() => return Err(FetchError::Canceled),
                            }
                        }
                        None => return Err(error),
                    }
                }
                Err(error) => return Err(error),
            }
        }
    }

    /// A single download attempt: stream the response into a temp sibling
    /// and rename it over the destination. Any failure removes the temp
    /// file, so a partial download never becomes visible.
    async fn attempt(
        &self,
        request: &FetchRequest,
        events: Option<&UnboundedSender<FetchEvent>>,
    ) -> Result<Fetched, FetchError> {
        let response = self
            .client
            .get(request.url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Transport { url: request.url.clone(), source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url: request.url.clone(), status });
        }

        let mut suspect = false;
        if let Some(content_type) = response.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
        {
            if !request.class.allows(content_type) {
                tracing::warn!(
                    url = %request.url,
                    content_type,
                    "content type outside the allow list; retaining as suspect"
                );
                suspect = true;
            }
        }

        let parent = request.dest.parent().unwrap_or_else(|| std::path::Path::new("."));
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| io_error(parent, source))?;
        let file_name = request
            .dest
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "download".to_string());
        let part = parent.join(format!(".{file_name}.part"));

        let mut file = tokio::fs::File::create(&part)
            .await
            .map_err(|source| io_error(&part, source))?;

        let mut response = response;
        let mut received = 0u64;
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    if let Err(source) = file.write_all(&chunk).await {
                        drop(file);
                        let _ = tokio::fs::remove_file(&part).await;
                        return Err(io_error(&part, source));
                    }
                    received += chunk.len() as u64;
                    send(events, FetchEvent::Progress {
                        url: request.url.clone(),
                        bytes: received,
                    });
                }
                Ok(None) => break,
                Err(source) => {
                    drop(file);
                    let _ = tokio::fs::remove_file(&part).await;
                    return Err(FetchError::Transport { url: request.url.clone(), source });
                }
            }
        }

        file.flush().await.map_err(|source| io_error(&part, source))?;
        drop(file);
        tokio::fs::rename(&part, &request.dest)
            .await
            .map_err(|source| io_error(&part, source))?;

        tracing::debug!(url = %request.url, dest = %request.dest.display(), received, "downloaded");
        Ok(Fetched::Downloaded { dest: request.dest.clone(), suspect })
    }
}

fn host_of(url: &Url) -> String {
    url.host_str().unwrap_or("").to_string()
}

fn io_error(path: &std::path::Path, source: std::io::Error) -> FetchError {
    FetchError::Io { path: path.display().to_string(), source }
}

fn send(events: Option<&UnboundedSender<FetchEvent>>, event: FetchEvent) {
    if let Some(sender) = events {
        let _ = sender.send(event);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::RequestClass;

    #[tokio::test]
    async fn existing_files_of_the_expected_size_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("page_000.json");
        std::fs::write(&dest, b"{\"ok\":true}").unwrap();

        let pool = FetchPool::new(FetchConfig::default()).unwrap();
        let request = FetchRequest {
            // Unroutable host: the request must never reach the network.
            url: "http://192.0.2.1/page".parse().unwrap(),
            dest: dest.clone(),
            expected_len: Some(11),
            class: RequestClass::Json,
        };
        let outcome = pool
            .fetch_all(vec![request], None, &CancellationToken::new())
            .await;
        assert_eq!(vec![dest], outcome.skipped);
        assert!(outcome.failed.is_empty());
    }

    #[tokio::test]
    async fn cancellation_fails_queued_requests_without_partials() {
        let dir = tempfile::tempdir().unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut config = FetchConfig::default();
        config.attempts = 1;
        let pool = FetchPool::new(config).unwrap();
        let request = FetchRequest {
            url: "http://192.0.2.1/page".parse().unwrap(),
            dest: dir.path().join("page_000.json"),
            expected_len: None,
            class: RequestClass::Json,
        };
        let outcome = pool.fetch_all(vec![request], None, &cancel).await;
        assert_eq!(1, outcome.failed.len());
        assert!(matches!(outcome.failed[0].1, FetchError::Canceled));
        // Nothing was written.
        assert_eq!(0, std::fs::read_dir(dir.path()).unwrap().count());
    }
}

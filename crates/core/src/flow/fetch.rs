pub use super::fetch_error::CaskFetchError;
use crate::cancel::CancelToken;
use crate::checksum::{Checksum, ContentHasher};
use crate::config::FetchConfig;
use crate::env::CaskEnvironment;
use futures::StreamExt;
use starbase_utils::fs::{self, FsError};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, instrument, trace, warn};
use url::Url;

#[derive(Clone, Debug)]
pub struct FetchOptions {
    pub backoff: Duration,
    pub cancel: Option<CancelToken>,
    pub retries: u8,
    pub timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

impl FetchOptions {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            backoff: config.backoff(),
            cancel: None,
            retries: config.retries,
            timeout: config.timeout(),
        }
    }
}

/// A downloaded file whose contents matched the expected checksum.
/// Can only be produced by [`Fetcher`], and the file is removed when
/// the artifact is dropped.
pub struct VerifiedArtifact {
    checksum: Checksum,
    file_name: String,
    path: PathBuf,
    url: Url,
}

impl VerifiedArtifact {
    pub fn checksum(&self) -> &Checksum {
        &self.checksum
    }

    /// File name taken from the download URL, used to pick an unpacker.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl fmt::Debug for VerifiedArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifiedArtifact")
            .field("checksum", &self.checksum)
            .field("file_name", &self.file_name)
            .field("path", &self.path)
            .field("url", &self.url.as_str())
            .finish()
    }
}

impl Drop for VerifiedArtifact {
    fn drop(&mut self) {
        if self.path.exists() {
            trace!(file = ?self.path, "Removing verified artifact");

            let _ = fs::remove_file(&self.path);
        }
    }
}

// Removes a partial download unless it was handed off.
struct TempFile {
    path: PathBuf,
    keep: bool,
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if !self.keep && self.path.exists() {
            trace!(file = ?self.path, "Removing partial download");

            let _ = fs::remove_file(&self.path);
        }
    }
}

pub fn extract_file_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .map(|name| {
            // Keep names filesystem safe
            name.replace(['/', '\\', '%', '?', '#'], "_")
        })
        .unwrap_or_else(|| "download".into())
}

fn is_transient_status(status: reqwest::StatusCode) -> bool {
    status.is_server_error()
        || status == reqwest::StatusCode::REQUEST_TIMEOUT
        || status == reqwest::StatusCode::TOO_MANY_REQUESTS
}

fn map_request_error(url: &Url, error: reqwest::Error) -> CaskFetchError {
    let retryable =
        error.is_timeout() || error.is_connect() || error.is_request() || error.is_body();

    CaskFetchError::FetchFailed {
        url: url.to_string(),
        reason: error.to_string(),
        status: error.status().map(|status| status.as_u16()),
        retryable,
    }
}

/// Downloads artifacts into the store's temp directory and verifies them.
pub struct Fetcher<'env> {
    client: reqwest::Client,
    env: &'env CaskEnvironment,
}

impl<'env> Fetcher<'env> {
    pub fn new(env: &'env CaskEnvironment) -> Result<Self, CaskFetchError> {
        debug!("Creating HTTP client");

        let client = reqwest::Client::builder()
            .user_agent(format!("cask@{}", env!("CARGO_PKG_VERSION")))
            .use_rustls_tls()
            .connect_timeout(env.config.fetch.connect_timeout())
            .build()
            .map_err(|error| CaskFetchError::Client {
                error: Box::new(error),
            })?;

        Ok(Self { client, env })
    }

    /// Download the URL and verify its content against the checksum.
    /// Nothing is retained when verification fails.
    #[instrument(skip(self, options))]
    pub async fn fetch_and_verify(
        &self,
        url: &Url,
        checksum: &Checksum,
        options: &FetchOptions,
    ) -> Result<VerifiedArtifact, CaskFetchError> {
        let file_name = extract_file_name(url);
        let mut temp = TempFile {
            path: self.env.store.create_temp_path(&file_name)?,
            keep: false,
        };
        let cancel = options.cancel.clone().unwrap_or_default();

        debug!(url = url.as_str(), temp_file = ?temp.path, "Downloading artifact");

        let actual = tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                return Err(CaskFetchError::Cancelled { url: url.to_string() });
            }

            result = tokio::time::timeout(
                options.timeout,
                self.download(url, &temp.path, checksum),
            ) => match result {
                Ok(inner) => inner?,
                Err(_) => {
                    return Err(CaskFetchError::TimedOut {
                        url: url.to_string(),
                        seconds: options.timeout.as_secs(),
                    });
                }
            },
        };

        if !checksum.matches(&actual) {
            warn!(
                url = url.as_str(),
                expected = checksum.to_hex(),
                actual = actual.to_hex(),
                "Checksum mismatch, discarding download",
            );

            return Err(CaskFetchError::ChecksumMismatch {
                url: url.to_string(),
                expected: checksum.to_hex(),
                actual: actual.to_hex(),
            });
        }

        debug!(checksum = actual.to_hex(), "Verified artifact checksum");

        // Drop the .part suffix so the archive extension is visible
        let path = temp.path.with_extension("");

        fs::rename(&temp.path, &path)?;
        temp.keep = true;

        Ok(VerifiedArtifact {
            checksum: actual,
            file_name,
            path,
            url: url.to_owned(),
        })
    }

    /// Like [`Fetcher::fetch_and_verify`] but retries transient network
    /// failures with exponential backoff. Verification failures are never
    /// retried.
    pub async fn fetch_with_retry(
        &self,
        url: &Url,
        checksum: &Checksum,
        options: &FetchOptions,
    ) -> Result<VerifiedArtifact, CaskFetchError> {
        let cancel = options.cancel.clone().unwrap_or_default();
        let mut attempt = 0;
        let mut delay = options.backoff;

        loop {
            match self.fetch_and_verify(url, checksum, options).await {
                Err(error) if error.is_retryable() && attempt < options.retries => {
                    attempt += 1;

                    warn!(
                        attempt,
                        retries = options.retries,
                        "Download failed, retrying in {}ms: {error}",
                        delay.as_millis(),
                    );

                    tokio::select! {
                        _ = cancel.cancelled() => {
                            return Err(CaskFetchError::Cancelled { url: url.to_string() });
                        }
                        _ = tokio::time::sleep(delay) => {}
                    };

                    delay = delay.saturating_mul(2);
                }
                result => return result,
            }
        }
    }

    async fn download(
        &self,
        url: &Url,
        dest: &Path,
        checksum: &Checksum,
    ) -> Result<Checksum, CaskFetchError> {
        let handle_write_error = |error: std::io::Error| FsError::Write {
            path: dest.to_path_buf(),
            error: Box::new(error),
        };

        let mut hasher = ContentHasher::new(checksum.algorithm());
        let mut file = File::create(dest).await.map_err(handle_write_error)?;
        let mut size: u64 = 0;

        if url.scheme() == "file" {
            let source = url
                .to_file_path()
                .map_err(|_| CaskFetchError::FetchFailed {
                    url: url.to_string(),
                    reason: "not a local file path".into(),
                    status: None,
                    retryable: false,
                })?;

            let mut input = File::open(&source)
                .await
                .map_err(|error| CaskFetchError::FetchFailed {
                    url: url.to_string(),
                    reason: error.to_string(),
                    status: None,
                    retryable: false,
                })?;

            let mut buffer = vec![0; 64 * 1024];

            loop {
                let read = input
                    .read(&mut buffer)
                    .await
                    .map_err(|error| FsError::Read {
                        path: source.clone(),
                        error: Box::new(error),
                    })?;

                if read == 0 {
                    break;
                }

                hasher.update(&buffer[..read]);
                file.write_all(&buffer[..read])
                    .await
                    .map_err(handle_write_error)?;
                size += read as u64;
            }
        } else {
            let response = self
                .client
                .get(url.as_str())
                .send()
                .await
                .map_err(|error| map_request_error(url, error))?;
            let status = response.status();

            if !status.is_success() {
                return Err(CaskFetchError::FetchFailed {
                    url: url.to_string(),
                    reason: format!("server responded with {status}"),
                    status: Some(status.as_u16()),
                    retryable: is_transient_status(status),
                });
            }

            let mut stream = response.bytes_stream();

            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|error| map_request_error(url, error))?;

                hasher.update(&chunk);
                file.write_all(&chunk).await.map_err(handle_write_error)?;
                size += chunk.len() as u64;
            }
        }

        file.flush().await.map_err(handle_write_error)?;

        trace!(size, "Downloaded artifact");

        Ok(hasher.finalize())
    }
}

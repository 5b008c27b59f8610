//! HTTP client with connection pooling and retry logic

use futures::StreamExt;
use rand::Rng;
use reqwest::{Client, Response};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use toolchest_errors::{Error, FetchError};
use tracing::debug;
use url::Url;

/// Retry configuration for requests and downloads
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Initial backoff delay
    pub initial_delay: Duration,
    /// Backoff multiplier per attempt
    pub backoff_multiplier: f64,
    /// Jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl RetryConfig {
    /// Exponential backoff delay with jitter for a 1-based attempt number
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        #[allow(clippy::cast_precision_loss)]
        let base = self.initial_delay.as_millis() as f64;
        #[allow(clippy::cast_possible_wrap)]
        let delay = base * self.backoff_multiplier.powi(attempt as i32 - 1);

        let jitter = delay * self.jitter_factor * (rand::rng().random::<f64>() - 0.5);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let millis = (delay + jitter).max(0.0).round() as u64;
        Duration::from_millis(millis)
    }
}

/// Network client configuration
#[derive(Debug, Clone)]
pub struct NetConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub retry: RetryConfig,
    pub user_agent: String,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
            user_agent: format!("toolchest/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// HTTP client wrapper with retry logic
#[derive(Clone)]
pub struct NetClient {
    client: Client,
    config: NetConfig,
}

impl NetClient {
    /// Create a new network client
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to
    /// initialize.
    pub fn new(config: NetConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| FetchError::DownloadFailed {
                message: e.to_string(),
            })?;

        Ok(Self { client, config })
    }

    /// Create with default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created with
    /// default settings.
    pub fn with_defaults() -> Result<Self, Error> {
        Self::new(NetConfig::default())
    }

    /// Execute a GET request with retries
    ///
    /// Server errors (5xx) and transport failures are retried with
    /// backoff; client errors (4xx) are returned to the caller
    /// immediately.
    ///
    /// # Errors
    ///
    /// Returns an error once retries are exhausted or on a
    /// non-retryable status.
    pub async fn get(&self, url: &str) -> Result<Response, Error> {
        validate_url(url)?;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let result = self.client.get(url).send().await;

            match result {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) if response.status().is_server_error() => {
                    if attempt > self.config.retry.max_retries {
                        return Err(FetchError::HttpError {
                            status: response.status().as_u16(),
                            url: url.to_string(),
                        }
                        .into());
                    }
                }
                Ok(response) => {
                    return Err(FetchError::HttpError {
                        status: response.status().as_u16(),
                        url: url.to_string(),
                    }
                    .into());
                }
                Err(e) => {
                    if attempt > self.config.retry.max_retries {
                        return Err(FetchError::SourceUnreachable {
                            url: url.to_string(),
                            message: e.to_string(),
                        }
                        .into());
                    }
                }
            }

            let delay = self.config.retry.delay_for_attempt(attempt);
            debug!(url, attempt, ?delay, "request failed, retrying");
            tokio::time::sleep(delay).await;
        }
    }

    /// Stream a GET response body into a file
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the destination cannot be
    /// created, or streaming is interrupted.
    pub async fn download_file(&self, url: &str, dest: &Path) -> Result<u64, Error> {
        let response = self.get(url).await?;

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| Error::io_with_path(&e, dest))?;
        let mut stream = response.bytes_stream();
        let mut downloaded = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| FetchError::DownloadFailed {
                message: e.to_string(),
            })?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
        }

        file.flush().await?;
        Ok(downloaded)
    }
}

/// Validate a URL and check for supported protocols
fn validate_url(url: &str) -> Result<(), Error> {
    let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(FetchError::InvalidUrl {
            url: url.to_string(),
            message: format!("unsupported protocol: {scheme}"),
        }
        .into()),
    }
}

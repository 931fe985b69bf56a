use std::path::Path;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, HeaderMap};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::auth::OAuthToken;
use crate::error::{Cause, DiskError};

pub const DEFAULT_API_BASE: &str = "https://cloud-api.yandex.net";
pub const DEFAULT_APP_ROOT: &str = "Приложения";

pub(crate) const RESOURCES: &str = "/v1/disk/resources";
pub(crate) const UPLOAD: &str = "/v1/disk/resources/upload";

const MAX_RETRIES: u32 = 3;

/// Connection settings for [`DiskClient`].
#[derive(Debug, Clone)]
pub struct DiskSettings {
    pub token: OAuthToken,
    pub app_name: String,
    pub app_root: String,
    pub api_base: String,
    pub request_timeout: Duration,
    pub upload_timeout: Duration,
    /// First backoff step; doubled on every further retry.
    pub retry_base: Duration,
}

impl DiskSettings {
    pub fn new(token: OAuthToken, app_name: &str) -> Self {
        Self {
            token,
            app_name: app_name.to_string(),
            app_root: DEFAULT_APP_ROOT.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(120),
            upload_timeout: Duration::from_secs(60 * 60),
            retry_base: Duration::from_secs(1),
        }
    }
}

/// Authenticated client for the Yandex Disk REST API.
#[derive(Clone)]
pub struct DiskClient {
    settings: DiskSettings,
    http: reqwest::Client,
}

impl DiskClient {
    pub fn new(settings: DiskSettings) -> Result<Self, DiskError> {
        if settings.token.is_empty() {
            return Err(DiskError::Config("OAuth token is empty".to_string()));
        }
        let auth = settings
            .token
            .header()
            .map_err(|_| DiskError::Config("OAuth token is not a valid header value".into()))?;
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        // No pooling: every call opens and closes its own connection.
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| DiskError::Config(e.to_string()))?;

        Ok(Self { settings, http })
    }

    pub fn settings(&self) -> &DiskSettings {
        &self.settings
    }

    /// `{app_root}/{app_name}/{relative}`
    pub fn app_path(&self, relative: &str) -> String {
        let root = self.settings.app_root.trim_end_matches('/');
        let relative = relative.trim_start_matches('/');
        if relative.is_empty() {
            format!("{root}/{}", self.settings.app_name)
        } else {
            format!("{root}/{}/{relative}", self.settings.app_name)
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.settings.api_base.trim_end_matches('/'))
    }

    /// Send an idempotent API call, retrying transient failures.
    pub(crate) async fn send(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<Response, Cause> {
        let url = self.url(endpoint);
        let mut retries = 0;
        loop {
            let result = self
                .http
                .request(method.clone(), &url)
                .query(query)
                .timeout(self.settings.request_timeout)
                .send()
                .await;

            match result {
                Ok(resp) if is_throttled(resp.status()) && retries < MAX_RETRIES => {
                    retries += 1;
                    let delay = retry_after(&resp, self.settings.request_timeout)
                        .unwrap_or_else(|| self.backoff(retries));
                    warn!(url = %url, status = %resp.status(), retries, ?delay, "throttled, backing off");
                    tokio::time::sleep(delay).await;
                }
                Ok(resp) => {
                    debug!(%method, url = %url, status = %resp.status(), "response");
                    return Ok(resp);
                }
                Err(e) if is_transient(&e) && retries < MAX_RETRIES => {
                    retries += 1;
                    let delay = self.backoff(retries);
                    warn!(url = %url, error = %e, retries, ?delay, "transport error, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(Cause::Transport(e)),
            }
        }
    }

    /// Stream a local file to a pre-issued upload href. Never retried: the
    /// body is consumed by the first attempt.
    pub(crate) async fn transfer(
        &self,
        local: &Path,
        href: &str,
        method: Method,
    ) -> Result<(), Cause> {
        let file = tokio::fs::File::open(local).await?;
        let len = file.metadata().await?.len();
        // The stream owns the handle; it is closed when the request finishes
        // or is dropped on error.
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));

        let resp = self
            .http
            .request(method, href)
            .header(CONTENT_LENGTH, len)
            .body(body)
            .timeout(self.settings.upload_timeout)
            .send()
            .await?;
        ensure_success(resp).await?;
        Ok(())
    }

    fn backoff(&self, retries: u32) -> Duration {
        self.settings.retry_base * 2u32.pow(retries.saturating_sub(1))
    }
}

fn is_throttled(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

/// Server-requested delay, never longer than `cap`.
fn retry_after(resp: &Response, cap: Duration) -> Option<Duration> {
    resp.headers()
        .get("Retry-After")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| parse_retry_after(v, cap))
}

fn parse_retry_after(value: &str, cap: Duration) -> Option<Duration> {
    let secs = value.trim().parse::<u64>().ok()?;
    Some(Duration::from_secs(secs).min(cap))
}

/// Turn a non-2xx response into [`Cause::Status`] carrying the body text.
pub(crate) async fn ensure_success(resp: Response) -> Result<Response, Cause> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(Cause::Status { status, body })
}

/// Read the whole body, keeping transport and decode failures apart.
pub(crate) async fn read_json<T: DeserializeOwned>(
    resp: Response,
) -> Result<Result<T, serde_json::Error>, Cause> {
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes))
}

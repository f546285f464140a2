// crates/client/src/api.rs
//! HTTP surface of the analysis backend.
//!
//! Four endpoints: session create, query stream, latest-report lookup, and
//! report download. Non-2xx responses become typed errors carrying status
//! and body text so the display can show what the backend actually said.

use std::time::Duration;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::Error;
use crate::message::QueryRequest;
use crate::stream::QueryStream;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for one backend instance. Cheap to clone; the underlying
/// connection pool is shared.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

/// Session-create response. The id arrives under one of two keys depending
/// on the backend version.
#[derive(Debug, Deserialize)]
struct SessionResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
}

/// `GET /api/health` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub orchestrator_url: Option<String>,
}

/// `GET /api/reports/latest-pdf` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LatestReport {
    pub filename: String,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub created: Option<f64>,
}

impl ApiClient {
    /// Build a client for `base_url` (scheme + host + port, no trailing
    /// slash needed). The stream itself carries no deadline; only
    /// connection setup is bounded.
    pub fn new(base_url: impl Into<String>) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Create a session and return its correlation id. No retry: callers
    /// surface the error and abort the run.
    pub async fn create_session(&self) -> Result<String, Error> {
        let resp = self.http.post(self.url("/api/sessions")).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(Error::Session { status: status.as_u16(), body });
        }

        let parsed: SessionResponse =
            serde_json::from_str(&body).map_err(|_| Error::SessionIdMissing { body: body.clone() })?;
        parsed
            .id
            .or(parsed.session_id)
            .ok_or(Error::SessionIdMissing { body })
    }

    /// Open the query stream for one run. The token aborts both the
    /// request send and the subsequent read loop.
    pub async fn open_query_stream(
        &self,
        request: &QueryRequest,
        cancel: CancellationToken,
    ) -> Result<QueryStream, Error> {
        let send = self.http.post(self.url("/api/query")).json(request).send();
        let resp = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            resp = send => resp?,
        };

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Query { status: status.as_u16(), body });
        }
        debug!(session_id = %request.session_id, "query stream open");
        QueryStream::from_response(resp, cancel)
    }

    /// Preflight reachability check.
    pub async fn health(&self) -> Result<HealthStatus, Error> {
        let resp = self.http.get(self.url("/api/health")).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Backend {
                endpoint: "/api/health",
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json().await?)
    }

    /// The most recently generated report document. `Ok(None)` means no
    /// report exists yet, not a failure.
    pub async fn latest_report(&self) -> Result<Option<LatestReport>, Error> {
        let resp = self.http.get(self.url("/api/reports/latest-pdf")).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Backend {
                endpoint: "/api/reports/latest-pdf",
                status: status.as_u16(),
                body,
            });
        }
        Ok(Some(resp.json().await?))
    }

    /// Download a generated report by its server-side filename.
    pub async fn download_report(&self, filename: &str) -> Result<Vec<u8>, Error> {
        let resp = self
            .http
            .get(self.url(&format!("/api/reports/download/{filename}")))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Backend {
                endpoint: "/api/reports/download",
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.bytes().await?.to_vec())
    }
}

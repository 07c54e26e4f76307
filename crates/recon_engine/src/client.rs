use std::fmt;
use std::time::Duration;

use engine_logging::{engine_debug, engine_warn};
use recon_core::{Envelope, Feature, Job, JobId, StartRequest, StartedJob, Subdomain, Target, TargetId};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

/// Message shown when the backend fails without saying why.
pub const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Base of the versioned API, e.g. `http://localhost:3001/api/v1`.
    pub base_url: String,
    pub auth_token: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001/api/v1".to_string(),
            auth_token: None,
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiFailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Unauthorized,
    Timeout,
    Network,
    /// The backend answered with `success: false`.
    Application,
    Decode,
}

impl fmt::Display for ApiFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiFailureKind::InvalidUrl => write!(f, "invalid url"),
            ApiFailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            ApiFailureKind::Unauthorized => write!(f, "unauthorized"),
            ApiFailureKind::Timeout => write!(f, "timeout"),
            ApiFailureKind::Network => write!(f, "network error"),
            ApiFailureKind::Application => write!(f, "application error"),
            ApiFailureKind::Decode => write!(f, "malformed response"),
        }
    }
}

/// A failed backend call. `message` is what the user gets to see.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiFailureKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ApiFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// The backend endpoints the dashboard talks to.
#[async_trait::async_trait]
pub trait ScanApi: Send + Sync {
    async fn list_jobs(&self, feature: Feature) -> Result<Vec<Job>, ApiError>;

    /// Raw results payload of one job; `Value::Null` when the backend has none.
    async fn job_results(&self, feature: Feature, job_id: JobId) -> Result<Value, ApiError>;

    async fn start_job(
        &self,
        feature: Feature,
        request: &StartRequest,
    ) -> Result<StartedJob, ApiError>;

    async fn stop_job(&self, feature: Feature, job_id: JobId) -> Result<(), ApiError>;

    async fn list_targets(&self) -> Result<Vec<Target>, ApiError>;

    async fn list_subdomains(&self, target_id: TargetId) -> Result<Vec<Subdomain>, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestScanApi {
    base: Url,
    auth_token: Option<String>,
    client: reqwest::Client,
}

impl ReqwestScanApi {
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        let base = Url::parse(settings.base_url.trim_end_matches('/'))
            .map_err(|err| ApiError::new(ApiFailureKind::InvalidUrl, err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::new(
                ApiFailureKind::InvalidUrl,
                format!("{} cannot be used as an API base", settings.base_url),
            ));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(ApiFailureKind::Network, err.to_string()))?;

        Ok(Self {
            base,
            auth_token: settings.auth_token.filter(|token| !token.trim().is_empty()),
            client,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::new(ApiFailureKind::InvalidUrl, self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header(ACCEPT, "application/json");
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<Envelope<T>, ApiError> {
        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let url = response.url().clone();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        engine_debug!("{} -> {} ({} bytes)", url, status, body.len());

        if !status.is_success() {
            let detail = serde_json::from_slice::<Envelope<Value>>(&body)
                .ok()
                .and_then(|env| env.failure_message().map(str::to_string));
            let kind = if status == StatusCode::UNAUTHORIZED {
                ApiFailureKind::Unauthorized
            } else {
                ApiFailureKind::HttpStatus(status.as_u16())
            };
            return Err(ApiError::new(kind, detail.unwrap_or_else(|| status.to_string())));
        }

        let envelope: Envelope<T> = serde_json::from_slice(&body).map_err(|err| {
            engine_warn!("Undecodable response from {}: {}", url, err);
            ApiError::new(ApiFailureKind::Decode, err.to_string())
        })?;
        if !envelope.success {
            let message = envelope.failure_message().unwrap_or(UNKNOWN_ERROR).to_string();
            return Err(ApiError::new(ApiFailureKind::Application, message));
        }
        Ok(envelope)
    }

    async fn post_json<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<Envelope<T>, ApiError> {
        let payload = serde_json::to_vec(body)
            .map_err(|err| ApiError::new(ApiFailureKind::Decode, err.to_string()))?;
        let builder = self
            .request(reqwest::Method::POST, url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload);
        self.send(builder).await
    }
}

#[async_trait::async_trait]
impl ScanApi for ReqwestScanApi {
    async fn list_jobs(&self, feature: Feature) -> Result<Vec<Job>, ApiError> {
        let url = self.endpoint(&[feature.slug(), feature.list_path()])?;
        let envelope: Envelope<Vec<Job>> = self.send(self.request(reqwest::Method::GET, url)).await?;
        Ok(envelope.data.unwrap_or_default())
    }

    async fn job_results(&self, feature: Feature, job_id: JobId) -> Result<Value, ApiError> {
        let id = job_id.to_string();
        let url = self.endpoint(&[feature.slug(), "results", &id])?;
        let envelope: Envelope<Value> = self.send(self.request(reqwest::Method::GET, url)).await?;
        Ok(envelope.data.unwrap_or(Value::Null))
    }

    async fn start_job(
        &self,
        feature: Feature,
        request: &StartRequest,
    ) -> Result<StartedJob, ApiError> {
        let url = self.endpoint(&[feature.slug(), "start"])?;
        let envelope: Envelope<StartedJob> = self.post_json(url, request).await?;
        Ok(envelope.data.unwrap_or_default())
    }

    async fn stop_job(&self, feature: Feature, job_id: JobId) -> Result<(), ApiError> {
        let id = job_id.to_string();
        let url = self.endpoint(&[feature.slug(), "stop", &id])?;
        let _: Envelope<Value> = self.post_json(url, &serde_json::json!({})).await?;
        Ok(())
    }

    async fn list_targets(&self) -> Result<Vec<Target>, ApiError> {
        let url = self.endpoint(&["targets"])?;
        let envelope: Envelope<Vec<Target>> =
            self.send(self.request(reqwest::Method::GET, url)).await?;
        Ok(envelope.data.unwrap_or_default())
    }

    async fn list_subdomains(&self, target_id: TargetId) -> Result<Vec<Subdomain>, ApiError> {
        let mut url = self.endpoint(&["subdomains"])?;
        url.query_pairs_mut()
            .append_pair("target_id", &target_id.to_string())
            .append_pair("status", "active")
            .append_pair("limit", "1000");
        let envelope: Envelope<Vec<Subdomain>> =
            self.send(self.request(reqwest::Method::GET, url)).await?;
        Ok(envelope.data.unwrap_or_default())
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(ApiFailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ApiError::new(ApiFailureKind::Decode, err.to_string());
    }
    ApiError::new(ApiFailureKind::Network, err.to_string())
}

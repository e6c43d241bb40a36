//! Remote risk engine: scoring, settings, and portfolio statistics.

use std::fmt;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::domain::{PortfolioStats, ScoringRequest, ScoringResponse};
use super::settings::RiskPolicy;
use crate::config::EngineConfig;

const USER_AGENT: &str = "loan-risk-dashboard/0.1";
const MAX_ERROR_BODY: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Scoring,
    Settings,
    Stats,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceKind::Scoring => "scoring service",
            ServiceKind::Settings => "settings service",
            ServiceKind::Stats => "stats service",
        };
        f.write_str(name)
    }
}

/// Failure talking to the engine. Never a decision.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    #[error("{service} unavailable: {detail}")]
    Unavailable { service: ServiceKind, detail: String },
    #[error("{service} returned a malformed response: {detail}")]
    MalformedResponse { service: ServiceKind, detail: String },
    #[error("{service} rejected the request ({status}): {detail}")]
    Rejected {
        service: ServiceKind,
        status: u16,
        detail: String,
    },
}

impl ServiceError {
    pub fn service(&self) -> ServiceKind {
        match self {
            ServiceError::Unavailable { service, .. }
            | ServiceError::MalformedResponse { service, .. }
            | ServiceError::Rejected { service, .. } => *service,
        }
    }
}

#[async_trait]
pub trait ScoringService: Send + Sync {
    async fn score(&self, request: &ScoringRequest) -> Result<ScoringResponse, ServiceError>;
}

/// Remote source of truth for the risk policy.
#[async_trait]
pub trait SettingsSource: Send + Sync {
    async fn fetch_policy(&self) -> Result<RiskPolicy, ServiceError>;
    /// Persist `policy` remotely, returning the value the service accepted.
    async fn publish_policy(&self, policy: &RiskPolicy) -> Result<RiskPolicy, ServiceError>;
}

#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn portfolio_stats(&self) -> Result<PortfolioStats, ServiceError>;
}

/// Everything the dashboard needs from one engine deployment.
pub trait RiskEngine: ScoringService + SettingsSource + StatsSource {}

impl<T> RiskEngine for T where T: ScoringService + SettingsSource + StatsSource {}

/// HTTP client for the engine's JSON API.
#[derive(Debug, Clone)]
pub struct RiskEngineClient {
    client: reqwest::Client,
    base_url: Url,
}

impl RiskEngineClient {
    pub fn new(config: &EngineConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;

        // Without a trailing slash `join` would replace the last path segment.
        let mut base_url = config.base_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, service: ServiceKind, path: &str) -> Result<Url, ServiceError> {
        self.base_url
            .join(path)
            .map_err(|err| ServiceError::Unavailable {
                service,
                detail: format!("invalid endpoint '{path}': {err}"),
            })
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        service: ServiceKind,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ServiceError> {
        let response = request
            .send()
            .await
            .map_err(|err| ServiceError::Unavailable {
                service,
                detail: transport_detail(&err),
            })?;

        let status = response.status();
        debug!(%service, status = status.as_u16(), "engine responded");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(service, status, &body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| ServiceError::Unavailable {
                service,
                detail: transport_detail(&err),
            })?;

        serde_json::from_slice(&bytes).map_err(|err| ServiceError::MalformedResponse {
            service,
            detail: err.to_string(),
        })
    }
}

fn transport_detail(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request timed out: {err}")
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    }
}

fn classify_status(service: ServiceKind, status: StatusCode, body: &str) -> ServiceError {
    let detail = truncate(body);
    if status.is_client_error() {
        ServiceError::Rejected {
            service,
            status: status.as_u16(),
            detail,
        }
    } else {
        ServiceError::Unavailable {
            service,
            detail: format!("HTTP {}: {detail}", status.as_u16()),
        }
    }
}

fn truncate(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((cut, _)) => body[..cut].to_string(),
        None => body.to_string(),
    }
}

#[async_trait]
impl ScoringService for RiskEngineClient {
    async fn score(&self, request: &ScoringRequest) -> Result<ScoringResponse, ServiceError> {
        let url = self.endpoint(ServiceKind::Scoring, "predict")?;
        debug!(%url, installment = request.installment(), "submitting applicant for scoring");
        self.execute(ServiceKind::Scoring, self.client.post(url).json(request))
            .await
    }
}

#[async_trait]
impl SettingsSource for RiskEngineClient {
    async fn fetch_policy(&self) -> Result<RiskPolicy, ServiceError> {
        let url = self.endpoint(ServiceKind::Settings, "settings")?;
        self.execute(ServiceKind::Settings, self.client.get(url))
            .await
    }

    async fn publish_policy(&self, policy: &RiskPolicy) -> Result<RiskPolicy, ServiceError> {
        let url = self.endpoint(ServiceKind::Settings, "settings")?;
        self.execute(ServiceKind::Settings, self.client.post(url).json(policy))
            .await
    }
}

#[async_trait]
impl StatsSource for RiskEngineClient {
    async fn portfolio_stats(&self) -> Result<PortfolioStats, ServiceError> {
        let url = self.endpoint(ServiceKind::Stats, "stats")?;
        self.execute(ServiceKind::Stats, self.client.get(url)).await
    }
}

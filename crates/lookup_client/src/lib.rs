use async_trait::async_trait;
use chrono::Utc;
use reqwest::{
    header::{ACCEPT, CONTENT_TYPE},
    Client, Response,
};
use serde_json::Value;
use shared::{
    domain::{OptionId, OptionList},
    error::{LookupError, LookupFailureKind},
    protocol::{DependentsResponse, ErrorBody, ParentResponse},
};
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod config;

pub use config::{ConfigError, Endpoint, LookupConfig};

/// Resolves parent ids to dependent options and, optionally, dependents back
/// to their parent. Failures are values, never panics.
#[async_trait]
pub trait LookupClient: Send + Sync {
    /// Empty `parent_id` yields an empty list without any request.
    async fn fetch_dependents(&self, parent_id: &OptionId) -> Result<OptionList, LookupError>;
    /// `Ok(None)` when the dependent has no mapped parent.
    async fn fetch_parent(&self, dependent_id: &OptionId)
        -> Result<Option<OptionId>, LookupError>;
}

#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

pub struct HttpLookupClient {
    http: Client,
    config: LookupConfig,
}

impl HttpLookupClient {
    pub fn new(config: LookupConfig) -> Result<Self, ClientBuildError> {
        config.validate()?;
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            config,
        })
    }

    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    fn cache_buster(&self) -> Option<i64> {
        self.config
            .cache_bust
            .then(|| Utc::now().timestamp_millis())
    }

    async fn get_json(&self, endpoint: &Endpoint, id: &OptionId) -> Result<Value, LookupError> {
        let url = endpoint.request_url(id.as_str(), self.cache_buster());
        let response = self
            .http
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| network_failure(&err).at(url.as_str()))?;

        let status = response.status();
        let content_type = content_type(&response);
        let is_json = content_type.contains("application/json");

        if !status.is_success() {
            let mut err = LookupError::from_status(status.as_u16());
            if is_json {
                if let Ok(body) = response.json::<ErrorBody>().await {
                    err.message = body.error;
                }
            }
            return Err(err.at(url.as_str()));
        }

        if !is_json {
            return Err(LookupError::new(
                LookupFailureKind::MalformedResponse,
                format!(
                    "response is not JSON (content-type '{content_type}'), likely an error page"
                ),
            )
            .at(url.as_str()));
        }

        response.json::<Value>().await.map_err(|err| {
            LookupError::new(
                LookupFailureKind::MalformedResponse,
                format!("response body is not valid JSON: {err}"),
            )
            .at(url.as_str())
        })
    }

    async fn probe<T>(
        &self,
        lookup: &'static str,
        candidates: &[Endpoint],
        id: &OptionId,
        decode: impl Fn(Value) -> Result<T, LookupError>,
    ) -> Result<T, LookupError> {
        let mut last_failure = None;
        for (attempt, endpoint) in candidates.iter().enumerate() {
            debug!(
                lookup,
                attempt = attempt + 1,
                url = %endpoint.url,
                "lookup: trying candidate endpoint"
            );
            match self
                .get_json(endpoint, id)
                .await
                .and_then(|value| decode(value).map_err(|err| err.at(endpoint.url.as_str())))
            {
                Ok(value) => {
                    if attempt > 0 {
                        info!(lookup, url = %endpoint.url, "lookup: fallback candidate succeeded");
                    }
                    return Ok(value);
                }
                Err(err) => {
                    warn!(
                        lookup,
                        url = %endpoint.url,
                        kind = err.kind.as_str(),
                        "lookup: candidate endpoint failed: {}",
                        err.message
                    );
                    last_failure = Some(err);
                }
            }
        }

        match last_failure {
            Some(err) if candidates.len() > 1 => Err(LookupError {
                message: format!(
                    "all {} candidate endpoints failed; last error: {}",
                    candidates.len(),
                    err.message
                ),
                ..err
            }),
            Some(err) => Err(err),
            None => Err(LookupError::new(
                LookupFailureKind::NetworkFailure,
                format!("no candidate endpoints configured for {lookup}"),
            )),
        }
    }
}

#[async_trait]
impl LookupClient for HttpLookupClient {
    async fn fetch_dependents(&self, parent_id: &OptionId) -> Result<OptionList, LookupError> {
        if parent_id.is_empty() {
            return Ok(OptionList::new());
        }
        self.probe("dependents", &self.config.dependents, parent_id, decode_dependents)
            .await
    }

    async fn fetch_parent(
        &self,
        dependent_id: &OptionId,
    ) -> Result<Option<OptionId>, LookupError> {
        if dependent_id.is_empty() {
            return Ok(None);
        }
        self.probe("parent", &self.config.parent, dependent_id, decode_parent)
            .await
    }
}

fn content_type(response: &Response) -> String {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase()
}

fn network_failure(err: &reqwest::Error) -> LookupError {
    let message = if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        format!("failed to connect: {err}")
    } else {
        format!("request failed: {err}")
    };
    LookupError::new(LookupFailureKind::NetworkFailure, message)
}

fn decode_dependents(value: Value) -> Result<OptionList, LookupError> {
    match serde_json::from_value::<DependentsResponse>(value) {
        Ok(DependentsResponse::Records(records)) => Ok(records.into_iter().map(Into::into).collect()),
        Ok(DependentsResponse::Error(body)) => Err(LookupError::new(
            LookupFailureKind::LogicalError,
            body.error,
        )),
        Err(err) => Err(LookupError::new(
            LookupFailureKind::MalformedResponse,
            format!("unexpected dependents payload: {err}"),
        )),
    }
}

fn decode_parent(value: Value) -> Result<Option<OptionId>, LookupError> {
    match serde_json::from_value::<ParentResponse>(value) {
        Ok(ParentResponse::Parent(record)) => Ok(record.id.filter(|id| !id.is_empty())),
        Ok(ParentResponse::Error(body)) => Err(LookupError::new(
            LookupFailureKind::LogicalError,
            body.error,
        )),
        Err(err) => Err(LookupError::new(
            LookupFailureKind::MalformedResponse,
            format!("unexpected parent payload: {err}"),
        )),
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::access::{BearerCredential, CurrentUser};
use super::payload::RiskRequestPayload;
use super::result::RiskResult;

/// Shown when the backend refuses a mobile request with an empty 403 body.
pub const PORTAL_MISMATCH_MESSAGE: &str =
    "Accès refusé. Les administrateurs doivent se connecter via la plateforme admin (/admin/login).";

/// The two backend endpoints the assessment flow consumes.
pub trait RiskBackend: Send + Sync {
    /// `GET /auth/me`
    fn current_user(
        &self,
        credential: &BearerCredential,
    ) -> impl Future<Output = Result<CurrentUser, GatewayError>> + Send;

    /// `POST /risk/calculate-and-save`
    fn calculate_and_save(
        &self,
        credential: &BearerCredential,
        payload: &RiskRequestPayload,
    ) -> impl Future<Output = Result<RiskResult, GatewayError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("risk backend unreachable: {0}")]
    Transport(String),
    #[error("risk backend did not answer within {seconds} seconds")]
    Timeout { seconds: u64 },
    #[error("{detail}")]
    Rejected { status: u16, detail: String },
    #[error("unexpected risk backend response: {0}")]
    Decode(String),
}

impl GatewayError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// reqwest-backed client for the scoring backend.
#[derive(Debug, Clone)]
pub struct HttpRiskBackend {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpRiskBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn map_send_error(&self, err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else if err.is_decode() {
            GatewayError::Decode(err.to_string())
        } else {
            GatewayError::Transport(err.to_string())
        }
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = extract_error_detail(status, &body);
            if status == StatusCode::FORBIDDEN {
                debug!(status = status.as_u16(), %detail, "risk backend refused request");
            } else {
                warn!(status = status.as_u16(), %detail, "risk backend request failed");
            }
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|err| self.map_send_error(err))
    }
}

impl RiskBackend for HttpRiskBackend {
    async fn current_user(
        &self,
        credential: &BearerCredential,
    ) -> Result<CurrentUser, GatewayError> {
        let response = self
            .client
            .get(self.endpoint("/auth/me"))
            .bearer_auth(credential.token())
            .send()
            .await
            .map_err(|err| self.map_send_error(err))?;
        self.read_json(response).await
    }

    async fn calculate_and_save(
        &self,
        credential: &BearerCredential,
        payload: &RiskRequestPayload,
    ) -> Result<RiskResult, GatewayError> {
        let response = self
            .client
            .post(self.endpoint("/risk/calculate-and-save"))
            .bearer_auth(credential.token())
            .json(payload)
            .send()
            .await
            .map_err(|err| self.map_send_error(err))?;
        self.read_json(response).await
    }
}

/// Readable text for a non-success backend response.
///
/// Order of preference: JSON `detail` (structured details are re-encoded as JSON text), JSON
/// `message`, a bare JSON string, the raw body when it is not JSON, then `HTTP <status>`.
/// An empty refusal (403) uses [`PORTAL_MISMATCH_MESSAGE`].
pub fn extract_error_detail(status: StatusCode, body: &str) -> String {
    let fallback = || {
        if status == StatusCode::FORBIDDEN {
            PORTAL_MISMATCH_MESSAGE.to_string()
        } else {
            format!("HTTP {}", status.as_u16())
        }
    };

    let body = body.trim();
    if body.is_empty() {
        return fallback();
    }

    let parsed: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => return body.to_string(),
    };

    match parsed {
        Value::String(text) if !text.is_empty() => text,
        Value::Object(fields) => match (fields.get("detail"), fields.get("message")) {
            (Some(Value::String(detail)), _) if !detail.is_empty() => detail.clone(),
            (Some(detail), _) if !detail.is_null() && detail.as_str().is_none() => {
                detail.to_string()
            }
            (_, Some(Value::String(message))) if !message.is_empty() => message.clone(),
            _ => fallback(),
        },
        _ => fallback(),
    }
}

use dubber_logging::dub_warn;
use serde::Deserialize;

use crate::settings::ServiceSettings;
use crate::types::{map_reqwest_error, FailureKind, ServiceError};
use crate::{RemotePhase, StatusReport};

/// Diagnostic text only; the controller shows its own message for a failed check.
pub(crate) const STATUS_QUERY_FAILED: &str = "status query failed";

#[async_trait::async_trait]
pub trait StatusSource: Send + Sync {
    async fn query(&self, job_id: &str) -> Result<StatusReport, ServiceError>;
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: String,
    #[serde(default)]
    progress: Option<f64>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReqwestStatusSource {
    settings: ServiceSettings,
}

impl ReqwestStatusSource {
    pub fn new(settings: ServiceSettings) -> Self {
        Self { settings }
    }
}

#[async_trait::async_trait]
impl StatusSource for ReqwestStatusSource {
    async fn query(&self, job_id: &str) -> Result<StatusReport, ServiceError> {
        let client = self.settings.build_client(self.settings.request_timeout)?;
        let response = client
            .get(self.settings.status_url(job_id))
            .send()
            .await
            .map_err(|err| {
                dub_warn!("Status query for {} failed: {}", job_id, err);
                map_reqwest_error(&err, STATUS_QUERY_FAILED)
            })?;

        let status = response.status();
        if !status.is_success() {
            dub_warn!("Status query for {} returned {}", job_id, status);
            return Err(ServiceError::new(
                FailureKind::HttpStatus(status.as_u16()),
                STATUS_QUERY_FAILED,
            ));
        }

        let body = response.bytes().await.map_err(|err| {
            dub_warn!("Status body for {} could not be read: {}", job_id, err);
            map_reqwest_error(&err, STATUS_QUERY_FAILED)
        })?;
        parse_status(&body).inspect_err(|_| {
            dub_warn!("Status body for {} is malformed", job_id);
        })
    }
}

fn parse_status(body: &[u8]) -> Result<StatusReport, ServiceError> {
    let parsed: StatusBody = serde_json::from_slice(body)
        .map_err(|err| ServiceError::new(FailureKind::MalformedResponse, err.to_string()))?;
    Ok(StatusReport {
        phase: RemotePhase::parse(&parsed.status),
        progress: clamp_progress(parsed.progress.unwrap_or(0.0)),
        error: parsed.error,
    })
}

fn clamp_progress(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}

use std::time::Duration;

use url::Url;

use crate::types::{FailureKind, ServiceError};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/";

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub base_url: Url,
    pub connect_timeout: Duration,
    /// Applies to status queries.
    pub request_timeout: Duration,
    /// Applies to the whole upload request, body included.
    pub upload_timeout: Duration,
    /// Pause between the end of one status query and the start of the next.
    pub poll_interval: Duration,
    pub upload_chunk_size: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            upload_timeout: Duration::from_secs(600),
            poll_interval: Duration::from_secs(2),
            upload_chunk_size: 64 * 1024,
        }
    }
}

impl ServiceSettings {
    pub fn with_base_url(base_url: Url) -> Self {
        Self {
            base_url,
            ..Self::default()
        }
    }

    /// `POST {base}/api/upload`
    pub fn upload_url(&self) -> Url {
        self.endpoint(&["api", "upload"])
    }

    /// `GET {base}/api/status/{job_id}`
    pub fn status_url(&self, job_id: &str) -> Url {
        self.endpoint(&["api", "status", job_id])
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub(crate) fn build_client(&self, timeout: Duration) -> Result<reqwest::Client, ServiceError> {
        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(timeout)
            .build()
            .map_err(|err| ServiceError::new(FailureKind::Network, err.to_string()))
    }
}

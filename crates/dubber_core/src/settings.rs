use url::Url;

use crate::validate::AssetLimits;

pub const DEFAULT_SERVICE_BASE: &str = "http://localhost:5000/";

/// What happens to the local preview when an upload fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreviewPolicy {
    /// The selection is still valid, so the preview stays playable until reset.
    #[default]
    KeepOnUploadFailure,
    ReleaseOnUploadFailure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSettings {
    pub service_base: Url,
    pub limits: AssetLimits,
    pub preview_policy: PreviewPolicy,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            service_base: Url::parse(DEFAULT_SERVICE_BASE).expect("default service base is a valid url"),
            limits: AssetLimits::default(),
            preview_policy: PreviewPolicy::default(),
        }
    }
}

impl ControllerSettings {
    /// Location of the processed video: `{service_base}/api/result/{job_id}`.
    pub fn result_locator(&self, job_id: &str) -> String {
        let mut url = self.service_base.clone();
        match url.path_segments_mut() {
            Ok(mut segments) => {
                segments.pop_if_empty().extend(["api", "result", job_id]);
            }
            Err(()) => {
                return format!(
                    "{}/api/result/{}",
                    self.service_base.as_str().trim_end_matches('/'),
                    job_id
                );
            }
        }
        url.to_string()
    }
}

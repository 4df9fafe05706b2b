use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dubber_core::{AssetLimits, ControllerSettings, PreviewPolicy, DEFAULT_SERVICE_BASE};
use dubber_engine::ServiceSettings;
use dubber_logging::DEFAULT_LOG_FILE;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub(crate) const DEFAULT_SETTINGS_FILE: &str = "./dubber.ron";

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Error)]
pub(crate) enum SettingsError {
    #[error("could not read settings from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not parse settings in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("invalid service base url {value:?}: {source}")]
    BaseUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid setting {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Contents of the RON settings file. Every field may be omitted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct AppSettings {
    pub base_url: String,
    pub poll_interval_ms: u64,
    pub request_timeout_secs: u64,
    pub upload_timeout_secs: u64,
    pub max_upload_mib: u64,
    pub keep_preview_on_upload_failure: bool,
    pub log_file: PathBuf,
    /// File the settings came from; `None` means built-in defaults.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        let service = ServiceSettings::default();
        Self {
            base_url: DEFAULT_SERVICE_BASE.to_string(),
            poll_interval_ms: service.poll_interval.as_millis() as u64,
            request_timeout_secs: service.request_timeout.as_secs(),
            upload_timeout_secs: service.upload_timeout.as_secs(),
            max_upload_mib: AssetLimits::default().max_bytes / MIB,
            keep_preview_on_upload_failure: true,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            source: None,
        }
    }
}

impl AppSettings {
    /// Loads `explicit` if given, otherwise `./dubber.ron` when it exists.
    /// An explicit file that cannot be read is an error; a missing default
    /// file just means defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = Path::new(DEFAULT_SETTINGS_FILE);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut settings = Self::parse(&text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.check()?;
        settings.source = Some(path.to_path_buf());
        Ok(settings)
    }

    fn parse(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }

    fn check(&self) -> Result<(), SettingsError> {
        if self.poll_interval_ms == 0 {
            return Err(SettingsError::Invalid {
                field: "poll_interval_ms",
                reason: "must be greater than zero",
            });
        }
        if self.max_upload_mib == 0 {
            return Err(SettingsError::Invalid {
                field: "max_upload_mib",
                reason: "must be greater than zero",
            });
        }
        if self.max_upload_mib.checked_mul(MIB).is_none() {
            return Err(SettingsError::Invalid {
                field: "max_upload_mib",
                reason: "is too large",
            });
        }
        if self.request_timeout_secs == 0 || self.upload_timeout_secs == 0 {
            return Err(SettingsError::Invalid {
                field: "timeouts",
                reason: "must be greater than zero",
            });
        }
        Ok(())
    }

    /// Base url to use; the command line wins over the file.
    pub fn base_url(&self, cli_override: Option<&str>) -> Result<Url, SettingsError> {
        let value = cli_override.unwrap_or(&self.base_url);
        let url = Url::parse(value).map_err(|source| SettingsError::BaseUrl {
            value: value.to_string(),
            source,
        })?;
        if url.cannot_be_a_base() {
            return Err(SettingsError::Invalid {
                field: "base_url",
                reason: "must be a hierarchical http(s) url",
            });
        }
        Ok(url)
    }

    pub fn controller_settings(&self, base: Url) -> ControllerSettings {
        ControllerSettings {
            service_base: base,
            limits: AssetLimits {
                max_bytes: self.max_upload_mib.saturating_mul(MIB),
                ..AssetLimits::default()
            },
            preview_policy: if self.keep_preview_on_upload_failure {
                PreviewPolicy::KeepOnUploadFailure
            } else {
                PreviewPolicy::ReleaseOnUploadFailure
            },
        }
    }

    pub fn service_settings(&self, base: Url) -> ServiceSettings {
        ServiceSettings {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            upload_timeout: Duration::from_secs(self.upload_timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            ..ServiceSettings::with_base_url(base)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use dubber_core::MAX_UPLOAD_BYTES;

    use super::*;

    fn settings_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".ron").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_match_library_defaults() {
        let settings = AppSettings::default();
        let base = settings.base_url(None).unwrap();

        assert_eq!(settings.controller_settings(base.clone()), ControllerSettings::default());
        let service = settings.service_settings(base);
        assert_eq!(service.poll_interval, Duration::from_secs(2));
        assert_eq!(settings.max_upload_mib * 1024 * 1024, MAX_UPLOAD_BYTES);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let file = settings_file(
            r#"(
                base_url: "http://dub.local:8000/",
                poll_interval_ms: 500,
                keep_preview_on_upload_failure: false,
            )"#,
        );
        let settings = AppSettings::from_file(file.path()).unwrap();

        assert_eq!(settings.source.as_deref(), Some(file.path()));
        assert_eq!(settings.base_url, "http://dub.local:8000/");
        assert_eq!(settings.poll_interval_ms, 500);
        assert_eq!(settings.upload_timeout_secs, AppSettings::default().upload_timeout_secs);
        let controller = settings.controller_settings(settings.base_url(None).unwrap());
        assert_eq!(controller.preview_policy, PreviewPolicy::ReleaseOnUploadFailure);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let file = settings_file("(pol_interval_ms: 10)");
        assert!(matches!(
            AppSettings::from_file(file.path()),
            Err(SettingsError::Parse { .. })
        ));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let file = settings_file("(poll_interval_ms: 0)");
        assert!(matches!(
            AppSettings::from_file(file.path()),
            Err(SettingsError::Invalid {
                field: "poll_interval_ms",
                ..
            })
        ));
    }

    #[test]
    fn oversized_upload_ceiling_is_rejected() {
        let file = settings_file(&format!("(max_upload_mib: {})", u64::MAX / 1024));
        assert!(matches!(
            AppSettings::from_file(file.path()),
            Err(SettingsError::Invalid {
                field: "max_upload_mib",
                ..
            })
        ));
    }

    #[test]
    fn defaults_have_no_source() {
        assert_eq!(AppSettings::default().source, None);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.ron");
        assert!(matches!(
            AppSettings::load(Some(&missing)),
            Err(SettingsError::Read { .. })
        ));
    }

    #[test]
    fn cli_base_url_overrides_file() {
        let settings = AppSettings::default();
        let url = settings.base_url(Some("https://media.example.com/dub/")).unwrap();
        assert_eq!(url.as_str(), "https://media.example.com/dub/");
        assert!(matches!(
            settings.base_url(Some("not a url")),
            Err(SettingsError::BaseUrl { .. })
        ));
        assert!(matches!(
            settings.base_url(Some("mailto:someone@example.com")),
            Err(SettingsError::Invalid { .. })
        ));
    }

    #[test]
    fn upload_ceiling_follows_file() {
        let file = settings_file("(max_upload_mib: 10)");
        let settings = AppSettings::from_file(file.path()).unwrap();
        let controller = settings.controller_settings(settings.base_url(None).unwrap());
        assert_eq!(controller.limits.max_bytes, 10 * 1024 * 1024);
        assert_eq!(controller.limits.allowed_content_types.len(), 3);
    }
}

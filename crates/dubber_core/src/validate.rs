use std::path::PathBuf;

/// Upload ceiling enforced before any network activity: 100 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// MP4, QuickTime/MOV and AVI.
pub const ALLOWED_CONTENT_TYPES: [&str; 3] = ["video/mp4", "video/quicktime", "video/x-msvideo"];

/// A file the user picked, described by what the platform declares about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub size: u64,
    pub content_type: Option<String>,
}

/// A candidate that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedAsset {
    pub path: PathBuf,
    pub size: u64,
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLimits {
    pub max_bytes: u64,
    pub allowed_content_types: Vec<String>,
}

impl Default for AssetLimits {
    fn default() -> Self {
        Self {
            max_bytes: MAX_UPLOAD_BYTES,
            allowed_content_types: ALLOWED_CONTENT_TYPES
                .iter()
                .map(|ct| ct.to_string())
                .collect(),
        }
    }
}

impl AssetLimits {
    fn is_content_type_allowed(&self, content_type: &str) -> bool {
        let ct = content_type
            .split(';')
            .next()
            .unwrap_or(content_type)
            .trim();
        self.allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ct))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("file size cannot exceed {}MB", max_bytes / (1024 * 1024))]
    FileTooLarge { size: u64, max_bytes: u64 },
    #[error("please upload an MP4, MOV or AVI video")]
    UnsupportedType { content_type: Option<String> },
}

/// Pre-flight check for a selected file. Size is checked before type.
pub fn validate(file: &CandidateFile, limits: &AssetLimits) -> Result<AcceptedAsset, ValidationError> {
    if file.size > limits.max_bytes {
        return Err(ValidationError::FileTooLarge {
            size: file.size,
            max_bytes: limits.max_bytes,
        });
    }

    match file.content_type.as_deref() {
        Some(ct) if limits.is_content_type_allowed(ct) => Ok(AcceptedAsset {
            path: file.path.clone(),
            size: file.size,
            content_type: ct.to_string(),
        }),
        other => Err(ValidationError::UnsupportedType {
            content_type: other.map(ToOwned::to_owned),
        }),
    }
}

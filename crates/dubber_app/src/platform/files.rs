use std::fs;
use std::io;
use std::path::Path;

use dubber_core::CandidateFile;

/// Declared content type of a file on disk, derived from its extension.
pub(crate) fn content_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "mp4" => Some("video/mp4"),
        "mov" => Some("video/quicktime"),
        "avi" => Some("video/x-msvideo"),
        _ => None,
    }
}

pub(crate) fn candidate_from_path(path: &Path) -> io::Result<CandidateFile> {
    let metadata = fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a regular file", path.display()),
        ));
    }
    Ok(CandidateFile {
        path: path.to_path_buf(),
        size: metadata.len(),
        content_type: content_type_for(path).map(str::to_string),
    })
}

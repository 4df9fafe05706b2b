use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use dubber_logging::dub_debug;
use thiserror::Error;

use crate::PreviewId;

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("could not open {path:?} for preview: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Open handle on a selected file, playable before and regardless of the
/// upload. The contents are not read until a player asks for them.
#[derive(Debug)]
pub struct PreviewResource {
    pub path: PathBuf,
    len: u64,
    file: File,
}

impl PreviewResource {
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Independent reader positioned wherever the shared handle is.
    pub fn reader(&self) -> io::Result<File> {
        self.file.try_clone()
    }
}

/// Owns every live preview. Each id is acquired once and released once;
/// releasing an unknown or already released id does nothing.
#[derive(Debug, Default)]
pub struct PreviewStore {
    live: HashMap<PreviewId, PreviewResource>,
}

impl PreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&mut self, id: PreviewId, path: &Path) -> Result<&PreviewResource, PreviewError> {
        let open_err = |source| PreviewError::Open {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(open_err)?;
        let len = file.metadata().map_err(open_err)?.len();

        if self.live.remove(&id).is_some() {
            dub_debug!("Preview {} replaced before release", id);
        }
        Ok(self.live.entry(id).or_insert(PreviewResource {
            path: path.to_path_buf(),
            len,
            file,
        }))
    }

    /// Returns `true` when a live preview was dropped.
    pub fn release(&mut self, id: PreviewId) -> bool {
        self.live.remove(&id).is_some()
    }

    pub fn get(&self, id: PreviewId) -> Option<&PreviewResource> {
        self.live.get(&id)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Drops every live preview; used on teardown.
    pub fn release_all(&mut self) -> usize {
        let count = self.live.len();
        self.live.clear();
        count
    }
}

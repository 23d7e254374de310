//! Download destination decisions

use std::path::{Path, PathBuf};

use super::DownloadId;

/// Chooses where downloads are written
pub trait DownloadDecider {
    /// Destination for a download; `None` cancels it
    fn destination(&mut self, id: DownloadId, suggested_filename: &str) -> Option<PathBuf> {
        let _ = (id, suggested_filename);
        None
    }
}

/// Cancels every download
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultDownloadDecider;

impl DownloadDecider for DefaultDownloadDecider {}

/// Writes downloads into one directory under their suggested name
#[derive(Debug, Clone)]
pub struct DirectoryDownloadDecider {
    directory: PathBuf,
}

impl DirectoryDownloadDecider {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl DownloadDecider for DirectoryDownloadDecider {
    fn destination(&mut self, id: DownloadId, suggested_filename: &str) -> Option<PathBuf> {
        // keep only the final path component of whatever the server suggested
        let name = Path::new(suggested_filename)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty() && *n != "..")
            .map(str::to_owned)
            .unwrap_or_else(|| format!("download-{}", id.raw()));
        Some(self.directory.join(name))
    }
}

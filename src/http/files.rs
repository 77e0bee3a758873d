//! Document root and request path resolution.
//!
//! WARNING: `..` segments in the request target are joined onto the
//! document root as-is, so a client can address files outside of it.

use std::fs::File;
use std::path::PathBuf;

use percent_encoding::percent_decode_str;
use thiserror::Error;

use crate::config::StaticFilesConfig;
use crate::http::mime;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// A directory was requested and it has no index file.
    #[error("directory without index: {0}")]
    Forbidden(PathBuf),
    #[error("no such file: {0}")]
    NotFound(PathBuf),
    #[error("no content type known for {0}")]
    UnknownContentType(PathBuf),
}

/// An opened file ready to be served.
#[derive(Debug)]
pub struct StaticFile {
    pub file: File,
    pub path: PathBuf,
    pub len: u64,
    pub content_type: &'static str,
}

#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
    index_file: String,
    chunk_size: usize,
}

impl StaticFiles {
    pub fn new(config: &StaticFilesConfig) -> Self {
        Self {
            root: config.root.clone(),
            index_file: config.index_file.clone(),
            chunk_size: config.chunk_size,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Maps a request target onto the filesystem.
    ///
    /// Query string and fragment are dropped, the rest is percent-decoded
    /// and each `/`-separated segment is appended to the root.
    pub fn translate_path(&self, target: &str) -> PathBuf {
        let path = target.split('?').next().unwrap_or_default();
        let path = path.split('#').next().unwrap_or_default();
        let decoded = percent_decode_str(path).decode_utf8_lossy();

        let mut resolved = self.root.clone();
        for segment in decoded.split('/').filter(|s| !s.is_empty()) {
            resolved.push(segment);
        }
        resolved
    }

    /// Resolves and opens the file a request target refers to.
    ///
    /// Directories are served through their index file. The file is opened
    /// before the content type is looked up, so an unknown extension only
    /// surfaces for files that exist.
    pub fn open(&self, target: &str) -> Result<StaticFile, ResolveError> {
        let mut path = self.translate_path(target);

        if path.is_dir() {
            path.push(&self.index_file);
            if !path.exists() {
                return Err(ResolveError::Forbidden(path));
            }
        }

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(_) => return Err(ResolveError::NotFound(path)),
        };
        let len = match file.metadata() {
            Ok(meta) => meta.len(),
            Err(_) => return Err(ResolveError::NotFound(path)),
        };

        let content_type = match mime::content_type(&path) {
            Some(ctype) => ctype,
            None => return Err(ResolveError::UnknownContentType(path)),
        };

        Ok(StaticFile {
            file,
            path,
            len,
            content_type,
        })
    }
}

use std::fs;
use std::path::{Path, PathBuf};

use url::Url;

use crate::error::{MirrorError, Result};

pub const INDEX_FILE: &str = "index.html";

/// Name used when an asset URL has no final path segment to name it by.
pub const FALLBACK_ASSET_NAME: &str = "download.bin";

/// Maps URLs onto the destination tree.
///
/// Pages land in folders mirroring their URL path below the destination root;
/// assets land next to the `index.html` of the page that referenced them.
#[derive(Debug, Clone)]
pub struct FileManager {
    base_dir: PathBuf,
}

impl FileManager {
    pub fn new(base_dir: &Path) -> Result<Self> {
        let base_dir = base_dir.to_path_buf();
        ensure_dir(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Folder a page is mirrored into. `/` maps to the destination root itself.
    pub fn page_folder(&self, url: &Url) -> PathBuf {
        let mut path = self.base_dir.clone();
        if let Some(segments) = url.path_segments() {
            for segment in segments.filter(|s| !s.is_empty()) {
                path.push(sanitize_segment(segment));
            }
        }
        path
    }

    /// Writes the page body to `<folder>/index.html`, replacing any previous copy.
    pub fn write_index(&self, folder: &Path, html: &str) -> Result<PathBuf> {
        ensure_dir(folder)?;
        let path = folder.join(INDEX_FILE);
        fs::write(&path, html.as_bytes()).map_err(|e| MirrorError::filesystem(&path, e))?;
        Ok(path)
    }

    /// Destination of an asset inside `folder`, named after the URL's last path segment.
    pub fn asset_path(&self, folder: &Path, url: &Url) -> PathBuf {
        folder.join(asset_file_name(url))
    }
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| MirrorError::filesystem(path, e))
}

pub fn asset_file_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|last| !last.is_empty())
        .map(sanitize_segment)
        .unwrap_or_else(|| FALLBACK_ASSET_NAME.to_string())
}

/// Replaces anything that is unsafe in a single file or folder name.
pub fn sanitize_segment(segment: &str) -> String {
    let sanitized: String = segment
        .chars()
        .map(|c| match c {
            c if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' => c,
            _ => '_',
        })
        .collect();

    match sanitized.as_str() {
        "." | ".." => sanitized.replace('.', "_"),
        _ => sanitized,
    }
}

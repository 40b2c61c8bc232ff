//! Artifact Store
//!
//! Trained artifacts (classifier, feature schema, optional normalizer) live
//! in a remote store and are cached in a local directory. A file already in
//! the cache is used as-is; otherwise it is downloaded once and written
//! atomically (temp file + rename) so a crashed download never leaves a
//! truncated artifact behind.

use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ArtifactError;

/// Download timeout per artifact
const DOWNLOAD_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    base_url: Option<String>,
    cache_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(base_url: Option<String>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_url: base_url.map(|u| u.trim_end_matches('/').to_string()),
            cache_dir: cache_dir.into(),
        }
    }

    /// Local-only store
    pub fn local(cache_dir: impl Into<PathBuf>) -> Self {
        Self::new(None, cache_dir)
    }

    pub fn local_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(name)
    }

    pub fn url_for(&self, name: &str) -> Option<String> {
        self.base_url.as_ref().map(|base| format!("{}/{}", base, name))
    }

    /// Make sure `name` is in the cache, downloading it if needed
    pub fn ensure_local(&self, name: &str) -> Result<PathBuf, ArtifactError> {
        let path = self.local_path(name);
        if path.is_file() {
            log::debug!("Artifact '{}' found in cache", name);
            return Ok(path);
        }

        let url = self.url_for(name).ok_or_else(|| ArtifactError::NotFound {
            name: name.to_string(),
        })?;

        log::info!("Downloading artifact '{}' from {}", name, url);
        let bytes = download(&url).map_err(|message| ArtifactError::Download {
            name: name.to_string(),
            message,
        })?;

        std::fs::create_dir_all(&self.cache_dir)?;
        let tmp_path = self.cache_dir.join(format!(".{}.part", name));
        std::fs::write(&tmp_path, &bytes)?;
        std::fs::rename(&tmp_path, &path)?;

        log::info!("Artifact '{}' cached at {} ({} bytes)", name, path.display(), bytes.len());
        Ok(path)
    }

    /// Read an artifact's bytes, fetching it first if needed
    pub fn read(&self, name: &str) -> Result<Vec<u8>, ArtifactError> {
        let path = self.ensure_local(name)?;
        Ok(std::fs::read(path)?)
    }
}

fn download(url: &str) -> Result<Vec<u8>, String> {
    let response = ureq::get(url)
        .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
        .call()
        .map_err(|e| e.to_string())?;

    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .map_err(|e| e.to_string())?;
    Ok(bytes)
}

//! On-disk cache of extracted document text.
//!
//! Each source gets a directory named after the SHA-256 of its path. Inside
//! it, `extracted.txt` holds the text and `extracted.meta.toml` records the
//! source length, modification time and extraction variant it was built
//! from. Any mismatch is a miss.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

const TEXT_FILE: &str = "extracted.txt";
const META_FILE: &str = "extracted.meta.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSignature {
    pub source_len: u64,
    pub source_modified_unix_secs: Option<u64>,
    /// Distinguishes extractions of the same file with different tools or
    /// OCR settings.
    pub variant: String,
}

impl SourceSignature {
    pub fn of(path: &Path, variant: impl Into<String>) -> Result<Self> {
        let meta = fs::metadata(path)
            .with_context(|| format!("Failed to read source metadata for {}", path.display()))?;

        let modified = meta
            .modified()
            .ok()
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .map(|duration| duration.as_secs());

        Ok(SourceSignature {
            source_len: meta.len(),
            source_modified_unix_secs: modified,
            variant: variant.into(),
        })
    }
}

pub fn hash_dir(cache_root: &Path, source: &Path) -> PathBuf {
    let mut hasher = Sha256::new();
    hasher.update(source.as_os_str().to_string_lossy().as_bytes());
    let hash = format!("{:x}", hasher.finalize());
    cache_root.join(hash)
}

fn cache_paths(cache_root: &Path, source: &Path) -> (PathBuf, PathBuf) {
    let dir = hash_dir(cache_root, source);
    (dir.join(TEXT_FILE), dir.join(META_FILE))
}

/// Cached text for `source`, or `None` when absent or stale.
pub fn read_cached_text(
    cache_root: &Path,
    source: &Path,
    signature: &SourceSignature,
) -> Result<Option<String>> {
    let (text_path, meta_path) = cache_paths(cache_root, source);

    let meta_str = match fs::read_to_string(&meta_path) {
        Ok(v) => v,
        Err(_) => return Ok(None),
    };
    let cached: SourceSignature = match toml::from_str(&meta_str) {
        Ok(v) => v,
        Err(_) => return Ok(None),
    };
    if &cached != signature {
        return Ok(None);
    }

    let text = fs::read_to_string(&text_path)
        .with_context(|| format!("Failed to read cached text at {}", text_path.display()))?;
    Ok(Some(text))
}

pub fn write_cached_text(
    cache_root: &Path,
    source: &Path,
    signature: &SourceSignature,
    text: &str,
) -> Result<()> {
    let (text_path, meta_path) = cache_paths(cache_root, source);
    if let Some(parent) = text_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create cache dir {}", parent.display()))?;
    }

    fs::write(&text_path, text)
        .with_context(|| format!("Failed to write cached text at {}", text_path.display()))?;

    // Metadata goes last so a torn write reads as a miss.
    let meta_toml = toml::to_string(signature).context("Failed to serialize cache metadata")?;
    fs::write(&meta_path, meta_toml).with_context(|| {
        format!("Failed to write cache metadata at {}", meta_path.display())
    })?;

    Ok(())
}

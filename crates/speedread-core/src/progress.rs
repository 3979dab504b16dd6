//! Saved reading positions.
//!
//! A progress record is a small JSON file naming the source document and the
//! word index to resume at. Each save gets its own file named after the
//! document and the save time, so older saves are never overwritten.

use crate::error::{ReaderError, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const PROGRESS_EXTENSION: &str = "json";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H%M%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    #[serde(rename = "caminho_arquivo")]
    pub source: PathBuf,
    #[serde(rename = "indice_palavra", default)]
    pub word_index: usize,
}

impl ProgressRecord {
    pub fn new(source: impl Into<PathBuf>, word_index: usize) -> Self {
        ProgressRecord {
            source: source.into(),
            word_index,
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;
        // serde_json only emits valid UTF-8.
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Parse a record; `origin` only labels errors.
    pub fn decode(data: &str, origin: &Path) -> Result<Self> {
        let record: ProgressRecord =
            serde_json::from_str(data).map_err(|err| ReaderError::ProgressRecordCorrupt {
                path: origin.to_path_buf(),
                reason: err.to_string(),
            })?;
        if record.source.as_os_str().is_empty() {
            return Err(ReaderError::ProgressRecordCorrupt {
                path: origin.to_path_buf(),
                reason: "record does not name a source document".to_string(),
            });
        }
        Ok(record)
    }
}

/// `<source stem>_<YYYY-mm-dd_HHMMSS>.json`
pub fn record_file_name(source: &Path, at: DateTime<Local>) -> String {
    format!("{}.{PROGRESS_EXTENSION}", record_base_name(source, at))
}

fn record_base_name(source: &Path, at: DateTime<Local>) -> String {
    let stem = source
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or("book");
    format!("{stem}_{}", at.format(TIMESTAMP_FORMAT))
}

/// Write `record` into `dir` and return the file's path. A save landing on
/// an existing name gets a `_2`, `_3`, ... suffix instead of replacing it.
pub fn save_progress(dir: &Path, record: &ProgressRecord, at: DateTime<Local>) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|err| ReaderError::io(dir, err))?;
    let base = record_base_name(&record.source, at);
    let contents = record.encode().map_err(|err| {
        ReaderError::io(dir, io::Error::new(io::ErrorKind::InvalidData, err))
    })?;

    let mut attempt = 1u32;
    let (path, mut file) = loop {
        let name = if attempt == 1 {
            format!("{base}.{PROGRESS_EXTENSION}")
        } else {
            format!("{base}_{attempt}.{PROGRESS_EXTENSION}")
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => break (path, file),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(err) => return Err(ReaderError::io(&path, err)),
        }
    };
    file.write_all(contents.as_bytes())
        .map_err(|err| ReaderError::io(&path, err))?;
    info!(
        path = %path.display(),
        source = %record.source.display(),
        index = record.word_index,
        "Saved reading progress"
    );
    Ok(path)
}

pub fn load_progress(path: &Path) -> Result<ProgressRecord> {
    let data = fs::read_to_string(path).map_err(|err| ReaderError::ProgressRecordCorrupt {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    let record = ProgressRecord::decode(&data, path)?;
    info!(
        path = %path.display(),
        source = %record.source.display(),
        index = record.word_index,
        "Loaded reading progress"
    );
    Ok(record)
}

/// Saved records in `dir`, newest first. A missing directory is empty.
pub fn list_progress_records(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };
    let mut records: Vec<(Option<std::time::SystemTime>, PathBuf)> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(PROGRESS_EXTENSION))
        })
        .map(|path| {
            let modified = fs::metadata(&path).and_then(|meta| meta.modified()).ok();
            (modified, path)
        })
        .collect();
    records.sort_by(|a, b| b.cmp(a));
    records.into_iter().map(|(_, path)| path).collect()
}

/// Find the document a record points at. When it has moved, `locate` is
/// asked for a replacement; declining yields `SourceUnresolvable`.
pub fn resolve_source<F>(record: &ProgressRecord, locate: F) -> Result<PathBuf>
where
    F: FnOnce(&Path) -> Option<PathBuf>,
{
    if record.source.exists() {
        return Ok(record.source.clone());
    }
    warn!(
        source = %record.source.display(),
        "Source document from progress record is missing"
    );
    match locate(&record.source) {
        Some(replacement) if replacement.exists() => {
            info!(
                source = %record.source.display(),
                replacement = %replacement.display(),
                "Using replacement source document"
            );
            Ok(replacement)
        }
        _ => Err(ReaderError::SourceUnresolvable {
            path: record.source.clone(),
        }),
    }
}

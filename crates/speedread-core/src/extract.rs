//! Document text extraction.
//!
//! Plain text is read directly. Word documents and PDFs are handed to
//! external tools (pandoc and poppler), with tesseract as a per-page OCR
//! fallback for scanned PDFs. Tool failures are collected with `anyhow`
//! context and surface as [`ReaderError::ExtractionFailure`].

use crate::cache::{SourceSignature, read_cached_text, write_cached_text};
use crate::cancellation::{self, CancellationToken};
use crate::error::{ReaderError, Result};
use crate::tokenizer::{BoundaryStrategy, split_paragraphs};
use anyhow::{Context, bail};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

static RE_PAGES_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^Pages:\s*(\d+)\s*$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    PlainText,
    Word,
    Pdf,
}

impl SourceKind {
    /// Classify by extension, case-insensitively.
    pub fn detect(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match ext.as_deref() {
            Some("txt") => Ok(SourceKind::PlainText),
            Some("docx") => Ok(SourceKind::Word),
            Some("pdf") => Ok(SourceKind::Pdf),
            _ => Err(ReaderError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    pub fn boundary_strategy(self) -> BoundaryStrategy {
        match self {
            SourceKind::PlainText | SourceKind::Word => BoundaryStrategy::Paragraphs,
            SourceKind::Pdf => BoundaryStrategy::Sentences,
        }
    }
}

/// External tool commands and OCR knobs. Built from `AppConfig`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionConfig {
    pub pandoc_cmd: String,
    pub pdftotext_cmd: String,
    pub pdftoppm_cmd: String,
    pub pdfinfo_cmd: String,
    pub ocr_enabled: bool,
    pub tesseract_cmd: String,
    pub ocr_languages: String,
    pub ocr_dpi: u32,
    /// Pages with fewer trimmed characters than this are OCR'd.
    pub ocr_min_page_chars: usize,
    /// `None` disables the extraction cache.
    pub cache_dir: Option<PathBuf>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        crate::config::AppConfig::default().extraction_config()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub kind: SourceKind,
    pub paragraphs: Vec<String>,
    pub strategy: BoundaryStrategy,
}

impl ExtractedText {
    pub fn is_empty(&self) -> bool {
        self.paragraphs.iter().all(|para| para.trim().is_empty())
    }
}

pub fn extract_paragraphs(
    path: &Path,
    config: &ExtractionConfig,
    cancel: Option<&CancellationToken>,
) -> Result<ExtractedText> {
    let kind = SourceKind::detect(path)?;
    if !path.is_file() {
        return Err(ReaderError::ExtractionFailure {
            path: path.to_path_buf(),
            reason: "file does not exist".to_string(),
        });
    }
    cancellation::check(cancel, "extract_start")?;
    info!(path = %path.display(), ?kind, "Extracting document text");

    let paragraphs = match kind {
        SourceKind::PlainText => {
            let data = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))
                .map_err(|err| ReaderError::extraction(path, err))?;
            split_paragraphs(&data)
        }
        SourceKind::Word => {
            let text = cached_or_extract(path, config, "word".to_string(), || {
                convert_with_pandoc(path, config, cancel)
            })?;
            split_paragraphs(&text)
        }
        SourceKind::Pdf => {
            let text = cached_or_extract(path, config, pdf_variant(config), || {
                extract_pdf(path, config, cancel)
            })?;
            if text.trim().is_empty() {
                Vec::new()
            } else {
                vec![text]
            }
        }
    };

    info!(
        path = %path.display(),
        paragraphs = paragraphs.len(),
        total_chars = paragraphs.iter().map(String::len).sum::<usize>(),
        "Finished extraction"
    );
    Ok(ExtractedText {
        kind,
        paragraphs,
        strategy: kind.boundary_strategy(),
    })
}

fn pdf_variant(config: &ExtractionConfig) -> String {
    if config.ocr_enabled {
        format!(
            "pdf+ocr:{}:{}dpi:{}",
            config.ocr_languages, config.ocr_dpi, config.ocr_min_page_chars
        )
    } else {
        "pdf".to_string()
    }
}

fn cached_or_extract<F>(
    path: &Path,
    config: &ExtractionConfig,
    variant: String,
    extract: F,
) -> Result<String>
where
    F: FnOnce() -> Result<String>,
{
    let Some(cache_root) = config.cache_dir.as_deref() else {
        return extract();
    };
    let signature =
        SourceSignature::of(path, variant).map_err(|err| ReaderError::extraction(path, err))?;

    match read_cached_text(cache_root, path, &signature) {
        Ok(Some(text)) => {
            info!(path = %path.display(), "Using cached extraction");
            return Ok(text);
        }
        Ok(None) => {}
        Err(err) => warn!(path = %path.display(), "Ignoring unreadable extraction cache: {err:#}"),
    }

    let text = extract()?;
    if let Err(err) = write_cached_text(cache_root, path, &signature, &text) {
        warn!(path = %path.display(), "Failed to cache extracted text: {err:#}");
    }
    Ok(text)
}

fn convert_with_pandoc(
    path: &Path,
    config: &ExtractionConfig,
    cancel: Option<&CancellationToken>,
) -> Result<String> {
    cancellation::check(cancel, "pandoc")?;
    info!(path = %path.display(), "Converting document to plain text with pandoc");
    let mut command = Command::new(&config.pandoc_cmd);
    command
        .arg(path)
        .arg("--to")
        .arg("plain")
        .arg("--wrap=none");
    run_tool(&mut command, &config.pandoc_cmd).map_err(|err| ReaderError::extraction(path, err))
}

fn extract_pdf(
    path: &Path,
    config: &ExtractionConfig,
    cancel: Option<&CancellationToken>,
) -> Result<String> {
    cancellation::check(cancel, "pdfinfo")?;
    let pages = pdf_page_count(path, config).map_err(|err| ReaderError::extraction(path, err))?;
    info!(path = %path.display(), pages, "Extracting PDF pages");

    let mut texts = Vec::with_capacity(pages);
    let mut ocr_pages = 0usize;
    for page in 1..=pages {
        cancellation::check(cancel, "pdf_page")?;
        let text = pdftotext_page(path, page, config)
            .map_err(|err| ReaderError::extraction(path, err))?;

        let text = if config.ocr_enabled && text.trim().chars().count() < config.ocr_min_page_chars
        {
            cancellation::check(cancel, "ocr_page")?;
            match ocr_page(path, page, config) {
                Ok(ocr) if !ocr.trim().is_empty() => {
                    ocr_pages += 1;
                    debug!(page, chars = ocr.len(), "OCR recovered page text");
                    ocr
                }
                Ok(_) => text,
                Err(OcrError::EngineMissing(err)) => {
                    return Err(ReaderError::extraction(path, err));
                }
                Err(OcrError::Page(err)) => {
                    warn!(page, "OCR failed, keeping extracted page text: {err:#}");
                    text
                }
            }
        } else {
            text
        };

        let text = text.trim();
        if !text.is_empty() {
            texts.push(text.to_string());
        }
    }

    info!(pages, ocr_pages, "Finished PDF extraction");
    Ok(texts.join("\n\n"))
}

fn pdf_page_count(path: &Path, config: &ExtractionConfig) -> anyhow::Result<usize> {
    let mut command = Command::new(&config.pdfinfo_cmd);
    command.arg(path);
    let info = run_tool(&mut command, &config.pdfinfo_cmd)?;
    match parse_page_count(&info) {
        Some(pages) => Ok(pages),
        None => bail!("{} did not report a page count", config.pdfinfo_cmd),
    }
}

fn parse_page_count(info: &str) -> Option<usize> {
    RE_PAGES_LINE
        .captures(info)
        .and_then(|caps| caps.get(1))
        .and_then(|pages| pages.as_str().parse().ok())
}

fn pdftotext_page(path: &Path, page: usize, config: &ExtractionConfig) -> anyhow::Result<String> {
    let page = page.to_string();
    let mut command = Command::new(&config.pdftotext_cmd);
    command
        .arg("-f")
        .arg(&page)
        .arg("-l")
        .arg(&page)
        .arg("-enc")
        .arg("UTF-8")
        .arg(path)
        .arg("-");
    run_tool(&mut command, &config.pdftotext_cmd)
}

enum OcrError {
    /// The OCR engine itself could not be started.
    EngineMissing(anyhow::Error),
    Page(anyhow::Error),
}

fn ocr_page(path: &Path, page: usize, config: &ExtractionConfig) -> Result<String, OcrError> {
    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    let work_dir =
        std::env::temp_dir().join(format!("speedread-ocr-{}-{page}-{nonce}", std::process::id()));
    fs::create_dir_all(&work_dir)
        .with_context(|| format!("Failed to create OCR work dir {}", work_dir.display()))
        .map_err(OcrError::Page)?;

    let result = render_and_recognize(path, page, config, &work_dir);
    let _ = fs::remove_dir_all(&work_dir);
    result
}

fn render_and_recognize(
    path: &Path,
    page: usize,
    config: &ExtractionConfig,
    work_dir: &Path,
) -> Result<String, OcrError> {
    let prefix = work_dir.join("page");
    let page_arg = page.to_string();
    let mut render = Command::new(&config.pdftoppm_cmd);
    render
        .arg("-r")
        .arg(config.ocr_dpi.to_string())
        .arg("-f")
        .arg(&page_arg)
        .arg("-l")
        .arg(&page_arg)
        .arg("-png")
        .arg("-singlefile")
        .arg(path)
        .arg(&prefix);
    run_tool(&mut render, &config.pdftoppm_cmd).map_err(OcrError::Page)?;

    let image = prefix.with_extension("png");
    let mut recognize = Command::new(&config.tesseract_cmd);
    recognize
        .arg(&image)
        .arg("stdout")
        .arg("-l")
        .arg(&config.ocr_languages);
    run_tool(&mut recognize, &config.tesseract_cmd).map_err(|err| {
        if is_not_found(&err) {
            OcrError::EngineMissing(err)
        } else {
            OcrError::Page(err)
        }
    })
}

fn is_not_found(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<std::io::Error>()
            .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound)
    })
}

/// Run an external tool and return its stdout as UTF-8.
fn run_tool(command: &mut Command, name: &str) -> anyhow::Result<String> {
    let output = command
        .output()
        .with_context(|| format!("Failed to start {name}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("{name} exited with {}: {}", output.status, stderr.trim());
    }

    String::from_utf8(output.stdout).with_context(|| format!("{name} returned non-UTF8 text"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(label: &str) -> PathBuf {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be after epoch")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("speedread-extract-{label}-{nonce}"));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn no_cache() -> ExtractionConfig {
        ExtractionConfig {
            cache_dir: None,
            ..ExtractionConfig::default()
        }
    }

    #[test]
    fn detects_kind_by_extension_case_insensitively() {
        assert_eq!(
            SourceKind::detect(Path::new("a/B.TXT")).unwrap(),
            SourceKind::PlainText
        );
        assert_eq!(
            SourceKind::detect(Path::new("report.Docx")).unwrap(),
            SourceKind::Word
        );
        assert_eq!(
            SourceKind::detect(Path::new("scan.pdf")).unwrap(),
            SourceKind::Pdf
        );
        for unsupported in ["book.epub", "notes.md", "noext"] {
            assert!(matches!(
                SourceKind::detect(Path::new(unsupported)),
                Err(ReaderError::UnsupportedFormat { .. })
            ));
        }
    }

    #[test]
    fn plain_text_splits_on_blank_lines() {
        let dir = temp_dir("txt");
        let path = dir.join("book.txt");
        fs::write(&path, "Hello world.\n\n\n  \nSecond paragraph\nhere.\n").unwrap();

        let extracted = extract_paragraphs(&path, &no_cache(), None).unwrap();

        assert_eq!(extracted.kind, SourceKind::PlainText);
        assert_eq!(extracted.strategy, BoundaryStrategy::Paragraphs);
        assert_eq!(
            extracted.paragraphs,
            vec!["Hello world.", "Second paragraph\nhere."]
        );
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn unsupported_extension_is_rejected_before_reading() {
        let dir = temp_dir("unsupported");
        let path = dir.join("book.epub");
        fs::write(&path, "irrelevant").unwrap();
        assert!(matches!(
            extract_paragraphs(&path, &no_cache(), None),
            Err(ReaderError::UnsupportedFormat { .. })
        ));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_is_an_extraction_failure() {
        let path = temp_dir("missing").join("gone.txt");
        match extract_paragraphs(&path, &no_cache(), None) {
            Err(ReaderError::ExtractionFailure { path: failed, .. }) => assert_eq!(failed, path),
            other => panic!("expected extraction failure, got {other:?}"),
        }
    }

    #[test]
    fn missing_converter_is_an_extraction_failure() {
        let dir = temp_dir("nopandoc");
        let path = dir.join("doc.docx");
        fs::write(&path, "not really a docx").unwrap();
        let config = ExtractionConfig {
            pandoc_cmd: "speedread-test-no-such-pandoc".to_string(),
            ..no_cache()
        };
        match extract_paragraphs(&path, &config, None) {
            Err(ReaderError::ExtractionFailure { reason, .. }) => {
                assert!(reason.contains("speedread-test-no-such-pandoc"), "{reason}")
            }
            other => panic!("expected extraction failure, got {other:?}"),
        }
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn cancelled_token_stops_before_extracting() {
        let dir = temp_dir("cancel");
        let path = dir.join("book.txt");
        fs::write(&path, "words").unwrap();
        let token = CancellationToken::new();
        token.cancel();
        assert!(matches!(
            extract_paragraphs(&path, &no_cache(), Some(&token)),
            Err(ReaderError::Cancelled { .. })
        ));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn cached_word_text_skips_the_converter() {
        let dir = temp_dir("cached");
        let path = dir.join("doc.docx");
        fs::write(&path, "binary").unwrap();
        let cache_root = dir.join(".cache");
        let signature = SourceSignature::of(&path, "word").unwrap();
        write_cached_text(&cache_root, &path, &signature, "First.\n\nSecond.").unwrap();

        let config = ExtractionConfig {
            pandoc_cmd: "speedread-test-no-such-pandoc".to_string(),
            cache_dir: Some(cache_root),
            ..ExtractionConfig::default()
        };
        let extracted = extract_paragraphs(&path, &config, None).unwrap();
        assert_eq!(extracted.paragraphs, vec!["First.", "Second."]);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn parses_pdfinfo_page_count() {
        let info = "Title:          Scan\nProducer:       x\nPages:          12\nEncrypted:      no\n";
        assert_eq!(parse_page_count(info), Some(12));
        assert_eq!(parse_page_count("Title: none\n"), None);
    }

    #[test]
    fn pdf_variant_tracks_ocr_settings() {
        let mut config = no_cache();
        let with_ocr = pdf_variant(&config);
        config.ocr_languages = "eng".to_string();
        assert_ne!(pdf_variant(&config), with_ocr);
        config.ocr_enabled = false;
        assert_eq!(pdf_variant(&config), "pdf");
    }
}

use crate::extract::ExtractionConfig;
use crate::playback::PaceRamp;
use crate::tokenizer::{CasePolicy, TokenizerOptions};
use serde::Deserialize;
use std::path::PathBuf;

/// Flat view of every configurable knob; see `tables` for the file layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub log_level: LogLevel,
    pub ramp_floor_wpm: u32,
    pub ramp_step_wpm: u32,
    pub word_jump: usize,
    pub case_policy: CasePolicy,
    pub unicode_nfc: bool,
    pub rejoin_hyphens: bool,
    pub strip_footnote_markers: bool,
    pub pandoc_cmd: String,
    pub pdftotext_cmd: String,
    pub pdftoppm_cmd: String,
    pub pdfinfo_cmd: String,
    pub ocr_enabled: bool,
    pub tesseract_cmd: String,
    pub ocr_languages: String,
    pub ocr_dpi: u32,
    pub ocr_min_page_chars: usize,
    pub extraction_cache: bool,
    pub data_dir: String,
    pub cache_dir: String,
    pub progress_dir: String,
    pub settings_file: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            log_level: crate::config::defaults::default_log_level(),
            ramp_floor_wpm: crate::config::defaults::default_ramp_floor_wpm(),
            ramp_step_wpm: crate::config::defaults::default_ramp_step_wpm(),
            word_jump: crate::config::defaults::default_word_jump(),
            case_policy: crate::config::defaults::default_case_policy(),
            unicode_nfc: true,
            rejoin_hyphens: true,
            strip_footnote_markers: true,
            pandoc_cmd: crate::config::defaults::default_pandoc_cmd(),
            pdftotext_cmd: crate::config::defaults::default_pdftotext_cmd(),
            pdftoppm_cmd: crate::config::defaults::default_pdftoppm_cmd(),
            pdfinfo_cmd: crate::config::defaults::default_pdfinfo_cmd(),
            ocr_enabled: true,
            tesseract_cmd: crate::config::defaults::default_tesseract_cmd(),
            ocr_languages: crate::config::defaults::default_ocr_languages(),
            ocr_dpi: crate::config::defaults::default_ocr_dpi(),
            ocr_min_page_chars: crate::config::defaults::default_ocr_min_page_chars(),
            extraction_cache: true,
            data_dir: crate::config::defaults::default_data_dir(),
            cache_dir: crate::config::defaults::default_cache_dir(),
            progress_dir: crate::config::defaults::default_progress_dir(),
            settings_file: crate::config::defaults::default_settings_file(),
        }
    }
}

impl AppConfig {
    pub fn pace_ramp(&self) -> PaceRamp {
        PaceRamp {
            floor: self.ramp_floor_wpm.max(1),
            step: self.ramp_step_wpm,
        }
    }

    pub fn tokenizer_options(&self) -> TokenizerOptions {
        TokenizerOptions {
            case: self.case_policy,
            unicode_nfc: self.unicode_nfc,
            rejoin_hyphens: self.rejoin_hyphens,
            strip_footnote_markers: self.strip_footnote_markers,
        }
    }

    pub fn extraction_config(&self) -> ExtractionConfig {
        ExtractionConfig {
            pandoc_cmd: self.pandoc_cmd.clone(),
            pdftotext_cmd: self.pdftotext_cmd.clone(),
            pdftoppm_cmd: self.pdftoppm_cmd.clone(),
            pdfinfo_cmd: self.pdfinfo_cmd.clone(),
            ocr_enabled: self.ocr_enabled,
            tesseract_cmd: self.tesseract_cmd.clone(),
            ocr_languages: self.ocr_languages.clone(),
            ocr_dpi: self.ocr_dpi,
            ocr_min_page_chars: self.ocr_min_page_chars,
            cache_dir: self.extraction_cache.then(|| self.cache_path()),
        }
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn cache_path(&self) -> PathBuf {
        self.data_path().join(&self.cache_dir)
    }

    pub fn progress_path(&self) -> PathBuf {
        self.data_path().join(&self.progress_dir)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_path().join(&self.settings_file)
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

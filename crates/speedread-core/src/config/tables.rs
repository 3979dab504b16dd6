use super::defaults;
use super::models::{AppConfig, LogLevel};
use crate::tokenizer::CasePolicy;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize, serde::Serialize)]
pub(super) struct ConfigTables {
    #[serde(default)]
    logging: LoggingConfig,
    #[serde(default)]
    playback: PlaybackConfig,
    #[serde(default)]
    tokenizer: TokenizerConfig,
    #[serde(default)]
    extraction: ExtractionTable,
    #[serde(default)]
    storage: StorageConfig,
}

impl From<ConfigTables> for AppConfig {
    fn from(tables: ConfigTables) -> Self {
        AppConfig {
            log_level: tables.logging.log_level,
            ramp_floor_wpm: tables.playback.ramp_floor_wpm,
            ramp_step_wpm: tables.playback.ramp_step_wpm,
            word_jump: tables.playback.word_jump.max(1),
            case_policy: tables.tokenizer.case_policy,
            unicode_nfc: tables.tokenizer.unicode_nfc,
            rejoin_hyphens: tables.tokenizer.rejoin_hyphens,
            strip_footnote_markers: tables.tokenizer.strip_footnote_markers,
            pandoc_cmd: tables.extraction.pandoc_cmd,
            pdftotext_cmd: tables.extraction.pdftotext_cmd,
            pdftoppm_cmd: tables.extraction.pdftoppm_cmd,
            pdfinfo_cmd: tables.extraction.pdfinfo_cmd,
            ocr_enabled: tables.extraction.ocr_enabled,
            tesseract_cmd: tables.extraction.tesseract_cmd,
            ocr_languages: tables.extraction.ocr_languages,
            ocr_dpi: tables.extraction.ocr_dpi,
            ocr_min_page_chars: tables.extraction.ocr_min_page_chars,
            extraction_cache: tables.extraction.cache,
            data_dir: tables.storage.data_dir,
            cache_dir: tables.storage.cache_dir,
            progress_dir: tables.storage.progress_dir,
            settings_file: tables.storage.settings_file,
        }
    }
}

impl From<&AppConfig> for ConfigTables {
    fn from(config: &AppConfig) -> Self {
        ConfigTables {
            logging: LoggingConfig {
                log_level: config.log_level,
            },
            playback: PlaybackConfig {
                ramp_floor_wpm: config.ramp_floor_wpm,
                ramp_step_wpm: config.ramp_step_wpm,
                word_jump: config.word_jump,
            },
            tokenizer: TokenizerConfig {
                case_policy: config.case_policy,
                unicode_nfc: config.unicode_nfc,
                rejoin_hyphens: config.rejoin_hyphens,
                strip_footnote_markers: config.strip_footnote_markers,
            },
            extraction: ExtractionTable {
                pandoc_cmd: config.pandoc_cmd.clone(),
                pdftotext_cmd: config.pdftotext_cmd.clone(),
                pdftoppm_cmd: config.pdftoppm_cmd.clone(),
                pdfinfo_cmd: config.pdfinfo_cmd.clone(),
                ocr_enabled: config.ocr_enabled,
                tesseract_cmd: config.tesseract_cmd.clone(),
                ocr_languages: config.ocr_languages.clone(),
                ocr_dpi: config.ocr_dpi,
                ocr_min_page_chars: config.ocr_min_page_chars,
                cache: config.extraction_cache,
            },
            storage: StorageConfig {
                data_dir: config.data_dir.clone(),
                cache_dir: config.cache_dir.clone(),
                progress_dir: config.progress_dir.clone(),
                settings_file: config.settings_file.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_level: defaults::default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct PlaybackConfig {
    #[serde(default = "defaults::default_ramp_floor_wpm")]
    ramp_floor_wpm: u32,
    #[serde(default = "defaults::default_ramp_step_wpm")]
    ramp_step_wpm: u32,
    #[serde(default = "defaults::default_word_jump")]
    word_jump: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        PlaybackConfig {
            ramp_floor_wpm: defaults::default_ramp_floor_wpm(),
            ramp_step_wpm: defaults::default_ramp_step_wpm(),
            word_jump: defaults::default_word_jump(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct TokenizerConfig {
    #[serde(default = "defaults::default_case_policy")]
    case_policy: CasePolicy,
    #[serde(default = "defaults::default_true")]
    unicode_nfc: bool,
    #[serde(default = "defaults::default_true")]
    rejoin_hyphens: bool,
    #[serde(default = "defaults::default_true")]
    strip_footnote_markers: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        TokenizerConfig {
            case_policy: defaults::default_case_policy(),
            unicode_nfc: true,
            rejoin_hyphens: true,
            strip_footnote_markers: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct ExtractionTable {
    #[serde(default = "defaults::default_pandoc_cmd")]
    pandoc_cmd: String,
    #[serde(default = "defaults::default_pdftotext_cmd")]
    pdftotext_cmd: String,
    #[serde(default = "defaults::default_pdftoppm_cmd")]
    pdftoppm_cmd: String,
    #[serde(default = "defaults::default_pdfinfo_cmd")]
    pdfinfo_cmd: String,
    #[serde(default = "defaults::default_true")]
    ocr_enabled: bool,
    #[serde(default = "defaults::default_tesseract_cmd")]
    tesseract_cmd: String,
    #[serde(default = "defaults::default_ocr_languages")]
    ocr_languages: String,
    #[serde(default = "defaults::default_ocr_dpi")]
    ocr_dpi: u32,
    #[serde(default = "defaults::default_ocr_min_page_chars")]
    ocr_min_page_chars: usize,
    #[serde(default = "defaults::default_true")]
    cache: bool,
}

impl Default for ExtractionTable {
    fn default() -> Self {
        ExtractionTable {
            pandoc_cmd: defaults::default_pandoc_cmd(),
            pdftotext_cmd: defaults::default_pdftotext_cmd(),
            pdftoppm_cmd: defaults::default_pdftoppm_cmd(),
            pdfinfo_cmd: defaults::default_pdfinfo_cmd(),
            ocr_enabled: true,
            tesseract_cmd: defaults::default_tesseract_cmd(),
            ocr_languages: defaults::default_ocr_languages(),
            ocr_dpi: defaults::default_ocr_dpi(),
            ocr_min_page_chars: defaults::default_ocr_min_page_chars(),
            cache: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct StorageConfig {
    #[serde(default = "defaults::default_data_dir")]
    data_dir: String,
    #[serde(default = "defaults::default_cache_dir")]
    cache_dir: String,
    #[serde(default = "defaults::default_progress_dir")]
    progress_dir: String,
    #[serde(default = "defaults::default_settings_file")]
    settings_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            data_dir: defaults::default_data_dir(),
            cache_dir: defaults::default_cache_dir(),
            progress_dir: defaults::default_progress_dir(),
            settings_file: defaults::default_settings_file(),
        }
    }
}

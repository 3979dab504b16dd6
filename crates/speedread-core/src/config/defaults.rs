use crate::tokenizer::CasePolicy;

pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Info
}

pub(crate) fn default_ramp_floor_wpm() -> u32 {
    100
}

pub(crate) fn default_ramp_step_wpm() -> u32 {
    25
}

pub(crate) fn default_word_jump() -> usize {
    crate::navigator::DEFAULT_WORD_STEP
}

pub(crate) fn default_case_policy() -> CasePolicy {
    CasePolicy::Preserve
}

pub(crate) fn default_true() -> bool {
    true
}

pub(crate) fn default_pandoc_cmd() -> String {
    "pandoc".to_string()
}

pub(crate) fn default_pdftotext_cmd() -> String {
    "pdftotext".to_string()
}

pub(crate) fn default_pdftoppm_cmd() -> String {
    "pdftoppm".to_string()
}

pub(crate) fn default_pdfinfo_cmd() -> String {
    "pdfinfo".to_string()
}

pub(crate) fn default_tesseract_cmd() -> String {
    "tesseract".to_string()
}

pub(crate) fn default_ocr_languages() -> String {
    "por+eng".to_string()
}

pub(crate) fn default_ocr_dpi() -> u32 {
    300
}

pub(crate) fn default_ocr_min_page_chars() -> usize {
    50
}

pub(crate) fn default_data_dir() -> String {
    ".".to_string()
}

pub(crate) fn default_cache_dir() -> String {
    ".cache".to_string()
}

pub(crate) fn default_progress_dir() -> String {
    "progress_saves".to_string()
}

pub(crate) fn default_settings_file() -> String {
    "config/settings.json".to_string()
}

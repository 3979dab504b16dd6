//! User-facing reading settings.
//!
//! `Settings` is a plain value: changing a field produces a new value. The
//! on-disk field names are the ones existing `settings.json` files already
//! use, and each field is read on its own so one bad value only resets that
//! field.

use crate::error::{ReaderError, Result};
use crate::playback::clamp_target_pace;
use serde::de::{DeserializeOwned, Error as _};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

pub const MIN_FONT_SIZE: u32 = 10;
pub const MAX_FONT_SIZE: u32 = 100;

const FIELD_READING_PACE: &str = "velocidade_leitura";
const FIELD_TEXT_COLOR: &str = "cor_texto";
const FIELD_BACKGROUND_COLOR: &str = "cor_fundo";
const FIELD_FONT_SIZE: &str = "tamanho_fonte";
const FIELD_FONT_FAMILY: &str = "nome_fonte";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    /// Target pace in words per minute.
    #[serde(rename = "velocidade_leitura")]
    pub reading_pace: u32,
    #[serde(rename = "cor_texto")]
    pub text_color: String,
    #[serde(rename = "cor_fundo")]
    pub background_color: String,
    #[serde(rename = "tamanho_fonte")]
    pub font_size: u32,
    #[serde(rename = "nome_fonte")]
    pub font_family: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            reading_pace: default_reading_pace(),
            text_color: default_text_color(),
            background_color: default_background_color(),
            font_size: default_font_size(),
            font_family: default_font_family(),
        }
    }
}

impl Settings {
    pub fn with_reading_pace(self, wpm: u32) -> Self {
        Settings {
            reading_pace: clamp_target_pace(wpm),
            ..self
        }
    }

    pub fn with_text_color(self, color: impl Into<String>) -> Self {
        Settings {
            text_color: non_blank_or(color.into(), self.text_color.clone()),
            ..self
        }
    }

    pub fn with_background_color(self, color: impl Into<String>) -> Self {
        Settings {
            background_color: non_blank_or(color.into(), self.background_color.clone()),
            ..self
        }
    }

    pub fn with_font_size(self, size: u32) -> Self {
        Settings {
            font_size: size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE),
            ..self
        }
    }

    pub fn with_font_family(self, family: impl Into<String>) -> Self {
        Settings {
            font_family: non_blank_or(family.into(), self.font_family.clone()),
            ..self
        }
    }

    /// Bring hand-edited values back into range.
    pub fn sanitized(self) -> Self {
        let pace = self.reading_pace;
        let size = self.font_size;
        self.with_reading_pace(pace).with_font_size(size)
    }

    /// Pretty JSON with a four-space indent, like the progress records.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Parse a settings object. Missing, unknown or mistyped fields fall back
    /// to their defaults; only input that is not a JSON object is an error.
    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        let Value::Object(fields) = serde_json::from_str::<Value>(data)? else {
            return Err(serde_json::Error::custom("settings must be a JSON object"));
        };
        let defaults = Settings::default();
        let settings = Settings {
            reading_pace: field_or(&fields, FIELD_READING_PACE, defaults.reading_pace),
            text_color: field_or(&fields, FIELD_TEXT_COLOR, defaults.text_color),
            background_color: field_or(&fields, FIELD_BACKGROUND_COLOR, defaults.background_color),
            font_size: field_or(&fields, FIELD_FONT_SIZE, defaults.font_size),
            font_family: field_or(&fields, FIELD_FONT_FAMILY, defaults.font_family),
        };
        Ok(settings.sanitized())
    }
}

fn field_or<T: DeserializeOwned>(fields: &Map<String, Value>, key: &str, fallback: T) -> T {
    let Some(raw) = fields.get(key) else {
        return fallback;
    };
    match T::deserialize(raw) {
        Ok(value) => value,
        Err(err) => {
            warn!(field = key, "Ignoring invalid settings value: {err}");
            fallback
        }
    }
}

/// Load settings, falling back to defaults when the file is missing or
/// unreadable.
pub fn load_settings(path: &Path) -> Settings {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) => {
            info!(path = %path.display(), "Using default settings: {err}");
            return Settings::default();
        }
    };
    match Settings::from_json(&data) {
        Ok(settings) => {
            debug!(path = %path.display(), "Loaded settings");
            settings
        }
        Err(err) => {
            warn!(path = %path.display(), "Invalid settings JSON: {err}");
            Settings::default()
        }
    }
}

pub fn save_settings(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| ReaderError::io(parent, err))?;
    }
    let contents = settings.to_json().map_err(|err| {
        ReaderError::io(path, std::io::Error::new(std::io::ErrorKind::InvalidData, err))
    })?;
    fs::write(path, contents).map_err(|err| ReaderError::io(path, err))?;
    info!(path = %path.display(), pace = settings.reading_pace, "Saved settings");
    Ok(())
}

fn non_blank_or(value: String, fallback: String) -> String {
    if value.trim().is_empty() {
        fallback
    } else {
        value.trim().to_string()
    }
}

fn default_reading_pace() -> u32 {
    300
}

fn default_text_color() -> String {
    "blue".to_string()
}

fn default_background_color() -> String {
    "white".to_string()
}

fn default_font_size() -> u32 {
    48
}

fn default_font_family() -> String {
    "Arial".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(name: &str) -> std::path::PathBuf {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be after epoch")
            .as_nanos();
        std::env::temp_dir()
            .join(format!("speedread-settings-{nonce}"))
            .join(name)
    }

    #[test]
    fn json_uses_legacy_field_names() {
        let json = Settings::default().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["velocidade_leitura"], 300);
        assert_eq!(value["cor_texto"], "blue");
        assert_eq!(value["cor_fundo"], "white");
        assert_eq!(value["tamanho_fonte"], 48);
        assert_eq!(value["nome_fonte"], "Arial");
    }

    #[test]
    fn missing_fields_fall_back_per_field() {
        let settings = Settings::from_json(r##"{"cor_fundo": "#000000"}"##).unwrap();
        assert_eq!(settings.background_color, "#000000");
        assert_eq!(settings.reading_pace, 300);
        assert_eq!(settings.font_family, "Arial");
    }

    #[test]
    fn mistyped_field_keeps_the_other_fields() {
        let settings = Settings::from_json(
            r#"{"velocidade_leitura": 350.0, "cor_texto": "red", "tamanho_fonte": 30, "extra": 1}"#,
        )
        .unwrap();
        assert_eq!(settings.reading_pace, 300);
        assert_eq!(settings.text_color, "red");
        assert_eq!(settings.font_size, 30);
        assert_eq!(settings.font_family, "Arial");
    }

    #[test]
    fn non_object_json_is_rejected() {
        assert!(Settings::from_json("[1, 2, 3]").is_err());
    }

    #[test]
    fn json_is_indented_with_four_spaces() {
        let json = Settings::default().to_json().unwrap();
        assert!(json.contains("\n    \"velocidade_leitura\": 300"));
        assert!(!json.contains("\n  \"cor_texto\""));
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let settings =
            Settings::from_json(r#"{"velocidade_leitura": 5000, "tamanho_fonte": 2}"#).unwrap();
        assert_eq!(settings.reading_pace, 1000);
        assert_eq!(settings.font_size, 10);
    }

    #[test]
    fn builders_return_new_values() {
        let base = Settings::default();
        let changed = base
            .clone()
            .with_reading_pace(450)
            .with_text_color("#ff0000")
            .with_font_family("  ")
            .with_font_size(200);
        assert_eq!(base.reading_pace, 300);
        assert_eq!(changed.reading_pace, 450);
        assert_eq!(changed.text_color, "#ff0000");
        assert_eq!(changed.font_family, "Arial");
        assert_eq!(changed.font_size, MAX_FONT_SIZE);
    }

    #[test]
    fn missing_or_corrupt_file_yields_defaults() {
        let path = temp_path("settings.json");
        assert_eq!(load_settings(&path), Settings::default());

        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_settings(&path), Settings::default());

        fs::write(&path, r#"{"cor_fundo": 7, "nome_fonte": "Georgia"}"#).unwrap();
        let loaded = load_settings(&path);
        assert_eq!(loaded.background_color, "white");
        assert_eq!(loaded.font_family, "Georgia");

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn save_then_load_round_trips() {
        let path = temp_path("config/settings.json");
        let settings = Settings::default()
            .with_reading_pace(550)
            .with_background_color("black");

        save_settings(&path, &settings).unwrap();
        assert_eq!(load_settings(&path), settings);

        let _ = fs::remove_dir_all(path.parent().unwrap().parent().unwrap());
    }
}

use super::models::AppConfig;
use super::tables::ConfigTables;
use crate::error::{ReaderError, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Load configuration from disk, falling back to defaults on any failure.
pub fn load_config(path: &Path) -> AppConfig {
    let contents = match fs::read_to_string(path) {
        Ok(data) => {
            info!(path = %path.display(), "Loaded base config");
            data
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                "Falling back to default config: {err}"
            );
            return AppConfig::default();
        }
    };

    match parse_config(&contents) {
        Ok(cfg) => {
            debug!(level = %cfg.log_level, "Parsed configuration from disk");
            cfg
        }
        Err(err) => {
            warn!(path = %path.display(), "Invalid config TOML: {err}");
            AppConfig::default()
        }
    }
}

pub fn parse_config(contents: &str) -> Result<AppConfig, toml::de::Error> {
    toml::from_str::<ConfigTables>(contents).map(AppConfig::from)
}

pub fn serialize_config(config: &AppConfig) -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(&ConfigTables::from(config))
}

/// Write `config` as sectioned TOML, creating parent directories.
pub fn save_config(path: &Path, config: &AppConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| ReaderError::io(parent, err))?;
    }
    let contents = serialize_config(config).map_err(|err| {
        ReaderError::io(path, std::io::Error::new(std::io::ErrorKind::InvalidData, err))
    })?;
    fs::write(path, contents).map_err(|err| ReaderError::io(path, err))?;
    info!(path = %path.display(), "Wrote config");
    Ok(())
}

//! Application configuration for the reader.
//!
//! Loaded from `conf/config.toml` when present. The file is organised in
//! tables (`[playback]`, `[tokenizer]`, `[extraction]`, `[storage]`,
//! `[logging]`) that flatten into [`AppConfig`]. Missing or invalid entries
//! fall back to defaults so the reader can always start.

mod defaults;
mod io;
mod models;
mod tables;

pub use io::{load_config, parse_config, save_config, serialize_config};
pub use models::{AppConfig, LogLevel};

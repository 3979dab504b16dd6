//! Core of the speed reader: extraction, tokenization, paced playback,
//! navigation and persistence. No terminal or UI code lives here.

pub mod cache;
pub mod cancellation;
pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod navigator;
pub mod playback;
pub mod progress;
pub mod scheduler;
pub mod session;
pub mod settings;
pub mod tokenizer;

pub use document::Document;
pub use error::{ReaderError, Result};
pub use session::{ReaderSession, ReaderSnapshot, SessionCommand, SessionEvent};
pub use settings::Settings;

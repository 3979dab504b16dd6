use crate::error::{ReaderError, Result};
use crate::extract::ExtractedText;
use crate::navigator::paragraph_of;
use crate::tokenizer::{
    BoundaryStrategy, TokenizedText, TokenizerOptions, tokenize_continuous, tokenize_paragraphs,
};
use std::path::{Path, PathBuf};

/// A tokenized document ready for playback. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    source: PathBuf,
    tokens: Vec<String>,
    boundaries: Vec<usize>,
}

impl Document {
    pub fn from_paragraphs<S: AsRef<str>>(
        source: impl Into<PathBuf>,
        paragraphs: &[S],
        options: &TokenizerOptions,
    ) -> Result<Self> {
        Self::from_tokenized(source.into(), tokenize_paragraphs(paragraphs, options))
    }

    pub fn from_extracted(
        source: impl Into<PathBuf>,
        extracted: &ExtractedText,
        options: &TokenizerOptions,
    ) -> Result<Self> {
        let tokenized = match extracted.strategy {
            BoundaryStrategy::Paragraphs => {
                tokenize_paragraphs(extracted.paragraphs.as_slice(), options)
            }
            BoundaryStrategy::Sentences => {
                tokenize_continuous(&extracted.paragraphs.join("\n\n"), options)
            }
        };
        Self::from_tokenized(source.into(), tokenized)
    }

    fn from_tokenized(source: PathBuf, tokenized: TokenizedText) -> Result<Self> {
        if tokenized.is_empty() {
            return Err(ReaderError::EmptyDocument);
        }
        Ok(Document {
            source,
            tokens: tokenized.tokens,
            boundaries: tokenized.boundaries,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// File name for display, falling back to the full path.
    pub fn source_name(&self) -> String {
        self.source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn boundaries(&self) -> &[usize] {
        &self.boundaries
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn word(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    pub fn paragraph_count(&self) -> usize {
        self.boundaries.len()
    }

    pub fn paragraph_of(&self, index: usize) -> usize {
        paragraph_of(&self.boundaries, index)
    }
}

//! Text → words + paragraph boundaries.
//!
//! Two entry points cover the two shapes extractors hand us:
//! - [`tokenize_paragraphs`] for sources with explicit paragraphs (plain text,
//!   Word), where each paragraph's first word becomes a boundary.
//! - [`tokenize_continuous`] for a single blob without reliable paragraph
//!   breaks (PDF/OCR), where sentence-terminal punctuation marks the units.
//!
//! Words keep their attached punctuation (`"word."`, `"word,"`), since the
//! reader displays them verbatim.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

static RE_PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());
static RE_LINE_BREAK_HYPHEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)-[ \t]*\r?\n\s*(\w+)").unwrap());
static RE_FOOTNOTE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\d+\]").unwrap());
static RE_WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static RE_SINGLE_INITIAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\p{Lu}\.$").unwrap());
static RE_ENUMERATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.$").unwrap());

/// Whether words are shown as written or folded to lowercase.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CasePolicy {
    #[default]
    Preserve,
    Lowercase,
}

/// How paragraph boundaries are derived for an extracted source.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BoundaryStrategy {
    /// One boundary per non-empty paragraph.
    #[default]
    Paragraphs,
    /// Sentence-terminal punctuation ends a unit (continuous PDF/OCR text).
    Sentences,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenizerOptions {
    pub case: CasePolicy,
    pub unicode_nfc: bool,
    /// Continuous text only: rejoin `exam-\nple` into `example`.
    pub rejoin_hyphens: bool,
    /// Continuous text only: drop `[12]` style footnote markers.
    pub strip_footnote_markers: bool,
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        TokenizerOptions {
            case: CasePolicy::Preserve,
            unicode_nfc: true,
            rejoin_hyphens: true,
            strip_footnote_markers: true,
        }
    }
}

/// Flat word list plus the indices where paragraphs (or units) start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenizedText {
    pub tokens: Vec<String>,
    pub boundaries: Vec<usize>,
}

impl TokenizedText {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Split a raw blob into paragraphs on blank-line runs. Pieces are trimmed
/// and empty pieces dropped.
pub fn split_paragraphs(raw: &str) -> Vec<String> {
    RE_PARAGRAPH_BREAK
        .split(raw)
        .map(str::trim)
        .filter(|para| !para.is_empty())
        .map(str::to_string)
        .collect()
}

/// Rejoin words that were hyphenated across a line break.
pub fn rejoin_hyphenated(raw: &str) -> String {
    RE_LINE_BREAK_HYPHEN.replace_all(raw, "${1}${2}").into_owned()
}

pub fn tokenize_paragraphs<S: AsRef<str>>(
    paragraphs: &[S],
    options: &TokenizerOptions,
) -> TokenizedText {
    let mut tokens = Vec::new();
    let mut boundaries = Vec::new();

    for paragraph in paragraphs {
        let start = tokens.len();
        let text = prepare(paragraph.as_ref(), options);
        tokens.extend(
            text.split_whitespace()
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_string),
        );
        // Paragraphs that contributed nothing don't get a boundary.
        if tokens.len() > start {
            boundaries.push(start);
        }
    }

    finalize_boundaries(&mut boundaries, tokens.len());
    TokenizedText { tokens, boundaries }
}

/// Tokenize continuous text, inferring boundaries from sentence endings.
pub fn tokenize_continuous(raw: &str, options: &TokenizerOptions) -> TokenizedText {
    let mut text = if options.rejoin_hyphens {
        rejoin_hyphenated(raw)
    } else {
        raw.to_string()
    };
    text = RE_WHITESPACE_RUN.replace_all(&text, " ").trim().to_string();
    if options.strip_footnote_markers {
        text = RE_FOOTNOTE_MARKER.replace_all(&text, "").into_owned();
    }
    let text = prepare(&text, options);

    let tokens: Vec<String> = text.split_whitespace().map(str::to_string).collect();
    if tokens.is_empty() {
        return TokenizedText::default();
    }

    let mut boundaries = vec![0];
    for (idx, token) in tokens.iter().enumerate() {
        if ends_unit(token) && idx + 1 < tokens.len() {
            boundaries.push(idx + 1);
        }
    }
    boundaries.sort_unstable();
    boundaries.dedup();
    // A unit that starts on the very last word is not worth a stop.
    if boundaries.len() > 1
        && boundaries
            .last()
            .is_some_and(|&last| last >= tokens.len() - 1)
    {
        boundaries.pop();
    }

    TokenizedText { tokens, boundaries }
}

/// True when `token` ends a sentence-like unit. Initials (`J.`) and
/// enumerations (`3.`) are not unit endings.
pub fn ends_unit(token: &str) -> bool {
    token.ends_with(['.', '!', '?'])
        && !RE_SINGLE_INITIAL.is_match(token)
        && !RE_ENUMERATION.is_match(token)
}

fn prepare(text: &str, options: &TokenizerOptions) -> String {
    let text = if options.unicode_nfc {
        text.nfc().collect::<String>()
    } else {
        text.to_string()
    };
    match options.case {
        CasePolicy::Preserve => text,
        CasePolicy::Lowercase => text.to_lowercase(),
    }
}

fn finalize_boundaries(boundaries: &mut Vec<usize>, len: usize) {
    boundaries.sort_unstable();
    boundaries.dedup();
    if boundaries.len() > 1 && boundaries.last().is_some_and(|&last| last >= len) {
        boundaries.pop();
    }
    boundaries.retain(|&idx| idx < len);
}

use crate::config::AppConfig;
use crate::document::Document;
use crate::error::{ReaderError, Result};
use crate::extract::ExtractedText;
use crate::navigator;
use crate::playback::{Advance, PaceRamp, PlaybackController, PlaybackState};
use crate::progress::ProgressRecord;
use crate::scheduler::{Scheduler, TimerTicket};
use crate::settings::Settings;
use crate::tokenizer::TokenizerOptions;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info, warn};

const NO_ESTIMATE_LABEL: &str = "--:--:--";

/// 1-based paragraph number out of the document's total.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ParagraphPosition {
    pub current: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReaderSnapshot {
    pub source_path: Option<String>,
    pub source_name: Option<String>,
    pub state: PlaybackState,
    pub current_word: Option<String>,
    pub word_index: usize,
    pub words_read: usize,
    pub total_words: usize,
    pub paragraph: Option<ParagraphPosition>,
    pub target_pace: u32,
    pub effective_pace: u32,
    pub remaining_secs: f64,
    pub remaining_label: String,
    pub settings: Settings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    GetSnapshot,
    TogglePlayback,
    Reset,
    /// `None` uses the configured word jump.
    BackWords { n: Option<usize> },
    ForwardWords { n: Option<usize> },
    BackParagraph,
    ForwardParagraph,
    SetPace { wpm: u32 },
    ApplySettings { settings: Settings },
}

impl SessionCommand {
    pub fn action(&self) -> &'static str {
        match self {
            Self::GetSnapshot => "reader_get_snapshot",
            Self::TogglePlayback => "reader_toggle_playback",
            Self::Reset => "reader_reset",
            Self::BackWords { .. } => "reader_back_words",
            Self::ForwardWords { .. } => "reader_forward_words",
            Self::BackParagraph => "reader_back_paragraph",
            Self::ForwardParagraph => "reader_forward_paragraph",
            Self::SetPace { .. } => "reader_set_pace",
            Self::ApplySettings { .. } => "reader_apply_settings",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionEvent {
    pub action: &'static str,
    pub snapshot: ReaderSnapshot,
}

/// The reader core: one document, its playback controller and the user's
/// settings.
///
/// [`ReaderSession::load`] takes an already built [`Document`], so a failed
/// extraction never touches the session. Building through
/// [`ReaderSession::load_paragraphs`] or [`ReaderSession::load_extracted`]
/// instead unloads the session when the text has no words. Every navigation
/// pauses playback before moving.
#[derive(Debug)]
pub struct ReaderSession<S: Scheduler> {
    document: Option<Document>,
    controller: PlaybackController<S>,
    settings: Settings,
    /// Index of the word currently on screen.
    displayed: Option<usize>,
    word_jump: usize,
}

impl<S: Scheduler> ReaderSession<S> {
    pub fn new(scheduler: S, settings: Settings, ramp: PaceRamp, word_jump: usize) -> Self {
        let settings = settings.sanitized();
        let controller = PlaybackController::new(scheduler, settings.reading_pace, ramp);
        Self {
            document: None,
            controller,
            settings,
            displayed: None,
            word_jump: word_jump.max(1),
        }
    }

    pub fn with_config(scheduler: S, settings: Settings, config: &AppConfig) -> Self {
        Self::new(scheduler, settings, config.pace_ramp(), config.word_jump)
    }

    /// Install `document`, positioned at `resume_index` (clamped to the last
    /// word). Replaces any previous document and cancels pending playback.
    pub fn load(&mut self, document: Document, resume_index: usize) {
        self.controller.load(document.len(), resume_index);
        self.displayed = Some(self.controller.current_index());
        info!(
            source = %document.source().display(),
            words = document.len(),
            paragraphs = document.paragraph_count(),
            index = self.controller.current_index(),
            "Loaded document into session"
        );
        self.document = Some(document);
    }

    /// Tokenize `paragraphs` and load the result. An empty document unloads
    /// the session and leaves it `Idle`.
    pub fn load_paragraphs<P: AsRef<str>>(
        &mut self,
        source: impl Into<PathBuf>,
        paragraphs: &[P],
        options: &TokenizerOptions,
        resume_index: usize,
    ) -> Result<()> {
        let built = Document::from_paragraphs(source, paragraphs, options);
        self.install(built, resume_index)
    }

    /// Same as [`ReaderSession::load_paragraphs`] for extractor output.
    pub fn load_extracted(
        &mut self,
        source: impl Into<PathBuf>,
        extracted: &ExtractedText,
        options: &TokenizerOptions,
        resume_index: usize,
    ) -> Result<()> {
        let built = Document::from_extracted(source, extracted, options);
        self.install(built, resume_index)
    }

    fn install(&mut self, built: Result<Document>, resume_index: usize) -> Result<()> {
        match built {
            Ok(document) => {
                self.load(document, resume_index);
                Ok(())
            }
            Err(ReaderError::EmptyDocument) => {
                warn!("Document has no words; unloading session");
                self.unload();
                Err(ReaderError::EmptyDocument)
            }
            Err(err) => Err(err),
        }
    }

    /// Drop the document and cancel pending playback.
    pub fn unload(&mut self) {
        self.controller.load(0, 0);
        self.document = None;
        self.displayed = None;
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> PlaybackState {
        self.controller.state()
    }

    pub fn is_playing(&self) -> bool {
        self.controller.is_playing()
    }

    pub fn current_index(&self) -> usize {
        self.controller.current_index()
    }

    pub fn word_jump(&self) -> usize {
        self.word_jump
    }

    pub fn scheduler(&self) -> &S {
        self.controller.scheduler()
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        self.controller.scheduler_mut()
    }

    pub fn toggle(&mut self) {
        self.controller.toggle();
    }

    pub fn reset(&mut self) {
        self.controller.reset();
        self.displayed = self.document.as_ref().map(|_| 0);
    }

    /// Deliver a scheduler ticket. Returns the advance when a word was shown.
    pub fn on_timer(&mut self, ticket: TimerTicket) -> Option<Advance> {
        let advance = self.controller.on_timer(ticket)?;
        self.displayed = Some(advance.index);
        Some(advance)
    }

    pub fn back_words(&mut self, n: usize) {
        self.navigate("back_words", |current, _| navigator::back_words(current, n));
    }

    pub fn forward_words(&mut self, n: usize) {
        self.navigate("forward_words", |current, doc| {
            navigator::forward_words(doc.len(), current, n)
        });
    }

    pub fn back_paragraph(&mut self) {
        self.navigate("back_paragraph", |current, doc| {
            navigator::back_paragraph(doc.boundaries(), current)
        });
    }

    pub fn forward_paragraph(&mut self) {
        self.navigate("forward_paragraph", |current, doc| {
            navigator::forward_paragraph(doc.len(), doc.boundaries(), current)
        });
    }

    fn navigate<F>(&mut self, action: &'static str, target: F)
    where
        F: FnOnce(usize, &Document) -> usize,
    {
        let Some(document) = self.document.as_ref() else {
            debug!(action, "Navigation ignored: no document loaded");
            return;
        };
        self.controller.pause();
        let from = self.controller.current_index();
        let to = target(from, document);
        self.controller.seek(to);
        self.displayed = Some(to.min(document.len().saturating_sub(1)));
        debug!(action, from, to, "Navigated");
    }

    /// Change the target pace; returns the clamped value applied.
    pub fn set_target_pace(&mut self, wpm: u32) -> u32 {
        let applied = self.controller.set_target_pace(wpm);
        self.settings = self.settings.clone().with_reading_pace(applied);
        applied
    }

    pub fn apply_settings(&mut self, settings: Settings) {
        let settings = settings.sanitized();
        self.controller.set_target_pace(settings.reading_pace);
        debug!(pace = settings.reading_pace, "Applied settings");
        self.settings = settings;
    }

    pub fn current_word(&self) -> Option<&str> {
        let document = self.document.as_ref()?;
        document.word(self.displayed?)
    }

    /// `(words read, total words)`.
    pub fn progress(&self) -> (usize, usize) {
        let total = self.document.as_ref().map_or(0, Document::len);
        (self.controller.current_index().min(total), total)
    }

    /// Time left at the target pace.
    pub fn estimated_remaining_seconds(&self) -> f64 {
        let (read, total) = self.progress();
        let remaining = total - read;
        remaining as f64 * 60.0 / f64::from(self.controller.target_pace().max(1))
    }

    /// `HH:MM:SS`, or `--:--:--` with nothing loaded.
    pub fn remaining_time_label(&self) -> String {
        if self.document.is_none() {
            return NO_ESTIMATE_LABEL.to_string();
        }
        format_hms(self.estimated_remaining_seconds())
    }

    pub fn paragraph_position(&self) -> Option<ParagraphPosition> {
        let document = self.document.as_ref()?;
        let index = self.displayed?;
        Some(ParagraphPosition {
            current: document.paragraph_of(index) + 1,
            total: document.paragraph_count(),
        })
    }

    pub fn to_progress_record(&self) -> Option<ProgressRecord> {
        let document = self.document.as_ref()?;
        Some(ProgressRecord::new(
            document.source(),
            self.controller.current_index().min(document.len()),
        ))
    }

    pub fn snapshot(&self) -> ReaderSnapshot {
        let (words_read, total_words) = self.progress();
        ReaderSnapshot {
            source_path: self
                .document
                .as_ref()
                .map(|doc| doc.source().display().to_string()),
            source_name: self.document.as_ref().map(Document::source_name),
            state: self.controller.state(),
            current_word: self.current_word().map(str::to_string),
            word_index: self.controller.current_index(),
            words_read,
            total_words,
            paragraph: self.paragraph_position(),
            target_pace: self.controller.target_pace(),
            effective_pace: self.controller.ramp_pace(),
            remaining_secs: self.estimated_remaining_seconds(),
            remaining_label: self.remaining_time_label(),
            settings: self.settings.clone(),
        }
    }

    pub fn apply_command(&mut self, command: SessionCommand) -> SessionEvent {
        let action = command.action();
        match command {
            SessionCommand::GetSnapshot => {}
            SessionCommand::TogglePlayback => self.toggle(),
            SessionCommand::Reset => self.reset(),
            SessionCommand::BackWords { n } => self.back_words(n.unwrap_or(self.word_jump)),
            SessionCommand::ForwardWords { n } => self.forward_words(n.unwrap_or(self.word_jump)),
            SessionCommand::BackParagraph => self.back_paragraph(),
            SessionCommand::ForwardParagraph => self.forward_paragraph(),
            SessionCommand::SetPace { wpm } => {
                self.set_target_pace(wpm);
            }
            SessionCommand::ApplySettings { settings } => self.apply_settings(settings),
        }
        SessionEvent {
            action,
            snapshot: self.snapshot(),
        }
    }
}

fn format_hms(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

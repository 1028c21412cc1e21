//! Session data types.

use crate::text::Chapter;
use crate::tts::VoicePreference;

/// What the session is currently waiting for from the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Awaiting {
    Idle,
    VoiceChoice,
    WaitingFile,
    ChapterSelection,
    ChangingVoice,
}

/// Per-caller session state.
///
/// Owned exclusively by the calling session and mutated only through
/// [`SessionState::handle`]; a new upload or an explicit reset clears the
/// loaded chapters.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub awaiting: Awaiting,
    /// Menu state to restore after a voice change.
    pub(crate) prior: Option<Awaiting>,
    pub voice_preference: VoicePreference,
    pub chapters: Vec<Chapter>,
    pub book_title: String,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            awaiting: Awaiting::Idle,
            prior: None,
            voice_preference: VoicePreference::default(),
            chapters: Vec::new(),
            book_title: String::new(),
        }
    }

    /// Look up a loaded chapter by its 1-based number.
    pub fn chapter(&self, number: usize) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.number as usize == number)
    }

    /// Clear loaded book data and return to idle.
    pub fn reset(&mut self) {
        self.awaiting = Awaiting::Idle;
        self.prior = None;
        self.chapters.clear();
        self.book_title.clear();
    }
}

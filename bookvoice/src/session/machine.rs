//! Event dispatch for the session state machine.
//!
//! Caller input arrives as a closed event enum and produces an action for
//! the surrounding glue (menu rendering, downloads, pipeline runs) to carry
//! out. All state transitions live in one place.

use super::types::{Awaiting, SessionState};
use crate::config::BookvoiceConfig;
use crate::error::Error;
use crate::extract::{self, BookFormat};
use crate::text::Chapter;
use crate::tts::VoicePreference;
use log::debug;

/// Enumerated caller intents.
#[derive(Debug)]
pub enum SessionEvent<'a> {
    /// First contact from a caller with no record yet.
    FirstContact,
    /// The caller picked a voice label.
    VoiceSelected { label: &'a str },
    /// The caller offered a file for upload.
    FileOffered { file_name: &'a str, size: u64 },
    /// The glue finished extraction and segmentation for an accepted upload.
    BookLoaded {
        title: String,
        chapters: Vec<Chapter>,
    },
    /// The caller picked a chapter by its 1-based number.
    ChapterChosen { number: usize },
    /// Explicit voice-change request, allowed from any state.
    VoiceChangeRequested,
    /// Explicit reset.
    Reset,
}

/// What the surrounding glue should do next.
#[derive(Debug)]
pub enum SessionAction {
    /// Show the voice menu.
    PromptVoiceChoice,
    /// Announce the saved voice and ask for a book file.
    PromptUpload,
    /// Persist the new voice and re-render the restored menu state.
    VoiceSaved(VoicePreference),
    /// Download and extract the accepted upload, then send `BookLoaded`.
    AcceptUpload(BookFormat),
    /// Show the gate rejection to the caller; nothing else changes.
    RejectUpload(Error),
    /// Show the loaded chapter list.
    ShowChapters,
    /// Run chapter synthesis for this 1-based chapter number.
    Synthesize { number: usize },
    /// The chosen index is not in the loaded list.
    NotFound { number: usize },
    /// Event does not apply in the current state.
    Noop,
}

impl SessionState {
    /// Apply one caller event, returning the follow-up action.
    pub fn handle(&mut self, event: SessionEvent, config: &BookvoiceConfig) -> SessionAction {
        match event {
            SessionEvent::FirstContact => {
                self.awaiting = Awaiting::VoiceChoice;
                SessionAction::PromptVoiceChoice
            }

            SessionEvent::VoiceSelected { label } => match self.awaiting {
                Awaiting::VoiceChoice => {
                    self.voice_preference = VoicePreference::from_label(label);
                    self.awaiting = Awaiting::WaitingFile;
                    SessionAction::PromptUpload
                }
                Awaiting::ChangingVoice => {
                    self.voice_preference = VoicePreference::from_label(label);
                    self.awaiting = self.prior.take().unwrap_or(Awaiting::Idle);
                    SessionAction::VoiceSaved(self.voice_preference)
                }
                _ => SessionAction::Noop,
            },

            SessionEvent::FileOffered { file_name, size } => match self.awaiting {
                // A new upload is also accepted while a book is loaded; it
                // replaces the current one.
                Awaiting::WaitingFile | Awaiting::ChapterSelection => {
                    match extract::check_upload(file_name, size, config.max_upload_bytes) {
                        Ok(format) => SessionAction::AcceptUpload(format),
                        Err(e) => {
                            debug!("upload rejected: {e}");
                            SessionAction::RejectUpload(e)
                        }
                    }
                }
                _ => SessionAction::Noop,
            },

            SessionEvent::BookLoaded { title, chapters } => {
                self.chapters = chapters;
                self.book_title = title;
                self.prior = None;
                self.awaiting = Awaiting::ChapterSelection;
                SessionAction::ShowChapters
            }

            SessionEvent::ChapterChosen { number } => match self.awaiting {
                Awaiting::ChapterSelection => {
                    if self.chapter(number).is_some() {
                        // Stay in selection so the caller can pick another.
                        SessionAction::Synthesize { number }
                    } else {
                        SessionAction::NotFound { number }
                    }
                }
                _ => SessionAction::Noop,
            },

            SessionEvent::VoiceChangeRequested => {
                if self.awaiting != Awaiting::ChangingVoice {
                    self.prior = Some(self.awaiting);
                }
                self.awaiting = Awaiting::ChangingVoice;
                SessionAction::PromptVoiceChoice
            }

            SessionEvent::Reset => {
                self.reset();
                SessionAction::Noop
            }
        }
    }
}

//! Speech synthesis boundary: the synthesizer trait, stream events, and the
//! voice table.

pub mod command;
pub mod mock;

use crate::error::Result;
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// Caller-facing voice choice, resolved to a provider voice code through the
/// static [`VOICES`] table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoicePreference {
    #[default]
    Male,
    Female,
}

/// Static label-to-provider-code mapping. Immutable configuration, not
/// shared mutable state.
pub const VOICES: &[(VoicePreference, &str)] = &[
    (VoicePreference::Male, "ru-RU-DmitryNeural"),
    (VoicePreference::Female, "ru-RU-SvetlanaNeural"),
];

impl VoicePreference {
    /// Parse a caller-facing label. Unknown labels fall back to the default
    /// voice instead of failing.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "female" | "женский" => VoicePreference::Female,
            _ => VoicePreference::Male,
        }
    }

    /// The provider-specific voice code for this preference.
    pub fn voice_code(self) -> &'static str {
        VOICES
            .iter()
            .find(|(pref, _)| *pref == self)
            .map(|(_, code)| *code)
            .unwrap_or(VOICES[0].1)
    }

    pub fn label(self) -> &'static str {
        match self {
            VoicePreference::Male => "male",
            VoicePreference::Female => "female",
        }
    }
}

/// One event from a synthesizer's stream. The pipeline consumes only audio
/// fragments and ignores everything else.
#[derive(Debug, Clone)]
pub enum AudioEvent {
    /// A fragment of encoded audio, in delivery order.
    Audio(Vec<u8>),
    /// Non-audio provider event (timing marks and the like).
    Other,
}

/// Ordered stream of synthesis events for one chunk of text.
pub type AudioStream = BoxStream<'static, Result<AudioEvent>>;

/// Streaming speech synthesizer boundary.
///
/// The pipeline owns chunking, validation, ordering, and aggregation; an
/// implementation only has to turn one validated chunk of text into a stream
/// of audio fragments.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Open one streaming synthesis call for a validated chunk of text.
    async fn open_stream(&self, text: &str, voice_code: &str) -> Result<AudioStream>;
}

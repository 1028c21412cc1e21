//! Scripted synthesizer for testing
//!
//! Plays back a per-call script of fragment sequences or failures, so the
//! renderer's ordering, skip, and abort behavior can be exercised without a
//! real synthesis engine.

use super::{AudioEvent, AudioStream, SpeechSynthesizer};
use crate::error::{Error, Result};
use async_trait::async_trait;
use futures_util::stream;
use std::sync::atomic::{AtomicUsize, Ordering};

/// What one `open_stream` call should do.
#[derive(Debug, Clone)]
pub enum ChunkScript {
    /// Stream these fragments in order, then complete.
    Fragments(Vec<Vec<u8>>),
    /// Complete without producing any audio.
    NoAudio,
    /// Fail the stream with a transport error.
    TransportError(String),
}

/// A synthesizer that replays a fixed script, one entry per call.
///
/// Calls beyond the end of the script repeat the last entry.
pub struct ScriptedSynthesizer {
    script: Vec<ChunkScript>,
    calls: AtomicUsize,
}

impl ScriptedSynthesizer {
    pub fn with_script(script: Vec<ChunkScript>) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
        }
    }

    /// Every call streams the same fragments.
    pub fn always_fragments(fragments: Vec<Vec<u8>>) -> Self {
        Self::with_script(vec![ChunkScript::Fragments(fragments)])
    }

    /// Number of `open_stream` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for ScriptedSynthesizer {
    async fn open_stream(&self, _text: &str, _voice_code: &str) -> Result<AudioStream> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .script
            .get(index)
            .or_else(|| self.script.last())
            .cloned()
            .unwrap_or(ChunkScript::NoAudio);

        let events: Vec<Result<AudioEvent>> = match step {
            ChunkScript::Fragments(fragments) => fragments
                .into_iter()
                .map(|f| Ok(AudioEvent::Audio(f)))
                .collect(),
            ChunkScript::NoAudio => Vec::new(),
            ChunkScript::TransportError(message) => {
                vec![Err(Error::SynthesisTransport(message))]
            }
        };

        Ok(Box::pin(stream::iter(events)))
    }
}

//! Per-chapter streaming synthesis driver.
//!
//! Chunks are validated and synthesized strictly in sequence; fragment
//! arrival order within one chunk's stream is delivery order, so ordered
//! aggregation falls out of the sequential loop. No automatic retry: a
//! failed chapter is reported and leaves no partial artifact.

use super::{assembler, ProgressSink, RenderPhase, RenderProgress};
use crate::config::BookvoiceConfig;
use crate::error::{Error, Result};
use crate::text::chunker::{chunk_text, validate_for_synthesis};
use crate::tts::{AudioEvent, SpeechSynthesizer, VoicePreference};
use futures_util::StreamExt;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// The finished audio for one chapter.
#[derive(Debug, Clone)]
pub struct ChapterArtifact {
    pub path: PathBuf,
    pub bytes: u64,
    /// Rough playback length from the encoded size. Display only.
    pub estimated_seconds: u64,
}

/// Synthesize one chapter's text into a single audio artifact at
/// `output_path`.
///
/// Every chunk passes the validation gate right before its synthesis call;
/// invalid chunks are skipped. A chunk whose stream produces no audio fails
/// the chapter with [`Error::SynthesisEmpty`]; any other stream failure
/// aborts it likewise. On any failure no output file is left behind.
pub async fn synthesize_chapter(
    synthesizer: &dyn SpeechSynthesizer,
    chapter_text: &str,
    voice: VoicePreference,
    config: &BookvoiceConfig,
    progress: &dyn ProgressSink,
    output_path: &Path,
) -> Result<ChapterArtifact> {
    let chunks = chunk_text(chapter_text, config.max_chunk_chars);
    let chunks_total = chunks.len();
    let interval = config.progress_interval();

    let mut reporter = ProgressReporter::new(progress, interval);
    reporter
        .report_now(RenderPhase::Connecting, 0, 0, chunks_total)
        .await;

    let mut segments: Vec<Vec<u8>> = Vec::new();
    let mut bytes_written = 0u64;
    let mut skipped = 0usize;

    for (index, chunk) in chunks.iter().enumerate() {
        let Some(validated) = validate_for_synthesis(chunk) else {
            debug!("chunk {index} failed validation, skipping");
            skipped += 1;
            continue;
        };

        let mut stream = synthesizer
            .open_stream(&validated, voice.voice_code())
            .await?;

        let mut segment: Vec<u8> = Vec::new();
        while let Some(event) = stream.next().await {
            match event? {
                AudioEvent::Audio(data) => {
                    bytes_written += data.len() as u64;
                    segment.extend_from_slice(&data);
                    reporter
                        .report(RenderPhase::Streaming, bytes_written, segments.len(), chunks_total)
                        .await;
                }
                AudioEvent::Other => {}
            }
        }

        if segment.is_empty() {
            return Err(Error::SynthesisEmpty);
        }
        segments.push(segment);
    }

    if segments.is_empty() {
        debug!("all {skipped} chunk(s) rejected by the validation gate");
        return Err(Error::ValidationFailed);
    }

    reporter
        .report_now(
            RenderPhase::Assembling,
            bytes_written,
            segments.len(),
            chunks_total,
        )
        .await;

    let bytes = assembler::write_artifact(&segments, output_path)?;
    info!(
        "chapter rendered: {} segment(s), {} byte(s), {} skipped",
        segments.len(),
        bytes,
        skipped
    );

    Ok(ChapterArtifact {
        path: output_path.to_path_buf(),
        bytes,
        estimated_seconds: assembler::estimate_seconds(bytes),
    })
}

/// Rate-limits progress updates and swallows sink failures.
struct ProgressReporter<'a> {
    sink: &'a dyn ProgressSink,
    interval: Duration,
    last_update: Option<Instant>,
}

impl<'a> ProgressReporter<'a> {
    fn new(sink: &'a dyn ProgressSink, interval: Duration) -> Self {
        Self {
            sink,
            interval,
            last_update: None,
        }
    }

    /// Send an update if at least `interval` has passed since the last one.
    async fn report(
        &mut self,
        phase: RenderPhase,
        bytes_written: u64,
        chunks_done: usize,
        chunks_total: usize,
    ) {
        let due = self
            .last_update
            .map_or(true, |t| t.elapsed() >= self.interval);
        if due {
            self.report_now(phase, bytes_written, chunks_done, chunks_total)
                .await;
        }
    }

    /// Send an update regardless of throttling (phase boundaries).
    async fn report_now(
        &mut self,
        phase: RenderPhase,
        bytes_written: u64,
        chunks_done: usize,
        chunks_total: usize,
    ) {
        self.last_update = Some(Instant::now());
        let update = RenderProgress {
            phase,
            bytes_written,
            chunks_done,
            chunks_total,
        };
        if let Err(e) = self.sink.update(update).await {
            debug!("progress update dropped: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::NullProgress;
    use crate::tts::mock::{ChunkScript, ScriptedSynthesizer};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn test_config(max_chunk_chars: usize) -> BookvoiceConfig {
        BookvoiceConfig {
            max_chunk_chars,
            progress_interval_secs: 0,
            ..BookvoiceConfig::default()
        }
    }

    /// Three sentences that chunk into three pieces at max_chunk_chars=40.
    fn three_chunk_text() -> String {
        let a = "Первое предложение этой главы тянется долго. ";
        let b = "Второе предложение ничуть не короче него. ";
        let c = "Третье предложение завершает главу целиком.";
        format!("{a}{b}{c}")
    }

    struct RecordingSink {
        updates: Mutex<Vec<RenderProgress>>,
    }

    #[async_trait]
    impl ProgressSink for RecordingSink {
        async fn update(&self, progress: RenderProgress) -> anyhow::Result<()> {
            self.updates.lock().unwrap().push(progress);
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl ProgressSink for FailingSink {
        async fn update(&self, _progress: RenderProgress) -> anyhow::Result<()> {
            anyhow::bail!("display channel rejected the update")
        }
    }

    #[tokio::test]
    async fn test_renders_ordered_artifact() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("chapter.mp3");
        let synth = ScriptedSynthesizer::with_script(vec![
            ChunkScript::Fragments(vec![vec![1, 1], vec![2]]),
            ChunkScript::Fragments(vec![vec![3]]),
            ChunkScript::Fragments(vec![vec![4, 4]]),
        ]);

        let artifact = synthesize_chapter(
            &synth,
            &three_chunk_text(),
            VoicePreference::Male,
            &test_config(40),
            &NullProgress,
            &out,
        )
        .await
        .unwrap();

        assert_eq!(synth.call_count(), 3);
        assert_eq!(artifact.bytes, 6);
        // Concatenation order equals chunk sequence order.
        assert_eq!(std::fs::read(&out).unwrap(), vec![1, 1, 2, 3, 4, 4]);
    }

    #[tokio::test]
    async fn test_no_audio_on_middle_chunk_fails_without_artifact() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("chapter.mp3");
        let synth = ScriptedSynthesizer::with_script(vec![
            ChunkScript::Fragments(vec![vec![1]]),
            ChunkScript::NoAudio,
            ChunkScript::Fragments(vec![vec![3]]),
        ]);

        let result = synthesize_chapter(
            &synth,
            &three_chunk_text(),
            VoicePreference::Female,
            &test_config(40),
            &NullProgress,
            &out,
        )
        .await;

        assert!(matches!(result, Err(Error::SynthesisEmpty)));
        assert!(!out.exists(), "partial artifact left on disk");
        // The failing chunk aborts the chapter before chunk 3 is attempted.
        assert_eq!(synth.call_count(), 2);
    }

    #[tokio::test]
    async fn test_transport_error_aborts_chapter() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("chapter.mp3");
        let synth = ScriptedSynthesizer::with_script(vec![ChunkScript::TransportError(
            "connection reset".to_string(),
        )]);

        let result = synthesize_chapter(
            &synth,
            "Достаточно длинный текст для синтеза речи.",
            VoicePreference::Male,
            &test_config(200),
            &NullProgress,
            &out,
        )
        .await;

        assert!(matches!(result, Err(Error::SynthesisTransport(_))));
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_invalid_chunks_are_skipped_not_synthesized() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("chapter.mp3");
        let synth = ScriptedSynthesizer::always_fragments(vec![vec![7]]);

        // "@@. " units strip to nothing and fail validation; the long
        // sentence passes.
        let text = format!("@@@@@@@@@@. {}", "Настоящее предложение для озвучивания.");
        let artifact = synthesize_chapter(
            &synth,
            &text,
            VoicePreference::Male,
            &test_config(13),
            &NullProgress,
            &out,
        )
        .await
        .unwrap();

        assert_eq!(synth.call_count(), 1);
        assert_eq!(artifact.bytes, 1);
    }

    #[tokio::test]
    async fn test_all_chunks_invalid_is_validation_failure() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("chapter.mp3");
        let synth = ScriptedSynthesizer::always_fragments(vec![vec![7]]);

        let result = synthesize_chapter(
            &synth,
            "@#$%^&*@#$%^&*",
            VoicePreference::Male,
            &test_config(200),
            &NullProgress,
            &out,
        )
        .await;

        assert!(matches!(result, Err(Error::ValidationFailed)));
        assert_eq!(synth.call_count(), 0);
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_phased() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("chapter.mp3");
        let synth =
            ScriptedSynthesizer::always_fragments(vec![vec![0; 10], vec![0; 5], vec![0; 1]]);
        let sink = RecordingSink {
            updates: Mutex::new(Vec::new()),
        };

        synthesize_chapter(
            &synth,
            "Одно достаточно длинное предложение для озвучивания.",
            VoicePreference::Male,
            &test_config(200),
            &sink,
            &out,
        )
        .await
        .unwrap();

        let updates = sink.updates.lock().unwrap();
        assert!(updates.len() >= 3);
        assert_eq!(updates.first().unwrap().phase, RenderPhase::Connecting);
        assert_eq!(updates.last().unwrap().phase, RenderPhase::Assembling);
        let bytes: Vec<u64> = updates.iter().map(|u| u.bytes_written).collect();
        assert!(bytes.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*bytes.last().unwrap(), 16);
    }

    #[tokio::test]
    async fn test_progress_failures_never_abort_synthesis() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("chapter.mp3");
        let synth = ScriptedSynthesizer::always_fragments(vec![vec![9; 4]]);

        let artifact = synthesize_chapter(
            &synth,
            "Предложение, которое нужно озвучить полностью.",
            VoicePreference::Male,
            &test_config(200),
            &FailingSink,
            &out,
        )
        .await
        .unwrap();

        assert_eq!(artifact.bytes, 4);
        assert!(out.exists());
    }
}

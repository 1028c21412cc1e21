//! Audio side of the pipeline: per-chapter streaming synthesis and artifact
//! assembly.

pub mod assembler;
pub mod renderer;

use async_trait::async_trait;

/// Coarse phase of a chapter render, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPhase {
    Connecting,
    Streaming,
    Assembling,
}

/// A throttled progress snapshot. Byte counts are monotonic; no other
/// ordering is guaranteed, and updates may be skipped entirely under
/// back-pressure.
#[derive(Debug, Clone, Copy)]
pub struct RenderProgress {
    pub phase: RenderPhase,
    /// Cumulative audio bytes received so far.
    pub bytes_written: u64,
    pub chunks_done: usize,
    pub chunks_total: usize,
}

/// Destination for progress updates (a chat message edit, a terminal bar).
///
/// The renderer swallows sink errors: a rejected update must never abort
/// synthesis.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn update(&self, progress: RenderProgress) -> anyhow::Result<()>;
}

/// Sink that discards all updates.
pub struct NullProgress;

#[async_trait]
impl ProgressSink for NullProgress {
    async fn update(&self, _progress: RenderProgress) -> anyhow::Result<()> {
        Ok(())
    }
}

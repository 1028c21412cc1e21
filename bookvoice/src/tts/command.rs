//! Subprocess-backed synthesizer.
//!
//! Pipes the validated text into an external TTS command's stdin and streams
//! its stdout back as audio fragments. Any engine that reads text on stdin
//! and writes encoded audio to stdout fits (piper, say, a thin edge-tts
//! wrapper script).

use super::{AudioEvent, AudioStream, SpeechSynthesizer};
use crate::error::{Error, Result};
use async_trait::async_trait;
use futures_util::stream;
use log::debug;
use std::process::Stdio;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdout, Command};

/// Stdout read size per fragment.
const FRAGMENT_BYTES: usize = 8 * 1024;

pub struct CommandSynthesizer {
    program: String,
    args: Vec<String>,
}

impl CommandSynthesizer {
    /// Create a synthesizer around an external command. Occurrences of
    /// `{voice}` in `args` are replaced with the provider voice code at call
    /// time.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

struct StreamState {
    stdout: ChildStdout,
    child: Option<Child>,
    done: bool,
}

#[async_trait]
impl SpeechSynthesizer for CommandSynthesizer {
    async fn open_stream(&self, text: &str, voice_code: &str) -> Result<AudioStream> {
        let args: Vec<String> = self
            .args
            .iter()
            .map(|a| a.replace("{voice}", voice_code))
            .collect();

        debug!("spawning tts command: {} {:?}", self.program, args);

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                Error::SynthesisTransport(format!("failed to spawn {}: {e}", self.program))
            })?;

        // Feed stdin from a separate task so a chatty engine cannot deadlock
        // against our stdout reads.
        if let Some(mut stdin) = child.stdin.take() {
            let input = text.as_bytes().to_vec();
            tokio::spawn(async move {
                let _ = stdin.write_all(&input).await;
                // Dropping stdin closes the pipe and signals end of input.
            });
        }

        let stdout = child.stdout.take().ok_or_else(|| {
            Error::SynthesisTransport("tts command produced no stdout handle".to_string())
        })?;

        let state = StreamState {
            stdout,
            child: Some(child),
            done: false,
        };

        let stream = stream::unfold(state, |mut state| async move {
            if state.done {
                return None;
            }

            let mut buf = vec![0u8; FRAGMENT_BYTES];
            match state.stdout.read(&mut buf).await {
                Ok(0) => {
                    // End of output; reap the child and surface its status.
                    if let Some(mut child) = state.child.take() {
                        state.done = true;
                        match child.wait().await {
                            Ok(status) if !status.success() => {
                                return Some((
                                    Err(Error::SynthesisTransport(format!(
                                        "tts command exited with {status}"
                                    ))),
                                    state,
                                ));
                            }
                            Err(e) => {
                                return Some((
                                    Err(Error::SynthesisTransport(e.to_string())),
                                    state,
                                ));
                            }
                            Ok(_) => {}
                        }
                    }
                    None
                }
                Ok(n) => {
                    buf.truncate(n);
                    Some((Ok(AudioEvent::Audio(buf)), state))
                }
                Err(e) => {
                    state.done = true;
                    Some((Err(Error::SynthesisTransport(e.to_string())), state))
                }
            }
        });

        Ok(Box::pin(stream))
    }
}

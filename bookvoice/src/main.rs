use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use bookvoice::audio::{renderer, ProgressSink, RenderPhase, RenderProgress};
use bookvoice::extract::{self, PlainTextExtractor};
use bookvoice::store::{compute_book_hash, HistoryEntry, UserStore};
use bookvoice::text::Chapter;
use bookvoice::tts::{command::CommandSynthesizer, VoicePreference};
use bookvoice::{prepare_chapters, BookvoiceConfig};
use chrono::Utc;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};

/// Identifier for the local CLI caller in the user store.
const LOCAL_CALLER: &str = "local";

#[derive(Parser)]
#[command(
    name = "bookvoice",
    about = "Convert book text into per-chapter spoken audio",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the chapters detected in a book file
    Chapters {
        /// Book file (.txt, .epub, .fb2)
        file: PathBuf,
    },
    /// Synthesize one chapter into an audio file
    Synthesize {
        /// Book file (.txt, .epub, .fb2)
        file: PathBuf,
        /// 1-based chapter number from `bookvoice chapters`
        #[arg(short, long)]
        chapter: usize,
        /// Voice label: "male" or "female"
        #[arg(long)]
        voice: Option<String>,
        /// Output audio path (default: chapter_N.mp3)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Override the configured TTS command for this run
        #[arg(long)]
        tts_command: Option<String>,
        /// Arguments for the TTS command override; repeatable
        #[arg(long)]
        tts_arg: Vec<String>,
    },
    /// Show recent synthesis history
    History {
        /// Most recent entries to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the current configuration
    Show,
    /// Set the default voice label
    SetVoice { voice: String },
    /// Set the external TTS command and its arguments
    SetTtsCommand {
        command: String,
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let result = run(cli).await;
    if let Err(e) = &result {
        if let Some(remedy) = e
            .downcast_ref::<bookvoice::Error>()
            .and_then(|err| err.remedy())
        {
            eprintln!("hint: {remedy}");
        }
    }
    result
}

async fn run(cli: Cli) -> Result<()> {
    let config = BookvoiceConfig::load().context("failed to load config")?;

    match cli.command {
        Command::Chapters { file } => cmd_chapters(&file, &config),
        Command::Synthesize {
            file,
            chapter,
            voice,
            output,
            tts_command,
            tts_arg,
        } => {
            cmd_synthesize(
                &file,
                chapter,
                voice.as_deref(),
                output,
                tts_command,
                tts_arg,
                &config,
            )
            .await
        }
        Command::History { limit } => cmd_history(limit),
        Command::Config { action } => cmd_config(action, config),
    }
}

/// Gate, extract, and segment a book file.
fn load_book(path: &Path, config: &BookvoiceConfig) -> Result<Vec<Chapter>> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("invalid file name: {}", path.display()))?;
    let size = fs::metadata(path)
        .with_context(|| format!("cannot read {}", path.display()))?
        .len();

    let format = extract::check_upload(name, size, config.max_upload_bytes)?;
    let raw = extract::read_book(&PlainTextExtractor, path, format)?;
    Ok(prepare_chapters(&raw)?)
}

fn cmd_chapters(file: &Path, config: &BookvoiceConfig) -> Result<()> {
    let chapters = load_book(file, config)?;

    println!("{} chapter(s):", chapters.len());
    for chapter in &chapters {
        println!(
            "  {:>2}. {} (~{} min, {} words)",
            chapter.number,
            chapter.title,
            chapter.estimated_minutes(),
            chapter.word_count()
        );
    }
    Ok(())
}

async fn cmd_synthesize(
    file: &Path,
    chapter_number: usize,
    voice_label: Option<&str>,
    output: Option<PathBuf>,
    tts_command: Option<String>,
    tts_args: Vec<String>,
    config: &BookvoiceConfig,
) -> Result<()> {
    let chapters = load_book(file, config)?;
    let chapter = chapters
        .iter()
        .find(|c| c.number as usize == chapter_number)
        .ok_or(bookvoice::Error::ChapterNotFound(chapter_number))?;

    let program = tts_command
        .or_else(|| config.tts_command.clone())
        .with_context(|| {
            "no TTS command configured; run \
             `bookvoice config set-tts-command <program> [args...]` \
             (use {voice} where the voice code goes)"
        })?;
    let args = if tts_args.is_empty() {
        config.tts_args.clone()
    } else {
        tts_args
    };
    let synthesizer = CommandSynthesizer::new(program, args);

    let voice = voice_label
        .or(config.voice.as_deref())
        .map(VoicePreference::from_label)
        .unwrap_or_default();

    let output = output.unwrap_or_else(|| PathBuf::from(format!("chapter_{chapter_number}.mp3")));
    println!("{} — voice {}", chapter.title, voice.label());

    let bar = spinner();
    let sink = BarSink { bar: bar.clone() };
    let artifact =
        renderer::synthesize_chapter(&synthesizer, &chapter.text, voice, config, &sink, &output)
            .await;
    bar.finish_and_clear();
    let artifact = artifact?;

    record_synthesis(file, chapter)?;

    println!(
        "wrote {} ({} bytes, ~{} s)",
        artifact.path.display(),
        artifact.bytes,
        artifact.estimated_seconds
    );
    Ok(())
}

/// Best-effort store update after a successful synthesis.
fn record_synthesis(file: &Path, chapter: &Chapter) -> Result<()> {
    let store = UserStore::open_default()?;
    let title = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("book")
        .to_string();

    let hash = compute_book_hash(file)?;
    store.set_last_book(LOCAL_CALLER, &title, &hash)?;
    store.append_history(
        LOCAL_CALLER,
        &HistoryEntry {
            timestamp: Utc::now(),
            book_title: title,
            chapter_title: chapter.title.clone(),
        },
    )?;
    Ok(())
}

fn cmd_history(limit: usize) -> Result<()> {
    let store = UserStore::open_default()?;
    let entries = store.history(LOCAL_CALLER, limit)?;

    if entries.is_empty() {
        println!("no syntheses recorded yet");
        return Ok(());
    }
    for entry in entries {
        println!(
            "{}  {} — {}",
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            entry.book_title,
            entry.chapter_title
        );
    }
    Ok(())
}

fn cmd_config(action: ConfigAction, mut config: BookvoiceConfig) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::SetVoice { voice } => {
            let preference = VoicePreference::from_label(&voice);
            config.voice = Some(preference.label().to_string());
            config.save()?;
            println!("voice set to {}", preference.label());
        }
        ConfigAction::SetTtsCommand { command, args } => {
            if command.trim().is_empty() {
                bail!("TTS command cannot be empty");
            }
            config.tts_command = Some(command.clone());
            config.tts_args = args;
            config.save()?;
            println!("TTS command set to {command}");
        }
    }
    Ok(())
}

fn spinner() -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar
}

/// Progress sink that drives the terminal spinner.
struct BarSink {
    bar: ProgressBar,
}

#[async_trait]
impl ProgressSink for BarSink {
    async fn update(&self, progress: RenderProgress) -> Result<()> {
        let msg = match progress.phase {
            RenderPhase::Connecting => "connecting to synthesizer...".to_string(),
            RenderPhase::Streaming => format!(
                "streaming audio: {} KiB, chunk {}/{}",
                progress.bytes_written / 1024,
                progress.chunks_done + 1,
                progress.chunks_total
            ),
            RenderPhase::Assembling => "assembling chapter audio...".to_string(),
        };
        self.bar.set_message(msg);
        self.bar.tick();
        Ok(())
    }
}

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("could not extract any text from the source file")]
    ExtractionFailed,

    #[error("text is too short or malformed for synthesis")]
    ValidationFailed,

    #[error("the synthesizer produced no audio")]
    SynthesisEmpty,

    #[error("synthesis transport failure: {0}")]
    SynthesisTransport(String),

    #[error("chapter {0} is not in the loaded chapter list")]
    ChapterNotFound(usize),

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("file too large: {size} bytes (limit is {limit})")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// A caller-facing suggestion for recovering from this error, where one
    /// exists. Synthesis failures are never retried automatically, so the
    /// remedy always requires caller intervention.
    pub fn remedy(&self) -> Option<&'static str> {
        match self {
            Error::ExtractionFailed => Some("try converting the file to plain text first"),
            Error::ValidationFailed => Some("pick a longer chapter"),
            Error::SynthesisEmpty | Error::SynthesisTransport(_) => {
                Some("try another chapter or switch the voice")
            }
            Error::ChapterNotFound(_) => Some("pick a chapter from the current list"),
            Error::UnsupportedFormat(_) => Some("convert the book to txt, epub, or fb2"),
            Error::FileTooLarge { .. } => Some("compress the file or send the book in parts"),
            _ => None,
        }
    }
}

use thiserror::Error;

/// Main error type for the music-slides library
#[derive(Error, Debug)]
pub enum SlidesError {
    #[error("Image decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("External encoder error: {0}")]
    Process(#[from] ProcessError),

    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Image decoding errors, raised per image at the add/preview boundary
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Failed to decode image: {path} ({reason})")]
    Unreadable { path: String, reason: String },

    #[error("Image file not found: {path}")]
    NotFound { path: String },

    #[error("Cannot play audio: {path} ({reason})")]
    AudioUnplayable { path: String, reason: String },
}

/// Parameter and state validation errors, raised before any work starts
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("No slides to render")]
    EmptySlideList,

    #[error("Per-slide duration must be positive, got {seconds}")]
    InvalidDuration { seconds: f64 },

    #[error("A render job is already in flight")]
    RenderInFlight,

    #[error("Preview playback is active")]
    PreviewActive,

    #[error("No preview is active")]
    NoPreviewActive,
}

/// External encoder process errors
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Encoder binary not found: {binary}")]
    NotFound { binary: String },

    #[error("Failed to launch encoder: {reason}")]
    LaunchFailed { reason: String },

    #[error("Encoder exited with code {code}")]
    ExitFailure { code: i32, log: String },
}

/// Filesystem errors while managing scratch and output artifacts
#[derive(Error, Debug)]
pub enum FilesystemError {
    #[error("Failed to create scratch directory: {path} ({reason})")]
    ScratchDirFailed { path: String, reason: String },

    #[error("Failed to write artifact: {path} ({reason})")]
    WriteFailed { path: String, reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using SlidesError
pub type Result<T> = std::result::Result<T, SlidesError>;

impl SlidesError {
    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Decode(DecodeError::Unreadable { path, .. }) => {
                format!("Could not read image '{}'. Please check the file is a supported format.", path)
            }
            Self::Decode(DecodeError::NotFound { path }) => {
                format!("Image file '{}' does not exist.", path)
            }
            Self::Process(ProcessError::NotFound { binary }) => {
                format!("'{}' was not found on PATH. Please install FFmpeg.", binary)
            }
            Self::Process(ProcessError::ExitFailure { code, .. }) => {
                format!("Video encoding failed (encoder exit code {}).", code)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}

impl ProcessError {
    /// The captured combined stdout+stderr of a failed encoder run, if any
    pub fn log(&self) -> Option<&str> {
        match self {
            Self::ExitFailure { log, .. } => Some(log),
            _ => None,
        }
    }
}

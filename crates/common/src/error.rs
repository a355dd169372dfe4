//! Error types shared across PhotoGlow crates.

use std::path::PathBuf;

/// Top-level error type for PhotoGlow operations.
#[derive(Debug, thiserror::Error)]
pub enum PhotoglowError {
    #[error("No image loaded")]
    NoImage,

    #[error("No track selected")]
    NoTrackSelected,

    #[error("Encoding engine is not ready ({status})")]
    EngineNotReady { status: String },

    #[error("Another operation is already in progress: {operation}")]
    Busy { operation: String },

    #[error("Image decode error: {message}")]
    ImageDecode { message: String },

    #[error("Value {value} for filter '{name}' is outside {min}..={max}")]
    FilterOutOfRange {
        name: String,
        value: i64,
        min: u32,
        max: u32,
    },

    #[error("Unknown filter parameter: {name}")]
    UnknownFilter { name: String },

    #[error("Unknown track: {id}")]
    UnknownTrack { id: u32 },

    #[error("Fetch error: {message}")]
    Fetch { message: String },

    #[error("Encode error: {message}")]
    Encode { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Background removal error: {message}")]
    BackgroundRemoval { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using PhotoglowError.
pub type PhotoglowResult<T> = Result<T, PhotoglowError>;

/// Coarse error classes used to decide how a failure is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required state was missing; nothing was attempted.
    Precondition,
    /// Bad user input (undecodable image, out-of-range filter, unknown track).
    Input,
    /// Network retrieval of a track failed.
    Fetch,
    /// Rasterization or the encoding engine failed.
    Encode,
    /// The background-removal worker reported a failure.
    BackgroundRemoval,
    /// Filesystem, serialization, or configuration problems.
    Internal,
}

impl PhotoglowError {
    pub fn engine_not_ready(status: impl Into<String>) -> Self {
        Self::EngineNotReady {
            status: status.into(),
        }
    }

    pub fn busy(operation: impl Into<String>) -> Self {
        Self::Busy {
            operation: operation.into(),
        }
    }

    pub fn image_decode(msg: impl Into<String>) -> Self {
        Self::ImageDecode {
            message: msg.into(),
        }
    }

    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch {
            message: msg.into(),
        }
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn background_removal(msg: impl Into<String>) -> Self {
        Self::BackgroundRemoval {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoImage | Self::NoTrackSelected | Self::EngineNotReady { .. } | Self::Busy { .. } => {
                ErrorKind::Precondition
            }
            Self::ImageDecode { .. }
            | Self::FilterOutOfRange { .. }
            | Self::UnknownFilter { .. }
            | Self::UnknownTrack { .. } => ErrorKind::Input,
            Self::Fetch { .. } => ErrorKind::Fetch,
            Self::Encode { .. } | Self::Render { .. } | Self::Unsupported { .. } => {
                ErrorKind::Encode
            }
            Self::BackgroundRemoval { .. } => ErrorKind::BackgroundRemoval,
            Self::Config { .. }
            | Self::FileNotFound { .. }
            | Self::Io(_)
            | Self::Json(_)
            | Self::Other(_) => ErrorKind::Internal,
        }
    }

    /// Whether the operation was refused before any work started.
    pub fn is_precondition(&self) -> bool {
        self.kind() == ErrorKind::Precondition
    }
}

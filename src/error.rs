/// Error types for the multibom library
use std::fmt;

/// Result type alias for multibom operations
pub type Result<T> = std::result::Result<T, MultibomError>;

/// Main error type for multibom operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultibomError {
    /// Pattern-related errors (zero-length or otherwise malformed)
    InvalidPattern(String),

    /// State count exceeds the id width of the chosen representation
    CapacityExceeded(String),

    /// Automaton storage format that is recognised but not implemented
    UnsupportedFormat(String),

    /// Method tag whose engine lives outside this crate
    UnsupportedMethod(String),

    /// Search buffer exceeds the configured fold-buffer cap
    BufferTooLarge(String),

    /// Operation requires a compiled engine
    CompileRequired(String),

    /// Operation is only valid before compile
    AlreadyCompiled(String),

    /// I/O errors from report writers
    Io(String),
}

impl fmt::Display for MultibomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MultibomError::InvalidPattern(msg) => write!(f, "Invalid pattern: {}", msg),
            MultibomError::CapacityExceeded(msg) => write!(f, "Capacity exceeded: {}", msg),
            MultibomError::UnsupportedFormat(msg) => write!(f, "Unsupported format: {}", msg),
            MultibomError::UnsupportedMethod(msg) => write!(f, "Unsupported method: {}", msg),
            MultibomError::BufferTooLarge(msg) => write!(f, "Buffer too large: {}", msg),
            MultibomError::CompileRequired(msg) => write!(f, "Compile required: {}", msg),
            MultibomError::AlreadyCompiled(msg) => write!(f, "Already compiled: {}", msg),
            MultibomError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for MultibomError {}

impl From<std::io::Error> for MultibomError {
    fn from(err: std::io::Error) -> Self {
        MultibomError::Io(err.to_string())
    }
}

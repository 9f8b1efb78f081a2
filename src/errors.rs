use std::fmt;

/// Error types for building and probing opening books
#[derive(Debug, Clone)]
pub enum BookError {
    /// A game-record source could not be opened or read
    SourceUnavailable { path: String, reason: String },
    /// A game record could not be parsed or replayed
    MalformedRecord { ply: usize, reason: String },
    /// A scaled weight did not fit in 16 bits
    EncodingOverflow { fingerprint: u64, weight: u64 },
    /// A book file is not a sequence of 16-byte records
    MalformedBook(String),
    /// Configuration error
    ConfigurationError(String),
    /// File I/O operation failed
    IoError(String),
    /// One or more shards failed under a fail-fast policy
    ShardsFailed {
        failed: usize,
        total: usize,
        first_error: String,
    },
}

impl fmt::Display for BookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookError::SourceUnavailable { path, reason } => {
                write!(f, "Source unavailable '{}': {}", path, reason)
            }
            BookError::MalformedRecord { ply, reason } => {
                write!(f, "Malformed record at ply {}: {}", ply, reason)
            }
            BookError::EncodingOverflow { fingerprint, weight } => write!(
                f,
                "Encoding overflow for {:016x}: scaled weight {} exceeds 65535",
                fingerprint, weight
            ),
            BookError::MalformedBook(msg) => write!(f, "Malformed book: {}", msg),
            BookError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            BookError::IoError(msg) => write!(f, "I/O error: {}", msg),
            BookError::ShardsFailed {
                failed,
                total,
                first_error,
            } => write!(
                f,
                "{} of {} shards failed (first: {})",
                failed, total, first_error
            ),
        }
    }
}

impl std::error::Error for BookError {}

// Convenience type alias
pub type Result<T> = std::result::Result<T, BookError>;

impl From<std::io::Error> for BookError {
    fn from(error: std::io::Error) -> Self {
        BookError::IoError(error.to_string())
    }
}

impl From<serde_json::Error> for BookError {
    fn from(error: serde_json::Error) -> Self {
        BookError::IoError(format!("JSON serialization error: {}", error))
    }
}

impl BookError {
    /// Whether the shard that produced this error may keep reading records
    pub fn is_recoverable(&self) -> bool {
        matches!(self, BookError::MalformedRecord { .. })
    }
}

#[macro_export]
macro_rules! malformed_record {
    ($ply:expr, $msg:expr) => {
        $crate::errors::BookError::MalformedRecord {
            ply: $ply,
            reason: $msg.to_string(),
        }
    };
    ($ply:expr, $fmt:expr, $($arg:tt)*) => {
        $crate::errors::BookError::MalformedRecord {
            ply: $ply,
            reason: format!($fmt, $($arg)*),
        }
    };
}

#[macro_export]
macro_rules! source_unavailable {
    ($path:expr, $reason:expr) => {
        $crate::errors::BookError::SourceUnavailable {
            path: $path.display().to_string(),
            reason: $reason.to_string(),
        }
    };
}

#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::errors::BookError::ConfigurationError($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::errors::BookError::ConfigurationError(format!($fmt, $($arg)*))
    };
}

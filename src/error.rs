//! Error Types

use thiserror::Error;

/// Main error type
#[derive(Debug, Clone, Error)]
pub enum WavConvError {
    /// Input could not be parsed as a supported WAV file
    #[error("Format error: {message}")]
    Format { message: String },
    #[error("IO error: {message}")]
    Io { message: String },
    #[error("Config error: {message}")]
    Config { message: String },
    #[error("Server error: {message}")]
    Server { message: String },
    #[error("Upload exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },
    #[error("Please upload at least one file")]
    NoInput,
}

impl WavConvError {
    pub fn format<S: Into<String>>(msg: S) -> Self { Self::Format { message: msg.into() } }
    pub fn io<S: Into<String>>(msg: S) -> Self { Self::Io { message: msg.into() } }
    pub fn config<S: Into<String>>(msg: S) -> Self { Self::Config { message: msg.into() } }
    pub fn server<S: Into<String>>(msg: S) -> Self { Self::Server { message: msg.into() } }

    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format { .. })
    }
}

pub type Result<T> = std::result::Result<T, WavConvError>;

impl From<std::io::Error> for WavConvError {
    fn from(err: std::io::Error) -> Self { Self::io(err.to_string()) }
}

impl From<hound::Error> for WavConvError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => Self::io(e.to_string()),
            other => Self::format(other.to_string()),
        }
    }
}

impl From<hyper::Error> for WavConvError {
    fn from(err: hyper::Error) -> Self { Self::server(format!("HTTP: {}", err)) }
}

/// Size limit carried by a multer error, including one wrapped in a stream read failure.
fn multer_limit(err: &multer::Error) -> Option<u64> {
    match err {
        multer::Error::StreamSizeExceeded { limit } => Some(*limit),
        multer::Error::FieldSizeExceeded { limit, .. } => Some(*limit),
        multer::Error::StreamReadFailed(inner) => inner.downcast_ref::<multer::Error>().and_then(multer_limit),
        _ => None,
    }
}

impl From<multer::Error> for WavConvError {
    fn from(err: multer::Error) -> Self {
        match multer_limit(&err) {
            Some(limit) => Self::TooLarge { limit },
            None => Self::server(format!("Multipart: {}", err)),
        }
    }
}

impl From<toml::de::Error> for WavConvError {
    fn from(err: toml::de::Error) -> Self { Self::config(format!("Failed to parse config file: {}", err)) }
}

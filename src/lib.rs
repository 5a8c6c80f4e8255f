//! wavconv - WAV File Converter
//!
//! Re-writes WAV files while preserving sample rate, bit depth, channel count
//! and sample data, from the command line or a web upload page.

pub mod audio;
pub mod config;
pub mod error;
pub mod processing;
pub mod server;

pub use audio::{AudioConverter, ConversionResult, Subtype, WavAudio};
pub use config::{Args, Command, Config};
pub use error::{WavConvError, Result};
pub use processing::{BatchConverter, BatchInput, BatchReport};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Initialise `env_logger`. `RUST_LOG` wins over the verbose flag.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .try_init()
        .ok();
}

pub fn get_library_info() -> LibraryInfo {
    LibraryInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct LibraryInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

impl std::fmt::Display for LibraryInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} v{} - {}", self.name, self.version, self.description)
    }
}

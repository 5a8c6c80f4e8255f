//! Audio Module
//!
//! WAV reading and writing with subtype detection, and the converter that
//! copies a file while preserving every format property.

pub mod riff;
pub mod wav;
pub mod converter;

pub use wav::{WavAudio, Subtype, AudioHeader, SampleBuffer};
pub use converter::{AudioConverter, ConversionResult, DEFAULT_OUTPUT_PREFIX};

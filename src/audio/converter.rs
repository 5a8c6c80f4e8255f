//! Property-preserving WAV conversion

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use log::{debug, warn};
use crate::audio::{AudioHeader, WavAudio};
use crate::error::{WavConvError, Result};

pub const DEFAULT_OUTPUT_PREFIX: &str = "converted_";

/// Outcome of converting one file.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub source_name: String,
    pub output_name: Option<String>,
    pub output_path: Option<PathBuf>,
    /// Metadata of the written file; `None` on failure
    pub header: Option<AudioHeader>,
    pub error: Option<WavConvError>,
}

impl ConversionResult {
    fn succeeded(source_name: String, output_path: PathBuf, header: AudioHeader) -> Self {
        let output_name = output_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        Self {
            source_name,
            output_name,
            output_path: Some(output_path),
            header: Some(header),
            error: None,
        }
    }

    pub fn failed(source_name: String, error: WavConvError) -> Self {
        Self {
            source_name,
            output_name: None,
            output_path: None,
            header: None,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Human-readable status line for this file.
    pub fn summary(&self) -> String {
        match (&self.header, &self.error) {
            (_, Some(err)) => format!("{}: ERROR: {}", self.source_name, err),
            (Some(header), None) => format!("{}: {}", self.source_name, header.summary()),
            (None, None) => format!("{}: converted", self.source_name),
        }
    }
}

pub struct AudioConverter {
    prefix: String,
}

impl Default for AudioConverter {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_PREFIX)
    }
}

impl AudioConverter {
    pub fn new<S: Into<String>>(prefix: S) -> Self {
        Self { prefix: prefix.into() }
    }

    /// Output file name for an input name: `<prefix><name>`.
    pub fn output_name(&self, source_name: &str) -> String {
        format!("{}{}", self.prefix, source_name)
    }

    /// Output file name that is not in `taken`.
    ///
    /// A clash gets a counter before the extension:
    /// `converted_take.wav`, `converted_take (2).wav`, ...
    pub fn unique_output_name(&self, source_name: &str, taken: &HashSet<String>) -> String {
        let name = self.output_name(source_name);
        if !taken.contains(&name) {
            return name;
        }

        let (stem, ext) = match name.rfind('.') {
            Some(dot) if dot > 0 => name.split_at(dot),
            _ => (name.as_str(), ""),
        };
        let mut n = 2u32;
        loop {
            let candidate = format!("{} ({}){}", stem, n, ext);
            if !taken.contains(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Read `input` and write an identical WAV into `output_dir`.
    ///
    /// `source_name` is the name shown in reports and used for the output
    /// file; uploads arrive under scratch paths whose names differ from the
    /// user's file name.
    pub fn convert_file(&self, source_name: &str, input: &Path, output_dir: &Path) -> Result<ConversionResult> {
        self.convert_to(source_name, input, &output_dir.join(self.output_name(source_name)))
    }

    /// Read `input` and write an identical WAV at `output_path`.
    pub fn convert_to(&self, source_name: &str, input: &Path, output_path: &Path) -> Result<ConversionResult> {
        debug!("Converting {} -> {}", input.display(), output_path.display());

        let audio = WavAudio::from_file(input)?;
        audio.save_to_file(output_path)?;

        debug!("{}: {}", source_name, audio.header.summary());
        Ok(ConversionResult::succeeded(
            source_name.to_string(),
            output_path.to_path_buf(),
            audio.header,
        ))
    }

    /// Like `convert_to`, but a failure becomes a failed result instead of an error.
    pub fn convert_or_report(&self, source_name: &str, input: &Path, output_path: &Path) -> ConversionResult {
        match self.convert_to(source_name, input, output_path) {
            Ok(result) => result,
            Err(e) => {
                warn!("Failed to convert {}: {}", source_name, e);
                ConversionResult::failed(source_name.to_string(), e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{SampleBuffer, Subtype};
    use tempfile::TempDir;

    #[test]
    fn test_output_name() {
        assert_eq!(AudioConverter::default().output_name("take1.wav"), "converted_take1.wav");
        assert_eq!(AudioConverter::new("copy-").output_name("a.wav"), "copy-a.wav");
    }

    #[test]
    fn test_unique_output_name() {
        let converter = AudioConverter::default();
        let mut taken = HashSet::new();
        assert_eq!(converter.unique_output_name("take.wav", &taken), "converted_take.wav");

        taken.insert("converted_take.wav".to_string());
        assert_eq!(converter.unique_output_name("take.wav", &taken), "converted_take (2).wav");

        taken.insert("converted_take (2).wav".to_string());
        assert_eq!(converter.unique_output_name("take.wav", &taken), "converted_take (3).wav");

        taken.insert("converted_noext".to_string());
        assert_eq!(converter.unique_output_name("noext", &taken), "converted_noext (2)");
    }

    #[test]
    fn test_convert_float_mono() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.wav");
        let samples = vec![0.5f32, -1.25, 0.0, 3.0e-7];
        WavAudio::new(48000, 1, Subtype::Float, SampleBuffer::Float(samples.clone()))
            .unwrap()
            .save_to_file(&input)
            .unwrap();

        let out_dir = dir.path().join("out");
        let result = AudioConverter::default()
            .convert_file("voice.wav", &input, &out_dir)
            .unwrap();

        assert!(result.is_success());
        assert_eq!(result.output_name.as_deref(), Some("converted_voice.wav"));
        let output = WavAudio::from_file(result.output_path.as_ref().unwrap()).unwrap();
        assert_eq!(output.subtype(), Subtype::Float);
        assert_eq!(output.channels(), 1);
        assert!(output.samples().bit_identical(&SampleBuffer::Float(samples)));
        assert_eq!(result.summary(), "voice.wav: 32-bit, 48000 Hz, 1 channel (FLOAT)");
    }

    #[test]
    fn test_convert_empty_file_reports_error() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("empty.wav");
        std::fs::write(&input, b"").unwrap();

        let converter = AudioConverter::default();
        assert!(converter.convert_file("empty.wav", &input, dir.path()).unwrap_err().is_format());

        let result = converter.convert_or_report("empty.wav", &input, &dir.path().join("converted_empty.wav"));
        assert!(!result.is_success());
        assert!(result.output_path.is_none());
        assert!(result.summary().starts_with("empty.wav: ERROR:"));
        assert!(!dir.path().join("converted_empty.wav").exists());
    }
}

//! Aggregated conversion report

use std::path::PathBuf;
use crate::audio::ConversionResult;

#[derive(Debug, Clone)]
pub struct BatchReport {
    pub results: Vec<ConversionResult>,
    pub processing_time_seconds: f64,
}

impl BatchReport {
    pub fn new(results: Vec<ConversionResult>, processing_time_seconds: f64) -> Self {
        Self { results, processing_time_seconds }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.success_count() == self.len()
    }

    /// Paths of the files that were written, in input order.
    pub fn output_paths(&self) -> Vec<PathBuf> {
        self.results
            .iter()
            .filter_map(|r| r.output_path.clone())
            .collect()
    }

    /// Text report: a status line, then one block per file.
    pub fn render(&self) -> String {
        let mut text = if self.all_succeeded() {
            "Conversion completed successfully!\n".to_string()
        } else {
            format!("Converted {} of {} files.\n", self.success_count(), self.len())
        };

        for result in &self.results {
            match (&result.header, &result.error) {
                (Some(header), None) => {
                    text.push_str(&format!("\n{}:\n", result.source_name));
                    text.push_str(&format!("- Bit Depth: {}-bit\n", header.bits_per_sample()));
                    text.push_str(&format!("- Sample Rate: {}Hz\n", header.sample_rate));
                    text.push_str(&format!("- Channels: {}\n", header.channels));
                    text.push_str(&format!("- Format: {}\n", header.subtype));
                    text.push_str(&format!("- Summary: {}\n", header.summary()));
                }
                _ => {
                    text.push_str(&format!("\n{}\n", result.summary()));
                }
            }
        }

        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioConverter, SampleBuffer, Subtype, WavAudio};
    use tempfile::TempDir;

    #[test]
    fn test_render_success_and_failure() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.wav");
        WavAudio::new(44100, 2, Subtype::Pcm16, SampleBuffer::Int(vec![1, 2, 3, 4]))
            .unwrap()
            .save_to_file(&good)
            .unwrap();
        let missing = dir.path().join("missing.wav");

        let converter = AudioConverter::default();
        let results = vec![
            converter.convert_or_report("good.wav", &good, &dir.path().join("converted_good.wav")),
            converter.convert_or_report("missing.wav", &missing, &dir.path().join("converted_missing.wav")),
        ];
        let report = BatchReport::new(results, 0.01);
        let text = report.render();

        assert!(text.starts_with("Converted 1 of 2 files."));
        assert!(text.contains("good.wav:\n- Bit Depth: 16-bit\n- Sample Rate: 44100Hz\n- Channels: 2\n- Format: PCM_16"));
        assert!(text.contains("16-bit, 44100 Hz, 2 channels"));
        assert!(text.contains("missing.wav: ERROR: IO error:"));
    }

    #[test]
    fn test_render_all_succeeded() {
        let report = BatchReport::new(Vec::new(), 0.0);
        assert!(report.is_empty());
        assert!(report.render().starts_with("Conversion completed successfully!"));
    }
}

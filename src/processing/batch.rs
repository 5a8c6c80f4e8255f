//! Batch conversion: one converter call per input file

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use log::{debug, info};
use crate::audio::AudioConverter;
use crate::config::Config;
use crate::error::{WavConvError, Result};
use crate::processing::BatchReport;

/// A file to convert and the name it should be reported under.
#[derive(Debug, Clone)]
pub struct BatchInput {
    pub name: String,
    pub path: PathBuf,
}

impl BatchInput {
    pub fn new<S: Into<String>, P: Into<PathBuf>>(name: S, path: P) -> Self {
        Self { name: name.into(), path: path.into() }
    }

    /// Use the file's own name.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::new(name, path)
    }
}

pub struct BatchConverter {
    converter: AudioConverter,
    output_dir: PathBuf,
}

impl BatchConverter {
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            converter: AudioConverter::default(),
            output_dir: output_dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            converter: AudioConverter::new(config.output.prefix.clone()),
            output_dir: config.output.dir.clone(),
        }
    }

    pub fn with_output_dir<P: Into<PathBuf>>(mut self, output_dir: P) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Convert every input in order. A failing file is recorded in the
    /// report and does not stop the rest.
    ///
    /// Inputs sharing a name get distinct output names, so no output
    /// overwrites another from the same batch.
    pub fn convert_all(&self, inputs: &[BatchInput]) -> Result<BatchReport> {
        if inputs.is_empty() {
            return Err(WavConvError::NoInput);
        }

        let start_time = Instant::now();
        info!("Converting {} file(s) into {}", inputs.len(), self.output_dir.display());

        let mut results = Vec::with_capacity(inputs.len());
        let mut taken = HashSet::new();
        for input in inputs {
            let output_name = self.converter.unique_output_name(&input.name, &taken);
            let output_path = self.output_dir.join(&output_name);
            let result = self.converter.convert_or_report(&input.name, &input.path, &output_path);
            if result.is_success() {
                taken.insert(output_name);
            }
            debug!("{}", result.summary());
            results.push(result);
        }

        let report = BatchReport::new(results, start_time.elapsed().as_secs_f64());
        info!(
            "Converted {} of {} file(s) in {:.3}s",
            report.success_count(),
            report.len(),
            report.processing_time_seconds
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{SampleBuffer, Subtype, WavAudio};
    use tempfile::TempDir;

    fn write_pcm16(path: &Path, samples: Vec<i32>) {
        WavAudio::new(44100, 2, Subtype::Pcm16, SampleBuffer::Int(samples))
            .unwrap()
            .save_to_file(path)
            .unwrap();
    }

    #[test]
    fn test_empty_batch_is_error() {
        let dir = TempDir::new().unwrap();
        let err = BatchConverter::new(dir.path()).convert_all(&[]).unwrap_err();
        assert!(matches!(err, WavConvError::NoInput));
    }

    #[test]
    fn test_bad_file_does_not_stop_batch() {
        let dir = TempDir::new().unwrap();
        let good_a = dir.path().join("a.wav");
        let bad = dir.path().join("b.wav");
        let good_c = dir.path().join("c.wav");
        write_pcm16(&good_a, vec![1, -1, 2, -2]);
        std::fs::write(&bad, b"RIFF").unwrap();
        write_pcm16(&good_c, vec![100, 200]);

        let out = dir.path().join("out");
        let inputs = [
            BatchInput::from_path(&good_a),
            BatchInput::from_path(&bad),
            BatchInput::from_path(&good_c),
        ];
        let report = BatchConverter::new(&out).convert_all(&inputs).unwrap();

        assert_eq!(report.len(), 3);
        assert_eq!(report.success_count(), 2);
        assert!(!report.all_succeeded());
        assert_eq!(
            report.output_paths(),
            vec![out.join("converted_a.wav"), out.join("converted_c.wav")]
        );
        assert!(!out.join("converted_b.wav").exists());
        assert!(report.results[1].error.is_some());
    }

    #[test]
    fn test_upload_name_differs_from_path() {
        let dir = TempDir::new().unwrap();
        let scratch = dir.path().join("upload-0");
        write_pcm16(&scratch, vec![5, 6]);

        let report = BatchConverter::new(dir.path())
            .convert_all(&[BatchInput::new("drums.wav", &scratch)])
            .unwrap();
        assert_eq!(report.output_paths(), vec![dir.path().join("converted_drums.wav")]);
    }

    #[test]
    fn test_same_names_do_not_overwrite() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("a")).unwrap();
        std::fs::create_dir_all(dir.path().join("b")).unwrap();
        let first = dir.path().join("a").join("take.wav");
        let second = dir.path().join("b").join("take.wav");
        write_pcm16(&first, vec![1, 2, 3, 4]);
        write_pcm16(&second, vec![9, 9]);

        let out = dir.path().join("out");
        let report = BatchConverter::new(&out)
            .convert_all(&[BatchInput::from_path(&first), BatchInput::from_path(&second)])
            .unwrap();

        assert!(report.all_succeeded());
        assert_eq!(
            report.output_paths(),
            vec![out.join("converted_take.wav"), out.join("converted_take (2).wav")]
        );
        let a = WavAudio::from_file(out.join("converted_take.wav")).unwrap();
        let b = WavAudio::from_file(out.join("converted_take (2).wav")).unwrap();
        assert!(a.samples().bit_identical(&SampleBuffer::Int(vec![1, 2, 3, 4])));
        assert!(b.samples().bit_identical(&SampleBuffer::Int(vec![9, 9])));
    }

    #[test]
    fn test_failed_input_does_not_reserve_name() {
        let dir = TempDir::new().unwrap();
        let bad = dir.path().join("bad.wav");
        std::fs::write(&bad, b"").unwrap();
        let good = dir.path().join("good");
        std::fs::create_dir_all(&good).unwrap();
        let good = good.join("bad.wav");
        write_pcm16(&good, vec![7, 7]);

        let out = dir.path().join("out");
        let report = BatchConverter::new(&out)
            .convert_all(&[BatchInput::from_path(&bad), BatchInput::from_path(&good)])
            .unwrap();
        assert_eq!(report.output_paths(), vec![out.join("converted_bad.wav")]);
    }

    #[test]
    fn test_from_config_uses_prefix() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.output.dir = dir.path().join("cfg-out");
        config.output.prefix = "copy_".to_string();

        let input = dir.path().join("x.wav");
        write_pcm16(&input, vec![0, 0]);

        let batch = BatchConverter::from_config(&config);
        assert_eq!(batch.output_dir(), config.output.dir.as_path());
        let report = batch.convert_all(&[BatchInput::from_path(&input)]).unwrap();
        assert!(config.output.dir.join("copy_x.wav").exists());
        assert!(report.all_succeeded());
    }
}

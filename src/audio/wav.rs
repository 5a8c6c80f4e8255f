//! WAV audio file reading and writing

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use hound::{SampleFormat, WavReader, WavWriter};
use log::debug;
use crate::audio::riff::{self, FmtChunk, WAVE_FORMAT_IEEE_FLOAT, WAVE_FORMAT_PCM};
use crate::error::{WavConvError, Result};

/// Sample encoding within a WAV container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subtype {
    PcmU8,
    Pcm16,
    Pcm24,
    Pcm32,
    Float,
    Double,
}

impl Subtype {
    pub const ALL: [Subtype; 6] = [
        Subtype::PcmU8,
        Subtype::Pcm16,
        Subtype::Pcm24,
        Subtype::Pcm32,
        Subtype::Float,
        Subtype::Double,
    ];

    /// Map a `fmt ` chunk's format code and bit depth to a subtype.
    pub fn detect(format_tag: u16, bits_per_sample: u16) -> Result<Self> {
        match (format_tag, bits_per_sample) {
            (WAVE_FORMAT_PCM, 8) => Ok(Subtype::PcmU8),
            (WAVE_FORMAT_PCM, 16) => Ok(Subtype::Pcm16),
            (WAVE_FORMAT_PCM, 24) => Ok(Subtype::Pcm24),
            (WAVE_FORMAT_PCM, 32) => Ok(Subtype::Pcm32),
            (WAVE_FORMAT_IEEE_FLOAT, 32) => Ok(Subtype::Float),
            (WAVE_FORMAT_IEEE_FLOAT, 64) => Ok(Subtype::Double),
            (tag, bits) => Err(WavConvError::format(format!(
                "unsupported subtype: format {} with {} bits per sample",
                tag, bits
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Subtype::PcmU8 => "PCM_U8",
            Subtype::Pcm16 => "PCM_16",
            Subtype::Pcm24 => "PCM_24",
            Subtype::Pcm32 => "PCM_32",
            Subtype::Float => "FLOAT",
            Subtype::Double => "DOUBLE",
        }
    }

    pub fn bits_per_sample(&self) -> u16 {
        match self {
            Subtype::PcmU8 => 8,
            Subtype::Pcm16 => 16,
            Subtype::Pcm24 => 24,
            Subtype::Pcm32 | Subtype::Float => 32,
            Subtype::Double => 64,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Subtype::Float | Subtype::Double)
    }

    /// `hound` spec for this subtype; `None` for DOUBLE, which `hound` cannot write.
    pub fn to_wav_spec(&self, sample_rate: u32, channels: u16) -> Option<hound::WavSpec> {
        let sample_format = match self {
            Subtype::Double => return None,
            Subtype::Float => SampleFormat::Float,
            _ => SampleFormat::Int,
        };
        Some(hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: self.bits_per_sample(),
            sample_format,
        })
    }
}

impl fmt::Display for Subtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioHeader {
    pub sample_rate: u32,
    pub channels: u16,
    pub subtype: Subtype,
    /// Samples per channel
    pub frames: u32,
    pub duration: f64,
}

impl AudioHeader {
    pub fn new(sample_rate: u32, channels: u16, subtype: Subtype, frames: u32) -> Self {
        let duration = if sample_rate == 0 {
            0.0
        } else {
            frames as f64 / sample_rate as f64
        };

        Self {
            sample_rate,
            channels,
            subtype,
            frames,
            duration,
        }
    }

    pub fn bits_per_sample(&self) -> u16 {
        self.subtype.bits_per_sample()
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(WavConvError::format("Sample rate cannot be 0"));
        }

        if self.channels == 0 {
            return Err(WavConvError::format("Channel count cannot be 0"));
        }

        Ok(())
    }

    /// One-line description of the preserved properties,
    /// e.g. `16-bit, 44100 Hz, 2 channels (PCM_16)`.
    pub fn summary(&self) -> String {
        let channel_word = if self.channels == 1 { "channel" } else { "channels" };
        format!(
            "{}-bit, {} Hz, {} {} ({})",
            self.bits_per_sample(),
            self.sample_rate,
            self.channels,
            channel_word,
            self.subtype
        )
    }
}

/// Interleaved sample data in the widest lossless form of its subtype.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleBuffer {
    Int(Vec<i32>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

impl SampleBuffer {
    pub fn len(&self) -> usize {
        match self {
            SampleBuffer::Int(s) => s.len(),
            SampleBuffer::Float(s) => s.len(),
            SampleBuffer::Double(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Exact comparison: floats are compared by bit pattern, so NaN payloads
    /// and signed zeros count.
    pub fn bit_identical(&self, other: &SampleBuffer) -> bool {
        match (self, other) {
            (SampleBuffer::Int(a), SampleBuffer::Int(b)) => a == b,
            (SampleBuffer::Float(a), SampleBuffer::Float(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
            }
            (SampleBuffer::Double(a), SampleBuffer::Double(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
            }
            _ => false,
        }
    }

    fn matches_subtype(&self, subtype: Subtype) -> bool {
        matches!(
            (self, subtype),
            (SampleBuffer::Int(_), Subtype::PcmU8 | Subtype::Pcm16 | Subtype::Pcm24 | Subtype::Pcm32)
                | (SampleBuffer::Float(_), Subtype::Float)
                | (SampleBuffer::Double(_), Subtype::Double)
        )
    }
}

#[derive(Debug, Clone)]
pub struct WavAudio {
    pub path: Option<PathBuf>,
    pub header: AudioHeader,
    pub samples: SampleBuffer,
}

impl WavAudio {
    pub fn new(sample_rate: u32, channels: u16, subtype: Subtype, samples: SampleBuffer) -> Result<Self> {
        if !samples.matches_subtype(subtype) {
            return Err(WavConvError::format(format!(
                "sample buffer does not match subtype {}",
                subtype
            )));
        }
        if channels == 0 {
            return Err(WavConvError::format("Channel count cannot be 0"));
        }

        let frames = u32::try_from(samples.len() / channels as usize)
            .map_err(|_| WavConvError::format("too many samples for a WAV file"))?;
        let audio = WavAudio {
            path: None,
            header: AudioHeader::new(sample_rate, channels, subtype, frames),
            samples,
        };
        audio.validate()?;
        Ok(audio)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let fmt = riff::probe(path)?;
        let subtype = Subtype::detect(fmt.format_tag, fmt.bits_per_sample)?;
        debug!("{}: detected {} ({} Hz, {} ch)", path.display(), subtype, fmt.sample_rate, fmt.channels);

        let (header, samples) = match subtype {
            Subtype::Double => Self::read_double(path)?,
            _ => Self::read_with_hound(path, subtype, &fmt)?,
        };

        let audio = WavAudio {
            path: Some(path.to_path_buf()),
            header,
            samples,
        };
        audio.validate()?;
        Ok(audio)
    }

    fn read_with_hound(path: &Path, subtype: Subtype, fmt: &FmtChunk) -> Result<(AudioHeader, SampleBuffer)> {
        let file = File::open(path)
            .map_err(|e| WavConvError::io(format!("Cannot open audio file {}: {}", path.display(), e)))?;

        let mut reader = WavReader::new(BufReader::new(file))
            .map_err(|e| WavConvError::format(format!("Cannot create WAV reader: {}", e)))?;

        let spec = reader.spec();
        if spec.bits_per_sample != subtype.bits_per_sample() || spec.channels != fmt.channels {
            return Err(WavConvError::format(format!(
                "inconsistent fmt chunk: {} bits, {} channels",
                spec.bits_per_sample, spec.channels
            )));
        }

        let samples = match spec.sample_format {
            SampleFormat::Int => SampleBuffer::Int(
                reader
                    .samples::<i32>()
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|e| WavConvError::format(format!("Failed to read sample: {}", e)))?,
            ),
            SampleFormat::Float => SampleBuffer::Float(
                reader
                    .samples::<f32>()
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|e| WavConvError::format(format!("Failed to read sample: {}", e)))?,
            ),
        };

        let header = AudioHeader::new(spec.sample_rate, spec.channels, subtype, reader.duration());
        Ok((header, samples))
    }

    fn read_double(path: &Path) -> Result<(AudioHeader, SampleBuffer)> {
        let (fmt, samples) = riff::read_double(path)?;
        if fmt.channels == 0 {
            return Err(WavConvError::format("Channel count cannot be 0"));
        }
        let frames = (samples.len() / fmt.channels as usize) as u32;
        let header = AudioHeader::new(fmt.sample_rate, fmt.channels, Subtype::Double, frames);
        Ok((header, SampleBuffer::Double(samples)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| WavConvError::io(format!("Cannot create output directory: {}", e)))?;
            }
        }

        // A failed write must not leave a truncated file behind.
        if let Err(e) = self.write_file(path) {
            if path.exists() {
                if let Err(rm) = std::fs::remove_file(path) {
                    debug!("Cannot remove partial output {}: {}", path.display(), rm);
                }
            }
            return Err(e);
        }
        Ok(())
    }

    fn write_file(&self, path: &Path) -> Result<()> {
        let header = &self.header;
        let spec = match header.subtype.to_wav_spec(header.sample_rate, header.channels) {
            Some(spec) => spec,
            None => {
                return match &self.samples {
                    SampleBuffer::Double(samples) => {
                        riff::write_double(path, header.sample_rate, header.channels, samples)
                    }
                    _ => Err(WavConvError::format("DOUBLE subtype requires 64-bit float samples")),
                };
            }
        };

        let mut writer = WavWriter::create(path, spec)
            .map_err(|e| WavConvError::io(format!("Cannot create output file {}: {}", path.display(), e)))?;

        match &self.samples {
            SampleBuffer::Int(samples) => {
                for &sample in samples {
                    writer
                        .write_sample(sample)
                        .map_err(|e| WavConvError::format(format!("Failed to write sample: {}", e)))?;
                }
            }
            SampleBuffer::Float(samples) => {
                for &sample in samples {
                    writer
                        .write_sample(sample)
                        .map_err(|e| WavConvError::format(format!("Failed to write sample: {}", e)))?;
                }
            }
            SampleBuffer::Double(_) => {
                return Err(WavConvError::format(format!(
                    "{} subtype cannot hold 64-bit float samples",
                    header.subtype
                )));
            }
        }

        writer
            .finalize()
            .map_err(|e| WavConvError::io(format!("Failed to finalize WAV writing: {}", e)))?;

        Ok(())
    }

    pub fn sample_rate(&self) -> u32 {
        self.header.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.header.channels
    }

    pub fn subtype(&self) -> Subtype {
        self.header.subtype
    }

    pub fn frames(&self) -> u32 {
        self.header.frames
    }

    pub fn duration(&self) -> f64 {
        self.header.duration
    }

    pub fn samples(&self) -> &SampleBuffer {
        &self.samples
    }

    pub fn validate(&self) -> Result<()> {
        self.header.validate()?;

        if !self.samples.matches_subtype(self.header.subtype) {
            return Err(WavConvError::format(format!(
                "sample buffer does not match subtype {}",
                self.header.subtype
            )));
        }

        let channels = self.header.channels as usize;
        if self.samples.len() % channels != 0 {
            return Err(WavConvError::format(format!(
                "Sample count {} is not a multiple of the channel count {}",
                self.samples.len(),
                channels
            )));
        }

        if (self.samples.len() / channels) as u32 != self.header.frames {
            return Err(WavConvError::format(format!(
                "Data length mismatch: header shows {} frames, actual {} frames",
                self.header.frames,
                self.samples.len() / channels
            )));
        }

        Ok(())
    }
}

//! Minimal RIFF/WAVE chunk access
//!
//! `hound` covers integer PCM and 32-bit float. This module reads the `fmt `
//! chunk of any WAV file so the subtype can be detected before decoding, and
//! handles the 64-bit float data chunk that `hound` does not support.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;
use crate::error::{WavConvError, Result};

pub const WAVE_FORMAT_PCM: u16 = 1;
pub const WAVE_FORMAT_IEEE_FLOAT: u16 = 3;
pub const WAVE_FORMAT_EXTENSIBLE: u16 = 0xFFFE;

const RIFF_HEADER_LEN: u64 = 12;

/// Format fields of a `fmt ` chunk.
///
/// For `WAVE_FORMAT_EXTENSIBLE` files `format_tag` holds the format code from
/// the sub-format GUID, so callers never see 0xFFFE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FmtChunk {
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

impl FmtChunk {
    fn parse(body: &[u8]) -> Result<Self> {
        if body.len() < 16 {
            return Err(WavConvError::format("fmt chunk truncated"));
        }

        let raw_tag = le_u16(&body[0..2]);
        let format_tag = if raw_tag == WAVE_FORMAT_EXTENSIBLE {
            if body.len() < 40 {
                return Err(WavConvError::format("extensible fmt chunk truncated"));
            }
            le_u16(&body[24..26])
        } else {
            raw_tag
        };

        Ok(Self {
            format_tag,
            channels: le_u16(&body[2..4]),
            sample_rate: le_u32(&body[4..8]),
            block_align: le_u16(&body[12..14]),
            bits_per_sample: le_u16(&body[14..16]),
        })
    }
}

/// Read the RIFF header and `fmt ` chunk of the file at `path`.
pub fn probe<P: AsRef<Path>>(path: P) -> Result<FmtChunk> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| WavConvError::io(format!("Cannot open audio file {}: {}", path.display(), e)))?;
    probe_reader(&mut BufReader::new(file))
}

pub fn probe_reader<R: Read + Seek>(reader: &mut R) -> Result<FmtChunk> {
    check_riff_header(reader)?;

    while let Some((id, size)) = next_chunk(reader)? {
        if &id == b"fmt " {
            let body = read_body(reader, size)?;
            return FmtChunk::parse(&body);
        }
        skip_chunk(reader, size)?;
    }

    Err(WavConvError::format("no fmt chunk found"))
}

/// Read a 64-bit float WAV file: its format and interleaved samples.
pub fn read_double<P: AsRef<Path>>(path: P) -> Result<(FmtChunk, Vec<f64>)> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| WavConvError::io(format!("Cannot open audio file {}: {}", path.display(), e)))?;
    read_double_reader(&mut BufReader::new(file))
}

pub fn read_double_reader<R: Read + Seek>(reader: &mut R) -> Result<(FmtChunk, Vec<f64>)> {
    check_riff_header(reader)?;

    let mut fmt: Option<FmtChunk> = None;
    while let Some((id, size)) = next_chunk(reader)? {
        match &id {
            b"fmt " => {
                let body = read_body(reader, size)?;
                fmt = Some(FmtChunk::parse(&body)?);
            }
            b"data" => {
                let fmt = fmt.ok_or_else(|| WavConvError::format("data chunk before fmt chunk"))?;
                if fmt.format_tag != WAVE_FORMAT_IEEE_FLOAT || fmt.bits_per_sample != 64 {
                    return Err(WavConvError::format(format!(
                        "expected 64-bit float data, found format {} with {} bits",
                        fmt.format_tag, fmt.bits_per_sample
                    )));
                }
                if size % 8 != 0 {
                    return Err(WavConvError::format("data chunk is not a whole number of samples"));
                }

                let body = read_body(reader, size)?;
                let samples = body
                    .chunks_exact(8)
                    .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
                    .collect();
                return Ok((fmt, samples));
            }
            _ => skip_chunk(reader, size)?,
        }
    }

    Err(WavConvError::format("no data chunk found"))
}

/// Write interleaved 64-bit float samples as a WAVE_FORMAT_IEEE_FLOAT file.
pub fn write_double<P: AsRef<Path>>(
    path: P,
    sample_rate: u32,
    channels: u16,
    samples: &[f64],
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .map_err(|e| WavConvError::io(format!("Cannot create output file {}: {}", path.display(), e)))?;
    let mut writer = BufWriter::new(file);
    write_double_writer(&mut writer, sample_rate, channels, samples)?;
    writer.flush()?;
    Ok(())
}

pub fn write_double_writer<W: Write>(
    writer: &mut W,
    sample_rate: u32,
    channels: u16,
    samples: &[f64],
) -> Result<()> {
    if channels == 0 {
        return Err(WavConvError::format("channel count cannot be 0"));
    }

    let block_align = channels
        .checked_mul(8)
        .ok_or_else(|| WavConvError::format("too many channels"))?;
    let byte_rate = sample_rate
        .checked_mul(block_align as u32)
        .ok_or_else(|| WavConvError::format("sample rate too high"))?;
    let frames = (samples.len() / channels as usize) as u32;

    // RIFF size: "WAVE" + fmt (8 + 18) + fact (8 + 4) + data (8 + n)
    let data_len = u32::try_from(samples.len() * 8)
        .ok()
        .filter(|&n| n <= u32::MAX - 58)
        .ok_or_else(|| WavConvError::format("audio data too large for a WAV file"))?;
    let riff_len = 4 + 26 + 12 + 8 + data_len;

    writer.write_all(b"RIFF")?;
    writer.write_all(&riff_len.to_le_bytes())?;
    writer.write_all(b"WAVE")?;

    writer.write_all(b"fmt ")?;
    writer.write_all(&18u32.to_le_bytes())?;
    writer.write_all(&WAVE_FORMAT_IEEE_FLOAT.to_le_bytes())?;
    writer.write_all(&channels.to_le_bytes())?;
    writer.write_all(&sample_rate.to_le_bytes())?;
    writer.write_all(&byte_rate.to_le_bytes())?;
    writer.write_all(&block_align.to_le_bytes())?;
    writer.write_all(&64u16.to_le_bytes())?;
    writer.write_all(&0u16.to_le_bytes())?;

    writer.write_all(b"fact")?;
    writer.write_all(&4u32.to_le_bytes())?;
    writer.write_all(&frames.to_le_bytes())?;

    writer.write_all(b"data")?;
    writer.write_all(&data_len.to_le_bytes())?;
    for sample in samples {
        writer.write_all(&sample.to_le_bytes())?;
    }

    Ok(())
}

fn check_riff_header<R: Read + Seek>(reader: &mut R) -> Result<()> {
    let len = reader.seek(SeekFrom::End(0))?;
    if len == 0 {
        return Err(WavConvError::format("file is empty"));
    }
    if len < RIFF_HEADER_LEN {
        return Err(WavConvError::format("file too small to be a WAV file"));
    }
    reader.seek(SeekFrom::Start(0))?;

    let mut header = [0u8; 12];
    reader.read_exact(&mut header)?;
    if &header[0..4] != b"RIFF" {
        return Err(WavConvError::format("missing RIFF header"));
    }
    if &header[8..12] != b"WAVE" {
        return Err(WavConvError::format("missing WAVE marker"));
    }
    Ok(())
}

/// Chunk id and size, or `None` at end of file.
fn next_chunk<R: Read>(reader: &mut R) -> Result<Option<([u8; 4], u32)>> {
    let mut header = [0u8; 8];
    let mut filled = 0;
    while filled < header.len() {
        let n = reader.read(&mut header[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    match filled {
        0 => Ok(None),
        8 => {
            let id = [header[0], header[1], header[2], header[3]];
            Ok(Some((id, le_u32(&header[4..8]))))
        }
        _ => Err(WavConvError::format("truncated chunk header")),
    }
}

fn read_body<R: Read>(reader: &mut R, size: u32) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    let read = (&mut *reader).take(size as u64).read_to_end(&mut body)?;
    if read != size as usize {
        return Err(WavConvError::format("chunk extends past end of file"));
    }
    if size % 2 == 1 {
        // Chunks are word aligned; the pad byte may be missing on the last chunk.
        let mut pad = [0u8; 1];
        let _ = reader.read(&mut pad)?;
    }
    Ok(body)
}

fn skip_chunk<R: Seek>(reader: &mut R, size: u32) -> Result<()> {
    let padded = size as i64 + (size as i64 & 1);
    reader.seek(SeekFrom::Current(padded))?;
    Ok(())
}

fn le_u16(b: &[u8]) -> u16 {
    u16::from_le_bytes([b[0], b[1]])
}

fn le_u32(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn double_wav(samples: &[f64], channels: u16) -> Vec<u8> {
        let mut bytes = Vec::new();
        write_double_writer(&mut bytes, 48000, channels, samples).unwrap();
        bytes
    }

    #[test]
    fn test_probe_double() {
        let bytes = double_wav(&[0.25, -0.5, 1.5, 0.0], 2);
        let fmt = probe_reader(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(fmt.format_tag, WAVE_FORMAT_IEEE_FLOAT);
        assert_eq!(fmt.channels, 2);
        assert_eq!(fmt.sample_rate, 48000);
        assert_eq!(fmt.bits_per_sample, 64);
        assert_eq!(fmt.block_align, 16);
    }

    #[test]
    fn test_double_samples_survive() {
        let samples = [0.1, -0.7, f64::MIN_POSITIVE, 3.0, -1.0e-300, 0.0];
        let bytes = double_wav(&samples, 1);
        let (fmt, read) = read_double_reader(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(fmt.channels, 1);
        let read_bits: Vec<u64> = read.iter().map(|s| s.to_bits()).collect();
        let orig_bits: Vec<u64> = samples.iter().map(|s| s.to_bits()).collect();
        assert_eq!(read_bits, orig_bits);
    }

    #[test]
    fn test_riff_length_matches_file() {
        let bytes = double_wav(&[0.5; 10], 2);
        let riff_len = le_u32(&bytes[4..8]) as usize;
        assert_eq!(riff_len + 8, bytes.len());
    }

    #[test]
    fn test_probe_rejects_empty() {
        let err = probe_reader(&mut Cursor::new(Vec::new())).unwrap_err();
        assert!(err.is_format());
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_probe_rejects_non_riff() {
        let err = probe_reader(&mut Cursor::new(b"ID3\x04 this is an mp3 file".to_vec())).unwrap_err();
        assert!(err.to_string().contains("RIFF"));

        let err = probe_reader(&mut Cursor::new(b"RIFF\x00\x00\x00\x00AVI LIST".to_vec())).unwrap_err();
        assert!(err.to_string().contains("WAVE"));
    }

    #[test]
    fn test_probe_skips_unknown_chunks() {
        let mut bytes = b"RIFF\x00\x00\x00\x00WAVE".to_vec();
        bytes.extend_from_slice(b"LIST");
        bytes.extend_from_slice(&3u32.to_le_bytes());
        bytes.extend_from_slice(b"abc\x00");
        let fmt_part = &double_wav(&[0.0], 1)[12..];
        bytes.extend_from_slice(fmt_part);

        let fmt = probe_reader(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(fmt.bits_per_sample, 64);
    }

    #[test]
    fn test_probe_extensible_uses_sub_format() {
        let mut bytes = b"RIFF\x00\x00\x00\x00WAVEfmt ".to_vec();
        bytes.extend_from_slice(&40u32.to_le_bytes());
        bytes.extend_from_slice(&WAVE_FORMAT_EXTENSIBLE.to_le_bytes());
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&96000u32.to_le_bytes());
        bytes.extend_from_slice(&(96000u32 * 6).to_le_bytes());
        bytes.extend_from_slice(&6u16.to_le_bytes());
        bytes.extend_from_slice(&24u16.to_le_bytes());
        bytes.extend_from_slice(&22u16.to_le_bytes());
        bytes.extend_from_slice(&24u16.to_le_bytes());
        bytes.extend_from_slice(&3u32.to_le_bytes());
        bytes.extend_from_slice(&WAVE_FORMAT_PCM.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 14]);

        let fmt = probe_reader(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(fmt.format_tag, WAVE_FORMAT_PCM);
        assert_eq!(fmt.bits_per_sample, 24);
        assert_eq!(fmt.sample_rate, 96000);
    }

    #[test]
    fn test_truncated_data_chunk() {
        let mut bytes = double_wav(&[0.5; 8], 1);
        bytes.truncate(bytes.len() - 5);
        let err = read_double_reader(&mut Cursor::new(bytes)).unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn test_write_rejects_zero_channels() {
        let mut out = Vec::new();
        assert!(write_double_writer(&mut out, 44100, 0, &[0.0]).is_err());
    }
}

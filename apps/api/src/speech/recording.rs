//! Loads an uploaded WAV clip into memory as one mono 16-bit recording.

use std::path::Path;

use hound::{SampleFormat, WavReader};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("audio file could not be read as WAV: {0}")]
    Wav(#[from] hound::Error),

    #[error("unsupported WAV layout: {0}")]
    Unsupported(String),
}

/// A whole clip held in memory, downmixed to one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub sample_rate: u32,
    pub samples: Vec<i16>,
}

impl Recording {
    /// Reads the entire file at `path`.
    pub fn load(path: &Path) -> Result<Self, RecordingError> {
        let reader = WavReader::open(path)?;
        Self::from_reader(reader)
    }

    pub fn from_reader<R: std::io::Read>(reader: WavReader<R>) -> Result<Self, RecordingError> {
        let spec = reader.spec();
        if spec.channels == 0 {
            return Err(RecordingError::Unsupported("zero channels".to_string()));
        }

        let interleaved: Vec<i32> = match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Int, bits @ 1..=32) => reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| rescale_int(v, bits)))
                .collect::<Result<_, _>>()?,
            (SampleFormat::Float, 32) => reader
                .into_samples::<f32>()
                .map(|s| s.map(rescale_float))
                .collect::<Result<_, _>>()?,
            (format, bits) => {
                return Err(RecordingError::Unsupported(format!(
                    "{bits}-bit {format:?} samples"
                )))
            }
        };

        let channels = spec.channels as usize;
        let samples = interleaved
            .chunks(channels)
            .map(|frame| (frame.iter().sum::<i32>() / frame.len() as i32) as i16)
            .collect();

        Ok(Self {
            sample_rate: spec.sample_rate,
            samples,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Raw `audio/l16` payload: big-endian signed 16-bit samples.
    pub fn to_l16_be(&self) -> Vec<u8> {
        self.samples.iter().flat_map(|s| s.to_be_bytes()).collect()
    }
}

fn rescale_int(value: i32, bits: u16) -> i32 {
    if bits > 16 {
        value >> (bits - 16)
    } else {
        value << (16 - bits)
    }
}

fn rescale_float(value: f32) -> i32 {
    (value.clamp(-1.0, 1.0) * i16::MAX as f32) as i32
}

//! WAV artifact access shared by the transcribers.
//!
//! Extracted audio always lands on disk as a RIFF WAV file, so everything here
//! leans on `hound` for header probing, seeking and sample access.

use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use serde::Serialize;

use crate::ScribeError;

/// Sample rate the acquisition stage normalizes every artifact to
pub const RECOGNITION_SAMPLE_RATE: u32 = 16_000;

/// An extracted audio file on local disk, with its probed properties
#[derive(Debug, Clone, Serialize)]
pub struct LocalAudioArtifact {
    pub path: PathBuf,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channel_count: u16,
}

impl LocalAudioArtifact {
    /// Probe a WAV file on disk and record its shape
    pub fn probe(path: &Path) -> crate::Result<Self> {
        let reader = WavReader::open(path)?;
        let spec = reader.spec();
        let frames = reader.duration();

        Ok(Self {
            path: path.to_path_buf(),
            duration_seconds: frames as f64 / spec.sample_rate as f64,
            sample_rate: spec.sample_rate,
            channel_count: spec.channels,
        })
    }
}

/// Seekable sample access over an artifact, downmixed to mono on read
pub struct ArtifactReader {
    reader: WavReader<BufReader<File>>,
    spec: WavSpec,
    total_frames: u32,
}

impl ArtifactReader {
    pub fn open(artifact: &LocalAudioArtifact) -> Result<Self, ScribeError> {
        let reader = WavReader::open(&artifact.path).map_err(|e| ScribeError::SourceUnreadable {
            reason: format!("{}: {}", artifact.path.display(), e),
        })?;
        let spec = reader.spec();
        let total_frames = reader.duration();

        Ok(Self {
            reader,
            spec,
            total_frames,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.spec.sample_rate
    }

    pub fn duration_seconds(&self) -> f64 {
        self.total_frames as f64 / self.spec.sample_rate as f64
    }

    /// Read `duration_seconds` of audio starting at `start_seconds`, as mono i16.
    ///
    /// A window that runs past the end of the data is truncated, not an error.
    pub fn read_window(
        &mut self,
        start_seconds: f64,
        duration_seconds: f64,
    ) -> Result<Vec<i16>, ScribeError> {
        let rate = self.spec.sample_rate as f64;
        let start_frame = ((start_seconds * rate) as u32).min(self.total_frames);
        let frames_wanted = (duration_seconds * rate).round() as usize;

        self.reader.seek(start_frame).map_err(unreadable)?;

        let channels = self.spec.channels as usize;
        let interleaved = self.collect_samples(frames_wanted * channels)?;

        if channels <= 1 {
            return Ok(interleaved);
        }

        // Average interleaved channels down to one
        let mono = interleaved
            .chunks_exact(channels)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / channels as i32) as i16
            })
            .collect();

        Ok(mono)
    }

    fn collect_samples(&mut self, count: usize) -> Result<Vec<i16>, ScribeError> {
        let collected: Result<Vec<i16>, hound::Error> = match self.spec.sample_format {
            SampleFormat::Int => {
                // Scale other integer bit depths into the 16-bit range
                let shift = self.spec.bits_per_sample as i32 - 16;
                self.reader
                    .samples::<i32>()
                    .take(count)
                    .map(|s| {
                        s.map(|v| match shift {
                            d if d > 0 => (v >> d) as i16,
                            d if d < 0 => (v << -d) as i16,
                            _ => v as i16,
                        })
                    })
                    .collect()
            }
            SampleFormat::Float => self
                .reader
                .samples::<f32>()
                .take(count)
                .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * i16::MAX as f32) as i16))
                .collect(),
        };

        collected.map_err(unreadable)
    }
}

fn unreadable(err: impl std::fmt::Display) -> ScribeError {
    ScribeError::SourceUnreadable {
        reason: err.to_string(),
    }
}

/// Encode mono i16 samples as a standalone in-memory WAV payload
pub fn encode_wav(samples: &[i16], sample_rate: u32) -> crate::Result<Vec<u8>> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = WavWriter::new(&mut cursor, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    Ok(cursor.into_inner())
}

/// RMS level of a sample block on a 0.0..=1.0 scale
pub fn rms_level(samples: &[i16]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = samples
        .iter()
        .map(|&s| {
            let x = s as f64 / 32768.0;
            x * x
        })
        .sum();

    (sum_squares / samples.len() as f64).sqrt()
}

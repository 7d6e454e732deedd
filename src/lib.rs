//! Kannada Scribe - A Rust CLI tool for transcribing spoken Kannada from remote video streams
//!
//! This library provides functionality to probe a video or live-stream URL, pull out its
//! best audio track as a normalized WAV artifact, and transcribe the speech either through
//! Google Cloud Speech-to-Text or a local whisper model.

pub mod audio;
pub mod cli;
pub mod config;
pub mod extract;
pub mod output;
pub mod transcribe;
pub mod utils;

pub use audio::LocalAudioArtifact;
pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use extract::{AudioSource, FormatCandidate, MediaFetcher};
pub use transcribe::{TranscriptionPipeline, TranscriptionReport};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to the extraction and transcription pipeline
#[derive(thiserror::Error, Debug)]
pub enum ScribeError {
    #[error("Unsupported URL format: {0}")]
    UnsupportedUrl(String),

    #[error("No audio-capable format offered by the source")]
    NoSuitableFormat,

    #[error("Audio acquisition failed: {reason}")]
    AcquisitionFailed { reason: String },

    #[error("Audio artifact unreadable: {reason}")]
    SourceUnreadable { reason: String },
}

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::config::Config;
use crate::extract::{select_best_audio, AudioAcquirer, MediaFetcher, YtDlpFetcher};
use crate::utils::validate_url;

pub mod backend;
pub mod google;
pub mod processor;
#[cfg(feature = "local-whisper")]
pub mod whisper;

pub use backend::{build_backend, BackendKind, LanguageTag, RecognitionBackend, RecognitionError};
pub use processor::{
    ChunkStatus, ChunkedTranscript, TranscriptChunk, Transcriber, ERROR_SENTINEL, UNCLEAR_SENTINEL,
};

/// Per-run knobs resolved from configuration and CLI flags
#[derive(Debug, Clone)]
pub struct TranscribeOptions {
    /// Directory the extracted audio artifact lands in
    pub destination_dir: PathBuf,

    /// Language the recognizer is told to expect
    pub language: LanguageTag,

    /// Window length for chunked transcription, in seconds
    pub chunk_duration_secs: f64,

    /// Recordings longer than this are transcribed window by window
    pub long_audio_threshold_secs: f64,

    /// Print the probed format table before selecting one
    pub list_formats: bool,
}

/// Which transcription path a run took
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptionMode {
    WholeFile,
    Chunked,
}

/// The remote source a run drew from
#[derive(Debug, Clone, Serialize)]
pub struct SourceSummary {
    pub url: String,
    pub title: Option<String>,
    pub format_id: String,
    pub bitrate_kbps: Option<f64>,
}

/// Metadata about the transcription process
#[derive(Debug, Clone, Serialize)]
pub struct RunMetadata {
    /// Language the recognizer was asked for
    pub language: LanguageTag,

    /// Name of the recognition backend that served the run
    pub backend: String,

    /// Whole-file or chunked
    pub mode: TranscriptionMode,

    /// Audio duration in seconds
    pub audio_duration_seconds: f64,

    /// Wall-clock pipeline time in seconds
    pub processing_time_seconds: f64,

    /// Timestamp when transcription completed
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

/// Everything a finished run produced
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptionReport {
    /// The joined transcript, absent when recognition produced no text
    pub transcript: Option<String>,

    /// Per-window results; a single synthetic entry in whole-file mode
    pub chunks: Vec<TranscriptChunk>,

    /// Where the audio came from
    pub source: SourceSummary,

    /// Path to the extracted audio artifact, which is kept on disk
    pub audio_path: PathBuf,

    pub metadata: RunMetadata,
}

/// Main transcription pipeline
pub struct TranscriptionPipeline {
    fetcher: Arc<dyn MediaFetcher>,
    backend: Arc<dyn RecognitionBackend>,
}

impl TranscriptionPipeline {
    /// Create a pipeline with the configured fetcher and recognition backend
    pub async fn new(config: &Config) -> crate::Result<Self> {
        let fetcher: Arc<dyn MediaFetcher> = Arc::new(YtDlpFetcher::new(&config.tools));
        let backend = build_backend(&config.backend).await?;

        Ok(Self { fetcher, backend })
    }

    /// Assemble a pipeline from explicit collaborators
    pub fn with_components(
        fetcher: Arc<dyn MediaFetcher>,
        backend: Arc<dyn RecognitionBackend>,
    ) -> Self {
        Self { fetcher, backend }
    }

    /// Probe a URL, extract its best audio and transcribe the result
    pub async fn transcribe_from_url(
        &self,
        url: &str,
        options: &TranscribeOptions,
    ) -> crate::Result<TranscriptionReport> {
        let started = Instant::now();
        let url = validate_url(url)?;

        tracing::info!("Probing media source: {}", url);
        let source = self.fetcher.probe(&url).await?;

        if options.list_formats {
            crate::output::print_format_table(&source.candidates);
        }

        let selected = select_best_audio(&source.candidates)?;
        let summary = SourceSummary {
            url: url.clone(),
            title: source.title.clone(),
            format_id: selected.format_id.clone(),
            bitrate_kbps: selected.abr,
        };

        let acquirer = AudioAcquirer::new(Arc::clone(&self.fetcher));
        let artifact = acquirer
            .acquire(&url, selected, &options.destination_dir)
            .await?;

        let transcriber = Transcriber::new(self.backend.as_ref(), options.language.clone());

        let (mode, transcript, chunks) =
            if artifact.duration_seconds > options.long_audio_threshold_secs {
                tracing::info!(
                    duration = artifact.duration_seconds,
                    threshold = options.long_audio_threshold_secs,
                    "Long recording, transcribing in chunks"
                );
                let result = transcriber
                    .transcribe_long(&artifact, options.chunk_duration_secs)
                    .await?;
                (
                    TranscriptionMode::Chunked,
                    Some(result.transcript),
                    result.chunks,
                )
            } else {
                let text = transcriber.transcribe_whole(&artifact).await?;
                let chunks = text
                    .as_ref()
                    .map(|text| {
                        vec![TranscriptChunk {
                            index: 0,
                            start_offset_seconds: 0.0,
                            duration_seconds: artifact.duration_seconds,
                            text: text.clone(),
                            status: ChunkStatus::Ok,
                        }]
                    })
                    .unwrap_or_default();
                (TranscriptionMode::WholeFile, text, chunks)
            };

        tracing::info!(
            mode = ?mode,
            chunks = chunks.len(),
            elapsed = started.elapsed().as_secs_f64(),
            "Transcription finished"
        );

        Ok(TranscriptionReport {
            transcript,
            chunks,
            source: summary,
            audio_path: artifact.path.clone(),
            metadata: RunMetadata {
                language: options.language.clone(),
                backend: self.backend.name().to_string(),
                mode,
                audio_duration_seconds: artifact.duration_seconds,
                processing_time_seconds: started.elapsed().as_secs_f64(),
                completed_at: chrono::Utc::now(),
            },
        })
    }
}

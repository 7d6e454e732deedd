//! Whole-file and chunked transcription over an injected recognition backend.

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, warn};

use super::backend::{LanguageTag, RecognitionBackend, RecognitionError};
use crate::audio::{encode_wav, rms_level, ArtifactReader, LocalAudioArtifact};
use crate::ScribeError;

/// Chunk text substituted when the recognizer cannot make out the speech
pub const UNCLEAR_SENTINEL: &str = "[ಅಸ್ಪಷ್ಟ]";

/// Chunk text substituted when the recognition call itself fails
pub const ERROR_SENTINEL: &str = "[ದೋಷ]";

/// Seconds sampled from the head of an artifact to gauge its noise floor
pub const AMBIENT_CALIBRATION_SECS: f64 = 0.5;

/// One fixed-duration window over the artifact timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkWindow {
    pub start_offset_seconds: f64,
    pub duration_seconds: f64,
}

/// Windows covering `[0, total)` in steps of `chunk`, the last one holding
/// whatever remains. A non-positive total yields no windows.
pub fn chunk_windows(total_seconds: f64, chunk_seconds: f64) -> Vec<ChunkWindow> {
    assert!(chunk_seconds > 0.0, "chunk duration must be positive");

    let mut windows = Vec::new();
    let mut start = 0.0;
    while start < total_seconds {
        windows.push(ChunkWindow {
            start_offset_seconds: start,
            duration_seconds: chunk_seconds.min(total_seconds - start),
        });
        start += chunk_seconds;
    }

    windows
}

/// Per-chunk recognition outcome, kept tagged until the final join
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkOutcome {
    /// Recognized text
    Text(String),
    /// The recognizer heard nothing intelligible
    Unclear,
    /// The recognition call failed; the detail goes to the logs
    Failed(String),
}

impl ChunkOutcome {
    /// The text this outcome contributes to the joined transcript
    pub fn as_transcript_text(&self) -> &str {
        match self {
            ChunkOutcome::Text(text) => text,
            ChunkOutcome::Unclear => UNCLEAR_SENTINEL,
            ChunkOutcome::Failed(_) => ERROR_SENTINEL,
        }
    }

    fn status(&self) -> ChunkStatus {
        match self {
            ChunkOutcome::Text(_) => ChunkStatus::Ok,
            ChunkOutcome::Unclear => ChunkStatus::Unclear,
            ChunkOutcome::Failed(_) => ChunkStatus::Error,
        }
    }
}

/// How a chunk fared, for reports and subtitle output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStatus {
    Ok,
    Unclear,
    Error,
}

/// A finished chunk as it appears in reports
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptChunk {
    pub index: usize,
    pub start_offset_seconds: f64,
    pub duration_seconds: f64,
    pub text: String,
    pub status: ChunkStatus,
}

/// Output of a chunked run
#[derive(Debug, Clone)]
pub struct ChunkedTranscript {
    pub transcript: String,
    pub chunks: Vec<TranscriptChunk>,
}

/// Runs recognition over a local artifact through an injected backend
pub struct Transcriber<'a> {
    backend: &'a dyn RecognitionBackend,
    language: LanguageTag,
}

impl<'a> Transcriber<'a> {
    pub fn new(backend: &'a dyn RecognitionBackend, language: LanguageTag) -> Self {
        Self { backend, language }
    }

    /// Transcribe a short artifact in a single recognition call.
    ///
    /// `Ok(None)` means the audio was processed but yielded no text, whether
    /// the speech was unintelligible or the backend call failed; both get
    /// logged. Only an unreadable artifact is an error.
    pub async fn transcribe_whole(
        &self,
        artifact: &LocalAudioArtifact,
    ) -> Result<Option<String>, ScribeError> {
        let mut reader = ArtifactReader::open(artifact)?;
        let total = reader.duration_seconds();

        // The calibration span is consumed: recognition starts after it,
        // unless the artifact is shorter than the span itself
        let calibration = AMBIENT_CALIBRATION_SECS.min(total);
        let head = reader.read_window(0.0, calibration)?;
        debug!(
            noise_floor = rms_level(&head),
            calibration_secs = calibration,
            "Calibrated ambient noise level"
        );

        let speech_start = if calibration < total { calibration } else { 0.0 };
        let samples = reader.read_window(speech_start, total - speech_start)?;
        let payload =
            encode_wav(&samples, reader.sample_rate()).map_err(|e| ScribeError::SourceUnreadable {
                reason: e.to_string(),
            })?;

        match self.backend.recognize(&payload, &self.language).await {
            Ok(text) => Ok(Some(text)),
            Err(RecognitionError::Unintelligible) => {
                warn!("Audio could not be understood");
                Ok(None)
            }
            Err(RecognitionError::Backend(detail)) => {
                warn!(%detail, backend = self.backend.name(), "Recognition request failed");
                Ok(None)
            }
        }
    }

    /// Transcribe a long artifact window by window, one recognition call each.
    ///
    /// A failed window never aborts the run; its outcome is recorded and the
    /// run moves to the next window. Only an unreadable artifact aborts.
    pub async fn transcribe_long(
        &self,
        artifact: &LocalAudioArtifact,
        chunk_seconds: f64,
    ) -> Result<ChunkedTranscript, ScribeError> {
        let mut reader = ArtifactReader::open(artifact)?;
        let windows = chunk_windows(reader.duration_seconds(), chunk_seconds);

        debug!(
            chunks = windows.len(),
            chunk_seconds,
            total_seconds = reader.duration_seconds(),
            "Transcribing in fixed windows"
        );

        let progress = ProgressBar::new(windows.len() as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap()
                .progress_chars("#>-"),
        );
        progress.set_message("Transcribing chunks...");

        let mut outcomes = Vec::with_capacity(windows.len());
        for (index, window) in windows.iter().enumerate() {
            let samples =
                reader.read_window(window.start_offset_seconds, window.duration_seconds)?;
            let payload = encode_wav(&samples, reader.sample_rate()).map_err(|e| {
                ScribeError::SourceUnreadable {
                    reason: e.to_string(),
                }
            })?;

            let outcome = match self.backend.recognize(&payload, &self.language).await {
                Ok(text) => ChunkOutcome::Text(text),
                Err(RecognitionError::Unintelligible) => {
                    warn!(chunk = index, "Chunk could not be understood");
                    ChunkOutcome::Unclear
                }
                Err(RecognitionError::Backend(detail)) => {
                    warn!(chunk = index, %detail, "Chunk recognition failed");
                    ChunkOutcome::Failed(detail)
                }
            };

            outcomes.push(outcome);
            progress.inc(1);
        }
        progress.finish_and_clear();

        Ok(join_outcomes(&windows, &outcomes))
    }
}

/// Substitute sentinels and join chunk texts with single spaces
fn join_outcomes(windows: &[ChunkWindow], outcomes: &[ChunkOutcome]) -> ChunkedTranscript {
    let chunks: Vec<TranscriptChunk> = windows
        .iter()
        .zip(outcomes)
        .enumerate()
        .map(|(index, (window, outcome))| TranscriptChunk {
            index,
            start_offset_seconds: window.start_offset_seconds,
            duration_seconds: window.duration_seconds,
            text: outcome.as_transcript_text().to_string(),
            status: outcome.status(),
        })
        .collect();

    let transcript = chunks
        .iter()
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    ChunkedTranscript { transcript, chunks }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcribe::backend::MockRecognitionBackend;
    use hound::{SampleFormat, WavSpec, WavWriter};
    use std::io::Cursor;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TEST_RATE: u32 = 8_000;

    fn write_tone_wav(path: &Path, seconds: f64) -> LocalAudioArtifact {
        let spec = WavSpec {
            channels: 1,
            sample_rate: TEST_RATE,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        let frames = (seconds * TEST_RATE as f64) as u32;
        for i in 0..frames {
            let value = if (i / 100) % 2 == 0 { 2000i16 } else { -2000 };
            writer.write_sample(value).unwrap();
        }
        writer.finalize().unwrap();
        LocalAudioArtifact::probe(path).unwrap()
    }

    fn payload_frames(audio: &[u8]) -> u32 {
        hound::WavReader::new(Cursor::new(audio))
            .unwrap()
            .duration()
    }

    #[test]
    fn windows_cover_exact_multiples() {
        let windows = chunk_windows(90.0, 30.0);
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].start_offset_seconds, 0.0);
        assert_eq!(windows[2].start_offset_seconds, 60.0);
        assert!(windows.iter().all(|w| w.duration_seconds == 30.0));
    }

    #[test]
    fn last_window_holds_the_remainder() {
        let windows = chunk_windows(95.0, 30.0);
        assert_eq!(windows.len(), 4);
        assert_eq!(windows[3].start_offset_seconds, 90.0);
        assert!((windows[3].duration_seconds - 5.0).abs() < 1e-9);
    }

    #[test]
    fn windows_are_contiguous_and_cover_everything() {
        let windows = chunk_windows(125.0, 30.0);
        for pair in windows.windows(2) {
            assert_eq!(
                pair[0].start_offset_seconds + pair[0].duration_seconds,
                pair[1].start_offset_seconds
            );
        }
        let covered: f64 = windows.iter().map(|w| w.duration_seconds).sum();
        assert!((covered - 125.0).abs() < 1e-9);
    }

    #[test]
    fn short_recording_is_a_single_remainder_window() {
        let windows = chunk_windows(7.5, 30.0);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start_offset_seconds, 0.0);
        assert!((windows[0].duration_seconds - 7.5).abs() < 1e-9);
    }

    #[test]
    fn zero_duration_has_no_windows() {
        assert!(chunk_windows(0.0, 30.0).is_empty());
    }

    #[test]
    fn sentinels_substitute_only_at_join() {
        let windows = chunk_windows(60.0, 30.0);
        let outcomes = vec![
            ChunkOutcome::Unclear,
            ChunkOutcome::Failed("quota exhausted".to_string()),
        ];

        let joined = join_outcomes(&windows, &outcomes);
        assert_eq!(
            joined.transcript,
            format!("{} {}", UNCLEAR_SENTINEL, ERROR_SENTINEL)
        );
        assert_eq!(joined.chunks[0].status, ChunkStatus::Unclear);
        assert_eq!(joined.chunks[1].status, ChunkStatus::Error);
    }

    #[tokio::test]
    async fn whole_file_skips_calibration_and_returns_text() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = write_tone_wav(&dir.path().join("clip.wav"), 2.0);

        let mut backend = MockRecognitionBackend::new();
        backend.expect_name().return_const("mock");
        backend
            .expect_recognize()
            .times(1)
            .withf(|audio, language| {
                // 2.0s minus the 0.5s calibration span
                payload_frames(audio) == (1.5 * TEST_RATE as f64) as u32
                    && language.as_str() == "kn-IN"
            })
            .returning(|_, _| Ok("ಹಲೋ ನಮಸ್ಕಾರ".to_string()));

        let transcriber = Transcriber::new(&backend, LanguageTag::kannada());
        let text = transcriber.transcribe_whole(&artifact).await.unwrap();

        assert_eq!(text.as_deref(), Some("ಹಲೋ ನಮಸ್ಕಾರ"));
    }

    #[tokio::test]
    async fn whole_file_shorter_than_calibration_is_sent_whole() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = write_tone_wav(&dir.path().join("blip.wav"), 0.3);

        let mut backend = MockRecognitionBackend::new();
        backend.expect_name().return_const("mock");
        backend
            .expect_recognize()
            .times(1)
            .withf(|audio, _| payload_frames(audio) == (0.3 * TEST_RATE as f64) as u32)
            .returning(|_, _| Ok("ಸರಿ".to_string()));

        let transcriber = Transcriber::new(&backend, LanguageTag::kannada());
        let text = transcriber.transcribe_whole(&artifact).await.unwrap();

        assert_eq!(text.as_deref(), Some("ಸರಿ"));
    }

    #[tokio::test]
    async fn whole_file_maps_unintelligible_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = write_tone_wav(&dir.path().join("noise.wav"), 1.0);

        let mut backend = MockRecognitionBackend::new();
        backend.expect_name().return_const("mock");
        backend
            .expect_recognize()
            .returning(|_, _| Err(RecognitionError::Unintelligible));

        let transcriber = Transcriber::new(&backend, LanguageTag::kannada());
        let text = transcriber.transcribe_whole(&artifact).await.unwrap();

        assert!(text.is_none());
    }

    #[tokio::test]
    async fn whole_file_maps_backend_failure_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = write_tone_wav(&dir.path().join("clip.wav"), 1.0);

        let mut backend = MockRecognitionBackend::new();
        backend.expect_name().return_const("mock");
        backend
            .expect_recognize()
            .returning(|_, _| Err(RecognitionError::Backend("503 unavailable".to_string())));

        let transcriber = Transcriber::new(&backend, LanguageTag::kannada());
        let text = transcriber.transcribe_whole(&artifact).await.unwrap();

        assert!(text.is_none());
    }

    #[tokio::test]
    async fn chunked_run_marks_one_bad_window_and_keeps_going() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = write_tone_wav(&dir.path().join("long.wav"), 150.0);

        let mut backend = MockRecognitionBackend::new();
        backend.expect_name().return_const("mock");
        let calls = AtomicUsize::new(0);
        backend.expect_recognize().times(5).returning(move |_, _| {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            if call == 2 {
                Err(RecognitionError::Unintelligible)
            } else {
                Ok(format!("ಭಾಗ{call}"))
            }
        });

        let transcriber = Transcriber::new(&backend, LanguageTag::kannada());
        let result = transcriber.transcribe_long(&artifact, 30.0).await.unwrap();

        assert_eq!(result.chunks.len(), 5);
        assert_eq!(result.chunks[2].status, ChunkStatus::Unclear);
        assert_eq!(result.chunks[2].text, UNCLEAR_SENTINEL);
        assert_eq!(
            result.transcript,
            format!("ಭಾಗ0 ಭಾಗ1 {} ಭಾಗ3 ಭಾಗ4", UNCLEAR_SENTINEL)
        );
    }

    #[tokio::test]
    async fn chunked_run_distinguishes_error_from_unclear() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = write_tone_wav(&dir.path().join("long.wav"), 90.0);

        let mut backend = MockRecognitionBackend::new();
        backend.expect_name().return_const("mock");
        let calls = AtomicUsize::new(0);
        backend
            .expect_recognize()
            .times(3)
            .returning(move |_, _| match calls.fetch_add(1, Ordering::SeqCst) {
                0 => Err(RecognitionError::Backend("connection reset".to_string())),
                1 => Err(RecognitionError::Unintelligible),
                n => Ok(format!("ಭಾಗ{n}")),
            });

        let transcriber = Transcriber::new(&backend, LanguageTag::kannada());
        let result = transcriber.transcribe_long(&artifact, 30.0).await.unwrap();

        assert_eq!(result.chunks[0].text, ERROR_SENTINEL);
        assert_eq!(result.chunks[1].text, UNCLEAR_SENTINEL);
        assert_ne!(ERROR_SENTINEL, UNCLEAR_SENTINEL);
        assert_eq!(result.chunks[2].text, "ಭಾಗ2");
    }

    #[tokio::test]
    async fn chunked_join_preserves_segment_count() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = write_tone_wav(&dir.path().join("long.wav"), 95.0);

        let mut backend = MockRecognitionBackend::new();
        backend.expect_name().return_const("mock");
        backend
            .expect_recognize()
            .times(4)
            .returning(|_, _| Ok("ಸರಿ".to_string()));

        let transcriber = Transcriber::new(&backend, LanguageTag::kannada());
        let result = transcriber.transcribe_long(&artifact, 30.0).await.unwrap();

        // Single-space join over single-token chunk texts splits back cleanly
        assert_eq!(result.transcript.split(' ').count(), 4);
    }

    #[tokio::test]
    async fn unreadable_artifact_aborts_chunked_run() {
        let artifact = LocalAudioArtifact {
            path: Path::new("/nonexistent/audio_stream.wav").to_path_buf(),
            duration_seconds: 60.0,
            sample_rate: 16_000,
            channel_count: 1,
        };

        let mut backend = MockRecognitionBackend::new();
        backend.expect_name().return_const("mock");

        let transcriber = Transcriber::new(&backend, LanguageTag::kannada());
        let err = transcriber
            .transcribe_long(&artifact, 30.0)
            .await
            .unwrap_err();

        assert!(matches!(err, ScribeError::SourceUnreadable { .. }));
    }
}

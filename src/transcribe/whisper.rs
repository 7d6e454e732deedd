//! Local whisper recognition, compiled in with the `local-whisper` feature.

use async_trait::async_trait;
use hound::{SampleFormat, WavReader};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use super::backend::{LanguageTag, RecognitionBackend, RecognitionError};
use crate::config::LocalBackendConfig;

const MODEL_BASE_URL: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

/// Recognizer running a ggml whisper model in-process
pub struct WhisperBackend {
    context: WhisperContext,
}

impl WhisperBackend {
    /// Load the configured model, downloading it on first use
    pub async fn new(config: &LocalBackendConfig) -> crate::Result<Self> {
        let model_path = ensure_model(config).await?;
        info!(model = %model_path.display(), "Loading whisper model");

        let path_str = model_path
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("model path is not valid UTF-8"))?;
        let context =
            WhisperContext::new_with_params(path_str, WhisperContextParameters::default())?;

        Ok(Self { context })
    }
}

#[async_trait]
impl RecognitionBackend for WhisperBackend {
    async fn recognize(
        &self,
        audio: &[u8],
        language: &LanguageTag,
    ) -> Result<String, RecognitionError> {
        let samples = decode_wav_samples(audio)?;
        debug!(
            samples = samples.len(),
            language = %language,
            "Running whisper inference"
        );

        let mut state = self
            .context
            .create_state()
            .map_err(|e| RecognitionError::Backend(format!("whisper state: {e}")))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(Some(language.primary()));
        params.set_translate(false);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        state
            .full(params, &samples)
            .map_err(|e| RecognitionError::Backend(format!("whisper inference: {e}")))?;

        let segments = state
            .full_n_segments()
            .map_err(|e| RecognitionError::Backend(format!("whisper segments: {e}")))?;

        let mut text = String::new();
        for segment in 0..segments {
            let piece = state
                .full_get_segment_text(segment)
                .map_err(|e| RecognitionError::Backend(format!("whisper segment text: {e}")))?;
            text.push_str(&piece);
        }

        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(RecognitionError::Unintelligible);
        }

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "local-whisper"
    }
}

/// Decode a WAV payload into the f32 samples whisper consumes
fn decode_wav_samples(audio: &[u8]) -> Result<Vec<f32>, RecognitionError> {
    let mut reader = WavReader::new(Cursor::new(audio))
        .map_err(|e| RecognitionError::Backend(format!("invalid wav payload: {e}")))?;
    let spec = reader.spec();

    if spec.channels != 1 || spec.sample_rate != 16_000 {
        return Err(RecognitionError::Backend(format!(
            "whisper expects mono 16 kHz audio, got {} channel(s) at {} Hz",
            spec.channels, spec.sample_rate
        )));
    }
    if spec.bits_per_sample != 16 || !matches!(spec.sample_format, SampleFormat::Int) {
        return Err(RecognitionError::Backend(
            "whisper payload must be 16-bit PCM".to_string(),
        ));
    }

    reader
        .samples::<i16>()
        .map(|s| s.map(|v| v as f32 / 32768.0))
        .collect::<Result<_, _>>()
        .map_err(|e| RecognitionError::Backend(format!("wav read: {e}")))
}

/// Resolve the model file, downloading the named ggml model when absent
async fn ensure_model(config: &LocalBackendConfig) -> crate::Result<PathBuf> {
    if let Some(path) = &config.model_path {
        if !path.exists() {
            anyhow::bail!("configured model file does not exist: {}", path.display());
        }
        return Ok(path.clone());
    }

    let path = default_model_path(&config.model)?;
    if path.exists() {
        return Ok(path);
    }

    download_model(&config.model, &path).await?;
    Ok(path)
}

fn default_model_path(model: &str) -> crate::Result<PathBuf> {
    let data_dir =
        dirs::data_dir().ok_or_else(|| anyhow::anyhow!("could not determine data directory"))?;
    Ok(data_dir
        .join("kannada-scribe")
        .join("models")
        .join(format!("ggml-{model}.bin")))
}

async fn download_model(model: &str, target: &Path) -> crate::Result<()> {
    use futures_util::StreamExt;
    use indicatif::{ProgressBar, ProgressStyle};
    use std::io::Write;

    if let Some(parent) = target.parent() {
        fs_err::create_dir_all(parent)?;
    }

    let url = format!("{MODEL_BASE_URL}/ggml-{model}.bin");
    info!(%url, "Downloading whisper model");

    let response = reqwest::get(&url).await?;
    if !response.status().is_success() {
        anyhow::bail!("model download failed: HTTP {}", response.status());
    }

    let total_size = response.content_length().unwrap_or(0);
    let progress = ProgressBar::new(total_size);
    progress.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}",
            )
            .unwrap()
            .progress_chars("#>-"),
    );
    progress.set_message(format!("Downloading ggml-{model}.bin..."));

    // Stage under a partial name so an interrupted download never looks installed
    let partial = target.with_extension("bin.part");
    let mut file = fs_err::File::create(&partial)?;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)?;
        progress.inc(chunk.len() as u64);
    }
    file.flush()?;
    drop(file);

    fs_err::rename(&partial, target)?;
    progress.finish_with_message("Model downloaded");

    Ok(())
}

use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::config::BackendConfig;

/// Language tag handed through to the recognizer, BCP-47 style
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageTag(String);

impl LanguageTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Spoken Kannada, the default for this tool
    pub fn kannada() -> Self {
        Self("kn-IN".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The bare language part, e.g. `kn` out of `kn-IN`
    pub fn primary(&self) -> &str {
        self.0
            .split_once('-')
            .map(|(head, _)| head)
            .unwrap_or(&self.0)
    }
}

impl Default for LanguageTag {
    fn default() -> Self {
        Self::kannada()
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Failure modes of a single recognition call
#[derive(Debug, Error)]
pub enum RecognitionError {
    /// The recognizer processed the audio but heard nothing intelligible
    #[error("speech could not be understood")]
    Unintelligible,

    /// The call itself failed: transport, quota, model fault
    #[error("recognition backend error: {0}")]
    Backend(String),
}

/// A speech recognizer the transcribers can be pointed at.
///
/// Every call receives a complete standalone WAV payload; implementations do
/// not see the artifact on disk and hold no position between calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecognitionBackend: Send + Sync {
    /// Recognize the speech in `audio`, spoken in `language`
    async fn recognize(
        &self,
        audio: &[u8],
        language: &LanguageTag,
    ) -> Result<String, RecognitionError>;

    /// Backend name for logs and reports
    fn name(&self) -> &'static str;
}

/// Which recognizer implementation handles the audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Google Cloud Speech-to-Text over HTTP
    Cloud,
    /// whisper model running on this machine
    Local,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Cloud => write!(f, "cloud"),
            BackendKind::Local => write!(f, "local"),
        }
    }
}

/// Construct the configured recognition backend
pub async fn build_backend(config: &BackendConfig) -> crate::Result<Arc<dyn RecognitionBackend>> {
    match config.provider {
        BackendKind::Cloud => {
            let api_key = config.cloud.resolve_api_key()?;
            Ok(Arc::new(super::google::GoogleSpeechBackend::new(
                api_key,
                config.cloud.endpoint.clone(),
            )))
        }
        BackendKind::Local => build_local_backend(config).await,
    }
}

#[cfg(feature = "local-whisper")]
async fn build_local_backend(config: &BackendConfig) -> crate::Result<Arc<dyn RecognitionBackend>> {
    let backend = super::whisper::WhisperBackend::new(&config.local).await?;
    Ok(Arc::new(backend))
}

#[cfg(not(feature = "local-whisper"))]
async fn build_local_backend(_config: &BackendConfig) -> crate::Result<Arc<dyn RecognitionBackend>> {
    anyhow::bail!(
        "this build has no local model support; rebuild with --features local-whisper or switch backend.provider to 'cloud'"
    )
}

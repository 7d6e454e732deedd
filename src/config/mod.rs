use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::transcribe::BackendKind;

/// Environment variable consulted when no API key is configured
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Recognition backend selection and credentials
    pub backend: BackendConfig,

    /// Paths of the external tools the acquirer shells out to
    pub tools: ToolsConfig,

    /// Transcription policy knobs
    pub transcription: TranscriptionConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Which recognition backend serves transcription requests
    pub provider: BackendKind,

    /// Cloud recognizer settings
    pub cloud: CloudBackendConfig,

    /// Local model settings
    pub local: LocalBackendConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudBackendConfig {
    /// API key for the speech service; the environment wins when unset
    pub api_key: Option<String>,

    /// Override for the recognition endpoint URL
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalBackendConfig {
    /// Model size to fetch when no explicit path is given (tiny, base, small, ...)
    pub model: String,

    /// Path to an already-downloaded model file
    pub model_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// yt-dlp binary location
    pub yt_dlp_path: PathBuf,

    /// ffmpeg binary location; a platform default is used when unset
    pub ffmpeg_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// Language tag the recognizer is asked for by default
    pub default_language: String,

    /// Window length for chunked transcription, in seconds
    pub chunk_duration_secs: f64,

    /// Recordings longer than this many seconds are chunked
    pub long_audio_threshold_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory extracted audio artifacts are written to
    pub output_dir: PathBuf,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            provider: BackendKind::Cloud,
            cloud: CloudBackendConfig::default(),
            local: LocalBackendConfig::default(),
        }
    }
}

impl Default for LocalBackendConfig {
    fn default() -> Self {
        Self {
            model: "medium".to_string(),
            model_path: None,
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            yt_dlp_path: PathBuf::from("yt-dlp"),
            ffmpeg_path: None,
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            default_language: "kn-IN".to_string(),
            chunk_duration_secs: 30.0,
            long_audio_threshold_secs: 300.0,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("downloads"),
        }
    }
}

impl CloudBackendConfig {
    /// API key to use: the configured one, falling back to the environment
    pub fn resolve_api_key(&self) -> Result<String> {
        if let Some(key) = self.api_key.as_deref().filter(|key| !key.is_empty()) {
            return Ok(key.to_string());
        }

        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.is_empty())
            .with_context(|| {
                format!(
                    "no Google API key configured; set backend.cloud.api_key in the config file \
                     or the {API_KEY_ENV} environment variable"
                )
            })
    }
}

impl ToolsConfig {
    /// ffmpeg location: the configured override or the conventional
    /// install path for the platform.
    pub fn resolved_ffmpeg(&self) -> PathBuf {
        match &self.ffmpeg_path {
            Some(path) => path.clone(),
            None => PathBuf::from(if cfg!(windows) {
                r"C:\ffmpeg\bin\ffmpeg.exe"
            } else {
                "/usr/bin/ffmpeg"
            }),
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content =
                fs_err::read_to_string(&config_path).context("Failed to read config file")?;

            let config: Config =
                serde_yaml::from_str(&content).context("Failed to parse config file")?;

            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save().await?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("kannada-scribe").join("config.yaml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.transcription.chunk_duration_secs <= 0.0 {
            anyhow::bail!("transcription.chunk_duration_secs must be positive");
        }

        if self.transcription.long_audio_threshold_secs < 0.0 {
            anyhow::bail!("transcription.long_audio_threshold_secs cannot be negative");
        }

        if self.transcription.default_language.is_empty() {
            anyhow::bail!("transcription.default_language must not be empty");
        }

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Backend: {}", self.backend.provider);
        println!(
            "  Cloud API key: {}",
            if self.backend.cloud.api_key.is_some() {
                "set"
            } else {
                "not set"
            }
        );
        if let Some(endpoint) = &self.backend.cloud.endpoint {
            println!("  Cloud endpoint: {}", endpoint);
        }
        println!("  Local model: {}", self.backend.local.model);
        if let Some(path) = &self.backend.local.model_path {
            println!("  Local model path: {}", path.display());
        }
        println!("  yt-dlp: {}", self.tools.yt_dlp_path.display());
        println!("  ffmpeg: {}", self.tools.resolved_ffmpeg().display());
        println!("  Language: {}", self.transcription.default_language);
        println!(
            "  Chunk duration: {}s",
            self.transcription.chunk_duration_secs
        );
        println!(
            "  Long-audio threshold: {}s",
            self.transcription.long_audio_threshold_secs
        );
        println!("  Output directory: {}", self.app.output_dir.display());
    }
}

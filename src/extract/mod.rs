use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

pub mod acquirer;
pub mod selector;
pub mod ytdlp;

pub use acquirer::AudioAcquirer;
pub use selector::{audio_candidates, select_best_audio};
pub use ytdlp::YtDlpFetcher;

use crate::Result;

/// One stream variant reported by the prober.
///
/// Codec fields keep the prober's convention: the literal string `"none"`
/// marks a track that is explicitly absent, while a missing field means the
/// prober did not say.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatCandidate {
    /// Prober identifier used to request this exact variant
    pub format_id: String,

    /// Audio codec name, e.g. `opus`, or `none`
    pub acodec: Option<String>,

    /// Video codec name, e.g. `vp9`, or `none`
    pub vcodec: Option<String>,

    /// Audio bitrate in kbit/s as reported; absent for some entries
    pub abr: Option<f64>,

    /// Container extension, e.g. `webm`
    pub ext: Option<String>,

    /// Human note the prober attaches, e.g. `medium`
    pub format_note: Option<String>,
}

impl FormatCandidate {
    /// Build a candidate from one entry of the prober's `formats` array
    pub fn from_probe_value(value: &Value) -> Self {
        Self {
            format_id: value["format_id"].as_str().unwrap_or_default().to_string(),
            acodec: value["acodec"].as_str().map(|s| s.to_string()),
            vcodec: value["vcodec"].as_str().map(|s| s.to_string()),
            abr: value["abr"].as_f64(),
            ext: value["ext"].as_str().map(|s| s.to_string()),
            format_note: value["format_note"].as_str().map(|s| s.to_string()),
        }
    }

    /// True when the variant carries audio and no video track
    pub fn is_audio_only(&self) -> bool {
        self.vcodec.as_deref() == Some("none") && self.has_audio()
    }

    /// True unless the audio codec is explicitly marked absent
    pub fn has_audio(&self) -> bool {
        self.acodec.as_deref() != Some("none")
    }

    /// Ranking bitrate; a missing or unparseable value counts as zero
    pub fn bitrate(&self) -> f64 {
        self.abr.unwrap_or(0.0)
    }
}

/// A probed remote source: the URL plus everything the prober reported
#[derive(Debug, Clone)]
pub struct AudioSource {
    /// Normalized source URL
    pub url: String,

    /// Title of the media if the prober found one
    pub title: Option<String>,

    /// Duration in seconds as reported; the local artifact probe is authoritative
    pub duration: Option<f64>,

    /// Every format entry, parsed
    pub candidates: Vec<FormatCandidate>,

    /// The raw `formats` array for debug dumps
    pub raw_formats: Value,
}

/// Capability that probes a remote source and fetches one chosen variant.
///
/// Production code talks to yt-dlp through this seam so the pipeline can be
/// exercised without a network or external binaries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Probe a URL and report the stream variants it offers
    async fn probe(&self, url: &str) -> Result<AudioSource>;

    /// Fetch one variant and leave a mono 16 kHz WAV at `output_path`
    async fn fetch(&self, url: &str, format_id: &str, output_path: &Path) -> Result<()>;

    /// Tool name for logs and error messages
    fn name(&self) -> &'static str;
}

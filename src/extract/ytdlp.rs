use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use super::{AudioSource, FormatCandidate, MediaFetcher};
use crate::config::ToolsConfig;
use crate::Result;

/// Stream prober and downloader backed by the yt-dlp binary
pub struct YtDlpFetcher {
    yt_dlp_path: PathBuf,
    ffmpeg_path: PathBuf,
}

impl YtDlpFetcher {
    pub fn new(tools: &ToolsConfig) -> Self {
        Self {
            yt_dlp_path: tools.yt_dlp_path.clone(),
            ffmpeg_path: tools.resolved_ffmpeg(),
        }
    }

    /// Check if yt-dlp is available
    pub async fn check_availability(&self) -> Result<bool> {
        let output = Command::new(&self.yt_dlp_path)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        Ok(matches!(output, Ok(out) if out.status.success()))
    }

    /// Dump the prober's JSON description of a source
    async fn dump_info(&self, url: &str) -> Result<Value> {
        tracing::debug!("Probing stream info for: {}", url);

        let output = Command::new(&self.yt_dlp_path)
            .args(["--dump-json", "--no-playlist", url])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp failed: {}", error);
        }

        let json_str = String::from_utf8(output.stdout)?;
        let info: Value = serde_json::from_str(&json_str)?;

        Ok(info)
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn probe(&self, url: &str) -> Result<AudioSource> {
        if !self.check_availability().await? {
            anyhow::bail!(
                "yt-dlp is not available at '{}'. Install it: https://github.com/yt-dlp/yt-dlp",
                self.yt_dlp_path.display()
            );
        }

        let info = self.dump_info(url).await?;

        let title = info["title"].as_str().map(|s| s.to_string());
        let duration = info["duration"].as_f64();

        let raw_formats = info["formats"].clone();
        let candidates = raw_formats
            .as_array()
            .map(|formats| {
                formats
                    .iter()
                    .map(FormatCandidate::from_probe_value)
                    .collect()
            })
            .unwrap_or_default();

        Ok(AudioSource {
            url: url.to_string(),
            title,
            duration,
            candidates,
            raw_formats,
        })
    }

    async fn fetch(&self, url: &str, format_id: &str, output_path: &Path) -> Result<()> {
        tracing::debug!("Fetching format {} for: {}", format_id, url);

        // yt-dlp's audio postprocessor appends the final extension itself,
        // so the output template is the target path without its ".wav"
        let template = output_path.with_extension("");

        let output = Command::new(&self.yt_dlp_path)
            .args([
                "--format",
                format_id,
                // Re-encode the fetched track for the recognizers
                "--extract-audio",
                "--audio-format",
                "wav",
                "--postprocessor-args",
                "ffmpeg:-ac 1 -ar 16000",
                "--no-playlist",
            ])
            .arg("--ffmpeg-location")
            .arg(&self.ffmpeg_path)
            .arg("--output")
            .arg(&template)
            .arg(url)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp download failed: {}", error);
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

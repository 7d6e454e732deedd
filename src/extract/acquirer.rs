use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use super::{FormatCandidate, MediaFetcher};
use crate::audio::LocalAudioArtifact;
use crate::utils;
use crate::ScribeError;

/// Turns a selected stream variant into a validated local WAV artifact
pub struct AudioAcquirer {
    fetcher: Arc<dyn MediaFetcher>,
}

impl AudioAcquirer {
    pub fn new(fetcher: Arc<dyn MediaFetcher>) -> Self {
        Self { fetcher }
    }

    /// Fetch `selected` from `url` into `destination_dir`.
    ///
    /// The artifact gets a collision-free name and is probed before being
    /// handed on; a fetch that leaves nothing usable behind is reported as an
    /// acquisition failure, never as a phantom artifact.
    pub async fn acquire(
        &self,
        url: &str,
        selected: &FormatCandidate,
        destination_dir: &Path,
    ) -> Result<LocalAudioArtifact, ScribeError> {
        fs_err::create_dir_all(destination_dir).map_err(|e| ScribeError::AcquisitionFailed {
            reason: format!("cannot create {}: {}", destination_dir.display(), e),
        })?;

        let filename = utils::generate_unique_filename("audio_stream", "wav");
        let output_path = destination_dir.join(filename);

        info!(
            format_id = %selected.format_id,
            bitrate = selected.bitrate(),
            tool = self.fetcher.name(),
            "Fetching audio stream"
        );

        let progress = ProgressBar::new_spinner();
        progress.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap(),
        );
        progress.set_message("Extracting and transcoding audio...");

        let fetched = self
            .fetcher
            .fetch(url, &selected.format_id, &output_path)
            .await;
        progress.finish_and_clear();

        fetched.map_err(|e| ScribeError::AcquisitionFailed {
            reason: e.to_string(),
        })?;

        let size = fs_err::metadata(&output_path)
            .map_err(|_| ScribeError::AcquisitionFailed {
                reason: format!("{} produced no output file", self.fetcher.name()),
            })?
            .len();

        if size == 0 {
            return Err(ScribeError::AcquisitionFailed {
                reason: "downloader produced an empty file".to_string(),
            });
        }

        let artifact =
            LocalAudioArtifact::probe(&output_path).map_err(|e| ScribeError::AcquisitionFailed {
                reason: format!("artifact failed validation: {}", e),
            })?;

        info!(
            path = %artifact.path.display(),
            duration = %utils::format_duration(artifact.duration_seconds),
            size = %utils::format_file_size(size),
            sample_rate = artifact.sample_rate,
            "Audio artifact ready"
        );

        Ok(artifact)
    }
}

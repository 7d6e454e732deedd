use std::path::Path;
use url::Url;

use crate::config::ToolsConfig;
use crate::ScribeError;

/// Validate a stream URL and return its normalized form
pub fn validate_url(url: &str) -> Result<String, ScribeError> {
    let parsed = Url::parse(url).map_err(|_| ScribeError::UnsupportedUrl(url.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ScribeError::UnsupportedUrl(url.to_string()));
    }

    Ok(parsed.to_string())
}

/// Format file size in human-readable format
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f = bytes as f64;
    let unit_index = (bytes_f.log10() / THRESHOLD.log10()).floor() as usize;
    let unit_index = unit_index.min(UNITS.len() - 1);

    let size = bytes_f / THRESHOLD.powi(unit_index as i32);

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Format duration in human-readable format
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Generate a unique artifact filename with timestamp and random suffix
pub fn generate_unique_filename(base_name: &str, extension: &str) -> String {
    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let random_suffix = uuid::Uuid::new_v4().to_string()[..8].to_string();

    format!("{}_{}_{}.{}", base_name, timestamp, random_suffix, extension)
}

/// Parse language code and return normalized version
pub fn normalize_language_code(lang: &str) -> String {
    // Short codes map to the Indian regional variants the recognizer expects
    let normalized = match lang.to_lowercase().as_str() {
        "kn" | "kannada" => "kn-IN",
        "hi" | "hindi" => "hi-IN",
        "ta" | "tamil" => "ta-IN",
        "te" | "telugu" => "te-IN",
        "ml" | "malayalam" => "ml-IN",
        "mr" | "marathi" => "mr-IN",
        "en" | "english" => "en-IN",
        _ => lang, // Return as-is if no mapping found
    };

    normalized.to_string()
}

/// Check that the configured external tools are actually runnable
pub async fn check_dependencies(tools: &ToolsConfig) -> Vec<String> {
    let mut missing = Vec::new();

    if !check_command_available(&tools.yt_dlp_path, "--version").await {
        missing.push(format!(
            "{} - required for stream probing and audio extraction",
            tools.yt_dlp_path.display()
        ));
    }

    // ffmpeg only understands the single-dash form
    if !check_command_available(&tools.resolved_ffmpeg(), "-version").await {
        missing.push(format!(
            "{} - required for transcoding to mono 16 kHz WAV",
            tools.resolved_ffmpeg().display()
        ));
    }

    missing
}

/// Check if a command runs successfully with its version flag
pub async fn check_command_available(command: &Path, version_arg: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg(version_arg)
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}
